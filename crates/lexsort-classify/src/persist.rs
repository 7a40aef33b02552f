//! Whole-model persistence.
//!
//! Models are serialized to JSON and stored in a [`PersistedModel`]
//! envelope whose `vector_model_tag` carries the trainer version. The
//! envelope is upserted per owner: a new training run for the same
//! owner replaces any prior model atomically.

use tracing::debug;

use lexsort_types::{ClassifierModel, ModelStore, PersistedModel};

use crate::error::ClassifyError;

/// Wrap a model in its persistence envelope.
pub fn to_persisted(
    model: &ClassifierModel,
    model_name: &str,
) -> Result<PersistedModel, ClassifyError> {
    let payload = serde_json::to_string(model)
        .map_err(|e| ClassifyError::Model(format!("serialize failed: {e}")))?;
    Ok(PersistedModel {
        model_name: model_name.to_string(),
        vector_model_tag: model.version_tag.clone(),
        payload,
    })
}

/// Unwrap and validate a persisted model.
pub fn from_persisted(persisted: &PersistedModel) -> Result<ClassifierModel, ClassifyError> {
    let model: ClassifierModel = serde_json::from_str(&persisted.payload)
        .map_err(|e| ClassifyError::Model(format!("deserialize failed: {e}")))?;
    model.validate().map_err(ClassifyError::Model)?;
    Ok(model)
}

/// Persist a model for an owner, replacing any prior one.
pub fn save_model<M: ModelStore>(
    store: &M,
    owner: &str,
    model: &ClassifierModel,
    model_name: &str,
) -> Result<(), ClassifyError> {
    let persisted = to_persisted(model, model_name)?;
    store.put_model(owner, &persisted)?;
    debug!(owner, model_name, labels = model.labels.len(), "model saved");
    Ok(())
}

/// Load the owner's model, if a valid one is persisted.
pub fn load_model<M: ModelStore>(
    store: &M,
    owner: &str,
) -> Result<Option<ClassifierModel>, ClassifyError> {
    match store.get_model(owner)? {
        Some(persisted) => Ok(Some(from_persisted(&persisted)?)),
        None => Ok(None),
    }
}
