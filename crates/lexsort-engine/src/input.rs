//! JSON-lines input files.
//!
//! The host process hands the job its data as NDJSON files: one record
//! per line, blank lines ignored. Items are `{"id": .., "text": ..}`
//! (`ready` optional); samples are `{"id": .., "text": .., "label": ..}`.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::de::DeserializeOwned;
use tracing::info;

use lexsort_types::{Item, LabeledSample};

use crate::error::EngineError;

fn read_lines<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, EngineError> {
    let file = File::open(path)
        .map_err(|e| EngineError::Input(format!("cannot open {}: {e}", path.display())))?;
    let mut records = Vec::new();
    for (number, line) in BufReader::new(file).lines().enumerate() {
        let line =
            line.map_err(|e| EngineError::Input(format!("{}: read failed: {e}", path.display())))?;
        if line.trim().is_empty() {
            continue;
        }
        let record = serde_json::from_str(&line).map_err(|e| {
            EngineError::Input(format!("{}:{}: {e}", path.display(), number + 1))
        })?;
        records.push(record);
    }
    Ok(records)
}

/// Read items from an NDJSON file.
pub fn read_items(path: &Path) -> Result<Vec<Item>, EngineError> {
    let items: Vec<Item> = read_lines(path)?;
    info!(count = items.len(), path = %path.display(), "read items");
    Ok(items)
}

/// Read labeled training samples from an NDJSON file.
pub fn read_samples(path: &Path) -> Result<Vec<LabeledSample>, EngineError> {
    let samples: Vec<LabeledSample> = read_lines(path)?;
    info!(count = samples.len(), path = %path.display(), "read samples");
    Ok(samples)
}
