//! # lexsort-progress
//!
//! One-way structured event emission for lexsort jobs. Events are
//! self-contained records tagged with a `type` discriminator so a host
//! process can demultiplex progress, results, and terminal outcomes from
//! a single line-oriented channel.
//!
//! Emission is fire-and-forget: the engine never blocks waiting for the
//! consumer, delivery is at most once, and there is no acknowledgement
//! channel.

mod event;
mod sink;

pub use event::{JobStage, ProgressEvent};
pub use sink::{JsonLinesSink, MemorySink, NullSink, ProgressSink};
