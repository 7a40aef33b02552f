//! Progress sinks.

use std::io::Write;
use std::sync::Mutex;

use tracing::debug;

use crate::event::ProgressEvent;

/// Fire-and-forget event consumer.
///
/// `emit` must not block on the downstream consumer and must not fail
/// the job: a sink that cannot deliver drops the event.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: &ProgressEvent);
}

/// Writes one JSON object per line to the wrapped writer.
///
/// This is the wire format a host process consumes on the job's stdout.
/// Write errors are swallowed (logged at debug): a broken pipe must not
/// turn a finished computation into a failure.
pub struct JsonLinesSink<W: Write + Send> {
    writer: Mutex<W>,
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }
}

impl<W: Write + Send> ProgressSink for JsonLinesSink<W> {
    fn emit(&self, event: &ProgressEvent) {
        let line = match serde_json::to_string(event) {
            Ok(line) => line,
            Err(e) => {
                debug!("failed to serialize progress event: {}", e);
                return;
            }
        };
        let mut writer = match self.writer.lock() {
            Ok(writer) => writer,
            Err(_) => return,
        };
        if let Err(e) = writeln!(writer, "{}", line).and_then(|_| writer.flush()) {
            debug!("failed to write progress event: {}", e);
        }
    }
}

/// Discards every event.
pub struct NullSink;

impl ProgressSink for NullSink {
    fn emit(&self, _event: &ProgressEvent) {}
}

/// Collects events in memory; used by tests to assert on the stream.
#[derive(Default)]
pub struct MemorySink {
    events: Mutex<Vec<ProgressEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything emitted so far.
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().expect("sink poisoned").clone()
    }

    /// Count events matching a predicate.
    pub fn count_matching(&self, predicate: impl Fn(&ProgressEvent) -> bool) -> usize {
        self.events().iter().filter(|e| predicate(e)).count()
    }
}

impl ProgressSink for MemorySink {
    fn emit(&self, event: &ProgressEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_lines_one_record_per_line() {
        let sink = JsonLinesSink::new(Vec::new());
        sink.emit(&ProgressEvent::info("starting"));
        sink.emit(&ProgressEvent::fetch_progress(1, 2));

        let buffer = sink.writer.into_inner().unwrap();
        let text = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        for line in lines {
            let value: serde_json::Value = serde_json::from_str(line).unwrap();
            assert!(value.get("type").is_some());
        }
    }

    #[test]
    fn test_memory_sink_collects_in_order() {
        let sink = MemorySink::new();
        sink.emit(&ProgressEvent::info("a"));
        sink.emit(&ProgressEvent::info("b"));
        let events = sink.events();
        assert_eq!(events.len(), 2);
        match &events[0] {
            ProgressEvent::Info { message } => assert_eq!(message, "a"),
            _ => panic!("expected info"),
        }
    }
}
