use crate::model::event::Event;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fs::OpenOptions;
use std::path::Path;

/// One row of the persisted event stream.
#[derive(Debug, Serialize, Deserialize)]
pub struct EventRecord {
    pub ts: u64,
    pub node: String,
    pub kind: String,
    pub vehicle: String,
    pub road: String,
}

impl EventRecord {
    pub fn from_event(event: &Event) -> Self {
        EventRecord {
            ts: event.timestamp(),
            node: event.node().to_string(),
            kind: event.kind().to_string(),
            vehicle: event
                .vehicle()
                .map(|v| v.id.clone())
                .unwrap_or_default(),
            road: event.road().map(|r| r.to_string()).unwrap_or_default(),
        }
    }
}

/// Appends a record to the CSV file, writing headers only on creation.
pub fn log_to_csv(filename: &str, record: &EventRecord) -> Result<(), Box<dyn Error>> {
    let file_exists = Path::new(filename).exists();
    let file = OpenOptions::new().append(true).create(true).open(filename)?;
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(!file_exists)
        .from_writer(file);
    wtr.serialize(record)?;
    wtr.flush()?;
    Ok(())
}

/// Persists an ordered event, reporting failures without interrupting the
/// consumer loop.
pub fn log_event(filename: &str, event: &Event) {
    let record = EventRecord::from_event(event);
    if let Err(e) = log_to_csv(filename, &record) {
        eprintln!("Error logging event: {}", e);
    }
}
