//! Output sinks for kept records.
//!
//! The pipeline appends each kept record as its terminal per-record step.
//! [`JsonlSink`] flushes after every record so an aborted run leaves a
//! stream that is valid and truncatable at a record boundary.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::core::errors::{Result, ShardsmithError};
use crate::core::records::KeptRecord;

/// Destination for kept records, appended in processing order.
pub trait RecordSink {
    /// Append one kept record.
    fn append(&mut self, record: &KeptRecord) -> Result<()>;
}

/// JSON-lines sink over any writer.
#[derive(Debug)]
pub struct JsonlSink<W: Write> {
    writer: W,
}

impl JsonlSink<BufWriter<File>> {
    /// Create a sink writing to a new file at `path`.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| {
            ShardsmithError::io(format!("Failed to create output file: {}", path.display()), e)
        })?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> JsonlSink<W> {
    /// Wrap an existing writer.
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Unwrap the inner writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> RecordSink for JsonlSink<W> {
    fn append(&mut self, record: &KeptRecord) -> Result<()> {
        serde_json::to_writer(&mut self.writer, record)?;
        self.writer
            .write_all(b"\n")
            .and_then(|()| self.writer.flush())
            .map_err(|e| ShardsmithError::io("Failed to append kept record", e))
    }
}

/// In-memory sink, for tests and library embedding.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Vec<KeptRecord>,
}

impl MemorySink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records appended so far, in processing order.
    pub fn records(&self) -> &[KeptRecord] {
        &self.records
    }

    /// Consume the sink, yielding the appended records.
    pub fn into_records(self) -> Vec<KeptRecord> {
        self.records
    }
}

impl RecordSink for MemorySink {
    fn append(&mut self, record: &KeptRecord) -> Result<()> {
        self.records.push(record.clone());
        Ok(())
    }
}
