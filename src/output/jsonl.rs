//! Line-delimited JSON output
//!
//! One JSON object per line, `uid` first, flushed after every record.

use crate::crawler::PendingRecord;
use crate::output::traits::{OutputError, OutputResult, RecordSink};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// [`RecordSink`] writing JSON lines to any writer
pub struct JsonLinesWriter<W: Write> {
    writer: W,
    written: u64,
}

impl JsonLinesWriter<BufWriter<File>> {
    /// Creates (or truncates) the output file
    pub fn create(path: impl AsRef<Path>) -> OutputResult<Self> {
        let file = File::create(path.as_ref())?;
        tracing::info!("Writing records to {}", path.as_ref().display());
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> JsonLinesWriter<W> {
    /// Wraps an existing writer
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            written: 0,
        }
    }

    /// Returns the underlying writer
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> RecordSink for JsonLinesWriter<W> {
    fn write_record(&mut self, record: &PendingRecord) -> OutputResult<()> {
        let line = record.to_json_line().map_err(|source| OutputError::Serialize {
            uid: record.entity_id().to_string(),
            source,
        })?;

        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;

        self.written += 1;
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        self.writer.flush()?;
        Ok(())
    }

    fn records_written(&self) -> u64 {
        self.written
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn test_writes_one_line_per_record() {
        let mut sink = JsonLinesWriter::new(Vec::new());
        sink.write_record(&PendingRecord::new("a").with_field("name", "A"))
            .unwrap();
        sink.write_record(&PendingRecord::new("b").with_field("price", 0))
            .unwrap();
        sink.finish().unwrap();
        assert_eq!(sink.records_written(), 2);

        let bytes = sink.into_inner();
        let text = String::from_utf8(bytes).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(text.ends_with('\n'));

        let first: Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first, json!({"uid": "a", "name": "A"}));
        assert!(lines[1].starts_with(r#"{"uid":"b""#));
    }

    #[test]
    fn test_each_record_is_flushed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.jsonl");

        let mut sink = JsonLinesWriter::create(&path).unwrap();
        sink.write_record(&PendingRecord::new("com.acme")).unwrap();

        // Readable before the sink is finished or dropped
        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "{\"uid\":\"com.acme\"}\n");
    }

    #[test]
    fn test_create_truncates_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.jsonl");
        std::fs::write(&path, "stale\n").unwrap();

        let mut sink = JsonLinesWriter::create(&path).unwrap();
        sink.finish().unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
    }
}
