//! Writers for extracted records.
//!
//! Records are written either as NDJSON (one record per line, the format used
//! for replay output) or as a single JSON array.

use serde::Serialize;
use std::io::Write;
use std::str::FromStr;

pub use crate::error::SerializationError;

/// Output layout for record streams
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordFormat {
    #[default]
    Ndjson,
    JsonArray,
}

impl FromStr for RecordFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ndjson" | "jsonl" => Ok(RecordFormat::Ndjson),
            "json" | "array" => Ok(RecordFormat::JsonArray),
            other => Err(format!("Unsupported record format: '{}'. Supported formats: ndjson, json", other)),
        }
    }
}

/// Write `items` to `writer` in the given layout.
pub fn write_records<W: Write, T: Serialize>(
    writer: W,
    format: RecordFormat,
    items: &[T],
) -> Result<(), SerializationError> {
    match format {
        RecordFormat::Ndjson => {
            let mut out = NdjsonWriter::new(writer);
            out.write_all(items)?;
            out.flush()
        }
        RecordFormat::JsonArray => {
            let mut out = JsonArrayWriter::new(writer)?;
            for item in items {
                out.write(item)?;
            }
            out.finish()
        }
    }
}

/// NDJSON (Newline Delimited JSON) writer
pub struct NdjsonWriter<W: Write> {
    writer: W,
}

impl<W: Write> NdjsonWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Write a single record as an NDJSON line
    pub fn write<T: Serialize>(&mut self, record: &T) -> Result<(), SerializationError> {
        let json = serde_json::to_string(record)?;
        writeln!(self.writer, "{}", json)?;
        Ok(())
    }

    pub fn write_all<T: Serialize>(&mut self, records: &[T]) -> Result<(), SerializationError> {
        for record in records {
            self.write(record)?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<(), SerializationError> {
        self.writer.flush()?;
        Ok(())
    }
}

/// JSON array writer
pub struct JsonArrayWriter<W: Write> {
    writer: W,
    first: bool,
}

impl<W: Write> JsonArrayWriter<W> {
    /// Create a new JSON array writer and write the opening bracket
    pub fn new(mut writer: W) -> Result<Self, SerializationError> {
        write!(writer, "[")?;
        Ok(Self {
            writer,
            first: true,
        })
    }

    pub fn write<T: Serialize>(&mut self, record: &T) -> Result<(), SerializationError> {
        if !self.first {
            write!(self.writer, ",")?;
        }
        self.first = false;

        let json = serde_json::to_string(record)?;
        write!(self.writer, "{}", json)?;
        Ok(())
    }

    /// Finish writing the array and close the bracket
    pub fn finish(mut self) -> Result<(), SerializationError> {
        write!(self.writer, "]")?;
        self.writer.flush()?;
        Ok(())
    }
}
