use crate::prelude::Result;
use serde::Serialize;
use std::io::Write;

/// How records are written to stdout.
///
/// * `Json`: one compact JSON object per line.
/// * `Pretty`: indented JSON objects separated by newlines.
///
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Format {
    #[default]
    Json,
    Pretty,
}

/// Writes `records` in input order.
///
pub fn write_records<T, W>(writer: &mut W, format: Format, records: &[T]) -> Result<()>
where
    T: Serialize,
    W: Write,
{
    for record in records {
        match format {
            Format::Json => serde_json::to_writer(&mut *writer, record)?,
            Format::Pretty => serde_json::to_writer_pretty(&mut *writer, record)?,
        }
        writeln!(writer)?;
    }
    writer.flush()?;
    Ok(())
}
