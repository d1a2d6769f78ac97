use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use radproc::models::table::SummaryTable;
use radproc::{RadprocError, TimeFrame};

use super::{csv::CsvWriter, json::JsonWriter};

/// Trait implemented by the result writers (CSV, JSON)
pub trait TableSink {
    fn write_frame(&mut self, frame: &TimeFrame) -> Result<(), RadprocError>;

    fn write_table(&mut self, table: &SummaryTable) -> Result<(), RadprocError>;

    fn finish(&mut self) -> Result<(), RadprocError>;
}

/// Writer chosen from the file extension, CSV on standard output without a path
pub fn get_sink(path: Option<&Path>) -> Result<Box<dyn TableSink>, RadprocError> {
    let Some(path) = path else {
        return Ok(Box::new(CsvWriter::new(Box::new(io::stdout()))));
    };

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    let open = |path: &Path| -> Result<Box<dyn Write>, RadprocError> {
        let file = File::create(path)
            .map_err(|err| format!("Cannot create output file {}: {}", path.display(), err))?;
        Ok(Box::new(BufWriter::new(file)))
    };

    match extension.as_str() {
        "csv" | "txt" => Ok(Box::new(CsvWriter::new(open(path)?))),
        "json" => Ok(Box::new(JsonWriter::new(open(path)?))),
        _ => Err(format!("Unsupported output format: {}", path.display()).into()),
    }
}
