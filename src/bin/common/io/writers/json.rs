use std::io::Write;

use radproc::models::table::SummaryTable;
use radproc::{RadprocError, TimeFrame};
use serde_json::json;

use super::prelude::TableSink;

/// One JSON document per line and table, missing values are null
pub struct JsonWriter {
    writer: Box<dyn Write>,
}

impl JsonWriter {
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self { writer }
    }

    fn write_line(&mut self, value: &serde_json::Value) -> Result<(), RadprocError> {
        serde_json::to_writer(&mut self.writer, value)
            .map_err(|err| format!("Cannot write json: {err}"))?;
        writeln!(self.writer)?;
        Ok(())
    }
}

impl TableSink for JsonWriter {
    fn write_frame(&mut self, frame: &TimeFrame) -> Result<(), RadprocError> {
        let index: Vec<String> = frame.index().iter().map(|t| t.to_rfc3339()).collect();
        let values: Vec<Vec<f32>> = frame
            .values()
            .rows()
            .into_iter()
            .map(|row| row.to_vec())
            .collect();
        self.write_line(&json!({
            "index": index,
            "columns": frame.columns(),
            "values": values,
        }))
    }

    fn write_table(&mut self, table: &SummaryTable) -> Result<(), RadprocError> {
        let value =
            serde_json::to_value(table).map_err(|err| format!("Cannot serialize table: {err}"))?;
        self.write_line(&value)
    }

    fn finish(&mut self) -> Result<(), RadprocError> {
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use std::fs;

    #[test]
    fn tables_as_json_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        let mut writer = JsonWriter::new(Box::new(fs::File::create(&path).unwrap()));

        let r = SummaryTable::new("R", vec![1], vec!["a".into()], array![[f32::NAN]]).unwrap();
        let n = SummaryTable::new("N", vec![1], vec!["a".into()], array![[2.0]]).unwrap();
        writer.write_table(&r).unwrap();
        writer.write_table(&n).unwrap();
        writer.finish().unwrap();

        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<serde_json::Value> = content
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0]["values"][0][0].is_null());
        assert_eq!(lines[1]["name"], "N");
    }
}
