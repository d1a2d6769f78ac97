use std::io::Write;

use csv::{Writer, WriterBuilder};
use radproc::models::table::SummaryTable;
use radproc::{RadprocError, TimeFrame};

use super::prelude::TableSink;

const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn format_value(value: &f32) -> String {
    if value.is_nan() {
        String::new()
    } else {
        value.to_string()
    }
}

fn csv_error(err: csv::Error) -> RadprocError {
    format!("Cannot write csv: {err}").into()
}

/// Comma separated tables, missing values are empty fields.
/// Several tables are separated by an empty line.
pub struct CsvWriter {
    writer: Writer<Box<dyn Write>>,
    sections: usize,
}

impl CsvWriter {
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self {
            writer: WriterBuilder::new().flexible(true).from_writer(writer),
            sections: 0,
        }
    }

    fn start_section(&mut self) -> Result<(), RadprocError> {
        if self.sections > 0 {
            self.writer.flush()?;
            // csv::Writer has no `get_mut`; take the inner writer out and rebuild.
            let writer = std::mem::replace(&mut self.writer, Writer::from_writer(Box::new(std::io::sink())));
            let mut inner = writer.into_inner().map_err(|err| err.into_error())?;
            inner.write_all(b"\n")?;
            self.writer = WriterBuilder::new().flexible(true).from_writer(inner);
        }
        self.sections += 1;
        Ok(())
    }

    fn write_row<'a, I>(&mut self, label: String, values: I) -> Result<(), RadprocError>
    where
        I: Iterator<Item = &'a f32>,
    {
        let record = std::iter::once(label).chain(values.map(format_value));
        self.writer.write_record(record).map_err(csv_error)
    }
}

impl TableSink for CsvWriter {
    fn write_frame(&mut self, frame: &TimeFrame) -> Result<(), RadprocError> {
        self.start_section()?;
        self.writer
            .write_record(std::iter::once("date").chain(frame.columns().iter().map(String::as_str)))
            .map_err(csv_error)?;
        for (time, row) in frame.index().iter().zip(frame.values().rows()) {
            self.write_row(time.format(DATE_FORMAT).to_string(), row.iter())?;
        }
        Ok(())
    }

    fn write_table(&mut self, table: &SummaryTable) -> Result<(), RadprocError> {
        self.start_section()?;
        self.writer
            .write_record(std::iter::once(table.name()).chain(table.columns().iter().map(String::as_str)))
            .map_err(csv_error)?;
        for (label, row) in table.rows().iter().zip(table.values().rows()) {
            self.write_row(label.clone(), row.iter())?;
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<(), RadprocError> {
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use ndarray::array;
    use std::fs;

    fn written<F>(fun: F) -> String
    where
        F: FnOnce(&mut CsvWriter),
    {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let file = fs::File::create(&path).unwrap();
        let mut writer = CsvWriter::new(Box::new(file));
        fun(&mut writer);
        writer.finish().unwrap();
        drop(writer);
        fs::read_to_string(&path).unwrap()
    }

    #[test]
    fn frames_and_tables() {
        let frame = TimeFrame::new(
            vec![Utc.with_ymd_and_hms(2008, 5, 31, 0, 0, 0).unwrap()],
            vec!["1001".into(), "2002".into()],
            array![[1.5, f32::NAN]],
        )
        .unwrap();
        let table = SummaryTable::new("R", vec![2010], vec!["a".into()], array![[2.0]]).unwrap();

        let content = written(|writer| {
            writer.write_frame(&frame).unwrap();
            writer.write_table(&table).unwrap();
        });
        assert_eq!(
            content,
            "date,1001,2002\n2008-05-31 00:00:00,1.5,\n\nR,a\n2010,2\n"
        );
    }

    #[test]
    fn column_names_with_commas_are_quoted() {
        let frame = TimeFrame::new(
            vec![Utc.with_ymd_and_hms(2008, 5, 31, 0, 0, 0).unwrap()],
            vec!["Berlin, Mitte".into(), "2002".into()],
            array![[1.0, 2.0]],
        )
        .unwrap();

        let content = written(|writer| writer.write_frame(&frame).unwrap());
        assert_eq!(
            content,
            "date,\"Berlin, Mitte\",2002\n2008-05-31 00:00:00,1,2\n"
        );

        let mut reader = csv::Reader::from_reader(content.as_bytes());
        let header = reader.headers().unwrap().clone();
        let row = reader.records().next().unwrap().unwrap();
        assert_eq!(header.len(), 3);
        assert_eq!(row.len(), header.len());
        assert_eq!(&header[1], "Berlin, Mitte");
    }
}
