use std::path::PathBuf;

use chrono::{DateTime, Duration, NaiveDateTime, Utc};

use crate::store::DatasetKey;

use super::constants::{MINUTES_PER_LINE, UTC_SHIFT_MINUTES};

/// Raw content of one MR90 line
#[derive(Debug, Clone, PartialEq)]
pub struct GaugeRecord {
    pub station: String,
    /// start of the record in MEZ
    pub date: NaiveDateTime,
    /// 60 seesaw values, 3 chars each
    pub wippe: String,
    /// 60 drop counter values, 4 chars each
    pub tropfer: String,
}

impl GaugeRecord {
    /// First minute of the record in UTC
    pub fn start_utc(&self) -> DateTime<Utc> {
        DateTime::from_naive_utc_and_offset(self.date, Utc) - Duration::minutes(UTC_SHIFT_MINUTES)
    }

    /// One timestamp per minute value
    pub fn minute_index(&self) -> Vec<DateTime<Utc>> {
        let start = self.start_utc();
        (0..MINUTES_PER_LINE as i64)
            .map(|m| start + Duration::minutes(m))
            .collect()
    }
}

/// Outcome of an import of a station folder
#[derive(Debug, Clone, Default)]
pub struct ImportReport {
    pub stations: Vec<String>,
    pub failed: Vec<PathBuf>,
    pub datasets: Vec<DatasetKey>,
}
