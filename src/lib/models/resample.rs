use std::collections::HashMap;

use chrono::{DateTime, Datelike, Duration, Months, NaiveDate, Utc};
use ndarray::Array2;
use serde_derive::{Deserialize, Serialize};

use crate::errors::RadprocError;

use super::frame::{accumulate, TimeFrame};

/// Which side of a bin interval is closed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Closed {
    Left,
    Right,
}

/// Which bin edge is used as label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Label {
    Left,
    Right,
}

/// Resampling rule.
///
/// Fixed rules are aligned to multiples of their length since the unix epoch.
/// Calendar rules cover whole months: `months` is the period length and
/// `anchor_month` a month in which a period starts.
/// For calendar rules a right label is the last day of the period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rule {
    Minutes(i64),
    Hours(i64),
    Days(i64),
    Calendar { months: u32, anchor_month: u32 },
}

impl Rule {
    pub fn months() -> Self {
        Rule::Calendar {
            months: 1,
            anchor_month: 1,
        }
    }

    /// Years ending in `month` (12 = calendar years)
    pub fn annual_ending(month: u32) -> Self {
        Rule::Calendar {
            months: 12,
            anchor_month: month % 12 + 1,
        }
    }

    pub fn years() -> Self {
        Rule::annual_ending(12)
    }

    /// Half years, one of them starting in `month`
    pub fn half_years_from(month: u32) -> Self {
        Rule::Calendar {
            months: 6,
            anchor_month: month,
        }
    }

    fn tick_seconds(&self) -> Option<i64> {
        match self {
            Rule::Minutes(n) => Some(n * 60),
            Rule::Hours(n) => Some(n * 3600),
            Rule::Days(n) => Some(n * 86400),
            Rule::Calendar { .. } => None,
        }
    }

    /// Start of the bin containing `time`
    pub fn bin_start(&self, time: &DateTime<Utc>, closed: Closed) -> Result<DateTime<Utc>, RadprocError> {
        match *self {
            Rule::Calendar {
                months,
                anchor_month,
            } => {
                let months = months.max(1) as i64;
                let offset = ((anchor_month.max(1) - 1) as i64).rem_euclid(months);
                let k = time.year() as i64 * 12 + time.month0() as i64;
                let k0 = (k - offset).div_euclid(months) * months + offset;
                let year = k0.div_euclid(12) as i32;
                let month = (k0.rem_euclid(12) + 1) as u32;
                let date = NaiveDate::from_ymd_opt(year, month, 1)
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
                    .ok_or(format!("invalid period start {year}-{month}"))?;
                Ok(DateTime::from_naive_utc_and_offset(date, Utc))
            }
            _ => {
                let period = self.tick_seconds().ok_or("invalid rule")?;
                if period <= 0 {
                    return Err("resampling period must be positive".into());
                }
                let mut ts = time.timestamp();
                if closed == Closed::Right {
                    ts -= 1;
                }
                let start = ts.div_euclid(period) * period;
                DateTime::<Utc>::from_timestamp(start, 0)
                    .ok_or_else(|| format!("timestamp {start} out of range").into())
            }
        }
    }

    pub fn next_bin(&self, start: DateTime<Utc>) -> Result<DateTime<Utc>, RadprocError> {
        match self {
            Rule::Calendar { months, .. } => start
                .checked_add_months(Months::new(*months))
                .ok_or_else(|| format!("cannot advance {start} by {months} months").into()),
            _ => {
                let period = self.tick_seconds().ok_or("invalid rule")?;
                Ok(start + Duration::seconds(period))
            }
        }
    }

    pub fn label(&self, start: DateTime<Utc>, label: Label) -> Result<DateTime<Utc>, RadprocError> {
        match (self, label) {
            (_, Label::Left) => Ok(start),
            (Rule::Calendar { .. }, Label::Right) => {
                Ok(self.next_bin(start)? - Duration::days(1))
            }
            (_, Label::Right) => self.next_bin(start),
        }
    }
}

impl TimeFrame {
    /// Downsamples the frame by summing all values of every bin.
    /// Bins without any value are NaN, the output covers every bin between
    /// the first and the last occupied one.
    pub fn resample(&self, rule: Rule, closed: Closed, label: Label) -> Result<TimeFrame, RadprocError> {
        if self.is_empty() {
            return Ok(TimeFrame::empty(self.columns().to_vec()));
        }

        let starts = self
            .index()
            .iter()
            .map(|t| rule.bin_start(t, closed))
            .collect::<Result<Vec<_>, _>>()?;

        let first = *starts.iter().min().ok_or("empty index")?;
        let last = *starts.iter().max().ok_or("empty index")?;

        let mut bins = vec![first];
        let mut current = first;
        while current < last {
            current = rule.next_bin(current)?;
            bins.push(current);
        }
        let positions: HashMap<DateTime<Utc>, usize> =
            bins.iter().enumerate().map(|(i, b)| (*b, i)).collect();

        let source = self.values();
        let mut values = Array2::from_elem((bins.len(), self.ncols()), f32::NAN);
        for (row, start) in starts.iter().enumerate() {
            let target = *positions
                .get(start)
                .ok_or_else(|| format!("bin {start} is not aligned to {rule:?}"))?;
            for (col, value) in source.row(row).iter().enumerate() {
                accumulate(&mut values[[target, col]], *value);
            }
        }

        let index = bins
            .into_iter()
            .map(|b| rule.label(b, label))
            .collect::<Result<Vec<_>, _>>()?;

        TimeFrame::new(index, self.columns().to_vec(), values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use ndarray::array;

    fn ts(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    #[test]
    fn five_minute_sums_closed_left() {
        let index: Vec<_> = (0..10).map(|m| ts(2008, 5, 1, 0, 50 + m)).collect();
        let values = Array2::from_shape_vec((10, 1), (0..10).map(|v| v as f32).collect()).unwrap();
        let frame = TimeFrame::new(index, vec!["a".into()], values).unwrap();

        let out = frame
            .resample(Rule::Minutes(5), Closed::Left, Label::Left)
            .unwrap();
        assert_eq!(out.index(), &[ts(2008, 5, 1, 0, 50), ts(2008, 5, 1, 0, 55)]);
        assert_eq!(out.values()[[0, 0]], 0.0 + 1.0 + 2.0 + 3.0 + 4.0);
        assert_eq!(out.values()[[1, 0]], 5.0 + 6.0 + 7.0 + 8.0 + 9.0);
    }

    #[test]
    fn hourly_sums_closed_right_label_right() {
        let frame = TimeFrame::new(
            vec![ts(2008, 5, 1, 0, 0), ts(2008, 5, 1, 0, 5), ts(2008, 5, 1, 1, 0)],
            vec!["a".into()],
            array![[1.0], [2.0], [4.0]],
        )
        .unwrap();
        let out = frame
            .resample(Rule::Hours(1), Closed::Right, Label::Right)
            .unwrap();
        // 00:00 belongs to (23:00, 00:00], 00:05 and 01:00 to (00:00, 01:00]
        assert_eq!(out.index(), &[ts(2008, 5, 1, 0, 0), ts(2008, 5, 1, 1, 0)]);
        assert_eq!(out.values()[[0, 0]], 1.0);
        assert_eq!(out.values()[[1, 0]], 6.0);
    }

    #[test]
    fn empty_bins_are_missing() {
        let frame = TimeFrame::new(
            vec![ts(2008, 5, 1, 0, 0), ts(2008, 5, 1, 0, 15)],
            vec!["a".into()],
            array![[1.0], [f32::NAN]],
        )
        .unwrap();
        let out = frame
            .resample(Rule::Minutes(5), Closed::Left, Label::Left)
            .unwrap();
        assert_eq!(out.nrows(), 4);
        assert_eq!(out.values()[[0, 0]], 1.0);
        assert!(out.values()[[1, 0]].is_nan());
        assert!(out.values()[[3, 0]].is_nan());
    }

    #[test]
    fn monthly_labels_are_month_ends() {
        let frame = TimeFrame::new(
            vec![ts(2008, 1, 1, 0, 0), ts(2008, 1, 31, 23, 55), ts(2008, 2, 10, 0, 0)],
            vec!["a".into()],
            array![[1.0], [2.0], [3.0]],
        )
        .unwrap();
        let out = frame
            .resample(Rule::months(), Closed::Right, Label::Right)
            .unwrap();
        assert_eq!(out.index(), &[ts(2008, 1, 31, 0, 0), ts(2008, 2, 29, 0, 0)]);
        assert_eq!(out.values()[[0, 0]], 3.0);
        assert_eq!(out.values()[[1, 0]], 3.0);
    }

    #[test]
    fn annual_periods_ending_in_october() {
        let rule = Rule::annual_ending(10);
        let start = rule
            .bin_start(&ts(2010, 3, 5, 0, 0), Closed::Right)
            .unwrap();
        assert_eq!(start, ts(2009, 11, 1, 0, 0));
        assert_eq!(
            rule.label(start, Label::Right).unwrap(),
            ts(2010, 10, 31, 0, 0)
        );
        let start = rule
            .bin_start(&ts(2010, 11, 5, 0, 0), Closed::Right)
            .unwrap();
        assert_eq!(start, ts(2010, 11, 1, 0, 0));
    }

    #[test]
    fn half_years_from_may() {
        let rule = Rule::half_years_from(5);
        let summer = rule.bin_start(&ts(2010, 10, 31, 0, 0), Closed::Left).unwrap();
        let winter = rule.bin_start(&ts(2011, 2, 28, 0, 0), Closed::Left).unwrap();
        assert_eq!(summer, ts(2010, 5, 1, 0, 0));
        assert_eq!(winter, ts(2010, 11, 1, 0, 0));
    }
}
