use std::collections::HashMap;

use chrono::Utc;
use log::{debug, info};
use ndarray::{Array2, Axis};

use crate::errors::RadprocError;
use crate::models::frame::TimeFrame;
use crate::models::resample::{Closed, Label, Rule};
use crate::models::table::SummaryTable;
use crate::modules::aggregation::functions::{load_month, normalize_year_end};
use crate::store::FrameStore;

use super::constants::*;
use super::models::{ClassInterval, ClassSums, Classification, ClassificationOptions};

/// Index of the depth class of `value` [mm] in `CLASS_LABELS`
pub fn depth_class(value: f32) -> usize {
    if value.is_nan() {
        NAN_CLASS
    } else if value == 0.0 {
        ZERO_CLASS
    } else {
        CLASS_UPPER_BOUNDS
            .iter()
            .position(|bound| value < *bound)
            .map(|idx| idx + 1)
            .unwrap_or(MAX_CLASS)
    }
}

/// Classifies every interval of `frame` and sums depth and duration per
/// class and column
pub fn classify_frame(frame: &TimeFrame, interval: ClassInterval) -> Result<ClassSums, RadprocError> {
    let hourly;
    let frame = match (interval, frame.freq_minutes()) {
        (ClassInterval::Hours, Some(freq)) if freq < 60 => {
            hourly = frame.resample(Rule::Hours(1), Closed::Left, Label::Left)?;
            &hourly
        }
        _ => frame,
    };

    let mut sums = ClassSums::zeros(frame.ncols());
    for row in frame.values().rows() {
        for (col, value) in row.iter().enumerate() {
            let class = depth_class(*value);
            sums.duration[[class, col]] += 1.0;
            if !value.is_nan() {
                sums.depth[[class, col]] += *value;
            }
        }
    }
    Ok(sums)
}

fn is_dropped(class: usize, dropna: bool) -> bool {
    dropna && (class == ZERO_CLASS || class == NAN_CLASS)
}

fn to_percentage(values: &mut [f32]) {
    let total: f32 = values.iter().filter(|v| !v.is_nan()).sum();
    values.iter_mut().for_each(|v| *v = *v / total * 100.0);
}

/// Depth and duration of every class summed over all columns.
/// Dropped classes are NaN.
pub fn summarize_columns(sums: &ClassSums, dropna: bool, percentage: bool) -> (Vec<f32>, Vec<f32>) {
    let summarize = |values: &Array2<f32>| {
        let mut totals: Vec<f32> = values
            .sum_axis(Axis(1))
            .iter()
            .enumerate()
            .map(|(class, v)| if is_dropped(class, dropna) { f32::NAN } else { *v })
            .collect();
        if percentage {
            to_percentage(&mut totals);
        }
        totals
    };
    (summarize(&sums.depth), summarize(&sums.duration))
}

/// Per column values with the dropped classes set to NaN, as shares of the
/// column total if `percentage` is set
fn column_shares(values: &Array2<f32>, dropna: bool, percentage: bool) -> Array2<f32> {
    let mut shares = values.clone();
    for (class, mut row) in shares.axis_iter_mut(Axis(0)).enumerate() {
        if is_dropped(class, dropna) {
            row.fill(f32::NAN);
        }
    }
    if percentage {
        for mut column in shares.axis_iter_mut(Axis(1)) {
            let total: f32 = column.iter().filter(|v| !v.is_nan()).sum();
            column.mapv_inplace(|v| v / total * 100.0);
        }
    }
    shares
}

/// Class sums per column over several months, columns are matched by name
#[derive(Debug, Default)]
struct SpatialSums {
    columns: Vec<String>,
    positions: HashMap<String, usize>,
    depth: Vec<[f32; CLASS_COUNT]>,
    duration: Vec<[f32; CLASS_COUNT]>,
}

impl SpatialSums {
    fn position(&mut self, name: &str) -> usize {
        if let Some(position) = self.positions.get(name) {
            return *position;
        }
        let position = self.columns.len();
        self.columns.push(name.to_string());
        self.positions.insert(name.to_string(), position);
        self.depth.push([0.0; CLASS_COUNT]);
        self.duration.push([0.0; CLASS_COUNT]);
        position
    }

    /// Missing values do not change the sums
    fn add(&mut self, columns: &[String], depth: &Array2<f32>, duration: &Array2<f32>) {
        for (col, name) in columns.iter().enumerate() {
            let target = self.position(name);
            for class in 0..CLASS_COUNT {
                let value = depth[[class, col]];
                if !value.is_nan() {
                    self.depth[target][class] += value;
                }
                let value = duration[[class, col]];
                if !value.is_nan() {
                    self.duration[target][class] += value;
                }
            }
        }
    }

    fn into_tables(self) -> Result<(SummaryTable, SummaryTable), RadprocError> {
        let to_array = |sums: &[[f32; CLASS_COUNT]]| {
            Array2::from_shape_fn((CLASS_COUNT, sums.len()), |(class, col)| sums[col][class])
        };
        Ok((
            SummaryTable::new(
                "spatial_depth",
                CLASS_LABELS,
                self.columns.clone(),
                to_array(&self.depth),
            )?,
            SummaryTable::new(
                "spatial_duration",
                CLASS_LABELS,
                self.columns,
                to_array(&self.duration),
            )?,
        ))
    }
}

fn temporal_table(name: &str, periods: &[String], values: Vec<f32>) -> Result<SummaryTable, RadprocError> {
    let columns: Vec<String> = CLASS_LABELS.iter().map(|c| c.to_string()).collect();
    let values = Array2::from_shape_vec((periods.len(), CLASS_COUNT), values)
        .map_err(|err| format!("invalid shape of {name}: {err}"))?;
    SummaryTable::new(name, periods.iter(), columns, values)
}

/// Classifies the intervals of `months` in the years `year_start..=year_end`
/// by precipitation depth.
/// Returns depth and duration per class as spatial tables (class by column,
/// summed over all months) and temporal tables (month by class, summed over
/// all columns).
pub fn classification(
    store: &dyn FrameStore,
    year_start: i32,
    year_end: i32,
    months: &[u32],
    options: &ClassificationOptions,
) -> Result<Classification, RadprocError> {
    let start = Utc::now();
    let year_end = normalize_year_end(year_start, year_end);
    if months.is_empty() {
        return Err("no months to classify".into());
    }
    if let Some(month) = months.iter().find(|m| !(1..=12).contains(*m)) {
        return Err(format!("invalid month {month}").into());
    }

    let mut spatial = SpatialSums::default();
    let mut periods = Vec::new();
    let mut temporal_depth = Vec::new();
    let mut temporal_duration = Vec::new();

    for year in year_start..=year_end {
        for month in months {
            let mut frame = load_month(store, year, *month)?;
            if !options.selection.is_empty() {
                frame = frame.select_columns(&options.selection)?;
            }

            let sums = classify_frame(&frame, options.interval)?;
            let (depth, duration) = summarize_columns(&sums, options.dropna, options.percentage);
            periods.push(format!("{year}-{month:02}"));
            temporal_depth.extend(depth);
            temporal_duration.extend(duration);

            spatial.add(
                frame.columns(),
                &column_shares(&sums.depth, options.dropna, options.percentage),
                &column_shares(&sums.duration, options.dropna, options.percentage),
            );
            debug!("[CLASSIFICATION] {year}/{month} done");
        }
    }

    let (spatial_depth, spatial_duration) = spatial.into_tables()?;
    let classification = Classification {
        spatial_depth,
        spatial_duration,
        temporal_depth: temporal_table("temporal_depth", &periods, temporal_depth)?,
        temporal_duration: temporal_table("temporal_duration", &periods, temporal_duration)?,
    };
    info!(
        "Classified {} months ({}) in {} seconds",
        periods.len(),
        options.interval,
        Utc::now() - start
    );
    Ok(classification)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{DatasetKey, MemoryStore};
    use chrono::{DateTime, Duration, TimeZone};
    use ndarray::array;

    fn hourly(year: i32, month: u32, columns: &[&str], values: Array2<f32>) -> TimeFrame {
        let start = Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0).unwrap();
        let index: Vec<DateTime<Utc>> = (0..values.nrows() as i64)
            .map(|h| start + Duration::hours(h))
            .collect();
        TimeFrame::new(index, columns.iter().map(|c| c.to_string()).collect(), values).unwrap()
    }

    fn store() -> MemoryStore {
        let mut store = MemoryStore::new();
        store
            .put(
                &DatasetKey::month(2010, 5),
                &hourly(2010, 5, &["a", "b"], array![[0.5, 0.0], [12.0, f32::NAN]]),
            )
            .unwrap();
        store
            .put(
                &DatasetKey::month(2010, 6),
                &hourly(2010, 6, &["a", "c"], array![[0.5, 1.0], [12.0, 1.0]]),
            )
            .unwrap();
        store
    }

    fn absolute() -> ClassificationOptions {
        ClassificationOptions {
            dropna: false,
            percentage: false,
            ..Default::default()
        }
    }

    #[test]
    fn class_bounds() {
        assert_eq!(depth_class(0.0), ZERO_CLASS);
        assert_eq!(depth_class(f32::NAN), NAN_CLASS);
        assert_eq!(CLASS_LABELS[depth_class(0.5)], "0.01 - 0.99");
        assert_eq!(CLASS_LABELS[depth_class(1.0)], "1.00 - 1.99");
        assert_eq!(CLASS_LABELS[depth_class(9.99)], "9.00 - 9.99");
        assert_eq!(CLASS_LABELS[depth_class(10.0)], "10.00 - 14.99");
        assert_eq!(CLASS_LABELS[depth_class(15.0)], "15.00 - 19.99");
        assert_eq!(CLASS_LABELS[depth_class(39.9)], "20.00 - 39.99");
        assert_eq!(CLASS_LABELS[depth_class(40.0)], ">= 40");
        assert_eq!(depth_class(100.0), MAX_CLASS);
    }

    #[test]
    fn five_minute_data_is_classified_hourly() {
        let start = Utc.with_ymd_and_hms(2010, 5, 1, 0, 0, 0).unwrap();
        let index: Vec<DateTime<Utc>> = (0..24).map(|i| start + Duration::minutes(5 * i)).collect();
        let values = Array2::from_shape_fn((24, 2), |(row, col)| match (row, col) {
            (_, 1) => f32::NAN,
            (row, _) if row < 12 => 0.5,
            _ => 0.0,
        });
        let frame = TimeFrame::new(index, vec!["a".into(), "b".into()], values).unwrap();

        let sums = classify_frame(&frame, ClassInterval::Hours).unwrap();
        assert_eq!(CLASS_LABELS[7], "6.00 - 6.99");
        assert_eq!(sums.depth[[7, 0]], 6.0);
        assert_eq!(sums.duration[[7, 0]], 1.0);
        assert_eq!(sums.duration[[ZERO_CLASS, 0]], 1.0);
        assert_eq!(sums.duration[[NAN_CLASS, 1]], 2.0);
        assert_eq!(sums.depth[[NAN_CLASS, 1]], 0.0);

        let sums = classify_frame(&frame, ClassInterval::FiveMinutes).unwrap();
        assert_eq!(sums.duration[[1, 0]], 12.0);
        assert_eq!(sums.duration[[ZERO_CLASS, 0]], 12.0);
        assert_eq!(sums.duration[[NAN_CLASS, 1]], 24.0);
    }

    #[test]
    fn summarize_drops_zero_and_missing() {
        let frame = hourly(2010, 5, &["a", "b"], array![[0.5, 0.0], [12.0, f32::NAN]]);
        let sums = classify_frame(&frame, ClassInterval::Hours).unwrap();

        let (depth, duration) = summarize_columns(&sums, false, false);
        assert_eq!(duration[ZERO_CLASS], 1.0);
        assert_eq!(duration[NAN_CLASS], 1.0);
        assert_eq!(depth[11], 12.0);

        let (depth, duration) = summarize_columns(&sums, true, true);
        assert!(duration[ZERO_CLASS].is_nan());
        assert!(duration[NAN_CLASS].is_nan());
        assert_eq!(duration[1], 50.0);
        assert_eq!(duration[11], 50.0);
        assert!((depth[11] - 12.0 / 12.5 * 100.0).abs() < 1e-4);
    }

    #[test]
    fn absolute_classification_over_months() {
        let result = classification(&store(), 2010, 2010, &[5, 6], &absolute()).unwrap();

        let spatial = &result.spatial_depth;
        assert_eq!(spatial.rows().len(), CLASS_COUNT);
        assert_eq!(spatial.columns(), &["a", "b", "c"]);
        assert_eq!(spatial.get("0.01 - 0.99", "a"), Some(1.0));
        assert_eq!(spatial.get("10.00 - 14.99", "a"), Some(24.0));

        let duration = &result.spatial_duration;
        assert_eq!(duration.get("NaN", "b"), Some(1.0));
        assert_eq!(duration.get("1.00 - 1.99", "c"), Some(2.0));
        assert_eq!(duration.get("0", "c"), Some(0.0));

        let temporal = &result.temporal_duration;
        assert_eq!(temporal.rows(), &["2010-05", "2010-06"]);
        assert_eq!(temporal.get("2010-05", "NaN"), Some(1.0));
        assert_eq!(temporal.get("2010-06", "1.00 - 1.99"), Some(2.0));
        assert_eq!(result.temporal_depth.get("2010-06", "10.00 - 14.99"), Some(12.0));
    }

    #[test]
    fn percentages_without_zero_and_missing() {
        let result = classification(
            &store(),
            2010,
            0,
            &[5],
            &ClassificationOptions::default(),
        )
        .unwrap();

        let temporal = &result.temporal_duration;
        assert!(temporal.get("2010-05", "0").unwrap().is_nan());
        assert_eq!(temporal.get("2010-05", "0.01 - 0.99"), Some(50.0));

        let spatial = &result.spatial_duration;
        assert_eq!(spatial.get("0.01 - 0.99", "a"), Some(50.0));
        assert_eq!(spatial.get("0", "a"), Some(0.0));
        // nothing left in b after dropping, its shares are undefined
        assert_eq!(spatial.get("NaN", "b"), Some(0.0));
    }

    #[test]
    fn column_selection() {
        let options = ClassificationOptions {
            selection: vec!["a".into()],
            ..absolute()
        };
        let result = classification(&store(), 2010, 2010, &[5, 6], &options).unwrap();
        assert_eq!(result.spatial_depth.columns(), &["a"]);
        assert_eq!(result.temporal_duration.get("2010-05", "NaN"), Some(0.0));

        let options = ClassificationOptions {
            selection: vec!["x".into()],
            ..absolute()
        };
        assert!(classification(&store(), 2010, 2010, &[5], &options).is_err());
    }

    #[test]
    fn invalid_months() {
        assert!(classification(&store(), 2010, 2010, &[], &absolute()).is_err());
        assert!(classification(&store(), 2010, 2010, &[13], &absolute()).is_err());
    }
}
