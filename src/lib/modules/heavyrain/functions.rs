use chrono::Utc;
use log::{debug, info};

use crate::errors::RadprocError;
use crate::models::frame::TimeFrame;
use crate::models::resample::{Closed, Label};
use crate::modules::aggregation::functions::{load_month, normalize_year_end};
use crate::store::FrameStore;

use super::models::Season;

/// true if more than `min_area` values reach `threshold`
fn is_exceeding(row: &[f32], threshold: f32, min_area: usize) -> bool {
    row.iter().filter(|v| **v >= threshold).count() > min_area
}

/// All intervals of the season months in which more than `min_area` cells
/// reach `threshold` [mm]
pub fn find_heavy_rainfalls(
    store: &dyn FrameStore,
    year_start: i32,
    year_end: i32,
    threshold: f32,
    min_area: usize,
    season: &Season,
) -> Result<TimeFrame, RadprocError> {
    let start = Utc::now();
    let year_end = normalize_year_end(year_start, year_end);

    let mut found = Vec::new();
    for year in year_start..=year_end {
        for month in season.months() {
            let frame = load_month(store, year, month)?;
            let mask: Vec<bool> = frame
                .values()
                .rows()
                .into_iter()
                .map(|row| match row.as_slice() {
                    Some(row) => is_exceeding(row, threshold, min_area),
                    None => is_exceeding(&row.to_vec(), threshold, min_area),
                })
                .collect();
            let heavy = frame.select_rows(&mask);
            debug!("[HEAVYRAIN] {year}/{month}: {} intervals", heavy.nrows());
            found.push(heavy);
        }
    }

    let found = TimeFrame::concat_rows(&found)?;
    info!(
        "Found {} heavy rain intervals ({}) in {} seconds",
        found.nrows(),
        season,
        Utc::now() - start
    );
    Ok(found)
}

/// Number of intervals per cell reaching `threshold` within the heavy rain
/// intervals, counted per season period. Periods without heavy rain are
/// dropped.
pub fn count_heavy_rainfall_intervals(
    store: &dyn FrameStore,
    year_start: i32,
    year_end: i32,
    threshold: f32,
    min_area: usize,
    season: &Season,
) -> Result<TimeFrame, RadprocError> {
    let found = find_heavy_rainfalls(store, year_start, year_end, threshold, min_area, season)?;
    let marks = found.map_values(|v| if v >= threshold { 1.0 } else { 0.0 });
    let counts = marks.resample(season.rule(), Closed::Right, Label::Right)?;

    let occupied: Vec<bool> = counts
        .values()
        .rows()
        .into_iter()
        .map(|row| row.iter().all(|v| !v.is_nan()))
        .collect();
    Ok(counts.select_rows(&occupied))
}
