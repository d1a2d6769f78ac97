use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};
use log::{info, trace, warn};

use crate::errors::RadprocError;
use crate::models::frame::TimeFrame;
use crate::models::resample::{Closed, Label, Rule};
use crate::store::{DatasetKey, FrameStore};

use super::models::Aggregation;

/// A missing or earlier end year means a single year
pub fn normalize_year_end(year_start: i32, year_end: i32) -> i32 {
    if year_end == 0 || year_end < year_start {
        if year_end != 0 {
            warn!("year_end {year_end} before year_start {year_start}, set to {year_start}");
        }
        year_start
    } else {
        year_end
    }
}

pub fn load_month(store: &dyn FrameStore, year: i32, month: u32) -> Result<TimeFrame, RadprocError> {
    let key = DatasetKey::month(year, month);
    store
        .get(&key)
        .map_err(|err| format!("cannot load dataset {key}: {err}").into())
}

/// Months of one year, concatenated in the given order
pub fn load_months(store: &dyn FrameStore, year: i32, months: &[u32]) -> Result<TimeFrame, RadprocError> {
    let frames = months
        .iter()
        .map(|month| load_month(store, year, *month))
        .collect::<Result<Vec<_>, _>>()?;
    TimeFrame::concat_rows(&frames)
}

/// Loads all months of the years `year_start..=year_end` and sums them to
/// the `freq` time step.
/// Every month is resampled on its own first, so only one month of raw
/// data is held at a time.
pub fn load_years_and_resample(
    store: &dyn FrameStore,
    year_start: i32,
    year_end: i32,
    freq: Aggregation,
) -> Result<TimeFrame, RadprocError> {
    let start = Utc::now();
    let year_end = normalize_year_end(year_start, year_end);
    let target = freq.rule();
    let monthly = freq.monthly_rule();

    let mut years = Vec::new();
    for year in year_start..=year_end {
        let mut months = Vec::with_capacity(12);
        for month in 1..=12 {
            let frame = load_month(store, year, month)?;
            months.push(frame.resample(monthly, Closed::Right, Label::Right)?);
        }
        // bins crossing a month border are merged here
        let frame = TimeFrame::concat_rows(&months)?.resample(target, Closed::Right, Label::Right)?;
        trace!("[AGGREGATION] year {year} resampled to {freq}");
        years.push(frame);
    }

    let mut frame = TimeFrame::concat_rows(&years)?
        .drop_duplicate_index()
        .resample(target, Closed::Right, Label::Right)?;

    // daily labels are the end of the day, move them to the day itself
    if freq == Aggregation::Days && frame.index().first().map(|t| t.day()) == Some(2) {
        frame.shift_index(Duration::days(-1));
    }

    info!(
        "Loaded {}-{} as {} ({} rows) in {} seconds",
        year_start,
        year_end,
        freq,
        frame.nrows(),
        Utc::now() - start
    );
    Ok(frame)
}

pub fn hdf5_to_years(store: &dyn FrameStore, year_start: i32, year_end: i32) -> Result<TimeFrame, RadprocError> {
    load_years_and_resample(store, year_start, year_end, Aggregation::Years)
}

pub fn hdf5_to_months(store: &dyn FrameStore, year_start: i32, year_end: i32) -> Result<TimeFrame, RadprocError> {
    load_years_and_resample(store, year_start, year_end, Aggregation::Months)
}

pub fn hdf5_to_days(store: &dyn FrameStore, year_start: i32, year_end: i32) -> Result<TimeFrame, RadprocError> {
    load_years_and_resample(store, year_start, year_end, Aggregation::Days)
}

pub fn hdf5_to_hours(store: &dyn FrameStore, year_start: i32, year_end: i32) -> Result<TimeFrame, RadprocError> {
    load_years_and_resample(store, year_start, year_end, Aggregation::Hours)
}

fn utc_date(year: i32, month: u32, day: u32) -> Result<DateTime<Utc>, RadprocError> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0)
        .single()
        .ok_or_else(|| format!("invalid date {year}-{month}-{day}").into())
}

/// Precipitation of the hydrological half years from May of `year_start`
/// to October of `year_end`.
/// Rows are labelled with the season start: May 1 for summer, November 1
/// for winter.
pub fn hydrological_seasons(store: &dyn FrameStore, year_start: i32, year_end: i32) -> Result<TimeFrame, RadprocError> {
    let year_end = normalize_year_end(year_start, year_end);
    let months = hdf5_to_months(store, year_start, year_end)?;

    let first = utc_date(year_start, 5, 1)?;
    let last = utc_date(year_end, 11, 1)? - Duration::seconds(1);
    months
        .truncate(first, last)
        .resample(Rule::half_years_from(5), Closed::Left, Label::Left)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use ndarray::Array2;

    /// Three five minute intervals of 1 mm at the start of every month
    fn store(years: &[i32]) -> MemoryStore {
        let mut store = MemoryStore::new();
        for &year in years {
            for month in 1..=12 {
                let index: Vec<DateTime<Utc>> = [5, 10, 15]
                    .iter()
                    .map(|m| Utc.with_ymd_and_hms(year, month, 1, 0, *m, 0).unwrap())
                    .collect();
                let frame = TimeFrame::new(
                    index,
                    vec!["a".into(), "b".into()],
                    Array2::from_elem((3, 2), 1.0),
                )
                .unwrap();
                store.put(&DatasetKey::month(year, month), &frame).unwrap();
            }
        }
        store
    }

    #[test]
    fn load_months_in_order() {
        let store = store(&[2008]);
        let frame = load_months(&store, 2008, &[5, 6]).unwrap();
        assert_eq!(frame.nrows(), 6);
        assert_eq!(frame.index()[3].month(), 6);
        assert!(load_month(&store, 2009, 1).is_err());
    }

    #[test]
    fn years_and_months() {
        let store = store(&[2008, 2009]);

        let years = hdf5_to_years(&store, 2008, 2009).unwrap();
        assert_eq!(
            years.index(),
            &[utc_date(2008, 12, 31).unwrap(), utc_date(2009, 12, 31).unwrap()]
        );
        assert_eq!(years.values()[[0, 0]], 36.0);
        assert_eq!(years.values()[[1, 1]], 36.0);

        let months = hdf5_to_months(&store, 2008, 2009).unwrap();
        assert_eq!(months.nrows(), 24);
        assert_eq!(months.index()[1], utc_date(2008, 2, 29).unwrap());
        assert!(months.values().iter().all(|v| *v == 3.0));
    }

    #[test]
    fn single_year_when_end_is_missing() {
        let store = store(&[2008]);
        let years = hdf5_to_years(&store, 2008, 0).unwrap();
        assert_eq!(years.nrows(), 1);
        let years = hdf5_to_years(&store, 2008, 2000).unwrap();
        assert_eq!(years.nrows(), 1);
    }

    #[test]
    fn days_are_labelled_with_their_date() {
        let store = store(&[2008]);
        let days = hdf5_to_days(&store, 2008, 0).unwrap();
        assert_eq!(days.index()[0], utc_date(2008, 1, 1).unwrap());
        assert_eq!(days.values()[[0, 0]], 3.0);
        assert!(days.values()[[1, 0]].is_nan());
        assert_eq!(days.index()[31], utc_date(2008, 2, 1).unwrap());
        assert_eq!(days.values()[[31, 0]], 3.0);
    }

    #[test]
    fn hours_are_right_labelled() {
        let store = store(&[2008]);
        let hours = hdf5_to_hours(&store, 2008, 0).unwrap();
        assert_eq!(
            hours.index()[0],
            Utc.with_ymd_and_hms(2008, 1, 1, 1, 0, 0).unwrap()
        );
        assert_eq!(hours.values()[[0, 1]], 3.0);
    }

    #[test]
    fn missing_month_names_dataset() {
        let mut store = store(&[2008]);
        let mut partial = MemoryStore::new();
        for month in [1, 2, 4] {
            let key = DatasetKey::month(2008, month);
            partial.put(&key, &store.get(&key).unwrap()).unwrap();
        }
        store = partial;
        let err = hdf5_to_months(&store, 2008, 0).unwrap_err();
        assert!(err.message().contains("2008/3"));
    }

    #[test]
    fn seasons_start_in_may_and_november() {
        let store = store(&[2008, 2009]);
        let seasons = hydrological_seasons(&store, 2008, 2009).unwrap();
        assert_eq!(
            seasons.index(),
            &[
                utc_date(2008, 5, 1).unwrap(),
                utc_date(2008, 11, 1).unwrap(),
                utc_date(2009, 5, 1).unwrap(),
            ]
        );
        assert!(seasons.values().iter().all(|v| *v == 18.0));
    }
}
