use chrono::Utc;
use log::{info, warn};
use ndarray::{Array2, ArrayView1};
use ndarray_stats::QuantileExt;
use rayon::prelude::*;

use crate::errors::RadprocError;
use crate::models::frame::TimeFrame;
use crate::models::table::SummaryTable;
use crate::modules::aggregation::functions::{load_month, load_months, normalize_year_end};
use crate::store::{DatasetKey, FrameStore};

use super::constants::*;

/// Sum of the non-NaN values, 0 if there is none
fn nansum(values: &[f32]) -> f32 {
    values.iter().filter(|v| !v.is_nan()).sum()
}

/// Maximum 30 minutes intensity I30 [mm/h] of a rain.
/// Hourly series use the maximum hourly sum instead.
pub fn calc_i30(values: &[f32], freq_min: i64) -> f32 {
    if freq_min == 60 {
        return *ArrayView1::from(values).max_skipnan();
    }
    let window = (I30_WINDOW_MINUTES / freq_min).max(1) as usize;
    let i30 = if values.len() <= window {
        nansum(values)
    } else {
        values
            .windows(window)
            .map(nansum)
            .fold(f32::NEG_INFINITY, f32::max)
    };
    i30 * 2.0
}

/// Kinetic energy of a rain [kJ/m²]
fn rain_energy(values: &[f32], freq_min: i64) -> f64 {
    let per_hour = (60 / freq_min) as f64;
    values
        .iter()
        .map(|&n| {
            let n = n as f64;
            let intensity = n * per_hour;
            if intensity > ENERGY_MIN_INTENSITY && intensity < ENERGY_MAX_INTENSITY {
                (ENERGY_OFFSET + ENERGY_SLOPE * intensity.log10()) * n * ENERGY_SCALE
            } else if n >= ENERGY_MAX_INTENSITY {
                ENERGY_MAX * n * ENERGY_SCALE
            } else {
                0.0
            }
        })
        .sum()
}

/// R-factor [kJ/m² · mm/h] and number of erosive rains of a series.
///
/// Both are NaN if more than `max_nan_days` worth of intervals are missing.
/// A rain lasts from its first wet interval until six hours without
/// rain; the trailing dry intervals are not part of it.
pub fn calc_r_factor(column: &[f32], freq_min: i64, max_nan_days: f32) -> (f32, f32) {
    if freq_min <= 0 {
        return (f32::NAN, f32::NAN);
    }
    let six_hours = (RAIN_PAUSE_MINUTES / freq_min) as usize;
    let max_nan_intervals = max_nan_days * (60 / freq_min) as f32 * 24.0;

    let nan_count = column.iter().filter(|v| v.is_nan()).count();
    if nan_count as f32 > max_nan_intervals {
        return (f32::NAN, f32::NAN);
    }

    let len = column.len();
    let mut r_factor = 0.0_f64;
    let mut n_rains = 0;
    let mut i = 0;
    while i < len {
        if column[i] > 0.0 {
            let start = i;
            let mut pause = 0;
            while pause <= six_hours {
                i += 1;
                if i == len {
                    pause = six_hours + 1;
                } else if column[i] > 0.0 {
                    pause = 0;
                } else {
                    pause += 1;
                }
            }

            let end = i.saturating_sub(six_hours);
            let rain = if end > start && nansum(&column[end..i]) == 0.0 {
                &column[start..end]
            } else {
                &column[start..i]
            };

            let i30 = calc_i30(rain, freq_min);
            if (i30 > EROSIVE_I30 || nansum(rain) >= EROSIVE_SUM) && i30 <= MAX_I30 {
                n_rains += 1;
                r_factor += rain_energy(rain, freq_min) * i30 as f64;
            }
        }
        i += 1;
    }
    (r_factor as f32, n_rains as f32)
}

/// R-factor and rain count of every column, computed in parallel
fn columns_r_factor(frame: &TimeFrame, freq_min: i64, max_nan_days: f32) -> (Vec<f32>, Vec<f32>) {
    (0..frame.ncols())
        .into_par_iter()
        .map(|col| {
            let column = frame.column(col).to_vec();
            calc_r_factor(&column, freq_min, max_nan_days)
        })
        .unzip()
}

fn frequency(frame: &TimeFrame) -> Result<i64, RadprocError> {
    frame
        .freq_minutes()
        .ok_or_else(|| "cannot infer the time step of the precipitation data".into())
}

fn to_tables(
    rows: Vec<i32>,
    columns: Vec<String>,
    r_values: Vec<f32>,
    n_values: Vec<f32>,
) -> Result<(SummaryTable, SummaryTable), RadprocError> {
    let shape = (rows.len(), columns.len());
    let r = Array2::from_shape_vec(shape, r_values).map_err(|err| format!("invalid shape: {err}"))?;
    let n = Array2::from_shape_vec(shape, n_values).map_err(|err| format!("invalid shape: {err}"))?;
    Ok((
        SummaryTable::new("R", rows.clone(), columns.clone(), r)?,
        SummaryTable::new("N", rows, columns, n)?,
    ))
}

fn add_into(acc: &mut [f32], values: &[f32]) {
    acc.iter_mut().zip(values).for_each(|(a, v)| *a += v);
}

/// Mean R-factor and mean number of erosive rains per calendar month.
/// Rows are the months 1 to 12.
pub fn monthly_r_factor(
    store: &dyn FrameStore,
    year_start: i32,
    year_end: i32,
    max_nan_days: f32,
) -> Result<(SummaryTable, SummaryTable), RadprocError> {
    let start = Utc::now();
    let year_end = normalize_year_end(year_start, year_end);
    let n_years = (year_end - year_start + 1) as f32;

    let first = load_month(store, year_start, 1)?;
    let freq_min = frequency(&first)?;
    let columns = first.columns().to_vec();
    drop(first);

    let mut r_values = Vec::with_capacity(12 * columns.len());
    let mut n_values = Vec::with_capacity(12 * columns.len());
    for month in 1..=12 {
        let mut r_sum = vec![0.0; columns.len()];
        let mut n_sum = vec![0.0; columns.len()];
        for year in year_start..=year_end {
            let frame = load_month(store, year, month)?;
            let (r, n) = columns_r_factor(&frame, freq_min, max_nan_days);
            add_into(&mut r_sum, &r);
            add_into(&mut n_sum, &n);
        }
        r_values.extend(r_sum.iter().map(|r| r / n_years));
        n_values.extend(n_sum.iter().map(|n| n / n_years));
    }

    info!("Monthly R-factor computed in {} seconds", Utc::now() - start);
    to_tables((1..=12).collect(), columns, r_values, n_values)
}

/// Annual R-factor as the sum of the monthly R-factors of every year.
/// Each month may miss a twelfth of `max_nan_days`.
pub fn annual_r_factor(
    store: &dyn FrameStore,
    year_start: i32,
    year_end: i32,
    max_nan_days: f32,
) -> Result<(SummaryTable, SummaryTable), RadprocError> {
    let start = Utc::now();
    let year_end = normalize_year_end(year_start, year_end);
    let max_nan_days = max_nan_days / 12.0;

    let first = load_month(store, year_start, 1)?;
    let freq_min = frequency(&first)?;
    let columns = first.columns().to_vec();
    drop(first);

    let mut r_values = Vec::new();
    let mut n_values = Vec::new();
    for year in year_start..=year_end {
        let mut r_year = vec![0.0; columns.len()];
        let mut n_year = vec![0.0; columns.len()];
        for month in 1..=12 {
            let frame = load_month(store, year, month)?;
            let (r, n) = columns_r_factor(&frame, freq_min, max_nan_days);
            add_into(&mut r_year, &r);
            add_into(&mut n_year, &n);
        }
        r_values.extend(r_year);
        n_values.extend(n_year);
    }

    info!("Annual R-factor computed in {} seconds", Utc::now() - start);
    to_tables((year_start..=year_end).collect(), columns, r_values, n_values)
}

/// Annual R-factor computed on the whole series of every year.
/// Needs all months of a year in memory.
pub fn annual_r_factor_whole_years(
    store: &dyn FrameStore,
    year_start: i32,
    year_end: i32,
    max_nan_days: f32,
) -> Result<(SummaryTable, SummaryTable), RadprocError> {
    let start = Utc::now();
    let year_end = normalize_year_end(year_start, year_end);
    let months: Vec<u32> = (1..=12).collect();

    let mut columns = Vec::new();
    let mut freq_min = None;
    let mut r_values = Vec::new();
    let mut n_values = Vec::new();
    for year in year_start..=year_end {
        let frame = load_months(store, year, &months)?;
        let freq = match freq_min {
            Some(freq) => freq,
            None => {
                let freq = frequency(&frame)?;
                columns = frame.columns().to_vec();
                freq_min = Some(freq);
                freq
            }
        };
        let (r, n) = columns_r_factor(&frame, freq, max_nan_days);
        r_values.extend(r);
        n_values.extend(n);
    }

    info!("Annual R-factor of whole years computed in {} seconds", Utc::now() - start);
    to_tables((year_start..=year_end).collect(), columns, r_values, n_values)
}

/// Annual R-factor of a single dataset spanning several years, e.g. all
/// gauges in one table
pub fn annual_r_factor_gauge(
    store: &dyn FrameStore,
    dataset: &DatasetKey,
    year_start: i32,
    year_end: i32,
    max_nan_days: f32,
) -> Result<(SummaryTable, SummaryTable), RadprocError> {
    let start = Utc::now();
    let year_end = normalize_year_end(year_start, year_end);
    let frame = store.get(dataset)?;
    let freq_min = frequency(&frame)?;
    let columns = frame.columns().to_vec();

    let mut r_values = Vec::new();
    let mut n_values = Vec::new();
    for year in year_start..=year_end {
        let slice = frame.slice_year(year);
        if slice.is_empty() {
            warn!("No data for {year} in {dataset}");
            r_values.extend(std::iter::repeat(f32::NAN).take(columns.len()));
            n_values.extend(std::iter::repeat(f32::NAN).take(columns.len()));
            continue;
        }
        let (r, n) = columns_r_factor(&slice, freq_min, max_nan_days);
        r_values.extend(r);
        n_values.extend(n);
    }

    info!("Annual R-factor of {} computed in {} seconds", dataset, Utc::now() - start);
    to_tables((year_start..=year_end).collect(), columns, r_values, n_values)
}
