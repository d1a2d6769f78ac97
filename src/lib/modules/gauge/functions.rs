use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use log::{debug, info, trace, warn};
use ndarray::Array2;
use rayon::prelude::*;

use crate::constants::NODATAVAL;
use crate::errors::RadprocError;
use crate::models::frame::{nan_sum, TimeFrame};
use crate::store::{DatasetKey, FrameStore};

use super::{
    constants::*,
    models::{GaugeRecord, ImportReport},
};

/// Chars `start..end` of `line`, cut to the line length
fn field(line: &str, start: usize, end: usize) -> &str {
    let end = end.min(line.len());
    let start = start.min(end);
    line.get(start..end).unwrap_or("")
}

fn parse_number<T: std::str::FromStr>(line: &str, start: usize, end: usize, name: &str) -> Result<T, RadprocError> {
    let value = field(line, start, end).trim();
    value
        .parse::<T>()
        .map_err(|_| format!("invalid {name} '{value}'").into())
}

/// Splits an MR90 line in its station, date and value strings
pub fn read_line(line: &str) -> Result<GaugeRecord, RadprocError> {
    let station = field(line, 2, 7).trim().to_string();
    let year: i32 = parse_number(line, 7, 11, "year")?;
    let month: u32 = parse_number(line, 11, 13, "month")?;
    let day: u32 = parse_number(line, 13, 15, "day")?;
    let hour: u32 = parse_number(line, 15, 17, "hour")?;

    let date = NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(hour, 0, 0))
        .ok_or(format!("invalid date {year}-{month}-{day} {hour}h"))?;

    let mut wippe = String::with_capacity(BLOCK_STARTS.len() * WIPPE_LEN);
    let mut tropfer = String::with_capacity(BLOCK_STARTS.len() * TROPFER_LEN);
    for start in BLOCK_STARTS {
        let tropfer_start = start + WIPPE_LEN;
        wippe.push_str(field(line, start, tropfer_start));
        tropfer.push_str(field(line, tropfer_start, tropfer_start + TROPFER_LEN));
    }

    Ok(GaugeRecord {
        station,
        date,
        wippe,
        tropfer,
    })
}

fn decode_value(value: &str, nodata: &str, zeros: &[&str], scale: f32) -> f32 {
    if value == nodata {
        NODATAVAL
    } else if zeros.contains(&value) {
        0.0
    } else {
        value
            .trim()
            .parse::<f32>()
            .map(|v| v * scale)
            .unwrap_or(NODATAVAL)
    }
}

fn decode_series(series: &str, width: usize, nodata: &str, zeros: &[&str], scale: f32) -> [f32; MINUTES_PER_LINE] {
    let mut values = [NODATAVAL; MINUTES_PER_LINE];
    let chunks = (0..series.len()).step_by(width);
    for (minute, start) in chunks.take(MINUTES_PER_LINE).enumerate() {
        let value = field(series, start, start + width);
        values[minute] = decode_value(value, nodata, zeros, scale);
    }
    values
}

/// Precipitation per minute [mm] of a record.
/// The drop counter series is used unless it is entirely missing.
pub fn interpret_line(record: &GaugeRecord) -> [f32; MINUTES_PER_LINE] {
    if record.tropfer != TROPFER_NODATA.repeat(MINUTES_PER_LINE) {
        decode_series(
            &record.tropfer,
            TROPFER_WIDTH,
            TROPFER_NODATA,
            &TROPFER_ZERO,
            TROPFER_SCALE,
        )
    } else {
        decode_series(
            &record.wippe,
            WIPPE_WIDTH,
            WIPPE_NODATA,
            &WIPPE_ZERO,
            WIPPE_SCALE,
        )
    }
}

/// Sums of every five minutes. The first minute of a record is aligned to
/// five minutes, so each bin starts at its first minute.
pub fn to_five_minutes(values: &[f32; MINUTES_PER_LINE]) -> [f32; MINUTES_PER_LINE / 5] {
    let mut sums = [NODATAVAL; MINUTES_PER_LINE / 5];
    for (bin, chunk) in values.chunks(AGGREGATION_MINUTES as usize).enumerate() {
        sums[bin] = nan_sum(chunk.iter().copied());
    }
    sums
}

/// Reads a file replacing non ASCII bytes, keeping the fixed offsets intact
fn read_ascii(path: &Path) -> Result<String, RadprocError> {
    let bytes = fs::read(path)
        .map_err(|err| format!("cannot read {}: {}", path.display(), err))?;
    Ok(bytes
        .iter()
        .map(|&b| if b.is_ascii() { b as char } else { '?' })
        .collect())
}

/// Decodes a station file into a single column frame of five minute sums.
/// The column is named after the station, the index is in UTC.
pub fn stationfile_to_frame(path: &Path) -> Result<TimeFrame, RadprocError> {
    let start = Utc::now();
    let content = read_ascii(path)?;

    let mut station: Option<String> = None;
    let mut rows: Vec<(DateTime<Utc>, f32)> = Vec::new();

    for (n, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let record = match read_line(line) {
            Ok(record) => record,
            Err(err) => {
                debug!("[GAUGE] skipping line {} of {}: {}", n + 1, path.display(), err);
                continue;
            }
        };
        let sums = to_five_minutes(&interpret_line(&record));
        let index = record.minute_index();
        rows.extend(
            index
                .into_iter()
                .step_by(AGGREGATION_MINUTES as usize)
                .zip(sums),
        );
        station.get_or_insert(record.station);
    }

    let station = station.ok_or(format!("no valid line in {}", path.display()))?;

    // stable sort, the first of duplicated timestamps survives the dedup
    rows.sort_by_key(|(time, _)| *time);
    let (index, values): (Vec<_>, Vec<_>) = rows.into_iter().unzip();
    let values = Array2::from_shape_vec((values.len(), 1), values)
        .map_err(|err| format!("invalid shape: {err}"))?;
    let frame = TimeFrame::new(index, vec![station], values)?.drop_duplicate_index();

    trace!(
        "[GAUGE] reading {} took {} seconds",
        path.display(),
        Utc::now() - start
    );
    Ok(frame)
}

/// Regular files of a folder in name order
fn list_files(folder: &Path) -> Result<Vec<PathBuf>, RadprocError> {
    let mut files: Vec<PathBuf> = fs::read_dir(folder)
        .map_err(|err| format!("cannot list {}: {}", folder.display(), err))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file())
        .collect();
    files.sort();
    Ok(files)
}

fn station_line(content: &str) -> Option<String> {
    let line = content
        .lines()
        .map(str::trim)
        .find(|line| line.starts_with(STATION_PREFIX))?;
    let mut line = line.replace(':', " ");
    line.pop();
    Some(line)
}

fn is_same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Files of `folder` without the summary itself
fn metadata_files(folder: &Path, summary_path: &Path) -> Result<Vec<PathBuf>, RadprocError> {
    let mut files = list_files(folder)?;
    files.retain(|file| !is_same_file(file, summary_path));
    Ok(files)
}

/// Collects the station line of every metadata file of `folder` in a
/// summary file written to the parent folder. Returns the summary path.
pub fn summarize_metadata_files(folder: &Path) -> Result<PathBuf, RadprocError> {
    let parent = folder
        .parent()
        .ok_or(format!("{} has no parent folder", folder.display()))?;
    let summary_path = parent.join(SUMMARY_FILE_NAME);

    let files = metadata_files(folder, &summary_path)?;
    let mut summary = fs::File::create(&summary_path)?;
    let mut count = 0;
    for file in files {
        let content = match fs::read(&file) {
            Ok(bytes) => bytes.iter().map(|&b| b as char).collect::<String>(),
            Err(err) => {
                warn!("Error reading metadata file {}: {}", file.display(), err);
                continue;
            }
        };
        match station_line(&content) {
            Some(line) => {
                writeln!(summary, "{line}")?;
                count += 1;
            }
            None => warn!("No {} line in {}", STATION_PREFIX, file.display()),
        }
    }

    info!(
        "Summarized {} metadata files in {}",
        count,
        summary_path.display()
    );
    Ok(summary_path)
}

/// Imports every station file of `folder` and writes one dataset per month
/// with all stations as columns.
/// Files that cannot be read are reported and skipped.
pub fn gauges_to_store(
    folder: &Path,
    store: &mut dyn FrameStore,
    threads: Option<usize>,
) -> Result<ImportReport, RadprocError> {
    let start = Utc::now();
    let files = list_files(folder)?;
    info!("Reading {} station files from {}", files.len(), folder.display());

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads.unwrap_or(0))
        .build()
        .map_err(|err| format!("cannot build thread pool: {err}"))?;

    let results: Vec<(&PathBuf, Result<TimeFrame, RadprocError>)> = pool.install(|| {
        files
            .par_iter()
            .map(|file| (file, stationfile_to_frame(file)))
            .collect()
    });

    let mut report = ImportReport::default();
    let mut frames = Vec::with_capacity(results.len());
    for (file, result) in results {
        match result {
            Ok(frame) => {
                report.stations.extend(frame.columns().iter().cloned());
                frames.push(frame);
            }
            Err(err) => {
                warn!("Error reading station file {}: {}", file.display(), err);
                report.failed.push(file.clone());
            }
        }
    }
    if frames.is_empty() {
        return Err(format!("no readable station file in {}", folder.display()).into());
    }
    trace!("[GAUGE] parsing took {} seconds", Utc::now() - start);

    let gauges = TimeFrame::join_columns(&frames);
    drop(frames);

    for year in gauges.years() {
        for month in 1..=12 {
            let frame = gauges.slice_month(year, month);
            if frame.is_empty() {
                continue;
            }
            let key = DatasetKey::month(year, month);
            store.put(&key, &frame)?;
            debug!("[GAUGE] written {} with {} rows", key, frame.nrows());
            report.datasets.push(key);
        }
    }

    info!(
        "Imported {} stations into {} datasets, {} files failed",
        report.stations.len(),
        report.datasets.len(),
        report.failed.len()
    );
    Ok(report)
}
