use std::collections::HashMap;

use chrono::{DateTime, Datelike, Duration, Utc};
use itertools::Itertools;
use ndarray::{concatenate, Array2, ArrayView1, ArrayView2, Axis};

use crate::errors::RadprocError;

/// Adds `value` to `acc` ignoring missing values.
/// An accumulator that never saw a value stays NaN.
#[inline]
pub fn accumulate(acc: &mut f32, value: f32) {
    if value.is_nan() {
        return;
    }
    if acc.is_nan() {
        *acc = value;
    } else {
        *acc += value;
    }
}

/// Sum of the non-NaN values, NaN if there is none
pub fn nan_sum<I>(values: I) -> f32
where
    I: IntoIterator<Item = f32>,
{
    let mut acc = f32::NAN;
    values.into_iter().for_each(|v| accumulate(&mut acc, v));
    acc
}

/// Time indexed precipitation table.
///
/// Every row is one interval (a raster at a given date for radar data,
/// one timestamp of all stations for gauge data), every column is the time
/// series of one raster cell or one station. Missing values are NaN.
/// The index is kept in non-decreasing order.
#[derive(Debug, Clone)]
pub struct TimeFrame {
    index: Vec<DateTime<Utc>>,
    columns: Vec<String>,
    values: Array2<f32>,
}

impl TimeFrame {
    pub fn new(
        index: Vec<DateTime<Utc>>,
        columns: Vec<String>,
        values: Array2<f32>,
    ) -> Result<Self, RadprocError> {
        if values.dim() != (index.len(), columns.len()) {
            return Err(format!(
                "values of shape {:?} do not match index ({}) and columns ({})",
                values.dim(),
                index.len(),
                columns.len()
            )
            .into());
        }
        if !index.windows(2).all(|w| w[0] <= w[1]) {
            return Err("time index must be sorted".into());
        }
        Ok(Self {
            index,
            columns,
            values,
        })
    }

    pub fn empty(columns: Vec<String>) -> Self {
        let ncols = columns.len();
        Self {
            index: Vec::new(),
            columns,
            values: Array2::zeros((0, ncols)),
        }
    }

    pub fn index(&self) -> &[DateTime<Utc>] {
        &self.index
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> ArrayView2<'_, f32> {
        self.values.view()
    }

    pub fn column(&self, idx: usize) -> ArrayView1<'_, f32> {
        self.values.column(idx)
    }

    pub fn nrows(&self) -> usize {
        self.index.len()
    }

    pub fn ncols(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn into_parts(self) -> (Vec<DateTime<Utc>>, Vec<String>, Array2<f32>) {
        (self.index, self.columns, self.values)
    }

    /// Frequency in minutes, derived from the first two timestamps
    pub fn freq_minutes(&self) -> Option<i64> {
        if self.index.len() < 2 {
            return None;
        }
        let minutes = (self.index[1] - self.index[0]).num_minutes();
        if minutes > 0 {
            Some(minutes)
        } else {
            None
        }
    }

    /// Distinct years of the index, ascending
    pub fn years(&self) -> Vec<i32> {
        self.index.iter().map(|t| t.year()).dedup().collect()
    }

    fn take_rows(&self, rows: &[usize]) -> Self {
        Self {
            index: rows.iter().map(|r| self.index[*r]).collect(),
            columns: self.columns.clone(),
            values: self.values.select(Axis(0), rows),
        }
    }

    pub fn select_rows(&self, mask: &[bool]) -> Self {
        let rows: Vec<usize> = mask
            .iter()
            .enumerate()
            .filter(|(row, keep)| **keep && *row < self.index.len())
            .map(|(row, _)| row)
            .collect();
        self.take_rows(&rows)
    }

    /// Columns `names` in the given order, unknown names are an error
    pub fn select_columns(&self, names: &[String]) -> Result<Self, RadprocError> {
        let positions = names
            .iter()
            .map(|name| {
                self.columns
                    .iter()
                    .position(|c| c == name)
                    .ok_or_else(|| format!("column {name} not found"))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            index: self.index.clone(),
            columns: names.to_vec(),
            values: self.values.select(Axis(1), &positions),
        })
    }

    fn filter_index<F>(&self, predicate: F) -> Self
    where
        F: Fn(&DateTime<Utc>) -> bool,
    {
        let rows: Vec<usize> = self
            .index
            .iter()
            .positions(|t| predicate(t))
            .collect();
        self.take_rows(&rows)
    }

    pub fn slice_month(&self, year: i32, month: u32) -> Self {
        self.filter_index(|t| t.year() == year && t.month() == month)
    }

    pub fn slice_year(&self, year: i32) -> Self {
        self.filter_index(|t| t.year() == year)
    }

    /// Rows between `start` and `end`, both included
    pub fn truncate(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.filter_index(|t| *t >= start && *t <= end)
    }

    /// Keeps only the first row of every repeated timestamp
    pub fn drop_duplicate_index(&self) -> Self {
        let rows: Vec<usize> = (0..self.index.len())
            .filter(|&row| row == 0 || self.index[row] != self.index[row - 1])
            .collect();
        if rows.len() == self.index.len() {
            return self.clone();
        }
        self.take_rows(&rows)
    }

    pub fn shift_index(&mut self, offset: Duration) {
        self.index.iter_mut().for_each(|t| *t += offset);
    }

    pub fn map_values<F>(&self, fun: F) -> Self
    where
        F: Fn(f32) -> f32,
    {
        Self {
            index: self.index.clone(),
            columns: self.columns.clone(),
            values: self.values.mapv(fun),
        }
    }

    /// Appends the rows of all frames. All frames need the same columns.
    pub fn concat_rows(frames: &[TimeFrame]) -> Result<Self, RadprocError> {
        let first = frames.first().ok_or("no frames to concatenate")?;

        if let Some(other) = frames.iter().find(|f| f.columns != first.columns) {
            return Err(format!(
                "cannot concatenate frames with different columns ({} vs {})",
                first.columns.len(),
                other.columns.len()
            )
            .into());
        }

        let index: Vec<DateTime<Utc>> = frames
            .iter()
            .flat_map(|f| f.index.iter().copied())
            .collect();
        let views: Vec<ArrayView2<f32>> = frames.iter().map(|f| f.values.view()).collect();
        let values = concatenate(Axis(0), &views)
            .map_err(|err| format!("cannot concatenate frames: {err}"))?;

        TimeFrame::new(index, first.columns.clone(), values)
    }

    /// Outer join along the columns: the result index is the union of all
    /// indexes and every frame contributes its columns.
    pub fn join_columns(frames: &[TimeFrame]) -> Self {
        let index: Vec<DateTime<Utc>> = frames
            .iter()
            .flat_map(|f| f.index.iter().copied())
            .sorted()
            .dedup()
            .collect();
        let positions: HashMap<DateTime<Utc>, usize> =
            index.iter().enumerate().map(|(i, t)| (*t, i)).collect();

        let columns: Vec<String> = frames
            .iter()
            .flat_map(|f| f.columns.iter().cloned())
            .collect();

        let mut values = Array2::from_elem((index.len(), columns.len()), f32::NAN);

        let mut offset = 0;
        for frame in frames {
            let frame = frame.drop_duplicate_index();
            for (row, time) in frame.index.iter().enumerate() {
                let target = positions[time];
                for col in 0..frame.ncols() {
                    values[[target, offset + col]] = frame.values[[row, col]];
                }
            }
            offset += frame.ncols();
        }

        Self {
            index,
            columns,
            values,
        }
    }
}
