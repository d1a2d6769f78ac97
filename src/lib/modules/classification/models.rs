use ndarray::Array2;
use serde_derive::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

use crate::models::table::SummaryTable;

use super::constants::CLASS_COUNT;

/// Time step of the classified intervals
#[derive(Debug, PartialEq, Eq, Copy, Clone, EnumString, Display, Serialize, Deserialize)]
#[strum(ascii_case_insensitive)]
pub enum ClassInterval {
    /// finer data is summed to hours first
    #[strum(to_string = "hours", serialize = "h")]
    #[serde(rename = "hours")]
    Hours,
    #[strum(to_string = "5min")]
    #[serde(rename = "5min")]
    FiveMinutes,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassificationOptions {
    pub interval: ClassInterval,
    /// leave out the `0` and `NaN` classes
    pub dropna: bool,
    /// shares of the total in percent instead of absolute values
    pub percentage: bool,
    /// columns to classify, all if empty
    pub selection: Vec<String>,
}

impl Default for ClassificationOptions {
    fn default() -> Self {
        Self {
            interval: ClassInterval::Hours,
            dropna: true,
            percentage: true,
            selection: Vec::new(),
        }
    }
}

/// Precipitation depth [mm] and number of intervals per class (rows) and
/// column
#[derive(Debug, Clone)]
pub struct ClassSums {
    pub depth: Array2<f32>,
    pub duration: Array2<f32>,
}

impl ClassSums {
    pub fn zeros(ncols: usize) -> Self {
        Self {
            depth: Array2::zeros((CLASS_COUNT, ncols)),
            duration: Array2::zeros((CLASS_COUNT, ncols)),
        }
    }
}

/// Result of a classification over several months.
///
/// The spatial tables have one row per class and one column per cell or
/// station, summed over all months. The temporal tables have one row per
/// month and one column per class, summed over all cells.
#[derive(Debug, Clone)]
pub struct Classification {
    pub spatial_depth: SummaryTable,
    pub spatial_duration: SummaryTable,
    pub temporal_depth: SummaryTable,
    pub temporal_duration: SummaryTable,
}

impl Classification {
    pub fn tables(&self) -> [&SummaryTable; 4] {
        [
            &self.spatial_depth,
            &self.spatial_duration,
            &self.temporal_depth,
            &self.temporal_duration,
        ]
    }
}
