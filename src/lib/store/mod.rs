use std::fmt::Display;
use std::str::FromStr;

use crate::errors::RadprocError;
use crate::models::frame::TimeFrame;

pub mod memory;

#[cfg(feature = "hdf5")]
pub mod h5;

pub use memory::MemoryStore;

#[cfg(feature = "hdf5")]
pub use h5::Hdf5Store;

/// Slash separated dataset path inside a store, e.g. `2008/5`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DatasetKey(String);

impl DatasetKey {
    pub fn new(path: &str) -> Result<Self, RadprocError> {
        let components: Vec<&str> = path
            .split('/')
            .filter(|c| !c.is_empty())
            .collect();
        if components.is_empty() {
            return Err(format!("invalid dataset key '{path}'").into());
        }
        Ok(DatasetKey(components.join("/")))
    }

    /// Key of a monthly dataset. The month is not zero padded.
    pub fn month(year: i32, month: u32) -> Self {
        DatasetKey(format!("{year:04}/{month}"))
    }

    /// Year and month of a monthly key
    pub fn as_month(&self) -> Option<(i32, u32)> {
        let (year, month) = self.0.split_once('/')?;
        let year = year.parse::<i32>().ok()?;
        let month = month.parse::<u32>().ok()?;
        if (1..=12).contains(&month) {
            Some((year, month))
        } else {
            None
        }
    }

    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.0.split('/')
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for DatasetKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for DatasetKey {
    type Err = RadprocError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DatasetKey::new(s)
    }
}

/// Keyed storage of time frames
pub trait FrameStore: Send + Sync {
    /// Writes `frame` under `key`, replacing an existing dataset
    fn put(&mut self, key: &DatasetKey, frame: &TimeFrame) -> Result<(), RadprocError>;

    fn get(&self, key: &DatasetKey) -> Result<TimeFrame, RadprocError>;

    fn contains(&self, key: &DatasetKey) -> bool;

    /// All dataset keys, sorted
    fn keys(&self) -> Result<Vec<DatasetKey>, RadprocError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monthly_keys_are_not_padded() {
        let key = DatasetKey::month(2008, 5);
        assert_eq!(key.as_str(), "2008/5");
        assert_eq!(key.as_month(), Some((2008, 5)));
        assert_eq!(DatasetKey::month(2010, 12).to_string(), "2010/12");
    }

    #[test]
    fn keys_are_normalized() {
        let key: DatasetKey = "/gauges/all/".parse().unwrap();
        assert_eq!(key.as_str(), "gauges/all");
        assert_eq!(key.components().collect::<Vec<_>>(), vec!["gauges", "all"]);
        assert_eq!(key.as_month(), None);
        assert!("//".parse::<DatasetKey>().is_err());
    }
}
