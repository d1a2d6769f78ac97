use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use hdf5::types::VarLenUnicode;
use hdf5::{File, Group};
use log::{debug, trace};
use ndarray::Array2;

use crate::constants::DEFAULT_COMPLEVEL;
use crate::errors::RadprocError;
use crate::models::frame::TimeFrame;

use super::{DatasetKey, FrameStore};

const INDEX_DATASET: &str = "index";
const COLUMNS_DATASET: &str = "columns";
const VALUES_DATASET: &str = "values";

/// Frames stored as nested groups of an HDF5 file.
///
/// Every key is a group holding three datasets: `index` with the row
/// timestamps as unix seconds, `columns` with the column names and `values`
/// with the f32 table, rows by columns.
#[derive(Debug, Clone)]
pub struct Hdf5Store {
    path: PathBuf,
    complevel: u8,
}

impl Hdf5Store {
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            complevel: DEFAULT_COMPLEVEL,
        }
    }

    /// Deflate level 0-9 of the values dataset, 0 disables compression
    pub fn with_complevel(mut self, complevel: u8) -> Self {
        self.complevel = complevel.min(9);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open_read(&self) -> Result<File, RadprocError> {
        File::open(&self.path).map_err(|err| {
            format!("cannot open store {}: {}", self.path.display(), err).into()
        })
    }

    fn find_group(&self, file: &File, key: &DatasetKey) -> Result<Option<Group>, RadprocError> {
        let mut group = file.group("/")?;
        for name in key.components() {
            if !group.link_exists(name) {
                return Ok(None);
            }
            group = group.group(name)?;
        }
        Ok(Some(group))
    }

    fn collect_keys(group: &Group, prefix: &str, keys: &mut Vec<DatasetKey>) -> Result<(), RadprocError> {
        if group.link_exists(VALUES_DATASET) {
            keys.push(DatasetKey::new(prefix)?);
            return Ok(());
        }
        for name in group.member_names()? {
            let Ok(child) = group.group(&name) else {
                continue;
            };
            let path = if prefix.is_empty() {
                name
            } else {
                format!("{prefix}/{name}")
            };
            Self::collect_keys(&child, &path, keys)?;
        }
        Ok(())
    }
}

impl FrameStore for Hdf5Store {
    fn put(&mut self, key: &DatasetKey, frame: &TimeFrame) -> Result<(), RadprocError> {
        if frame.is_empty() {
            debug!("[STORE] skipping empty dataset {key}");
            return Ok(());
        }
        let start = Utc::now();

        let file = File::append(&self.path)?;
        let mut parent = file.group("/")?;
        let components: Vec<&str> = key.components().collect();
        let (leaf, groups) = components
            .split_last()
            .ok_or_else(|| format!("invalid dataset key {key}"))?;

        for name in groups {
            parent = if parent.link_exists(name) {
                parent.group(name)?
            } else {
                parent.create_group(name)?
            };
        }
        if parent.link_exists(leaf) {
            parent.unlink(leaf)?;
        }
        let group = parent.create_group(leaf)?;

        let index: Vec<i64> = frame.index().iter().map(|t| t.timestamp()).collect();
        group
            .new_dataset::<i64>()
            .shape(index.len())
            .create(INDEX_DATASET)?
            .write_raw(index.as_slice())?;

        let columns = frame
            .columns()
            .iter()
            .map(|c| {
                c.parse::<VarLenUnicode>()
                    .map_err(|err| format!("invalid column name {c}: {err}"))
            })
            .collect::<Result<Vec<_>, _>>()?;
        group
            .new_dataset::<VarLenUnicode>()
            .shape(columns.len())
            .create(COLUMNS_DATASET)?
            .write_raw(columns.as_slice())?;

        let values: Vec<f32> = frame.values().iter().copied().collect();
        let builder = group
            .new_dataset::<f32>()
            .shape((frame.nrows(), frame.ncols()));
        let dataset = if self.complevel > 0 {
            builder.deflate(self.complevel).create(VALUES_DATASET)?
        } else {
            builder.create(VALUES_DATASET)?
        };
        dataset.write_raw(values.as_slice())?;

        trace!("[STORE] writing {key} took {} seconds", Utc::now() - start);
        Ok(())
    }

    fn get(&self, key: &DatasetKey) -> Result<TimeFrame, RadprocError> {
        let file = self.open_read()?;
        let group = self
            .find_group(&file, key)?
            .ok_or_else(|| format!("dataset {key} not found in {}", self.path.display()))?;

        let index = group
            .dataset(INDEX_DATASET)?
            .read_raw::<i64>()?
            .into_iter()
            .map(|ts| {
                DateTime::<Utc>::from_timestamp(ts, 0)
                    .ok_or_else(|| format!("invalid timestamp {ts} in {key}"))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let columns: Vec<String> = group
            .dataset(COLUMNS_DATASET)?
            .read_raw::<VarLenUnicode>()?
            .iter()
            .map(|c| c.as_str().to_string())
            .collect();

        let dataset = group.dataset(VALUES_DATASET)?;
        let shape = dataset.shape();
        if shape.len() != 2 {
            return Err(format!("dataset {key} has {} dimensions, expected 2", shape.len()).into());
        }
        let values = Array2::from_shape_vec((shape[0], shape[1]), dataset.read_raw::<f32>()?)
            .map_err(|err| format!("invalid values in {key}: {err}"))?;

        TimeFrame::new(index, columns, values)
    }

    fn contains(&self, key: &DatasetKey) -> bool {
        if !self.path.exists() {
            return false;
        }
        self.open_read()
            .and_then(|file| self.find_group(&file, key))
            .map(|group| group.is_some_and(|g| g.link_exists(VALUES_DATASET)))
            .unwrap_or(false)
    }

    fn keys(&self) -> Result<Vec<DatasetKey>, RadprocError> {
        let file = self.open_read()?;
        let root = file.group("/")?;
        let mut keys = Vec::new();
        for name in root.member_names()? {
            if let Ok(child) = root.group(&name) {
                Self::collect_keys(&child, &name, &mut keys)?;
            }
        }
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use ndarray::array;

    #[test]
    fn roundtrip_nested_keys() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = Hdf5Store::new(&dir.path().join("gauges.h5"));

        let index = vec![
            Utc.with_ymd_and_hms(2008, 5, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2008, 5, 1, 0, 5, 0).unwrap(),
        ];
        let frame = TimeFrame::new(
            index.clone(),
            vec!["1001".into(), "2002".into()],
            array![[0.1, f32::NAN], [0.0, 2.5]],
        )
        .unwrap();

        let may = DatasetKey::month(2008, 5);
        store.put(&may, &frame).unwrap();
        store.put(&DatasetKey::month(2008, 6), &TimeFrame::empty(vec!["1001".into()])).unwrap();

        assert!(store.contains(&may));
        assert!(!store.contains(&DatasetKey::month(2008, 6)));
        assert_eq!(store.keys().unwrap(), vec![may.clone()]);

        let read = store.get(&may).unwrap();
        assert_eq!(read.index(), index.as_slice());
        assert_eq!(read.columns(), frame.columns());
        assert_eq!(read.values()[[0, 0]], 0.1);
        assert!(read.values()[[0, 1]].is_nan());
        assert_eq!(read.values()[[1, 1]], 2.5);
    }

    #[test]
    fn put_replaces_existing_dataset() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = Hdf5Store::new(&dir.path().join("store.h5")).with_complevel(0);
        let key = DatasetKey::month(2010, 1);
        let t = Utc.with_ymd_and_hms(2010, 1, 1, 0, 0, 0).unwrap();

        let first = TimeFrame::new(vec![t], vec!["a".into()], array![[1.0]]).unwrap();
        let second = TimeFrame::new(vec![t, t], vec!["b".into()], array![[2.0], [3.0]]).unwrap();
        store.put(&key, &first).unwrap();
        store.put(&key, &second).unwrap();

        let read = store.get(&key).unwrap();
        assert_eq!(read.columns(), &["b".to_string()]);
        assert_eq!(read.nrows(), 2);
        assert!(store.get(&DatasetKey::month(2010, 2)).is_err());
    }
}
