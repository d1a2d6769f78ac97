use std::collections::BTreeMap;

use crate::errors::RadprocError;
use crate::models::frame::TimeFrame;

use super::{DatasetKey, FrameStore};

/// Store keeping every frame in memory
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    frames: BTreeMap<DatasetKey, TimeFrame>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }
}

impl FrameStore for MemoryStore {
    fn put(&mut self, key: &DatasetKey, frame: &TimeFrame) -> Result<(), RadprocError> {
        if frame.is_empty() {
            return Ok(());
        }
        self.frames.insert(key.clone(), frame.clone());
        Ok(())
    }

    fn get(&self, key: &DatasetKey) -> Result<TimeFrame, RadprocError> {
        self.frames
            .get(key)
            .cloned()
            .ok_or_else(|| format!("dataset {key} not found").into())
    }

    fn contains(&self, key: &DatasetKey) -> bool {
        self.frames.contains_key(key)
    }

    fn keys(&self) -> Result<Vec<DatasetKey>, RadprocError> {
        Ok(self.frames.keys().cloned().collect())
    }
}
