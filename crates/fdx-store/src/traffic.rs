//! Traffic cache: `{<system id>: {total, week, day, breakdown}}`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use fdx_schemas::TrafficRecord;

use crate::{read_snapshot, write_json_atomic, StoreError};

#[derive(Debug, Clone)]
pub struct TrafficCache {
    path: PathBuf,
    records: BTreeMap<String, TrafficRecord>,
}

impl TrafficCache {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let records = match read_snapshot(&path)? {
            None => BTreeMap::new(),
            Some(raw) => serde_json::from_str(&raw).map_err(|e| StoreError::Corrupt {
                path: path.clone(),
                message: format!("invalid traffic cache: {e}"),
            })?,
        };
        Ok(Self { path, records })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, system_id: &str) -> Option<&TrafficRecord> {
        self.records.get(system_id)
    }

    pub fn insert(&mut self, system_id: impl Into<String>, record: TrafficRecord) {
        self.records.insert(system_id.into(), record);
    }

    pub fn records(&self) -> &BTreeMap<String, TrafficRecord> {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn persist(&self) -> Result<(), StoreError> {
        write_json_atomic(&self.path, &self.records)
    }
}
