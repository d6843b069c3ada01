//! Durable interval/entity store.
//!
//! Accepted on-disk shapes:
//! - absent file, blank file, or `{}` → empty skeleton
//! - `{meta, intervals, entities}` (current) or `{.., systems}` (older name)
//! - a flat `{<id>: {name, firstDiscoveryDate}}` map written by old full
//!   rescans → loaded as entities with no interval records, so every
//!   interval in range is re-fetched once and merged over them
//!
//! Anything else is `STORE_CORRUPT`; existing data is never discarded
//! silently.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use fdx_schemas::{EntityRecord, StoreDocument, STORE_VERSION};
use serde_json::Value;
use tracing::{debug, warn};

use crate::{read_snapshot, write_json_atomic, StoreError};

const DOCUMENT_KEYS: &[&str] = &["meta", "intervals", "entities", "systems"];

/// Exclusive owner of the interval and entity maps for one store file.
#[derive(Debug, Clone)]
pub struct DiscoveryStore {
    path: PathBuf,
    doc: StoreDocument,
}

impl DiscoveryStore {
    /// Load the snapshot at `path`, or an empty skeleton if there is none.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let doc = match read_snapshot(&path)? {
            None => {
                debug!(path = %path.display(), "no discovery snapshot; starting empty");
                StoreDocument::default()
            }
            Some(raw) => parse_document(&path, &raw)?,
        };

        if doc.meta.version > STORE_VERSION {
            return Err(StoreError::UnsupportedVersion {
                path,
                found: doc.meta.version,
            });
        }

        Ok(Self { path, doc })
    }

    /// Wrap an existing document; nothing is read from disk.
    pub fn from_document(path: impl AsRef<Path>, doc: StoreDocument) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            doc,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn document(&self) -> &StoreDocument {
        &self.doc
    }

    pub fn document_mut(&mut self) -> &mut StoreDocument {
        &mut self.doc
    }

    pub fn entities(&self) -> &BTreeMap<String, EntityRecord> {
        &self.doc.entities
    }

    /// Overwrite the snapshot on disk with the current in-memory state.
    pub fn persist(&self) -> Result<(), StoreError> {
        write_json_atomic(&self.path, &self.doc)
    }
}

fn parse_document(path: &Path, raw: &str) -> Result<StoreDocument, StoreError> {
    let corrupt = |message: String| StoreError::Corrupt {
        path: path.to_path_buf(),
        message,
    };

    let v: Value = serde_json::from_str(raw).map_err(|e| corrupt(format!("invalid json: {e}")))?;
    let Value::Object(map) = &v else {
        return Err(corrupt("top-level value is not an object".to_string()));
    };

    if map.is_empty() {
        return Ok(StoreDocument::default());
    }

    if map.keys().any(|k| DOCUMENT_KEYS.contains(&k.as_str())) {
        return serde_json::from_value(v).map_err(|e| corrupt(format!("unexpected layout: {e}")));
    }

    let entities: BTreeMap<String, EntityRecord> = serde_json::from_value(v)
        .map_err(|e| corrupt(format!("neither a store document nor a flat entity map: {e}")))?;
    warn!(
        path = %path.display(),
        entities = entities.len(),
        "flat entity snapshot found; intervals will be re-fetched"
    );
    Ok(StoreDocument {
        entities,
        ..StoreDocument::default()
    })
}
