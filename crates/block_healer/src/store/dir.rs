use std::fs::{self, create_dir_all};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tempfile::NamedTempFile;
use tracing::debug;

use super::{Store, StoreError};
use crate::config::StoreConfig;

const JSON_EXTENSION: &str = ".json";

/// Directory of pretty-printed JSON files named by zero-padded height,
/// e.g. `0001234` or `0001234.json`.
#[derive(Debug, Clone)]
pub struct DirStore {
    root: PathBuf,
    width: usize,
    extension: &'static str,
}

impl DirStore {
    pub fn new<P: AsRef<Path>>(root: P, width: usize, json_extension: bool) -> Result<Self, StoreError> {
        let root = root.as_ref().to_path_buf();
        if !root.exists() {
            create_dir_all(&root)?;
        }
        Ok(DirStore {
            root,
            width,
            extension: if json_extension { JSON_EXTENSION } else { "" },
        })
    }

    pub fn from_config(config: &StoreConfig) -> Result<Self, StoreError> {
        Self::new(&config.root, config.id_width, config.json_extension)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn file_name(&self, height: u64) -> Result<String, StoreError> {
        let digits = format!("{height:0width$}", width = self.width);
        if digits.len() > self.width {
            return Err(StoreError::HeightTooWide {
                height,
                width: self.width,
            });
        }
        Ok(format!("{digits}{}", self.extension))
    }

    pub fn path_for(&self, height: u64) -> Result<PathBuf, StoreError> {
        Ok(self.root.join(self.file_name(height)?))
    }

    /// Parses a directory entry name; anything that is not exactly `width`
    /// ASCII digits plus the configured extension is not a record.
    pub fn parse_name(&self, name: &str) -> Option<u64> {
        let digits = name.strip_suffix(self.extension)?;
        if digits.len() != self.width || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok()
    }
}

impl Store for DirStore {
    fn put(&self, height: u64, payload: &Value) -> Result<(), StoreError> {
        let path = self.path_for(height)?;
        let body = serde_json::to_vec_pretty(payload)
            .map_err(|source| StoreError::Serialize { height, source })?;

        // Temp files start with '.', so they never pass `parse_name`.
        let mut temp = NamedTempFile::new_in(&self.root)?;
        temp.write_all(&body)?;
        temp.as_file().sync_all()?;
        temp.persist(&path).map_err(|e| StoreError::IO(e.error))?;

        debug!("wrote {}", path.display());
        Ok(())
    }

    fn heights(&self) -> Result<Vec<u64>, StoreError> {
        let mut heights = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str()
                && let Some(height) = self.parse_name(name)
            {
                heights.push(height);
            }
        }
        Ok(heights)
    }
}
