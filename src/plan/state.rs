//! Persisted state written after apply and destroy.

use crate::error::{ProviderError, Result};
use crate::resources::ResourceState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct State {
    /// When the state was last written (RFC3339).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub applied_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub resources: BTreeMap<String, ResourceState>,

    #[serde(default)]
    pub data: BTreeMap<String, ResourceState>,
}

impl State {
    /// Load state from `path`. A missing file means no prior state.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Option<Self>> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path).map_err(|e| {
            ProviderError::UserError(format!(
                "failed to read state file '{}': {}",
                path.display(),
                e
            ))
        })?;

        Self::from_json(&content).map(Some)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| ProviderError::UserError(format!("failed to parse state: {}", e)))
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| ProviderError::UserError(format!("failed to serialize state: {}", e)))
    }

    /// Stamp the state with the current time.
    pub fn touch(&mut self) {
        self.applied_at = Some(Utc::now());
    }

    /// Write the state to `path`, replacing it atomically.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let json = self.to_json()?;

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let write_error = |e: std::io::Error| {
            ProviderError::IoError(format!(
                "failed to write state file '{}': {}",
                path.display(),
                e
            ))
        };

        std::fs::create_dir_all(dir).map_err(write_error)?;
        let mut file = tempfile::NamedTempFile::new_in(dir).map_err(write_error)?;
        file.write_all(json.as_bytes()).map_err(write_error)?;
        file.write_all(b"\n").map_err(write_error)?;
        file.as_file().sync_all().map_err(write_error)?;
        file.persist(path).map_err(|e| write_error(e.error))?;

        Ok(())
    }
}
