//! Config loading, overrides, validation and CA certificate handling.

use super::model::{ConfigOverrides, ProviderConfig};
use super::types::CA_CERT_FILE_NAME;
use crate::error::{ProviderError, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::path::Path;
use tracing::debug;

impl ProviderConfig {
    /// Parse config from a YAML string and validate it.
    ///
    /// Unknown fields in the YAML are silently ignored for forward compatibility.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: ProviderConfig = serde_yaml::from_str(yaml).map_err(|e| {
            ProviderError::UserError(format!("failed to parse provider config YAML: {}", e))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply command-line overrides on top of the file values.
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        let fields = [
            (&mut self.bin_dir, &overrides.bin_dir),
            (&mut self.username, &overrides.username),
            (&mut self.token, &overrides.token),
            (&mut self.lock, &overrides.lock),
            (&mut self.ca_cert, &overrides.ca_cert),
            (&mut self.ca_cert_file, &overrides.ca_cert_file),
        ];

        for (field, value) in fields {
            if let Some(value) = value {
                *field = value.clone();
            }
        }

        self.debug |= overrides.debug;
    }

    /// Validate config values and return error on invalid values.
    ///
    /// Validation rules:
    /// - `lock` must be non-empty
    /// - `git_email` and `git_name` must be non-empty
    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("lock", &self.lock),
            ("git_email", &self.git_email),
            ("git_name", &self.git_name),
        ] {
            if value.trim().is_empty() {
                return Err(ProviderError::ConfigError(format!(
                    "provider {} must not be empty",
                    name
                )));
            }
        }

        Ok(())
    }

    /// Write the base64 `ca_cert` to `dir/git-ca.crt` and point
    /// `ca_cert_file` at it.
    ///
    /// Does nothing when no certificate is configured or when `ca_cert_file`
    /// is already set.
    pub fn materialize_ca_cert(&mut self, dir: &Path) -> Result<()> {
        if self.ca_cert.trim().is_empty() || !self.ca_cert_file.is_empty() {
            return Ok(());
        }

        let encoded: String = self.ca_cert.split_whitespace().collect();
        let pem = STANDARD.decode(encoded.as_bytes()).map_err(|e| {
            ProviderError::ConfigError(format!("ca_cert is not valid base64: {}", e))
        })?;

        let path = dir.join(CA_CERT_FILE_NAME);
        std::fs::write(&path, pem).map_err(|e| {
            ProviderError::IoError(format!(
                "failed to write CA certificate '{}': {}",
                path.display(),
                e
            ))
        })?;

        debug!("Wrote CA certificate to {}", path.display());
        self.ca_cert_file = path.display().to_string();
        Ok(())
    }
}
