//! `gitops_seal_secrets`: seal a directory of secret manifests.

use super::Resource;
use super::types::*;
use crate::error::Result;
use crate::kube::{seal_dir, write_cert};
use crate::provider::Provider;
use serde::Deserialize;
use std::path::Path;
use tracing::info;

fn default_tmp_dir() -> String {
    ".tmp/sealed-secrets".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct SealSecretsConfig {
    pub source_dir: String,
    pub dest_dir: String,
    pub kubeseal_cert: String,

    /// `key=value` annotations added to every sealed secret.
    #[serde(default)]
    pub annotations: Vec<String>,

    /// Where the certificate is written.
    #[serde(default = "default_tmp_dir")]
    pub tmp_dir: String,
}

impl SealSecretsConfig {
    fn validate(&self) -> Result<()> {
        require("source_dir", &self.source_dir)?;
        require("dest_dir", &self.dest_dir)?;
        require("kubeseal_cert", &self.kubeseal_cert)
    }

    /// `sealCert:source:dest`
    pub fn id(&self) -> String {
        format!("sealCert:{}:{}", self.source_dir, self.dest_dir)
    }
}

impl Resource for SealSecretsConfig {
    fn kind(&self) -> &'static str {
        "gitops_seal_secrets"
    }

    fn create(&self, provider: &Provider) -> Result<ResourceState> {
        self.validate()?;

        let cert_file = write_cert(Path::new(&self.tmp_dir), &self.kubeseal_cert)?;
        let sealed = seal_dir(
            provider,
            &cert_file,
            Path::new(&self.source_dir),
            Path::new(&self.dest_dir),
            &self.annotations,
        )?;
        info!("Sealed {} file(s) into {}", sealed.len(), self.dest_dir);

        let files: Vec<String> = sealed.iter().map(|p| p.display().to_string()).collect();
        Ok(ResourceState::new(self.id()).with("sealed_files", files))
    }

    /// Sealed files are left in place.
    fn delete(&self, _provider: &Provider, _prior: Option<&ResourceState>) -> Result<()> {
        Ok(())
    }
}
