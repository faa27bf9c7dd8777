//! `gitops_pull_secret`: an image pull secret sealed with the cluster's
//! kubeseal certificate and published as a module.

use super::Resource;
use super::module::ModuleRequest;
use super::types::*;
use crate::error::Result;
use crate::exec::REDACTED;
use crate::kube::{PullSecret, create_pull_secret, seal_dir, write_cert};
use crate::provider::Provider;
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::info;

const SECRET_FILE_NAME: &str = "pull-secret.yaml";

#[derive(Clone, Deserialize)]
pub struct PullSecretConfig {
    pub name: String,
    pub namespace: String,
    pub layer: Layer,

    #[serde(default, rename = "type")]
    pub module_type: ModuleType,

    /// Public certificate used to seal the secret.
    pub kubeseal_cert: String,

    pub registry_server: String,
    pub registry_username: String,
    pub registry_password: String,

    /// Name of the generated secret. Defaults to `name`.
    #[serde(default)]
    pub secret_name: String,

    /// Scratch directory. Defaults to `.tmp/pull_secret/<namespace>/<name>`.
    #[serde(default)]
    pub tmp_dir: String,

    #[serde(flatten)]
    pub target: GitopsTarget,
}

impl fmt::Debug for PullSecretConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PullSecretConfig")
            .field("name", &self.name)
            .field("namespace", &self.namespace)
            .field("layer", &self.layer)
            .field("module_type", &self.module_type)
            .field("registry_server", &self.registry_server)
            .field("registry_username", &self.registry_username)
            .field("registry_password", &REDACTED)
            .field("secret_name", &self.secret_name)
            .field("tmp_dir", &self.tmp_dir)
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

impl PullSecretConfig {
    fn validate(&self) -> Result<()> {
        require("name", &self.name)?;
        require("namespace", &self.namespace)?;
        require("kubeseal_cert", &self.kubeseal_cert)?;
        require("registry_server", &self.registry_server)?;
        require("registry_username", &self.registry_username)?;
        require("registry_password", &self.registry_password)?;
        self.target.validate()
    }

    fn tmp_dir(&self) -> PathBuf {
        if self.tmp_dir.is_empty() {
            Path::new(".tmp/pull_secret")
                .join(&self.namespace)
                .join(&self.name)
        } else {
            PathBuf::from(&self.tmp_dir)
        }
    }

    fn secret(&self) -> PullSecret {
        let name = if self.secret_name.is_empty() {
            &self.name
        } else {
            &self.secret_name
        };

        PullSecret {
            name: name.clone(),
            namespace: self.namespace.clone(),
            server: self.registry_server.clone(),
            username: self.registry_username.clone(),
            password: self.registry_password.clone(),
        }
    }

    /// Generate and seal the secret, returning the sealed directory.
    fn seal(&self, provider: &Provider) -> Result<String> {
        let tmp_dir = self.tmp_dir();
        let secret_dir = tmp_dir.join(&self.name).join("secrets");
        let sealed_dir = tmp_dir.join(&self.name).join("sealed-secrets");

        create_pull_secret(provider, &self.secret(), &secret_dir, SECRET_FILE_NAME)?;
        let cert_file = write_cert(&tmp_dir, &self.kubeseal_cert)?;
        seal_dir(provider, &cert_file, &secret_dir, &sealed_dir, &[])?;

        Ok(sealed_dir.display().to_string())
    }

    fn request<'a>(&'a self, source: &'a ContentSource) -> ModuleRequest<'a> {
        ModuleRequest {
            name: &self.name,
            namespace: &self.namespace,
            layer: self.layer,
            module_type: self.module_type,
            source,
            value_files: "",
            ignore_diff: "",
            target: &self.target,
        }
    }
}

impl Resource for PullSecretConfig {
    fn kind(&self) -> &'static str {
        "gitops_pull_secret"
    }

    fn create(&self, provider: &Provider) -> Result<ResourceState> {
        self.validate()?;

        info!(
            "Provisioning gitops pull secret: name={}, namespace={}, serverName={}",
            self.name, self.namespace, self.target.server_name
        );
        let source = ContentSource::Directory(self.seal(provider)?);
        let request = self.request(&source);
        request.run(provider, false)?;

        Ok(ResourceState::new(request.id()))
    }

    /// The module is removed by content, so the sealed secret is regenerated
    /// before the delete.
    fn delete(&self, provider: &Provider, _prior: Option<&ResourceState>) -> Result<()> {
        self.validate()?;

        info!(
            "Destroying gitops pull secret: name={}, namespace={}, serverName={}",
            self.name, self.namespace, self.target.server_name
        );
        let source = ContentSource::Directory(self.seal(provider)?);
        self.request(&source).run(provider, true)
    }
}
