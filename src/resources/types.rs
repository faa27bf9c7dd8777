//! Types shared by the resource kinds.

use crate::error::{ProviderError, Result};
use crate::exec::{CommandLine, REDACTED};
use crate::mutex::LockKey;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

/// Helm repository hosting the toolkit charts.
pub const TOOLKIT_CHART_REPO: &str = "https://charts.cloudnativetoolkit.dev";

/// Argo CD namespace used when none is configured.
pub const DEFAULT_ARGOCD_NAMESPACE: &str = "openshift-gitops";

pub(crate) fn default_branch() -> String {
    "main".to_string()
}

pub(crate) fn default_server_name() -> String {
    "default".to_string()
}

pub(crate) fn default_true() -> bool {
    true
}

pub(crate) fn default_argocd_namespace() -> String {
    DEFAULT_ARGOCD_NAMESPACE.to_string()
}

/// Deployment-ordering category of GitOps content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Layer {
    #[default]
    Infrastructure,
    Services,
    Applications,
}

impl Layer {
    pub fn as_str(&self) -> &'static str {
        match self {
            Layer::Infrastructure => "infrastructure",
            Layer::Services => "services",
            Layer::Applications => "applications",
        }
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of module content within a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ModuleType {
    #[default]
    Base,
    Instances,
    Operators,
}

impl ModuleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModuleType::Base => "base",
            ModuleType::Instances => "instances",
            ModuleType::Operators => "operators",
        }
    }
}

impl fmt::Display for ModuleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the content of a module comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentSource {
    /// A directory of manifests.
    Directory(String),
    /// A Helm chart reference.
    Chart {
        repo_url: String,
        chart: String,
        version: String,
    },
}

impl ContentSource {
    /// Pick the content source from the resource fields.
    ///
    /// A content directory wins; otherwise all three chart fields must be set.
    pub fn from_fields(
        content_dir: &str,
        repo_url: &str,
        chart: &str,
        version: &str,
    ) -> Result<Self> {
        if !content_dir.is_empty() {
            return Ok(Self::Directory(content_dir.to_string()));
        }

        if !repo_url.is_empty() && !chart.is_empty() && !version.is_empty() {
            return Ok(Self::Chart {
                repo_url: repo_url.to_string(),
                chart: chart.to_string(),
                version: version.to_string(),
            });
        }

        Err(ProviderError::ConfigError(
            "contentDir or helmRepoUrl, helmChart, and helmChartVersion are required".to_string(),
        ))
    }

    /// A chart from the toolkit chart repository.
    pub fn toolkit_chart(chart: &str, version: &str) -> Self {
        Self::Chart {
            repo_url: TOOLKIT_CHART_REPO.to_string(),
            chart: chart.to_string(),
            version: version.to_string(),
        }
    }

    /// Append `--contentDir` or the three `--helm*` flags.
    pub fn append_to(&self, command: CommandLine) -> CommandLine {
        match self {
            ContentSource::Directory(dir) => command.flag("--contentDir", dir),
            ContentSource::Chart {
                repo_url,
                chart,
                version,
            } => command
                .flag("--helmRepoUrl", repo_url)
                .flag("--helmChart", chart)
                .flag("--helmChartVersion", version),
        }
    }

    /// The content directory, or an empty string for charts.
    pub fn content_dir(&self) -> &str {
        match self {
            ContentSource::Directory(dir) => dir,
            ContentSource::Chart { .. } => "",
        }
    }
}

/// Fields every resource that writes into a GitOps repository carries.
#[derive(Clone, Deserialize)]
pub struct GitopsTarget {
    #[serde(default = "default_branch")]
    pub branch: String,

    #[serde(default = "default_server_name")]
    pub server_name: String,

    /// Git credentials blob, passed as `GIT_CREDENTIALS`.
    #[serde(default)]
    pub credentials: String,

    /// GitOps config payload, passed as `GITOPS_CONFIG`.
    #[serde(default)]
    pub config: String,
}

impl GitopsTarget {
    pub fn validate(&self) -> Result<()> {
        require("credentials", &self.credentials)?;
        require("config", &self.config)
    }

    /// The serialization domain of the repository the config points at.
    pub fn lock_key(&self) -> LockKey {
        LockKey::for_gitops_config(&self.config)
    }
}

impl Default for GitopsTarget {
    fn default() -> Self {
        Self {
            branch: default_branch(),
            server_name: default_server_name(),
            credentials: String::new(),
            config: String::new(),
        }
    }
}

impl fmt::Debug for GitopsTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GitopsTarget")
            .field("branch", &self.branch)
            .field("server_name", &self.server_name)
            .field("credentials", &REDACTED)
            .field("config", &self.config)
            .finish()
    }
}

/// Persisted outcome of a resource or data source operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceState {
    pub id: String,

    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, serde_json::Value>,
}

impl ResourceState {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// Add a computed attribute.
    pub fn with(mut self, name: &str, value: impl Into<serde_json::Value>) -> Self {
        self.attributes.insert(name.to_string(), value.into());
        self
    }

    pub fn str_attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).and_then(|v| v.as_str())
    }

    pub fn bool_attr(&self, name: &str) -> Option<bool> {
        self.attributes.get(name).and_then(|v| v.as_bool())
    }
}

/// Fail with a configuration error when `value` is empty.
pub(crate) fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ProviderError::ConfigError(format!(
            "{} must be provided",
            field
        )));
    }
    Ok(())
}

/// Serialize a result into the JSON string stored as a state attribute.
pub(crate) fn to_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value)
        .map_err(|e| ProviderError::ParseError(format!("failed to serialize result: {}", e)))
}

/// Serialize `values` as YAML into `dir/values.yaml`, creating `dir`.
pub(crate) fn write_values<T: Serialize>(dir: &Path, values: &T) -> Result<PathBuf> {
    let yaml = serde_yaml::to_string(values).map_err(|e| {
        ProviderError::IoError(format!("failed to serialize values: {}", e))
    })?;

    std::fs::create_dir_all(dir).map_err(|e| {
        ProviderError::IoError(format!(
            "failed to create directory '{}': {}",
            dir.display(),
            e
        ))
    })?;

    let path = dir.join("values.yaml");
    std::fs::write(&path, yaml).map_err(|e| {
        ProviderError::IoError(format!(
            "failed to write values file '{}': {}",
            path.display(),
            e
        ))
    })?;

    Ok(path)
}
