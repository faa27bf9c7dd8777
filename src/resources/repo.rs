//! `gitops_repo`: create (or adopt) the GitOps repository and report the
//! layout the other resources write into.

use super::Resource;
use super::types::*;
use crate::error::{ProviderError, Result};
use crate::exec::{CommandLine, EnvOverlay, OutputChannel, REDACTED};
use crate::mutex::LockKey;
use crate::provider::Provider;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, warn};

fn default_tmp_dir() -> String {
    ".tmp/gitops-init".to_string()
}

#[derive(Clone, Deserialize)]
pub struct RepoConfig {
    /// Git host. When host, username and token are not all set here, the
    /// provider-level git settings are used instead.
    #[serde(default)]
    pub host: String,

    #[serde(default)]
    pub org: String,

    #[serde(default)]
    pub project: String,

    /// Repository name. Defaults to the provider's `repo`.
    #[serde(default)]
    pub repo: String,

    #[serde(default)]
    pub username: String,

    #[serde(default)]
    pub token: String,

    /// Defaults to the provider's `branch`.
    #[serde(default)]
    pub branch: String,

    /// Defaults to the provider's `server_name`.
    #[serde(default)]
    pub server_name: String,

    #[serde(default)]
    pub ca_cert_file: String,

    #[serde(default = "default_argocd_namespace")]
    pub gitops_namespace: String,

    /// Certificate the GitOps tool stores for sealing secrets.
    #[serde(default)]
    pub sealed_secrets_cert: String,

    #[serde(default)]
    pub public: bool,

    /// Fail when the repository already exists.
    #[serde(default)]
    pub strict: bool,

    #[serde(default = "default_tmp_dir")]
    pub tmp_dir: String,
}

impl fmt::Debug for RepoConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RepoConfig")
            .field("host", &self.host)
            .field("org", &self.org)
            .field("project", &self.project)
            .field("repo", &self.repo)
            .field("username", &self.username)
            .field("token", &REDACTED)
            .field("branch", &self.branch)
            .field("server_name", &self.server_name)
            .field("public", &self.public)
            .field("strict", &self.strict)
            .finish_non_exhaustive()
    }
}

/// Fully resolved settings for one `gitops-init` call.
#[derive(Clone)]
struct ResolvedRepo {
    host: String,
    org: String,
    project: String,
    repo: String,
    username: String,
    token: String,
    branch: String,
    server_name: String,
    ca_cert_file: String,
    public: bool,
}

impl ResolvedRepo {
    /// `host/org[/project]/repo`
    fn id(&self) -> String {
        if self.project.is_empty() {
            format!("{}/{}/{}", self.host, self.org, self.repo)
        } else {
            format!("{}/{}/{}/{}", self.host, self.org, self.project, self.repo)
        }
    }

    fn lock_key(&self) -> LockKey {
        LockKey::for_repository(&self.host, &self.org, &self.project, &self.repo)
    }
}

impl RepoConfig {
    fn resolve(&self, provider: &Provider) -> Result<ResolvedRepo> {
        let defaults = provider.config();

        let own_credentials =
            !self.host.is_empty() && !self.username.is_empty() && !self.token.is_empty();
        let (host, org, project, username, token, ca_cert_file) = if own_credentials {
            (
                &self.host,
                &self.org,
                &self.project,
                &self.username,
                &self.token,
                &self.ca_cert_file,
            )
        } else {
            (
                &defaults.host,
                &defaults.org,
                &defaults.project,
                &defaults.username,
                &defaults.token,
                &defaults.ca_cert_file,
            )
        };

        if host.is_empty() || username.is_empty() || token.is_empty() {
            return Err(ProviderError::ConfigError(
                "host, username, and/or token values not provided".to_string(),
            ));
        }

        let repo = or_default(&self.repo, &defaults.repo);
        if repo.is_empty() {
            return Err(ProviderError::ConfigError(
                "repo name must be provided".to_string(),
            ));
        }

        Ok(ResolvedRepo {
            host: host.clone(),
            org: org.clone(),
            project: project.clone(),
            repo,
            username: username.clone(),
            token: token.clone(),
            branch: or_default(&self.branch, &defaults.branch),
            server_name: or_default(&self.server_name, &defaults.server_name),
            ca_cert_file: ca_cert_file.clone(),
            public: self.public || defaults.public,
        })
    }

    fn command_line(&self, repo: &ResolvedRepo, debug: bool, delete: bool) -> CommandLine {
        CommandLine::new("gitops-init")
            .positional(&repo.repo)
            .flag("--host", &repo.host)
            .flag("--org", &repo.org)
            .flag("--branch", &repo.branch)
            .flag("--serverName", &repo.server_name)
            .flag("--tmpDir", &self.tmp_dir)
            .switch("--debug", debug)
            .optional("--project", &repo.project)
            .optional("--caCertFile", &repo.ca_cert_file)
            .flag_if("--public", "true", repo.public)
            .flag_if("--strict", "true", self.strict)
            .switch("--delete", delete)
    }

    fn env(&self, repo: &ResolvedRepo) -> EnvOverlay {
        EnvOverlay::new()
            .var("GIT_USERNAME", &repo.username)
            .var("GIT_TOKEN", &repo.token)
            .var_if_set("KUBESEAL_CERT", &self.sealed_secrets_cert)
    }

    fn run(&self, provider: &Provider, repo: &ResolvedRepo, delete: bool) -> Result<RepoResult> {
        let debug = provider.config().debug;
        let invocation = provider
            .gitops(self.command_line(repo, debug, delete), self.env(repo))
            .output(OutputChannel::JsonFile);

        let mut result: RepoResult = provider.run_locked(&repo.lock_key(), &invocation)?.json()?;

        result.host = repo.host.clone();
        result.org = repo.org.clone();
        result.project = repo.project.clone();
        result.username = repo.username.clone();
        result.token = repo.token.clone();
        result.gitops_config = result.gitops_config.normalized();

        debug!(
            "Result values from gitops repo: {}, {}",
            result.repo, result.gitops_config.bootstrap.argocd_config.project
        );
        Ok(result)
    }
}

fn or_default(value: &str, default: &str) -> String {
    if value.is_empty() {
        default.to_string()
    } else {
        value.to_string()
    }
}

impl Resource for RepoConfig {
    fn kind(&self) -> &'static str {
        "gitops_repo"
    }

    fn create(&self, provider: &Provider) -> Result<ResourceState> {
        let repo = self.resolve(provider)?;

        info!(
            "Provisioning gitops repo: host={}, org={}, project={}, repo={}",
            repo.host, repo.org, repo.project, repo.repo
        );
        let result = self.run(provider, &repo, false)?;
        debug!("Create result: {}, {}", result.created, result.url);

        let credentials = vec![GitCredential {
            repo: result.repo.clone(),
            url: result.url.clone(),
            username: repo.username.clone(),
            token: repo.token.clone(),
        }];

        let mut state = ResourceState::new(repo.id())
            .with("created", result.created)
            .with("url", result.url.as_str())
            .with("repo_slug", result.repo.as_str())
            .with("sealed_secrets_cert", result.kubeseal_cert.as_str())
            .with("gitops_config", to_json(&result.gitops_config)?)
            .with("git_credentials", to_json(&credentials)?)
            .with("result_host", repo.host.as_str())
            .with("result_org", repo.org.as_str())
            .with("result_project", repo.project.as_str())
            .with("result_username", repo.username.as_str())
            .with("result_token", repo.token.as_str())
            .with("result_branch", repo.branch.as_str())
            .with("result_server_name", repo.server_name.as_str())
            .with("result_ca_cert_file", repo.ca_cert_file.as_str());

        if !repo.ca_cert_file.is_empty() {
            match std::fs::read_to_string(&repo.ca_cert_file) {
                Ok(cert) => state = state.with("result_ca_cert", cert),
                Err(e) => warn!(
                    "Unable to read CA certificate '{}': {}",
                    repo.ca_cert_file, e
                ),
            }
        }

        Ok(state)
    }

    fn delete(&self, provider: &Provider, prior: Option<&ResourceState>) -> Result<()> {
        if prior.and_then(|state| state.bool_attr("created")) != Some(true) {
            info!("Repository not created by this resource. Skipping delete");
            return Ok(());
        }

        let repo = self.resolve(provider)?;
        info!(
            "Deleting gitops repo: host={}, org={}, project={}, repo={}",
            repo.host, repo.org, repo.project, repo.repo
        );
        self.run(provider, &repo, true)?;
        Ok(())
    }
}

/// Result written by `gitops-init`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RepoResult {
    pub host: String,
    pub org: String,
    pub project: String,
    pub username: String,
    pub token: String,
    pub url: String,
    pub repo: String,
    pub created: bool,
    pub initialized: bool,
    pub gitops_config: GitopsConfigResult,
    pub kubeseal_cert: String,
}

/// Argo CD application settings for one layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArgocdConfig {
    pub project: String,
    pub repo: String,
    pub url: String,
    pub path: String,
}

/// Where a layer's content is written.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PayloadConfig {
    pub repo: String,
    pub url: String,
    pub path: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    #[serde(rename = "argocd-config")]
    pub argocd_config: ArgocdConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerConfig {
    #[serde(rename = "argocd-config")]
    pub argocd_config: ArgocdConfig,
    pub payload: PayloadConfig,
}

/// Layout of a GitOps repository: the bootstrap application and one entry
/// per layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GitopsConfigResult {
    pub bootstrap: BootstrapConfig,
    /// Misspelled mirror of `bootstrap` that existing consumers still read.
    pub boostrap: BootstrapConfig,
    pub infrastructure: LayerConfig,
    pub services: LayerConfig,
    pub applications: LayerConfig,
}

impl GitopsConfigResult {
    /// Copy `bootstrap` into `boostrap`.
    pub fn normalized(mut self) -> Self {
        self.boostrap = self.bootstrap.clone();
        self
    }
}

/// Credentials for one repository URL (`*` matches any).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GitCredential {
    pub repo: String,
    pub url: String,
    pub username: String,
    pub token: String,
}
