//! `gitops_repo_config`: the layout of an existing GitOps repository.

use super::DataSource;
use crate::error::Result;
use crate::exec::{CommandLine, EnvOverlay, OutputChannel, REDACTED};
use crate::mutex::LockKey;
use crate::provider::Provider;
use crate::resources::types::{default_branch, default_server_name, require, to_json};
use crate::resources::{GitCredential, GitopsConfigResult, ResourceState};
use serde::Deserialize;
use std::fmt;
use tracing::{debug, info};

#[derive(Clone, Deserialize)]
pub struct RepoConfigSource {
    /// URL of the bootstrap repository.
    pub bootstrap_url: String,

    #[serde(default = "default_branch")]
    pub branch: String,

    #[serde(default = "default_server_name")]
    pub server_name: String,

    /// Defaults to the provider's username.
    #[serde(default)]
    pub username: String,

    /// Defaults to the provider's token.
    #[serde(default)]
    pub token: String,

    /// Defaults to the provider's CA certificate file.
    #[serde(default)]
    pub ca_cert_file: String,
}

impl fmt::Debug for RepoConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RepoConfigSource")
            .field("bootstrap_url", &self.bootstrap_url)
            .field("branch", &self.branch)
            .field("server_name", &self.server_name)
            .field("username", &self.username)
            .field("token", &REDACTED)
            .field("ca_cert_file", &self.ca_cert_file)
            .finish()
    }
}

impl RepoConfigSource {
    /// `repo-config:bootstrapUrl:branch`
    pub fn id(&self) -> String {
        format!("repo-config:{}:{}", self.bootstrap_url, self.branch)
    }

    fn credentials<'a>(&'a self, provider: &'a Provider) -> (&'a str, &'a str) {
        let config = provider.config();
        if self.username.is_empty() && self.token.is_empty() {
            (&config.username, &config.token)
        } else {
            (&self.username, &self.token)
        }
    }

    fn command_line(&self, provider: &Provider) -> CommandLine {
        let ca_cert = if self.ca_cert_file.is_empty() {
            &provider.config().ca_cert_file
        } else {
            &self.ca_cert_file
        };

        CommandLine::new("gitops-config")
            .positional(&self.bootstrap_url)
            .flag("--branch", &self.branch)
            .flag("--serverName", &self.server_name)
            .optional("--caCert", ca_cert)
            .flag_if("--debug", "true", provider.config().debug)
    }
}

impl DataSource for RepoConfigSource {
    fn kind(&self) -> &'static str {
        "gitops_repo_config"
    }

    fn read(&self, provider: &Provider) -> Result<ResourceState> {
        require("bootstrap_url", &self.bootstrap_url)?;
        let (username, token) = self.credentials(provider);

        let env = EnvOverlay::new()
            .var("GIT_USERNAME", username)
            .var("GIT_TOKEN", token)
            .with_git_identity(&provider.config().git_email, &provider.config().git_name);
        let invocation = provider
            .gitops(self.command_line(provider), env)
            .output(OutputChannel::JsonFile);

        info!(
            "Retrieving gitops config: bootstrapUrl={}, serverName={}",
            self.bootstrap_url, self.server_name
        );
        let config: GitopsConfigResult = provider
            .run_locked(&LockKey::for_url(&self.bootstrap_url), &invocation)?
            .json()?;
        debug!("Result values from gitops config");

        let credentials = vec![GitCredential {
            repo: "*".to_string(),
            url: "*".to_string(),
            username: username.to_string(),
            token: token.to_string(),
        }];

        Ok(ResourceState::new(self.id())
            .with("gitops_config", to_json(&config.normalized())?)
            .with("git_credentials", to_json(&credentials)?))
    }
}
