//! Constants and default value functions used by ProviderConfig.

/// Author/committer email for every commit the GitOps tool makes.
pub const DEFAULT_GIT_EMAIL: &str = "cloudnativetoolkit@gmail.com";

/// Author/committer name for every commit the GitOps tool makes.
pub const DEFAULT_GIT_NAME: &str = "Cloud Native Toolkit";

/// File the decoded CA certificate is written to.
pub const CA_CERT_FILE_NAME: &str = "git-ca.crt";

pub fn default_lock() -> String {
    "branch".to_string()
}

pub fn default_branch() -> String {
    "main".to_string()
}

pub fn default_server_name() -> String {
    "default".to_string()
}

pub fn default_git_email() -> String {
    DEFAULT_GIT_EMAIL.to_string()
}

pub fn default_git_name() -> String {
    DEFAULT_GIT_NAME.to_string()
}
