//! Lock key derivation.

use std::fmt;

/// Key used when a gitops config payload names no repository at all.
const SHARED_KEY: &str = "gitops";

/// Layers whose repositories may be named in a gitops config payload, in the
/// order they are consulted when the bootstrap repository is absent.
const LAYERS: [&str; 3] = ["infrastructure", "services", "applications"];

/// Identity of a serialization domain in the [`MutexKv`](super::MutexKv).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LockKey(String);

impl LockKey {
    /// Wrap an already-derived key.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Key for a repository addressed by its parts (`gitops_repo`).
    ///
    /// Produces `host/org/repo`, or `host/org/project/repo` when a project is
    /// set, lower-cased so it lines up with [`LockKey::for_url`].
    pub fn for_repository(host: &str, org: &str, project: &str, repo: &str) -> Self {
        let parts: Vec<&str> = [host, org, project, repo]
            .into_iter()
            .map(|p| p.trim_matches('/'))
            .filter(|p| !p.is_empty())
            .collect();

        Self(parts.join("/").to_lowercase())
    }

    /// Key for a repository addressed by URL.
    pub fn for_url(url: &str) -> Self {
        Self(normalize_repo_url(url))
    }

    /// Key for an operation driven by a `GITOPS_CONFIG` payload.
    ///
    /// The bootstrap repository is the one every module of a cluster shares,
    /// so it names the domain. When it is absent the first layer repository
    /// is used; a payload that cannot be parsed falls back to one shared key.
    pub fn for_gitops_config(config: &str) -> Self {
        let Ok(value) = serde_yaml::from_str::<serde_yaml::Value>(config) else {
            return Self::new(SHARED_KEY);
        };

        let bootstrap = ["bootstrap", "boostrap"]
            .into_iter()
            .filter_map(|section| url_at(&value, &[section, "argocd-config", "url"]));

        let layers = LAYERS.into_iter().flat_map(|layer| {
            [
                url_at(&value, &[layer, "argocd-config", "url"]),
                url_at(&value, &[layer, "payload", "url"]),
            ]
            .into_iter()
            .flatten()
        });

        bootstrap
            .chain(layers)
            .next()
            .map(|url| Self::for_url(&url))
            .unwrap_or_else(|| Self::new(SHARED_KEY))
    }

    /// The key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LockKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn url_at(value: &serde_yaml::Value, path: &[&str]) -> Option<String> {
    let mut current = value;
    for segment in path {
        current = current.get(*segment)?;
    }
    current
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Reduce a git URL to `host/path` form.
///
/// Strips the scheme, user info, a trailing `.git` and trailing slashes, and
/// rewrites scp-like `git@host:org/repo` to `host/org/repo`.
pub(crate) fn normalize_repo_url(url: &str) -> String {
    let url = url.trim();

    let (without_scheme, had_scheme) = match url.split_once("://") {
        Some((_, rest)) => (rest, true),
        None => (url, false),
    };

    let without_user = match without_scheme.split_once('@') {
        Some((user, rest)) if !user.contains('/') => rest,
        _ => without_scheme,
    };

    let path = if had_scheme {
        without_user.to_string()
    } else {
        // scp-like syntax separates host and path with the first ':'
        match without_user.split_once(':') {
            Some((host, rest)) if !host.contains('/') => format!("{}/{}", host, rest),
            _ => without_user.to_string(),
        }
    };

    let path = path.trim_end_matches('/');
    let path = path.strip_suffix(".git").unwrap_or(path);

    path.trim_end_matches('/').to_lowercase()
}
