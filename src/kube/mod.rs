//! kubectl and kubeseal helpers.
//!
//! These produce secret manifests and sealed secrets on the local disk. They
//! never touch a git repository, so none of them takes a lock.

mod seal;
mod secret;

#[cfg(test)]
mod tests;

pub use seal::{CERT_FILE_NAME, seal_dir, seal_file, write_cert};
pub use secret::{PullSecret, create_pull_secret};
