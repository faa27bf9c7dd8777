//! Provider configuration for gitops-provider.
//!
//! This module defines the ProviderConfig struct that represents the
//! `provider:` block of a plan file. Unknown fields are ignored, every field
//! has a default, and CLI flags (or their environment variables) override
//! whatever the file says.

mod model;
mod operations;
pub mod types;


// Re-export public API
pub use model::{ConfigOverrides, ProviderConfig};
pub use types::{CA_CERT_FILE_NAME, DEFAULT_GIT_EMAIL, DEFAULT_GIT_NAME};
