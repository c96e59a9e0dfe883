//! stackd foundation layer
//!
//! Shared building blocks for the execution and server layers:
//! - `Error` / `Result` - central error taxonomy
//! - `Config` - process configuration from environment variables
//! - wire types - request bodies and the operation result envelope
//! - path helpers - lexical normalization for allowlist checks

pub mod config;
pub mod error;
pub mod paths;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
pub use types::{DestroyRequest, OperationResult, ProvisionRequest, StopRequest};
