//! Configuration models and loading for the Synapse core.
//!
//! This crate owns the Synapse config schema, validation, and file loading
//! used by embedding services and the SDK.

mod error;
mod loader;
mod model;

/// Public error type returned by config loading and validation APIs.
pub use error::ConfigError;
/// File loading and environment overlay helpers.
pub use loader::{API_KEY_ENV, from_env, load_from_path};
/// Configuration schema models.
pub use model::*;
