//! dataweb-core — shared library for the dataweb instrument dashboard.
//!
//! Provides:
//! - `model` — feed snapshot types decoded from the block server JSON
//! - `labels` — instrument PV label translation table
//! - `projector` — snapshot → display rows (status/alarm/privacy rules)
//! - `render` — HTML and plain-text rendering of projected rows
//!
//! With `provider` feature (default):
//! - `provider` — feed source abstraction (file, HTTP with `http`)
//!
//! With `api` feature:
//! - `api` — JSON-serializable dashboard payload with OpenAPI schema

pub mod labels;
pub mod model;
pub mod projector;
pub mod render;

#[cfg(feature = "provider")]
pub mod provider;

#[cfg(feature = "api")]
pub mod api;

/// Crate version shown by `--version` and in the startup log.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_package_version() {
        assert_eq!(VERSION, env!("CARGO_PKG_VERSION"));
        assert!(!VERSION.is_empty());
    }
}
