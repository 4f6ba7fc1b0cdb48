//! Error types for configuration loading and validation.

use thiserror::Error;

/// Primary error type for configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Loading the layered configuration (file + environment) failed.
    #[error("failed to load configuration")]
    Load {
        /// Source error from the underlying provider chain.
        #[source]
        source: figment::Error,
    },
    /// A loaded settings snapshot failed validation.
    #[error("invalid configuration field {section}.{field}: {reason}")]
    Invalid {
        /// Section containing the invalid field (e.g. `path_profiles`).
        section: &'static str,
        /// Name of the invalid field.
        field: String,
        /// Human-readable reason for the failure.
        reason: String,
    },
}

/// Convenience alias for configuration results.
pub type ConfigResult<T> = Result<T, ConfigError>;
