/*!
 * Error types for the lexicat catalog.
 *
 * This module contains typed errors for the parts of the catalog whose
 * failures callers inspect, using the thiserror crate for ergonomic
 * error definitions. Record-store failures travel as `anyhow::Error`.
 */

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by a file store driver
#[derive(Error, Debug)]
pub enum StoreError {
    /// The locale is not part of the active or override locale set
    #[error("Locale '{0}' is not in the allowed locale set")]
    LocaleNotAllowed(String),

    /// Scope or locale sanitized down to nothing
    #[error("Cannot build a store path for scope '{scope}' and locale '{locale}'")]
    InvalidPath {
        /// Scope as given by the caller
        scope: String,
        /// Locale as given by the caller
        locale: String,
    },

    /// Filesystem failure while reading or writing a catalog file
    #[error("I/O error on {path:?}: {source}")]
    Io {
        /// File the operation targeted
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The catalog file exists but its body cannot be decoded
    #[error("Malformed catalog file {path:?}: {reason}")]
    Malformed {
        /// File that failed to decode
        path: PathBuf,
        /// Decoder message
        reason: String,
    },

    /// Serializing a snapshot failed
    #[error("Failed to encode catalog: {0}")]
    Encode(String),
}

impl StoreError {
    /// Build an I/O error bound to a path
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Configuration problems detected by `Config::validate`
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// `default_scope` is empty or sanitizes to nothing
    #[error("Default scope must be a non-empty name")]
    MissingDefaultScope,

    /// Config-sourced locales were selected but none are listed
    #[error("No locales configured while use_locales_from is 'config'")]
    NoLocales,

    /// A configured locale code contains characters outside [A-Za-z0-9_-]
    #[error("Invalid locale code: '{0}'")]
    InvalidLocale(String),

    /// Shared cache enabled with a zero time-to-live
    #[error("Shared cache TTL must be greater than zero")]
    InvalidTtl,
}
