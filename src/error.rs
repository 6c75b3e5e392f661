//! Error handling for depres-rs
//!
//! This module defines the crate-level error type and a Result alias used by
//! everything outside the resolver core (configuration loading, artifact
//! output, the binary). Resolution failures themselves are
//! [`ResolutionError`]s and convert into [`DepResError::Resolution`].

use crate::resolver::ResolutionError;
use thiserror::Error;

/// Main error type for depres-rs operations
#[derive(Error, Debug)]
pub enum DepResError {
    /// Dependency resolution failed
    #[error("Resolution error: {0}")]
    Resolution(#[from] ResolutionError),

    /// Errors related to configuration loading/saving
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<DepResError>,
    },
}

impl DepResError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        DepResError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// The resolution error at the root of this error, if any.
    pub fn as_resolution(&self) -> Option<&ResolutionError> {
        match self {
            DepResError::Resolution(e) => Some(e),
            DepResError::WithContext { source, .. } => source.as_resolution(),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for DepResError {
    fn from(err: serde_json::Error) -> Self {
        DepResError::Serialization(err.to_string())
    }
}

/// Result type alias for depres-rs operations
pub type Result<T> = std::result::Result<T, DepResError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.with_context(f()))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, ResolutionError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| DepResError::from(e).with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| DepResError::from(e).with_context(f()))
    }
}
