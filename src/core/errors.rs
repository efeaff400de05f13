//! Error types for the livemeasure-rs library.
//!
//! Errors are split along the lines the recomputation cares about: data
//! integrity violations and formula failures abort a branch, while
//! configuration, storage and serialization errors surface from the
//! collaborators around the engine.

use std::io;
use std::num::ParseFloatError;

use thiserror::Error;

/// Main result type for live measure operations.
pub type Result<T> = std::result::Result<T, LiveMeasureError>;

/// Error type for all live measure operations.
#[derive(Error, Debug)]
pub enum LiveMeasureError {
    /// External data is inconsistent (missing branch root, missing metric, ...)
    #[error("Integrity violation: {message}")]
    Integrity {
        /// Error description
        message: String,
        /// Additional context
        context: Option<String>,
    },

    /// A metric key was read or written without being registered first
    #[error("Metric with key {metric_key} is not registered")]
    UnknownMetric {
        /// Offending metric key
        metric_key: String,
    },

    /// A formula tried to read a metric it did not declare
    #[error("Metric {dependency} is not declared as a dependency of {metric_key}")]
    UndeclaredDependency {
        /// Metric of the formula being executed
        metric_key: String,
        /// Metric the formula attempted to read
        dependency: String,
    },

    /// A leaf or hierarchy step failed
    #[error("Fail to update measure {metric_key} on component {component_uuid}")]
    FormulaFailure {
        /// Metric of the failing formula
        metric_key: String,
        /// Component being computed
        component_uuid: String,
        /// Underlying failure
        #[source]
        source: Box<LiveMeasureError>,
    },

    /// Validation errors for input data
    #[error("Validation error: {message}")]
    Validation {
        /// Error description
        message: String,
        /// Field or input that failed validation
        field: Option<String>,
    },

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config {
        /// Error description
        message: String,
        /// Configuration field that caused the error
        field: Option<String>,
    },

    /// I/O related errors
    #[error("I/O error: {message}")]
    Io {
        /// Human-readable error message
        message: String,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Serialization/deserialization errors
    #[error("Serialization error: {message}")]
    Serialization {
        /// Error description
        message: String,
        /// Data type being serialized
        data_type: Option<String>,
        /// Underlying serialization error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Storage collaborator errors
    #[error("Storage error: {message}")]
    Storage {
        /// Error description
        message: String,
        /// Store operation that failed
        operation: Option<String>,
    },

    /// Generic internal errors
    #[error("Internal error: {message}")]
    Internal {
        /// Error description
        message: String,
        /// Additional context
        context: Option<String>,
    },
}

impl LiveMeasureError {
    /// Create a new integrity violation
    pub fn integrity(message: impl Into<String>) -> Self {
        Self::Integrity {
            message: message.into(),
            context: None,
        }
    }

    /// Create an unknown metric error
    pub fn unknown_metric(metric_key: impl Into<String>) -> Self {
        Self::UnknownMetric {
            metric_key: metric_key.into(),
        }
    }

    /// Wrap a failure raised while computing `metric_key` on `component_uuid`
    pub fn formula_failure(
        metric_key: impl Into<String>,
        component_uuid: impl Into<String>,
        source: LiveMeasureError,
    ) -> Self {
        Self::FormulaFailure {
            metric_key: metric_key.into(),
            component_uuid: component_uuid.into(),
            source: Box::new(source),
        }
    }

    /// Create a new validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            field: None,
        }
    }

    /// Create a new validation error bound to a field
    pub fn validation_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create a new I/O error with context
    pub fn io(message: impl Into<String>, source: io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }

    /// Create a new configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            field: None,
        }
    }

    /// Create a new configuration error with field context
    pub fn config_field(message: impl Into<String>, field: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            field: Some(field.into()),
        }
    }

    /// Create a new storage error
    pub fn storage(operation: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
            operation: Some(operation.into()),
        }
    }

    /// Create a new internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
            context: None,
        }
    }

    /// Add context to an existing error
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        match &mut self {
            Self::Integrity { context: ctx, .. } | Self::Internal { context: ctx, .. } => {
                *ctx = Some(context.into());
            }
            Self::Storage { operation, .. } if operation.is_none() => {
                *operation = Some(context.into());
            }
            _ => {}
        }
        self
    }

    /// Whether this error reports inconsistent external data, possibly
    /// wrapped inside a formula failure.
    pub fn is_integrity_violation(&self) -> bool {
        match self {
            Self::Integrity { .. } | Self::UnknownMetric { .. } => true,
            Self::FormulaFailure { source, .. } => source.is_integrity_violation(),
            _ => false,
        }
    }
}

impl From<io::Error> for LiveMeasureError {
    fn from(err: io::Error) -> Self {
        Self::io("I/O operation failed", err)
    }
}

impl From<serde_json::Error> for LiveMeasureError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            message: format!("JSON serialization failed: {err}"),
            data_type: Some("JSON".to_string()),
            source: Some(Box::new(err)),
        }
    }
}

impl From<serde_yaml::Error> for LiveMeasureError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::Serialization {
            message: format!("YAML serialization failed: {err}"),
            data_type: Some("YAML".to_string()),
            source: Some(Box::new(err)),
        }
    }
}

impl From<ParseFloatError> for LiveMeasureError {
    fn from(err: ParseFloatError) -> Self {
        Self::validation(format!("Invalid float: {err}"))
    }
}

/// Result extension trait for adding context to errors
pub trait ResultExt<T> {
    /// Add context to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;

    /// Add static context to an error result
    fn context(self, msg: &'static str) -> Result<T>;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<LiveMeasureError>,
{
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.into().with_context(f()))
    }

    fn context(self, msg: &'static str) -> Result<T> {
        self.map_err(|e| e.into().with_context(msg))
    }
}
