//! Error types for store, configuration, metadata, and output failures.
//!
//! Store errors are returned to the caller *and* recorded as diagnostics on
//! the store, so a batch loader can keep going and report everything at the
//! end.

use std::path::PathBuf;

use crate::diagnostics::DiagnosticKind;
use crate::model::EventType;

/// Errors raised by entity store operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    /// An entity with this uid already exists.
    #[error("entity with uid {0} already exists")]
    DuplicateEntity(String),

    /// No entity with this uid exists.
    #[error("no entity with uid {0}")]
    UnknownEntity(String),

    /// A field name that entities do not have.
    #[error("entity {uid}: unrecognized field {field}")]
    UnknownField { uid: String, field: String },

    /// An event list name outside the fixed set.
    #[error("unrecognized event list {0}")]
    UnrecognizedEventList(String),

    /// No event with this id exists.
    #[error("event {0} not found")]
    EventNotFound(String),

    /// The parallel columns of an event group are out of step.
    #[error("entity {uid}: {event_type} columns out of step ({detail})")]
    MismatchedListLengths {
        uid: String,
        event_type: EventType,
        detail: String,
    },

    /// A value could not be cast to the type its target requires.
    #[error("entity {uid}: cannot cast value for {target}, expected {expected}")]
    TypeCastFailure {
        uid: String,
        target: String,
        expected: &'static str,
    },
}

impl StoreError {
    pub fn kind(&self) -> DiagnosticKind {
        match self {
            Self::DuplicateEntity(_) => DiagnosticKind::DuplicateEntity,
            Self::UnknownEntity(_) => DiagnosticKind::UnknownEntity,
            Self::UnknownField { .. } => DiagnosticKind::UnknownField,
            Self::UnrecognizedEventList(_) => DiagnosticKind::UnrecognizedEventList,
            Self::EventNotFound(_) => DiagnosticKind::EventNotFound,
            Self::MismatchedListLengths { .. } => DiagnosticKind::MismatchedListLengths,
            Self::TypeCastFailure { .. } => DiagnosticKind::TypeCastFailure,
        }
    }

    /// The entity the error is about, if any.
    pub fn entity(&self) -> Option<&str> {
        match self {
            Self::DuplicateEntity(uid) | Self::UnknownEntity(uid) => Some(uid),
            Self::UnknownField { uid, .. }
            | Self::MismatchedListLengths { uid, .. }
            | Self::TypeCastFailure { uid, .. } => Some(uid),
            Self::UnrecognizedEventList(_) | Self::EventNotFound(_) => None,
        }
    }

    pub fn event(&self) -> Option<&str> {
        match self {
            Self::EventNotFound(id) => Some(id),
            _ => None,
        }
    }
}

/// Errors raised while loading or updating the dataset configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the config file.
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The config text is not valid JSON of the expected shape.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// The key is not a configuration setting.
    #[error("unknown config setting {0}")]
    UnknownSetting(String),

    /// The value does not fit the setting.
    #[error("invalid value for config setting {key}: {source}")]
    InvalidValue {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Reasons a metadata entry is refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MetadataError {
    /// The key names a configuration setting. Use `update_config` instead.
    #[error("metadata key {0} is a config setting")]
    ReservedKey(String),

    /// The key exists and replacement was not requested.
    #[error("metadata key {0} already exists")]
    KeyExists(String),
}

/// Errors raised while writing or reading output files.
#[derive(Debug, thiserror::Error)]
pub enum FlushError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error on {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("JSON error on {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
