//! Builds a Common Data Format (CDF) dataset from combat simulation output:
//! an entity store filled by ingestion code, and the entity table, event log,
//! and combat power ledger derived from it on finalize.

pub mod config;
pub mod dataset;
pub mod diagnostics;
pub mod error;
pub mod flush;
pub mod hierarchy;
pub mod id;
pub mod metadata;
pub mod model;
pub mod tables;
pub mod validate;

pub use config::DatasetConfig;
pub use dataset::{Dataset, DatasetState, FinalizeReport};
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics, Severity};
pub use error::{ConfigError, FlushError, MetadataError, StoreError};
pub use id::EventSequencer;
pub use model::{EntityStore, EventList, EventType};
pub use tables::{CombatPowerLedger, EntityTable, EventLog};
