//! The three derived views: entity table, event log, and combat power ledger.
//!
//! Views are recomputed from the store on every finalize and never written
//! back. Each row type serializes its fields in the documented column order,
//! which the CSV and JSONL writers rely on.

pub mod combat_power;
pub mod entity_table;
pub mod event_log;

use serde::Serialize;

pub use combat_power::{CombatPowerLedger, EVENT_NOT_FOUND, LedgerRow, SEED_EVENT};
pub use entity_table::{EntityTable, EntityTableRow};
pub use event_log::{EventLog, EventLogRow};

/// Declared type of one output column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    String,
    Integer,
    Float,
    Boolean,
}

/// A table-shaped output with a fixed schema.
pub trait CdfTable {
    type Row: Serialize;

    /// Name used in output file names, e.g. `Events`.
    const NAME: &'static str;

    /// Column names and types, in output order.
    const COLUMNS: &'static [(&'static str, ColumnType)];

    fn rows(&self) -> &[Self::Row];
}
