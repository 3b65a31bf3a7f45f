use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::DatasetConfig;
use crate::error::MetadataError;
use crate::tables::{CombatPowerLedger, EntityTable, EventLog};

/// Ordered key/value description of a run: every config setting, then any
/// caller-supplied entries, then summary statistics once finalized.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata {
    entries: IndexMap<String, Value>,
}

impl Metadata {
    pub fn from_config(config: &DatasetConfig) -> Self {
        let mut metadata = Metadata::default();
        metadata.sync_config(config);
        metadata
    }

    /// Overwrite every config key with the current setting.
    pub(crate) fn sync_config(&mut self, config: &DatasetConfig) {
        for (key, value) in config.to_map() {
            self.entries.insert(key, value);
        }
    }

    pub(crate) fn set(&mut self, key: impl Into<String>, value: Value) {
        self.entries.insert(key.into(), value);
    }

    /// Add a caller-supplied entry.
    ///
    /// Config settings cannot be changed here, and an existing entry is only
    /// replaced when `replace` is set.
    pub fn add(&mut self, key: &str, value: Value, replace: bool) -> Result<(), MetadataError> {
        if DatasetConfig::is_setting(key) {
            return Err(MetadataError::ReservedKey(key.to_string()));
        }
        match self.entries.get_mut(key) {
            Some(_) if !replace => Err(MetadataError::KeyExists(key.to_string())),
            Some(existing) => {
                tracing::debug!(key, old = %existing, new = %value, "metadata updated");
                *existing = value;
                Ok(())
            }
            None => {
                tracing::debug!(key, %value, "metadata added");
                self.entries.insert(key.to_string(), value);
                Ok(())
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub(crate) fn record_summary(&mut self, summary: &RunSummary) {
        if let Ok(Value::Object(map)) = serde_json::to_value(summary) {
            for (key, value) in map {
                self.entries.insert(key, value);
            }
        }
    }
}

/// Summary statistics written to metadata on finalize.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    pub total_entities: usize,
    pub total_forces_and_affiliations: usize,
    pub total_events: usize,
    pub first_event: String,
    pub last_event: String,
}

impl RunSummary {
    /// Computed from the full event log, before any event types are dropped.
    pub fn compute(
        entity_table: &EntityTable,
        event_log: &EventLog,
        ledger: &CombatPowerLedger,
        time_unit: &str,
    ) -> Self {
        let (first_event, last_event) = match event_log.time_span() {
            Some((first, last)) => (
                format!("{first:?} {time_unit}"),
                format!("{last:?} {time_unit}"),
            ),
            None => ("no events".to_string(), "no events".to_string()),
        };
        RunSummary {
            total_entities: entity_table.len(),
            total_forces_and_affiliations: ledger.items().len(),
            total_events: event_log.len(),
            first_event,
            last_event,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn seeded_with_config_in_order() {
        let metadata = Metadata::from_config(&DatasetConfig::default());
        let keys: Vec<&str> = metadata.iter().map(|(k, _)| k).take(3).collect();
        assert_eq!(keys, vec!["serial", "case", "replication"]);
        assert_eq!(metadata.get("case"), Some(&json!("case_name")));
    }

    #[test]
    fn add_refuses_config_keys_and_overwrites() {
        let mut metadata = Metadata::from_config(&DatasetConfig::default());
        assert_eq!(
            metadata.add("case", json!("x"), true),
            Err(MetadataError::ReservedKey("case".into()))
        );
        metadata.add("analyst", json!("kim"), false).unwrap();
        assert_eq!(
            metadata.add("analyst", json!("lee"), false),
            Err(MetadataError::KeyExists("analyst".into()))
        );
        metadata.add("analyst", json!("lee"), true).unwrap();
        assert_eq!(metadata.get("analyst"), Some(&json!("lee")));
    }

    #[test]
    fn summary_formats_times_with_unit() {
        let summary = RunSummary::compute(
            &EntityTable::default(),
            &EventLog::default(),
            &CombatPowerLedger::default(),
            "s",
        );
        assert_eq!(summary.first_event, "no events");
        let mut metadata = Metadata::default();
        metadata.record_summary(&summary);
        assert_eq!(metadata.get("total_events"), Some(&json!(0)));
        assert_eq!(metadata.get("last_event"), Some(&json!("no events")));
    }
}
