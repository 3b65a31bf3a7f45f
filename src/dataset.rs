use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::DatasetConfig;
use crate::diagnostics::Diagnostics;
use crate::error::{ConfigError, MetadataError};
use crate::hierarchy::resolve_levels;
use crate::metadata::{Metadata, RunSummary};
use crate::model::{EntityStore, StoreState};
use crate::tables::{CombatPowerLedger, EntityTable, EventLog};
use crate::validate::{self, PreparedEntity};

/// Everything one finalize pass derives from the store.
#[derive(Debug, Clone, PartialEq)]
pub struct FinalizeReport {
    pub roster: Vec<PreparedEntity>,
    pub entity_table: EntityTable,
    pub event_log: EventLog,
    pub combat_power: CombatPowerLedger,
    pub summary: RunSummary,
    pub diagnostics: Diagnostics,
    /// Event log rows removed by the configured drops.
    pub dropped_events: usize,
}

/// Saved form of a dataset: the store plus metadata (which carries the config).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetState {
    pub metadata: Metadata,
    pub store: StoreState,
}

/// One processing run: configuration, the entity store being filled, run
/// metadata, and the views from the last finalize.
#[derive(Debug)]
pub struct Dataset {
    config: DatasetConfig,
    store: EntityStore,
    metadata: Metadata,
    report: Option<FinalizeReport>,
}

impl Dataset {
    pub fn new(config: DatasetConfig) -> Self {
        let metadata = Metadata::from_config(&config);
        Self {
            config,
            store: EntityStore::new(),
            metadata,
            report: None,
        }
    }

    pub fn config(&self) -> &DatasetConfig {
        &self.config
    }

    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    /// Mutable store access. Discards the last report, which no longer
    /// reflects the store.
    pub fn store_mut(&mut self) -> &mut EntityStore {
        self.report = None;
        &mut self.store
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Views from the last [`finalize`](Self::finalize), if any.
    pub fn report(&self) -> Option<&FinalizeReport> {
        self.report.as_ref()
    }

    /// Store diagnostics followed by those of the last finalize.
    pub fn diagnostics(&self) -> Diagnostics {
        let mut all = self.store.diagnostics().clone();
        if let Some(report) = &self.report {
            all.extend_quiet(&report.diagnostics);
        }
        all
    }

    /// Change one config setting and mirror it into metadata.
    pub fn update_config(&mut self, key: &str, value: Value) -> Result<(), ConfigError> {
        if let Err(err) = self.config.set(key, value) {
            tracing::error!(%err, "config update rejected");
            return Err(err);
        }
        if let Some(value) = self.config.to_map().get(key) {
            tracing::debug!(key, %value, "config updated");
            self.metadata.set(key, value.clone());
        }
        self.report = None;
        Ok(())
    }

    pub fn add_metadata(&mut self, key: &str, value: Value, replace: bool) -> Result<(), MetadataError> {
        self.metadata.add(key, value, replace).inspect_err(|err| {
            tracing::warn!(%err, "metadata not added");
        })
    }

    /// Derive the entity table, event log, and combat power ledger from the
    /// current store, checking each as it is built.
    ///
    /// Entities are never modified: defaults and resolved levels live only
    /// in the prepared roster, so calling this again without changes yields
    /// identical views.
    pub fn finalize(&mut self) -> &FinalizeReport {
        tracing::info!(
            case = %self.config.case,
            rep = %self.config.replication,
            entities = self.store.len(),
            "finalizing dataset"
        );
        let mut diagnostics = Diagnostics::new();
        let case = self.config.case.as_str();
        let rep = self.config.replication.as_str();

        validate::check_dataset_details(&self.config, &mut diagnostics);
        let hierarchy = resolve_levels(&self.store, &mut diagnostics);
        validate::check_store_consistency(&self.store, &mut diagnostics);
        let roster = validate::prepare_entities(
            &self.store,
            &hierarchy,
            self.config.force_unique_unit_names,
            &mut diagnostics,
        );

        let entity_table = EntityTable::build(&roster, self.store.index(), case, rep);
        validate::check_entity_table(&entity_table, &mut diagnostics);

        let mut event_log = EventLog::build(&self.store, &entity_table, case, rep, &mut diagnostics);
        validate::check_event_log(&event_log, &self.store, &roster, &mut diagnostics);

        let combat_power =
            CombatPowerLedger::build(&roster, &self.store, &event_log, case, rep, &mut diagnostics);
        validate::check_ledger(&combat_power, &mut diagnostics);

        let summary = RunSummary::compute(
            &entity_table,
            &event_log,
            &combat_power,
            &self.config.time_unit,
        );
        self.metadata.record_summary(&summary);

        let dropped_events = event_log.drop_event_types(&self.config.dropped_event_types());

        tracing::info!(
            events = event_log.len(),
            ledger_rows = combat_power.len(),
            diagnostics = diagnostics.len(),
            "dataset finalized"
        );
        self.report.insert(FinalizeReport {
            roster,
            entity_table,
            event_log,
            combat_power,
            summary,
            diagnostics,
            dropped_events,
        })
    }

    pub fn export_state(&self) -> DatasetState {
        DatasetState {
            metadata: self.metadata.clone(),
            store: self.store.export_state(),
        }
    }

    /// Rebuild a dataset from saved state. Config settings are read back
    /// from the metadata; views must be rebuilt with [`finalize`](Self::finalize).
    pub fn import_state(state: DatasetState) -> Self {
        let mut config = DatasetConfig::default();
        for (key, value) in state.metadata.iter() {
            if !DatasetConfig::is_setting(key) {
                continue;
            }
            if let Err(err) = config.set(key, value.clone()) {
                tracing::warn!(%err, "saved config setting ignored");
            }
        }
        let mut metadata = state.metadata;
        metadata.sync_config(&config);
        Self {
            config,
            store: EntityStore::import_state(state.store),
            metadata,
            report: None,
        }
    }
}
