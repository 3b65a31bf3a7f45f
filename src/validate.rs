//! Entity preparation and consistency checks.
//!
//! Checks never block: every finding becomes a [`Diagnostic`] and the
//! pipeline carries on with predictable defaults.

use std::collections::{HashMap, HashSet};

use indexmap::{IndexMap, IndexSet};

use crate::config::DatasetConfig;
use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::error::StoreError;
use crate::hierarchy::Hierarchy;
use crate::model::detail::{NO_KEY, NO_VAL};
use crate::model::{EntityStore, EventType};
use crate::tables::{CdfTable, CombatPowerLedger, EntityTable, EventLog};

/// Stand-in for unset descriptive fields.
pub const NOT_SET: &str = "not set";
/// Appended to an affiliation to derive a missing force, and to a force that
/// collides with an affiliation.
pub const FORCE_SUFFIX: &str = " - Force";

/// An entity with every default applied, as it appears in the views.
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedEntity {
    pub uid: String,
    pub name: String,
    pub unit_type: String,
    pub commander: String,
    pub level: u32,
    pub affiliation: String,
    pub force: String,
    pub init_comps: i64,
    pub cbt_per_comp: f64,
    pub system_entity: bool,
    pub start_entity: bool,
    pub add_time: f64,
}

/// Warn about dataset descriptions left blank.
pub fn check_dataset_details(config: &DatasetConfig, diagnostics: &mut Diagnostics) {
    let details = [
        ("model_name", &config.model_name),
        ("data_name", &config.data_name),
        ("data_date", &config.data_date),
        ("data_details", &config.data_details),
        ("time_unit", &config.time_unit),
        ("distance_unit", &config.distance_unit),
        ("cbt_pwr_unit", &config.cbt_pwr_unit),
    ];
    for (label, value) in details {
        if value.trim().is_empty() {
            diagnostics.push(Diagnostic::warning(
                DiagnosticKind::MissingDatasetDetail,
                format!("{label} not set"),
            ));
        }
    }
}

/// Apply defaults, resolved levels, and name/force fixes to a copy of every
/// entity, in store order. The store itself is left untouched.
pub fn prepare_entities(
    store: &EntityStore,
    hierarchy: &Hierarchy,
    force_unique_names: bool,
    diagnostics: &mut Diagnostics,
) -> Vec<PreparedEntity> {
    let text = |v: &Option<String>| v.clone().unwrap_or_else(|| NOT_SET.to_string());

    let mut roster: Vec<PreparedEntity> = store
        .entities()
        .map(|entity| {
            let affiliation = text(&entity.affiliation);
            let force = entity
                .force
                .clone()
                .unwrap_or_else(|| format!("{affiliation}{FORCE_SUFFIX}"));
            let level = match hierarchy.level(&entity.uid) {
                Some(level) => level,
                None => {
                    diagnostics.push(
                        Diagnostic::warning(
                            DiagnosticKind::UnresolvedLevel,
                            format!("level for entity {} could not be resolved, set to 1", entity.uid),
                        )
                        .with_entity(entity.uid.as_str()),
                    );
                    1
                }
            };
            PreparedEntity {
                uid: entity.uid.clone(),
                name: text(&entity.name),
                unit_type: text(&entity.unit_type),
                commander: text(&entity.commander),
                level,
                affiliation,
                force,
                init_comps: entity.init_comps.unwrap_or(1),
                cbt_per_comp: entity.cbt_per_comp.unwrap_or(1.0),
                system_entity: entity.system_entity,
                start_entity: entity.start_entity,
                add_time: entity.add_time,
            }
        })
        .collect();

    let mut seen_names: HashMap<String, usize> = HashMap::new();
    for entity in &mut roster {
        let count = seen_names.entry(entity.name.to_lowercase()).or_insert(0);
        *count += 1;
        if *count == 1 {
            continue;
        }
        if force_unique_names {
            let renamed = format!("{}-{}", entity.name, count);
            tracing::info!(uid = %entity.uid, from = %entity.name, to = %renamed, "renamed repeated unit name");
            entity.name = renamed;
        } else {
            diagnostics.push(
                Diagnostic::warning(
                    DiagnosticKind::RepeatedName,
                    format!("name for entity {} ({}) is not unique", entity.uid, entity.name),
                )
                .with_entity(entity.uid.as_str()),
            );
        }
    }

    let affiliations: HashSet<String> = roster.iter().map(|e| e.affiliation.clone()).collect();
    for entity in &mut roster {
        if affiliations.contains(&entity.force) {
            diagnostics.push(
                Diagnostic::warning(
                    DiagnosticKind::ForceAffiliationCollision,
                    format!(
                        "force ({}) for entity {} is also an affiliation, renamed to {}{FORCE_SUFFIX}",
                        entity.force, entity.uid, entity.force
                    ),
                )
                .with_entity(entity.uid.as_str()),
            );
            entity.force.push_str(FORCE_SUFFIX);
        }
    }

    roster
}

/// Report event groups whose columns are out of step.
pub fn check_store_consistency(store: &EntityStore, diagnostics: &mut Diagnostics) {
    for issue in store.consistency_issues() {
        diagnostics.push(Diagnostic::from(&issue));
    }
}

/// Duplicate ids, and affiliations that map to more than one force.
pub fn check_entity_table(table: &EntityTable, diagnostics: &mut Diagnostics) {
    let before = diagnostics.len();

    let mut id_counts: IndexMap<&str, usize> = IndexMap::new();
    for row in table.rows() {
        *id_counts.entry(row.id.as_str()).or_insert(0) += 1;
    }
    for (id, count) in id_counts.into_iter().filter(|(_, count)| *count > 1) {
        diagnostics.push(
            Diagnostic::error(
                DiagnosticKind::DuplicateUid,
                format!("{count} instances of uid {id} in entity table"),
            )
            .with_entity(id),
        );
    }

    let mut forces: IndexMap<&str, IndexSet<&str>> = IndexMap::new();
    for row in table.rows() {
        forces
            .entry(row.affiliation.as_str())
            .or_default()
            .insert(row.force.as_str());
    }
    for (affiliation, mapped) in forces.into_iter().filter(|(_, f)| f.len() > 1) {
        let mapped: Vec<&str> = mapped.into_iter().collect();
        diagnostics.push(Diagnostic::error(
            DiagnosticKind::AffiliationForceConflict,
            format!("{affiliation} maps to multiple forces: {mapped:?}"),
        ));
    }

    log_check_outcome("entity table", diagnostics.len() - before);
}

/// Data-quality checks over the finished event log.
pub fn check_event_log(
    log: &EventLog,
    store: &EntityStore,
    roster: &[PreparedEntity],
    diagnostics: &mut Diagnostics,
) {
    let before = diagnostics.len();

    for row in log.rows() {
        let secondary = store
            .index()
            .lookup(&row.event_id)
            .and_then(|entry| entry.secondary.as_deref());
        if let Some(secondary) = secondary.filter(|s| !store.contains(s)) {
            diagnostics.push(
                Diagnostic::warning(
                    DiagnosticKind::UnknownSecondaryEntity,
                    format!(
                        "unrecognized secondary entity id {secondary} for event {}",
                        row.event_id
                    ),
                )
                .with_event(row.event_id.as_str()),
            );
        }

        if !row.time.is_finite() {
            let err = StoreError::TypeCastFailure {
                uid: row.primary_entity_id.clone(),
                target: format!("time of event {}", row.event_id),
                expected: "finite float",
            };
            diagnostics.push(Diagnostic::from(&err).with_event(row.event_id.as_str()));
        } else if row.time < 0.0 {
            diagnostics.push(
                Diagnostic::error(
                    DiagnosticKind::NegativeTime,
                    format!("negative time value of {} for event {}", row.time, row.event_id),
                )
                .with_event(row.event_id.as_str()),
            );
        }

        if row.event_detail.contains(NO_KEY) {
            diagnostics.push(
                Diagnostic::warning(
                    DiagnosticKind::DetailMissingKey,
                    format!("event {} at time {} had a detail value with no key", row.event_id, row.time),
                )
                .with_event(row.event_id.as_str()),
            );
        }
        if row.event_detail.contains(NO_VAL) {
            diagnostics.push(
                Diagnostic::warning(
                    DiagnosticKind::DetailMissingValue,
                    format!("event {} at time {} had a detail key with no value", row.event_id, row.time),
                )
                .with_event(row.event_id.as_str()),
            );
        }
    }

    for entity in roster {
        if entity.init_comps <= 0 {
            continue;
        }
        let losses = log
            .of_type(EventType::Loss)
            .filter(|row| row.primary_entity_id == entity.uid)
            .count();
        if losses as i64 > entity.init_comps {
            diagnostics.push(
                Diagnostic::error(
                    DiagnosticKind::LossesExceedComponents,
                    format!(
                        "entity {} suffered {losses} loss events but only had {} components",
                        entity.uid, entity.init_comps
                    ),
                )
                .with_entity(entity.uid.as_str()),
            );
        }
    }

    let mut involved: HashSet<&str> = HashSet::new();
    for row in log.rows() {
        involved.insert(row.primary_entity_id.as_str());
    }
    for event_id in log.rows().iter().map(|row| row.event_id.as_str()) {
        if let Some(secondary) = store.index().lookup(event_id).and_then(|e| e.secondary.as_deref()) {
            involved.insert(secondary);
        }
    }
    for entity in roster {
        if !involved.contains(entity.uid.as_str()) {
            diagnostics.push(
                Diagnostic::warning(
                    DiagnosticKind::InactiveEntity,
                    format!("entity {} not involved in any events", entity.uid),
                )
                .with_entity(entity.uid.as_str()),
            );
        }
    }

    log_check_outcome("event log", diagnostics.len() - before);
}

/// Negative times, and items whose cumulative components go negative.
pub fn check_ledger(ledger: &CombatPowerLedger, diagnostics: &mut Diagnostics) {
    let before = diagnostics.len();

    for row in ledger.rows().iter().filter(|row| row.time < 0.0) {
        diagnostics.push(
            Diagnostic::error(
                DiagnosticKind::NegativeTime,
                format!("negative time value {} in combat power ledger", row.time),
            )
            .with_event(row.event_id.as_str()),
        );
    }

    for item in ledger.items() {
        let negative: Vec<f64> = ledger
            .series(item)
            .filter(|row| row.components < 0)
            .map(|row| row.time)
            .collect();
        if !negative.is_empty() {
            diagnostics.push(Diagnostic::error(
                DiagnosticKind::NegativeComponents,
                format!("{item} had negative components at times {negative:?}"),
            ));
        }
    }

    log_check_outcome("combat power ledger", diagnostics.len() - before);
}

fn log_check_outcome(view: &str, issues: usize) {
    if issues == 0 {
        tracing::info!("no issues found in {view}");
    } else {
        tracing::warn!(issues, "potential issues found in {view}");
    }
}
