use std::collections::HashMap;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use super::event_log::EventLog;
use super::{CdfTable, ColumnType};
use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::model::{EntityStore, EventType};
use crate::validate::PreparedEntity;

/// Event id stamped on the time-zero seed rows.
pub const SEED_EVENT: &str = "none";
/// Event id stamped on a decrement row no loss event could be matched to.
pub const EVENT_NOT_FOUND: &str = "event not found";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerRow {
    pub case: String,
    pub rep: String,
    pub time: f64,
    pub item: String,
    pub components: i64,
    pub combat_power: f64,
    pub event_id: String,
}

/// Cumulative components and combat power per affiliation and per force.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CombatPowerLedger {
    rows: Vec<LedgerRow>,
}

struct Delta {
    time: f64,
    item: String,
    components: i64,
    combat_power: f64,
    seed: bool,
}

/// A loss row of the event log, with one claim per curve it can feed.
struct LossCandidate<'a> {
    time: f64,
    affiliation: &'a str,
    force: &'a str,
    event_id: &'a str,
    affiliation_claimed: bool,
    force_claimed: bool,
}

impl CombatPowerLedger {
    /// Build the ledger.
    ///
    /// Items are every distinct affiliation, then every distinct force, in
    /// roster order. Each is seeded at time zero with the summed initial
    /// strength of its entities. Every loss of an entity with components
    /// removes one component from both its affiliation and its force.
    pub fn build(
        roster: &[PreparedEntity],
        store: &EntityStore,
        event_log: &EventLog,
        case: &str,
        rep: &str,
        diagnostics: &mut Diagnostics,
    ) -> Self {
        tracing::info!("generating combat power ledger");
        let mut deltas = seed_rows(roster);

        for entity in roster {
            let Some(raw) = store.entity(&entity.uid) else {
                continue;
            };
            let losses = &raw.event_group(EventType::Loss).time;
            if entity.init_comps <= 0 {
                if !losses.is_empty() {
                    tracing::debug!(
                        uid = %entity.uid,
                        losses = losses.len(),
                        "skipping losses for entity without components"
                    );
                }
                continue;
            }
            for &time in losses {
                for item in [&entity.affiliation, &entity.force] {
                    deltas.push(Delta {
                        time,
                        item: item.clone(),
                        components: -1,
                        combat_power: -entity.cbt_per_comp,
                        seed: false,
                    });
                }
            }
        }

        deltas.sort_by(|a, b| a.time.total_cmp(&b.time).then_with(|| a.item.cmp(&b.item)));

        let comps_by_uid: HashMap<&str, i64> = roster
            .iter()
            .map(|e| (e.uid.as_str(), e.init_comps))
            .collect();
        let mut candidates: Vec<LossCandidate<'_>> = event_log
            .of_type(EventType::Loss)
            .filter(|row| comps_by_uid.get(row.primary_entity_id.as_str()).copied().unwrap_or(0) > 0)
            .map(|row| LossCandidate {
                time: row.time,
                affiliation: &row.primary_entity_affiliation,
                force: &row.primary_entity_force,
                event_id: &row.event_id,
                affiliation_claimed: false,
                force_claimed: false,
            })
            .collect();

        let mut totals: HashMap<String, (i64, f64)> = HashMap::new();
        let mut rows = Vec::with_capacity(deltas.len());
        for delta in deltas {
            let total = totals.entry(delta.item.clone()).or_insert((0, 0.0));
            total.0 += delta.components;
            total.1 += delta.combat_power;
            let (components, combat_power) = *total;

            let event_id = if delta.seed {
                SEED_EVENT.to_string()
            } else {
                match claim(&mut candidates, delta.time, &delta.item) {
                    Some(id) => id.to_string(),
                    None => {
                        diagnostics.push(Diagnostic::warning(
                            DiagnosticKind::AmbiguousLossAttribution,
                            format!(
                                "no loss event found for component drop of {} at time {}",
                                delta.item, delta.time
                            ),
                        ));
                        EVENT_NOT_FOUND.to_string()
                    }
                }
            };

            rows.push(LedgerRow {
                case: case.to_string(),
                rep: rep.to_string(),
                time: delta.time,
                item: delta.item,
                components,
                combat_power,
                event_id,
            });
        }

        tracing::info!(rows = rows.len(), "combat power ledger generated");
        CombatPowerLedger { rows }
    }

    /// Distinct items in first-appearance order.
    pub fn items(&self) -> Vec<&str> {
        let items: IndexSet<&str> = self.rows.iter().map(|row| row.item.as_str()).collect();
        items.into_iter().collect()
    }

    /// Rows for one item, in time order.
    pub fn series<'a>(&'a self, item: &'a str) -> impl Iterator<Item = &'a LedgerRow> {
        self.rows.iter().filter(move |row| row.item == item)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn seed_rows(roster: &[PreparedEntity]) -> Vec<Delta> {
    let affiliations: IndexSet<&str> = roster.iter().map(|e| e.affiliation.as_str()).collect();
    let forces: IndexSet<&str> = roster.iter().map(|e| e.force.as_str()).collect();

    let mut seeds = Vec::with_capacity(affiliations.len() + forces.len());
    for (item, by_force) in affiliations
        .iter()
        .map(|a| (*a, false))
        .chain(forces.iter().map(|f| (*f, true)))
    {
        let members = roster.iter().filter(|e| {
            if by_force {
                e.force == item
            } else {
                e.affiliation == item
            }
        });
        let (components, combat_power) = members.fold((0i64, 0.0f64), |(c, p), e| {
            (c + e.init_comps, p + e.init_comps as f64 * e.cbt_per_comp)
        });
        seeds.push(Delta {
            time: 0.0,
            item: item.to_string(),
            components,
            combat_power,
            seed: true,
        });
    }
    seeds
}

/// Claim the first unclaimed loss at `time` on `item`'s curve. The
/// affiliation curve is tried before the force curve.
fn claim<'a>(candidates: &mut [LossCandidate<'a>], time: f64, item: &str) -> Option<&'a str> {
    for candidate in candidates.iter_mut() {
        if candidate.time != time {
            continue;
        }
        if !candidate.affiliation_claimed && candidate.affiliation == item {
            candidate.affiliation_claimed = true;
            return Some(candidate.event_id);
        }
        if !candidate.force_claimed && candidate.force == item {
            candidate.force_claimed = true;
            return Some(candidate.event_id);
        }
    }
    None
}

impl CdfTable for CombatPowerLedger {
    type Row = LedgerRow;

    const NAME: &'static str = "Cbt_Pwr";

    const COLUMNS: &'static [(&'static str, ColumnType)] = &[
        ("case", ColumnType::String),
        ("rep", ColumnType::String),
        ("time", ColumnType::Float),
        ("item", ColumnType::String),
        ("components", ColumnType::Integer),
        ("combat_power", ColumnType::Float),
        ("event_id", ColumnType::String),
    ];

    fn rows(&self) -> &[LedgerRow] {
        &self.rows
    }
}
