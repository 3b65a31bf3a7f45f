use std::cmp::Ordering;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::entity_table::{EntityTable, EntityTableRow};
use super::{CdfTable, ColumnType};
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::error::StoreError;
use crate::model::EventType;
use crate::model::store::{EntityStore, read_event};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventLogRow {
    pub case: String,
    pub rep: String,
    pub time: f64,
    pub primary_entity_id: String,
    pub primary_entity_name: String,
    pub primary_entity_type: String,
    pub primary_entity_commander: String,
    pub primary_entity_level: Option<u32>,
    pub primary_entity_affiliation: String,
    pub primary_entity_force: String,
    pub primary_x: Option<f64>,
    pub primary_y: Option<f64>,
    pub event_id: String,
    pub event_type: EventType,
    pub event_detail: String,
    pub secondary_entity_id: String,
    pub secondary_entity_name: String,
    pub secondary_entity_type: String,
    pub secondary_entity_commander: String,
    pub secondary_entity_level: Option<u32>,
    pub secondary_entity_affiliation: String,
    pub secondary_entity_force: String,
    pub secondary_x: Option<f64>,
    pub secondary_y: Option<f64>,
}

/// Every event in chronological order, enriched with both entities' details
/// and their last known positions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventLog {
    rows: Vec<EventLogRow>,
}

struct Draft {
    time: f64,
    primary: String,
    x: Option<f64>,
    y: Option<f64>,
    event_id: String,
    event_type: EventType,
    detail: String,
    secondary: Option<String>,
    secondary_x: Option<f64>,
    secondary_y: Option<f64>,
}

/// Entity columns copied onto each side of an event row.
#[derive(Default)]
struct Enrichment {
    id: String,
    name: String,
    unit_type: String,
    commander: String,
    level: Option<u32>,
    affiliation: String,
    force: String,
}

impl Enrichment {
    fn lookup(roster: &HashMap<&str, &EntityTableRow>, id: Option<&str>) -> Self {
        match id.and_then(|id| roster.get(id)) {
            Some(row) => Enrichment {
                id: row.id.clone(),
                name: row.name.clone(),
                unit_type: row.unit_type.clone(),
                commander: row.commander_id.clone(),
                level: Some(row.level),
                affiliation: row.affiliation.clone(),
                force: row.force.clone(),
            },
            None => Enrichment::default(),
        }
    }
}

impl EventLog {
    /// Build the event log.
    ///
    /// Rows are flattened per entity and type, sorted by time then type rank,
    /// and positions are forward-filled in that order. Positions of an entity
    /// are never back-filled to events before its first location update.
    pub fn build(
        store: &EntityStore,
        entity_table: &EntityTable,
        case: &str,
        rep: &str,
        diagnostics: &mut Diagnostics,
    ) -> Self {
        tracing::info!("generating event log");
        let mut drafts = flatten(store, diagnostics);

        drafts.sort_by(|a, b| {
            a.time
                .total_cmp(&b.time)
                .then_with(|| a.event_type.sort_rank().cmp(&b.event_type.sort_rank()))
        });

        fill_primary_positions(&mut drafts);
        fill_secondary_positions(&mut drafts);

        let roster: HashMap<&str, &EntityTableRow> = entity_table
            .rows()
            .iter()
            .map(|row| (row.id.as_str(), row))
            .collect();

        let rows = drafts
            .into_iter()
            .map(|draft| {
                let primary = Enrichment::lookup(&roster, Some(draft.primary.as_str()));
                let secondary = Enrichment::lookup(&roster, draft.secondary.as_deref());
                EventLogRow {
                    case: case.to_string(),
                    rep: rep.to_string(),
                    time: draft.time,
                    primary_entity_id: primary.id,
                    primary_entity_name: primary.name,
                    primary_entity_type: primary.unit_type,
                    primary_entity_commander: primary.commander,
                    primary_entity_level: primary.level,
                    primary_entity_affiliation: primary.affiliation,
                    primary_entity_force: primary.force,
                    primary_x: draft.x,
                    primary_y: draft.y,
                    event_id: draft.event_id,
                    event_type: draft.event_type,
                    event_detail: draft.detail,
                    secondary_entity_id: secondary.id,
                    secondary_entity_name: secondary.name,
                    secondary_entity_type: secondary.unit_type,
                    secondary_entity_commander: secondary.commander,
                    secondary_entity_level: secondary.level,
                    secondary_entity_affiliation: secondary.affiliation,
                    secondary_entity_force: secondary.force,
                    secondary_x: draft.secondary_x,
                    secondary_y: draft.secondary_y,
                }
            })
            .collect::<Vec<_>>();

        tracing::info!(rows = rows.len(), "event log generated");
        EventLog { rows }
    }

    /// Remove rows of the given types. Must run after the log is fully
    /// built so that dropped rows still fed the position fill.
    pub fn drop_event_types(&mut self, types: &[EventType]) -> usize {
        let before = self.rows.len();
        self.rows.retain(|row| !types.contains(&row.event_type));
        let dropped = before - self.rows.len();
        if dropped > 0 {
            tracing::info!(dropped, ?types, "dropped event types from event log");
        }
        dropped
    }

    pub fn of_type(&self, event_type: EventType) -> impl Iterator<Item = &EventLogRow> {
        self.rows.iter().filter(move |row| row.event_type == event_type)
    }

    pub fn get(&self, event_id: &str) -> Option<&EventLogRow> {
        self.rows.iter().find(|row| row.event_id == event_id)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Earliest and latest event time.
    pub fn time_span(&self) -> Option<(f64, f64)> {
        let mut times = self.rows.iter().map(|row| row.time);
        let first = times.next()?;
        Some(times.fold((first, first), |(lo, hi), t| {
            (
                if t.total_cmp(&lo) == Ordering::Less { t } else { lo },
                if t.total_cmp(&hi) == Ordering::Greater { t } else { hi },
            )
        }))
    }
}

fn flatten(store: &EntityStore, diagnostics: &mut Diagnostics) -> Vec<Draft> {
    let index = store.index();
    let mut drafts = Vec::with_capacity(index.len());
    for entity in store.entities() {
        let entries = index.entries_for(&entity.uid);
        for event_type in EventType::ALL {
            for entry in entries.iter().filter(|e| e.event_type == event_type) {
                let Some(data) = read_event(entity, entry) else {
                    diagnostics.push(Diagnostic::from(&StoreError::MismatchedListLengths {
                        uid: entity.uid.clone(),
                        event_type,
                        detail: format!(
                            "event {} has no values at position {}",
                            entry.event_id, entry.data_index
                        ),
                    }));
                    continue;
                };
                drafts.push(Draft {
                    time: data.time,
                    primary: data.primary,
                    x: data.x,
                    y: data.y,
                    event_id: data.event_id,
                    event_type,
                    detail: data.detail,
                    secondary: entry.secondary.clone().or(data.secondary),
                    secondary_x: None,
                    secondary_y: None,
                });
            }
        }
    }
    drafts
}

fn fill_primary_positions(drafts: &mut [Draft]) {
    let mut last: HashMap<String, (Option<f64>, Option<f64>)> = HashMap::new();
    for draft in drafts.iter_mut() {
        if draft.event_type == EventType::Location {
            last.insert(draft.primary.clone(), (draft.x, draft.y));
        } else if let Some((x, y)) = last.get(&draft.primary) {
            draft.x = *x;
            draft.y = *y;
        }
    }
}

/// Location rows are the only position samples. A non-location row with a
/// secondary entity takes that entity's last sampled position.
fn fill_secondary_positions(drafts: &mut [Draft]) {
    let mut trace: HashMap<String, (Option<f64>, Option<f64>)> = HashMap::new();
    for draft in drafts.iter_mut() {
        if draft.event_type == EventType::Location {
            let key = draft.secondary.clone().unwrap_or_else(|| draft.primary.clone());
            trace.insert(key, (draft.x, draft.y));
            continue;
        }
        if let Some((x, y)) = draft.secondary.as_ref().and_then(|s| trace.get(s)) {
            draft.secondary_x = *x;
            draft.secondary_y = *y;
        }
    }
}

impl CdfTable for EventLog {
    type Row = EventLogRow;

    const NAME: &'static str = "Events";

    const COLUMNS: &'static [(&'static str, ColumnType)] = &[
        ("case", ColumnType::String),
        ("rep", ColumnType::String),
        ("time", ColumnType::Float),
        ("primary_entity_id", ColumnType::String),
        ("primary_entity_name", ColumnType::String),
        ("primary_entity_type", ColumnType::String),
        ("primary_entity_commander", ColumnType::String),
        ("primary_entity_level", ColumnType::Integer),
        ("primary_entity_affiliation", ColumnType::String),
        ("primary_entity_force", ColumnType::String),
        ("primary_x", ColumnType::Float),
        ("primary_y", ColumnType::Float),
        ("event_id", ColumnType::String),
        ("event_type", ColumnType::String),
        ("event_detail", ColumnType::String),
        ("secondary_entity_id", ColumnType::String),
        ("secondary_entity_name", ColumnType::String),
        ("secondary_entity_type", ColumnType::String),
        ("secondary_entity_commander", ColumnType::String),
        ("secondary_entity_level", ColumnType::Integer),
        ("secondary_entity_affiliation", ColumnType::String),
        ("secondary_entity_force", ColumnType::String),
        ("secondary_x", ColumnType::Float),
        ("secondary_y", ColumnType::Float),
    ];

    fn rows(&self) -> &[EventLogRow] {
        &self.rows
    }
}
