use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{CdfTable, ColumnType};
use crate::model::{EventIndex, EventType};
use crate::validate::PreparedEntity;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityTableRow {
    pub case: String,
    pub rep: String,
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub unit_type: String,
    pub commander_id: String,
    pub commander_name: String,
    pub level: u32,
    pub affiliation: String,
    pub force: String,
    pub init_comps: i64,
    pub cbt_per_comp: f64,
    pub init_cbt_pwr: f64,
    pub system_entity: bool,
    pub start_entity: bool,
    pub time_added: f64,
    pub total_events: usize,
    pub status_events: usize,
    pub location_events: usize,
    pub seen_events: usize,
    pub spot_events: usize,
    pub stop_events: usize,
    pub shot_events: usize,
    pub kill_events: usize,
    pub loss_events: usize,
}

/// One row per entity, in store insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntityTable {
    rows: Vec<EntityTableRow>,
}

impl EntityTable {
    /// Build the roster view. Commander names are looked up by id among the
    /// prepared entities and are empty when the commander is unknown.
    pub fn build(roster: &[PreparedEntity], index: &EventIndex, case: &str, rep: &str) -> Self {
        tracing::info!(entities = roster.len(), "generating entity table");
        let names: HashMap<&str, &str> = roster
            .iter()
            .map(|entity| (entity.uid.as_str(), entity.name.as_str()))
            .collect();
        let rows = roster
            .iter()
            .map(|entity| {
                let commander_name = names
                    .get(entity.commander.as_str())
                    .map(|name| name.to_string())
                    .unwrap_or_default();
                let count = |t: EventType| index.count_for(&entity.uid, t);
                EntityTableRow {
                    case: case.to_string(),
                    rep: rep.to_string(),
                    id: entity.uid.clone(),
                    name: entity.name.clone(),
                    unit_type: entity.unit_type.clone(),
                    commander_id: entity.commander.clone(),
                    commander_name,
                    level: entity.level,
                    affiliation: entity.affiliation.clone(),
                    force: entity.force.clone(),
                    init_comps: entity.init_comps,
                    cbt_per_comp: entity.cbt_per_comp,
                    init_cbt_pwr: entity.init_comps as f64 * entity.cbt_per_comp,
                    system_entity: entity.system_entity,
                    start_entity: entity.start_entity,
                    time_added: entity.add_time,
                    total_events: index.entries_for(&entity.uid).len(),
                    status_events: count(EventType::Status),
                    location_events: count(EventType::Location),
                    seen_events: count(EventType::Seen),
                    spot_events: count(EventType::Spot),
                    stop_events: count(EventType::Stop),
                    shot_events: count(EventType::Shot),
                    kill_events: count(EventType::Kill),
                    loss_events: count(EventType::Loss),
                }
            })
            .collect();
        EntityTable { rows }
    }

    pub fn get(&self, id: &str) -> Option<&EntityTableRow> {
        self.rows.iter().find(|row| row.id == id)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl CdfTable for EntityTable {
    type Row = EntityTableRow;

    const NAME: &'static str = "EntityTable";

    const COLUMNS: &'static [(&'static str, ColumnType)] = &[
        ("case", ColumnType::String),
        ("rep", ColumnType::String),
        ("id", ColumnType::String),
        ("name", ColumnType::String),
        ("type", ColumnType::String),
        ("commander_id", ColumnType::String),
        ("commander_name", ColumnType::String),
        ("level", ColumnType::Integer),
        ("affiliation", ColumnType::String),
        ("force", ColumnType::String),
        ("init_comps", ColumnType::Integer),
        ("cbt_per_comp", ColumnType::Float),
        ("init_cbt_pwr", ColumnType::Float),
        ("system_entity", ColumnType::Boolean),
        ("start_entity", ColumnType::Boolean),
        ("time_added", ColumnType::Float),
        ("total_events", ColumnType::Integer),
        ("status_events", ColumnType::Integer),
        ("location_events", ColumnType::Integer),
        ("seen_events", ColumnType::Integer),
        ("spot_events", ColumnType::Integer),
        ("stop_events", ColumnType::Integer),
        ("shot_events", ColumnType::Integer),
        ("kill_events", ColumnType::Integer),
        ("loss_events", ColumnType::Integer),
    ];

    fn rows(&self) -> &[EntityTableRow] {
        &self.rows
    }
}
