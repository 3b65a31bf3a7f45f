use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::detail::encode_detail;
use super::entity::{Entity, EntityField};
use super::event::{Column, ColumnData, EventData, EventList, EventType, IndexEntry};
use super::event_index::EventIndex;
use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::error::StoreError;
use crate::id::EventSequencer;
use crate::tables::EntityTableRow;

/// Entities in insertion order, their columnar event data, and the event
/// index that ties event ids to that data.
///
/// Every failed operation is returned to the caller and also recorded in
/// [`EntityStore::diagnostics`].
#[derive(Debug, Default)]
pub struct EntityStore {
    entities: IndexMap<String, Entity>,
    index: EventIndex,
    diagnostics: Diagnostics,
}

/// Typed reference to an entity in an [`EntityStore`], enabling chained field mutation.
///
/// Created by [`EntityStore::add`] (creation) or [`EntityStore::entity_mut`] (mutation).
/// Call [`.uid()`](EntityRef::uid) to terminate the chain.
pub struct EntityRef<'a> {
    entity: &'a mut Entity,
}

impl<'a> EntityRef<'a> {
    pub fn name(self, v: &str) -> Self { self.entity.name = Some(v.to_string()); self }
    pub fn unit_type(self, v: &str) -> Self { self.entity.unit_type = Some(v.to_string()); self }
    pub fn commander(self, v: &str) -> Self { self.entity.commander = Some(v.to_string()); self }
    pub fn level(self, v: u32) -> Self { self.entity.level = Some(v); self }
    pub fn affiliation(self, v: &str) -> Self { self.entity.affiliation = Some(v.to_string()); self }
    pub fn force(self, v: &str) -> Self { self.entity.force = Some(v.to_string()); self }
    pub fn init_comps(self, v: i64) -> Self { self.entity.init_comps = Some(v); self }
    pub fn cbt_per_comp(self, v: f64) -> Self { self.entity.cbt_per_comp = Some(v); self }
    pub fn system_entity(self, v: bool) -> Self { self.entity.system_entity = v; self }
    pub fn start_entity(self, v: bool) -> Self { self.entity.start_entity = v; self }
    pub fn add_time(self, v: f64) -> Self { self.entity.add_time = v; self }

    /// Escape hatch: apply an arbitrary closure to the entity.
    pub fn with(self, f: impl FnOnce(&mut Entity)) -> Self { f(&mut *self.entity); self }

    /// Terminate the chain and return the entity uid.
    pub fn uid(self) -> &'a str {
        let entity = self.entity;
        &entity.uid
    }
}

/// Saved form of one entity: its fields, event groups, and index rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityState {
    pub entity: Entity,
    #[serde(default)]
    pub index: Vec<IndexEntry>,
}

/// Saved form of a whole store.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StoreState {
    pub entities: Vec<EntityState>,
    #[serde(default)]
    pub sequences: EventSequencer,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn fail<T>(&mut self, err: StoreError) -> Result<T, StoreError> {
        self.diagnostics.push(Diagnostic::from(&err));
        Err(err)
    }

    fn require(&mut self, uid: &str) -> Result<(), StoreError> {
        if self.entities.contains_key(uid) {
            Ok(())
        } else {
            self.fail(StoreError::UnknownEntity(uid.to_string()))
        }
    }

    // -- Entities --

    /// Create an entity with default fields.
    pub fn add_entity(&mut self, uid: impl Into<String>) -> Result<(), StoreError> {
        let uid = uid.into();
        if self.entities.contains_key(&uid) {
            return self.fail(StoreError::DuplicateEntity(uid));
        }
        self.entities.insert(uid.clone(), Entity::new(uid));
        Ok(())
    }

    /// Create an entity and return a builder for its fields.
    pub fn add(&mut self, uid: impl Into<String>) -> Result<EntityRef<'_>, StoreError> {
        let uid = uid.into();
        self.add_entity(uid.clone())?;
        self.entity_mut(&uid)
    }

    pub fn entity_mut(&mut self, uid: &str) -> Result<EntityRef<'_>, StoreError> {
        self.require(uid)?;
        Ok(EntityRef {
            entity: &mut self.entities[uid],
        })
    }

    /// Remove an entity together with every index row it owns. Events of
    /// other entities, including ones naming it as secondary, are untouched.
    pub fn remove_entity(&mut self, uid: &str) -> Result<Entity, StoreError> {
        match self.entities.shift_remove(uid) {
            Some(entity) => {
                let dropped = self.index.remove_entity(uid);
                tracing::debug!(uid, dropped, "removed entity");
                Ok(entity)
            }
            None => self.fail(StoreError::UnknownEntity(uid.to_string())),
        }
    }

    pub fn contains(&self, uid: &str) -> bool {
        self.entities.contains_key(uid)
    }

    pub fn entity(&self, uid: &str) -> Option<&Entity> {
        self.entities.get(uid)
    }

    /// Entities in insertion order.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    pub fn uids(&self) -> impl Iterator<Item = &str> {
        self.entities.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Set descriptive fields by name.
    ///
    /// Each field is applied on its own: a bad field is recorded and
    /// skipped while the rest still land. Returns the number applied, or the
    /// first error if any field failed.
    pub fn set_fields<I, K>(&mut self, uid: &str, fields: I) -> Result<usize, StoreError>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: AsRef<str>,
    {
        self.require(uid)?;
        let mut applied = 0;
        let mut first_err = None;
        for (name, value) in fields {
            let name = name.as_ref();
            let outcome = match EntityField::parse(name) {
                None => Err(StoreError::UnknownField {
                    uid: uid.to_string(),
                    field: name.to_string(),
                }),
                Some(field) => self.entities[uid].set_field(field, &value).map_err(|expected| {
                    StoreError::TypeCastFailure {
                        uid: uid.to_string(),
                        target: field.to_string(),
                        expected,
                    }
                }),
            };
            match outcome {
                Ok(()) => applied += 1,
                Err(err) => {
                    self.diagnostics.push(Diagnostic::from(&err));
                    first_err.get_or_insert(err);
                }
            }
        }
        match first_err {
            Some(err) => Err(err),
            None => Ok(applied),
        }
    }

    /// Seed entities from previously written entity table rows. Rows whose id
    /// already exists are recorded as duplicates and skipped. Returns the
    /// number of entities created.
    pub fn entities_from_table(&mut self, rows: &[EntityTableRow]) -> usize {
        let mut added = 0;
        for row in rows {
            let Ok(entity) = self.add(row.id.clone()) else {
                continue;
            };
            entity
                .name(&row.name)
                .unit_type(&row.unit_type)
                .commander(&row.commander_id)
                .level(row.level)
                .affiliation(&row.affiliation)
                .force(&row.force)
                .init_comps(row.init_comps)
                .cbt_per_comp(row.cbt_per_comp)
                .with(|entity| {
                    entity.system_entity = row.system_entity;
                    entity.start_entity = row.start_entity;
                    entity.add_time = row.time_added;
                });
            added += 1;
        }
        tracing::info!(added, rows = rows.len(), "seeded entities from table");
        added
    }

    // -- Bulk event columns --

    /// Append a batch of values to one event list of one entity.
    ///
    /// Appends to a trigger list mint one index row per value; the other
    /// lists of the same type are expected to be appended to the same length
    /// before the dataset is finalized. Returns the number of values appended.
    pub fn append_events(
        &mut self,
        uid: &str,
        list: EventList,
        values: impl Into<ColumnData>,
    ) -> Result<usize, StoreError> {
        self.require(uid)?;
        let values = values.into();
        let expected = list.column().kind();
        if values.kind() != expected {
            return self.fail(StoreError::TypeCastFailure {
                uid: uid.to_string(),
                target: list.name().to_string(),
                expected: expected.describe(),
            });
        }

        let event_type = list.event_type();
        let count = values.len();
        if list.is_trigger() {
            match (&values, list.column()) {
                (ColumnData::Text(secondaries), Column::Secondary) => {
                    for secondary in secondaries {
                        let secondary = Some(secondary.clone()).filter(|s| !s.is_empty());
                        self.index.record(event_type, uid, secondary);
                    }
                }
                _ => {
                    for _ in 0..count {
                        self.index.record(event_type, uid, None);
                    }
                }
            }
        }

        let group = self.entities[uid].events.get_mut(event_type);
        if let Err(kind) = group.extend(list.column(), values) {
            return self.fail(StoreError::TypeCastFailure {
                uid: uid.to_string(),
                target: list.name().to_string(),
                expected: kind.describe(),
            });
        }
        Ok(count)
    }

    /// [`append_events`](Self::append_events) with the list given by name.
    pub fn append_events_named(
        &mut self,
        uid: &str,
        list_name: &str,
        values: impl Into<ColumnData>,
    ) -> Result<usize, StoreError> {
        match EventList::parse(list_name) {
            Some(list) => self.append_events(uid, list, values),
            None => self.fail(StoreError::UnrecognizedEventList(list_name.to_string())),
        }
    }

    // -- Single events --

    fn add_event(
        &mut self,
        uid: &str,
        event_type: EventType,
        time: f64,
        secondary: Option<&str>,
        position: Option<(f64, f64)>,
        detail: String,
    ) -> Result<String, StoreError> {
        self.require(uid)?;
        let group = self.entities[uid].events.get_mut(event_type);
        group.time.push(time);
        if let Some((x, y)) = position {
            group.x.push(x);
            group.y.push(y);
        }
        if event_type.has_secondary() {
            group.secondary.push(secondary.unwrap_or_default().to_string());
        }
        group.detail.push(detail);

        let secondary = secondary.filter(|s| !s.is_empty()).map(str::to_string);
        let entry = self.index.record(event_type, uid, secondary);
        Ok(entry.event_id.clone())
    }

    /// Record a position report. Returns the new event id.
    pub fn add_location<K: AsRef<str>, V: AsRef<str>>(
        &mut self,
        uid: &str,
        time: f64,
        x: f64,
        y: f64,
        keys: &[K],
        vals: &[V],
    ) -> Result<String, StoreError> {
        let detail = encode_detail(keys, vals);
        self.add_event(uid, EventType::Location, time, None, Some((x, y)), detail)
    }

    pub fn add_shot<K: AsRef<str>, V: AsRef<str>>(
        &mut self,
        uid: &str,
        time: f64,
        keys: &[K],
        vals: &[V],
    ) -> Result<String, StoreError> {
        let detail = encode_detail(keys, vals);
        self.add_event(uid, EventType::Shot, time, None, None, detail)
    }

    /// Record that `uid` killed `victim`.
    pub fn add_kill<K: AsRef<str>, V: AsRef<str>>(
        &mut self,
        uid: &str,
        time: f64,
        victim: &str,
        keys: &[K],
        vals: &[V],
    ) -> Result<String, StoreError> {
        let detail = encode_detail(keys, vals);
        self.add_event(uid, EventType::Kill, time, Some(victim), None, detail)
    }

    /// Record that `uid` lost a component to `killer`.
    pub fn add_loss<K: AsRef<str>, V: AsRef<str>>(
        &mut self,
        uid: &str,
        time: f64,
        killer: &str,
        keys: &[K],
        vals: &[V],
    ) -> Result<String, StoreError> {
        let detail = encode_detail(keys, vals);
        self.add_event(uid, EventType::Loss, time, Some(killer), None, detail)
    }

    pub fn add_spot<K: AsRef<str>, V: AsRef<str>>(
        &mut self,
        uid: &str,
        time: f64,
        spotted: &str,
        keys: &[K],
        vals: &[V],
    ) -> Result<String, StoreError> {
        let detail = encode_detail(keys, vals);
        self.add_event(uid, EventType::Spot, time, Some(spotted), None, detail)
    }

    pub fn add_seen<K: AsRef<str>, V: AsRef<str>>(
        &mut self,
        uid: &str,
        time: f64,
        seen_by: &str,
        keys: &[K],
        vals: &[V],
    ) -> Result<String, StoreError> {
        let detail = encode_detail(keys, vals);
        self.add_event(uid, EventType::Seen, time, Some(seen_by), None, detail)
    }

    pub fn add_stop<K: AsRef<str>, V: AsRef<str>>(
        &mut self,
        uid: &str,
        time: f64,
        lost_sight_of: &str,
        keys: &[K],
        vals: &[V],
    ) -> Result<String, StoreError> {
        let detail = encode_detail(keys, vals);
        self.add_event(uid, EventType::Stop, time, Some(lost_sight_of), None, detail)
    }

    pub fn add_status<K: AsRef<str>, V: AsRef<str>>(
        &mut self,
        uid: &str,
        time: f64,
        keys: &[K],
        vals: &[V],
    ) -> Result<String, StoreError> {
        let detail = encode_detail(keys, vals);
        self.add_event(uid, EventType::Status, time, None, None, detail)
    }

    // -- Event lookup and removal --

    /// Read back one event. Lookups do not record diagnostics.
    pub fn get_event_data(&self, event_id: &str) -> Result<EventData, StoreError> {
        let entry = self
            .index
            .lookup(event_id)
            .ok_or_else(|| StoreError::EventNotFound(event_id.to_string()))?;
        let entity = self
            .entities
            .get(&entry.primary)
            .ok_or_else(|| StoreError::UnknownEntity(entry.primary.clone()))?;
        read_event(entity, entry).ok_or_else(|| StoreError::MismatchedListLengths {
            uid: entry.primary.clone(),
            event_type: entry.event_type,
            detail: format!("no values at position {}", entry.data_index),
        })
    }

    /// Remove one event: its index row and the values at its position in
    /// every column of its group. Later events of the same type for the same
    /// entity keep resolving to their own values.
    pub fn remove_event(&mut self, event_id: &str) -> Result<IndexEntry, StoreError> {
        let Some(entry) = self.index.lookup(event_id).cloned() else {
            return self.fail(StoreError::EventNotFound(event_id.to_string()));
        };
        if let Some(entity) = self.entities.get_mut(&entry.primary) {
            let group = entity.events.get_mut(entry.event_type);
            if !group.remove(entry.event_type, entry.data_index) {
                let err = StoreError::MismatchedListLengths {
                    uid: entry.primary.clone(),
                    event_type: entry.event_type,
                    detail: format!("position {} missing from some columns", entry.data_index),
                };
                self.diagnostics.push(Diagnostic::from(&err));
            }
        }
        self.index.remove(event_id);
        Ok(entry)
    }

    /// All event ids, sorted.
    pub fn event_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.index.event_ids().map(str::to_string).collect();
        ids.sort();
        ids
    }

    pub fn index(&self) -> &EventIndex {
        &self.index
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Column groups whose lengths disagree with each other or with the
    /// number of index rows of that type.
    pub fn consistency_issues(&self) -> Vec<StoreError> {
        let mut issues = Vec::new();
        for entity in self.entities.values() {
            for event_type in EventType::ALL {
                let group = entity.events.get(event_type);
                let indexed = self.index.count_for(&entity.uid, event_type);
                if group.consistent_len(event_type) == Some(indexed) {
                    continue;
                }
                let detail = group
                    .lengths(event_type)
                    .iter()
                    .map(|(column, len)| format!("{column:?}={len}"))
                    .chain(std::iter::once(format!("indexed={indexed}")))
                    .collect::<Vec<_>>()
                    .join(" ");
                issues.push(StoreError::MismatchedListLengths {
                    uid: entity.uid.clone(),
                    event_type,
                    detail,
                });
            }
        }
        issues
    }

    // -- State --

    pub fn export_state(&self) -> StoreState {
        StoreState {
            entities: self
                .entities
                .values()
                .map(|entity| EntityState {
                    entity: entity.clone(),
                    index: self.index.entries_for(&entity.uid).to_vec(),
                })
                .collect(),
            sequences: *self.index.sequencer(),
        }
    }

    /// Rebuild a store from saved state. Problems in the saved data are
    /// recorded as diagnostics on the new store.
    pub fn import_state(state: StoreState) -> Self {
        let mut store = EntityStore::new();
        for EntityState { entity, index } in state.entities {
            let uid = entity.uid.clone();
            if store.entities.contains_key(&uid) {
                store
                    .diagnostics
                    .push(Diagnostic::from(&StoreError::DuplicateEntity(uid)));
                continue;
            }
            store.entities.insert(uid.clone(), entity);
            for rejected in store.index.restore(&uid, index) {
                store.diagnostics.push(
                    Diagnostic::error(
                        DiagnosticKind::DuplicateEventId,
                        format!("saved event id {} appears more than once", rejected.event_id),
                    )
                    .with_entity(uid.as_str())
                    .with_event(rejected.event_id),
                );
            }
        }
        store.index.restore_sequencer(&state.sequences);
        for issue in store.consistency_issues() {
            store.diagnostics.push(Diagnostic::from(&issue));
        }
        tracing::info!(
            entities = store.len(),
            events = store.index.len(),
            "imported store state"
        );
        store
    }
}

/// Resolve one index row against its entity's group.
pub(crate) fn read_event(entity: &Entity, entry: &IndexEntry) -> Option<EventData> {
    let group = entity.events.get(entry.event_type);
    let i = entry.data_index;
    let time = *group.time.get(i)?;
    let detail = group.detail.get(i)?.clone();
    let (x, y) = if entry.event_type == EventType::Location {
        (Some(*group.x.get(i)?), Some(*group.y.get(i)?))
    } else {
        (None, None)
    };
    let secondary = if entry.event_type.has_secondary() {
        let stored = group.secondary.get(i)?;
        Some(stored.clone()).filter(|s| !s.is_empty())
    } else {
        None
    };
    Some(EventData {
        event_id: entry.event_id.clone(),
        event_type: entry.event_type,
        time,
        primary: entry.primary.clone(),
        secondary,
        detail,
        x,
        y,
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::model::detail::NO_DETAIL;

    fn store_with(uids: &[&str]) -> EntityStore {
        let mut store = EntityStore::new();
        for uid in uids {
            store.add_entity(*uid).unwrap();
        }
        store
    }

    #[test]
    fn duplicate_entity_is_rejected_and_recorded() {
        let mut store = store_with(&["a"]);
        assert_eq!(
            store.add_entity("a"),
            Err(StoreError::DuplicateEntity("a".into()))
        );
        assert_eq!(store.len(), 1);
        assert_eq!(store.diagnostics().count(DiagnosticKind::DuplicateEntity), 1);
    }

    #[test]
    fn builder_sets_fields() {
        let mut store = EntityStore::new();
        let uid = store
            .add("tank-1")
            .unwrap()
            .name("Alpha")
            .affiliation("blue")
            .init_comps(4)
            .uid()
            .to_string();
        let e = store.entity(&uid).unwrap();
        assert_eq!(e.name.as_deref(), Some("Alpha"));
        assert_eq!(e.init_comps, Some(4));
    }

    #[test]
    fn set_fields_applies_good_fields_and_reports_bad_ones() {
        let mut store = store_with(&["a"]);
        let result = store.set_fields(
            "a",
            [
                ("name", json!("Alpha")),
                ("colour", json!("red")),
                ("init_comps", json!("lots")),
                ("level", json!(2)),
            ],
        );
        assert!(matches!(result, Err(StoreError::UnknownField { .. })));
        let e = store.entity("a").unwrap();
        assert_eq!(e.name.as_deref(), Some("Alpha"));
        assert_eq!(e.level, Some(2));
        assert_eq!(e.init_comps, None);
        assert_eq!(store.diagnostics().count(DiagnosticKind::TypeCastFailure), 1);
        assert_eq!(store.diagnostics().count(DiagnosticKind::UnknownField), 1);
    }

    #[test]
    fn set_fields_on_unknown_entity() {
        let mut store = EntityStore::new();
        let err = store.set_fields("ghost", [("name", json!("x"))]).unwrap_err();
        assert_eq!(err, StoreError::UnknownEntity("ghost".into()));
    }

    #[test]
    fn single_events_get_sequential_ids() {
        let mut store = store_with(&["a", "b"]);
        assert_eq!(store.add_shot("a", 1.0, NO_DETAIL, NO_DETAIL).unwrap(), "shot-1");
        assert_eq!(store.add_shot("b", 2.0, NO_DETAIL, NO_DETAIL).unwrap(), "shot-2");
        assert_eq!(store.add_kill("a", 2.0, "b", NO_DETAIL, NO_DETAIL).unwrap(), "kill-1");
        assert_eq!(
            store.add_location("a", 0.0, 1.0, 2.0, NO_DETAIL, NO_DETAIL).unwrap(),
            "loc-1"
        );
        assert_eq!(store.event_ids(), vec!["kill-1", "loc-1", "shot-1", "shot-2"]);
    }

    #[test]
    fn event_data_reads_back() {
        let mut store = store_with(&["a", "b"]);
        let id = store.add_loss("a", 4.5, "b", &["cause"], &["mine"]).unwrap();
        let data = store.get_event_data(&id).unwrap();
        assert_eq!(data.event_type, EventType::Loss);
        assert_eq!(data.time, 4.5);
        assert_eq!(data.secondary.as_deref(), Some("b"));
        assert_eq!(data.detail, r#"{"cause":"mine"}"#);
        assert!(data.x.is_none());

        let loc = store.add_location("a", 5.0, 10.0, 20.0, NO_DETAIL, NO_DETAIL).unwrap();
        let data = store.get_event_data(&loc).unwrap();
        assert_eq!((data.x, data.y), (Some(10.0), Some(20.0)));
    }

    #[test]
    fn unknown_entity_for_event() {
        let mut store = EntityStore::new();
        assert_eq!(
            store.add_status("nobody", 0.0, NO_DETAIL, NO_DETAIL),
            Err(StoreError::UnknownEntity("nobody".into()))
        );
        assert!(store.index().is_empty());
    }

    #[test]
    fn bulk_trigger_append_mints_ids() {
        let mut store = store_with(&["a"]);
        store
            .append_events_named("a", "kills_victim", vec!["b", "c"])
            .unwrap();
        store
            .append_events_named("a", "KILLS_TIME", vec![1.0, 2.0])
            .unwrap();
        store
            .append_events_named("a", "kills_detail", vec!["{}", "{}"])
            .unwrap();
        assert_eq!(store.event_ids(), vec!["kill-1", "kill-2"]);
        let second = store.get_event_data("kill-2").unwrap();
        assert_eq!(second.secondary.as_deref(), Some("c"));
        assert_eq!(second.time, 2.0);
        assert!(store.consistency_issues().is_empty());
    }

    #[test]
    fn non_trigger_append_mints_nothing() {
        let mut store = store_with(&["a"]);
        store.append_events_named("a", "location_x", vec![1.0]).unwrap();
        assert!(store.index().is_empty());
        assert_eq!(store.consistency_issues().len(), 1);
    }

    #[test]
    fn bulk_append_type_checks() {
        let mut store = store_with(&["a"]);
        let err = store
            .append_events_named("a", "shots_time", vec!["soon"])
            .unwrap_err();
        assert!(matches!(err, StoreError::TypeCastFailure { .. }));
        assert!(store.index().is_empty());
        assert!(store.entity("a").unwrap().events.shots.time.is_empty());
    }

    #[test]
    fn unrecognized_list_name() {
        let mut store = store_with(&["a"]);
        assert_eq!(
            store.append_events_named("a", "kills_x", vec![1.0]),
            Err(StoreError::UnrecognizedEventList("kills_x".into()))
        );
    }

    #[test]
    fn remove_event_keeps_other_events_intact() {
        let mut store = store_with(&["a"]);
        store.add_shot("a", 1.0, &["n"], &["1"]).unwrap();
        store.add_shot("a", 2.0, &["n"], &["2"]).unwrap();
        store.add_shot("a", 3.0, &["n"], &["3"]).unwrap();

        store.remove_event("shot-2").unwrap();

        assert_eq!(store.get_event_data("shot-1").unwrap().time, 1.0);
        let third = store.get_event_data("shot-3").unwrap();
        assert_eq!(third.time, 3.0);
        assert_eq!(third.detail, r#"{"n":"3"}"#);
        assert_eq!(
            store.get_event_data("shot-2"),
            Err(StoreError::EventNotFound("shot-2".into()))
        );
        assert!(store.consistency_issues().is_empty());
    }

    #[test]
    fn remove_missing_event() {
        let mut store = store_with(&["a"]);
        assert!(store.remove_event("loc-7").is_err());
        assert_eq!(store.diagnostics().count(DiagnosticKind::EventNotFound), 1);
    }

    #[test]
    fn remove_entity_drops_its_index_rows() {
        let mut store = store_with(&["a", "b"]);
        store.add_kill("a", 1.0, "b", NO_DETAIL, NO_DETAIL).unwrap();
        store.add_loss("b", 1.0, "a", NO_DETAIL, NO_DETAIL).unwrap();
        store.remove_entity("a").unwrap();
        assert_eq!(store.event_ids(), vec!["loss-1"]);
        assert_eq!(
            store.get_event_data("loss-1").unwrap().secondary.as_deref(),
            Some("a")
        );
        assert!(store.remove_entity("a").is_err());
    }

    #[test]
    fn state_round_trip_preserves_sequences() {
        let mut store = store_with(&["a"]);
        store.add_shot("a", 1.0, NO_DETAIL, NO_DETAIL).unwrap();
        store.add_shot("a", 2.0, NO_DETAIL, NO_DETAIL).unwrap();
        store.remove_event("shot-2").unwrap();

        let json = serde_json::to_string(&store.export_state()).unwrap();
        let state: StoreState = serde_json::from_str(&json).unwrap();
        let mut restored = EntityStore::import_state(state);

        assert!(restored.diagnostics().is_empty());
        assert_eq!(restored.event_ids(), vec!["shot-1"]);
        assert_eq!(
            restored.add_shot("a", 3.0, NO_DETAIL, NO_DETAIL).unwrap(),
            "shot-3"
        );
    }
}
