use std::collections::HashMap;

use super::event::{EventType, IndexEntry};
use crate::id::EventSequencer;

/// Maps event ids to where their values live.
///
/// Rows are kept per primary entity in append order. `data_index` of a row is
/// the number of earlier rows of the same type for the same entity, which is
/// exactly its offset into that entity's event group.
#[derive(Debug, Clone, Default)]
pub struct EventIndex {
    sequencer: EventSequencer,
    rows: HashMap<String, Vec<IndexEntry>>,
    owners: HashMap<String, String>,
}

impl EventIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sequencer(&self) -> &EventSequencer {
        &self.sequencer
    }

    /// Mint a new event id for `primary` and record where its values go.
    pub(crate) fn record(
        &mut self,
        event_type: EventType,
        primary: &str,
        secondary: Option<String>,
    ) -> &IndexEntry {
        let sequence = self.sequencer.next_sequence(event_type);
        let event_id = event_type.event_id(sequence);
        self.owners.insert(event_id.clone(), primary.to_string());

        let rows = self.rows.entry(primary.to_string()).or_default();
        let data_index = rows.iter().filter(|r| r.event_type == event_type).count();
        let pos = rows.len();
        rows.push(IndexEntry {
            sequence,
            event_id,
            event_type,
            primary: primary.to_string(),
            secondary,
            data_index,
        });
        &rows[pos]
    }

    pub fn lookup(&self, event_id: &str) -> Option<&IndexEntry> {
        let owner = self.owners.get(event_id)?;
        self.rows
            .get(owner)?
            .iter()
            .find(|r| r.event_id == event_id)
    }

    /// Remove one row and shift the `data_index` of later rows of the same
    /// type down by one, so they keep pointing at their values once the
    /// group column has been compacted.
    pub(crate) fn remove(&mut self, event_id: &str) -> Option<IndexEntry> {
        let owner = self.owners.get(event_id)?;
        let rows = self.rows.get_mut(owner)?;
        let pos = rows.iter().position(|r| r.event_id == event_id)?;
        let removed = rows.remove(pos);
        for row in rows[pos..]
            .iter_mut()
            .filter(|r| r.event_type == removed.event_type)
        {
            row.data_index -= 1;
        }
        self.owners.remove(event_id);
        Some(removed)
    }

    /// Drop every row owned by `uid`. Returns how many were removed.
    pub(crate) fn remove_entity(&mut self, uid: &str) -> usize {
        let Some(rows) = self.rows.remove(uid) else {
            return 0;
        };
        for row in &rows {
            self.owners.remove(&row.event_id);
        }
        rows.len()
    }

    /// Reinstate rows from saved state. Rows whose id is already present are
    /// returned instead of being inserted.
    pub(crate) fn restore(&mut self, uid: &str, entries: Vec<IndexEntry>) -> Vec<IndexEntry> {
        let mut rejected = Vec::new();
        for mut entry in entries {
            if self.owners.contains_key(&entry.event_id) {
                rejected.push(entry);
                continue;
            }
            entry.primary = uid.to_string();
            self.sequencer.observe(entry.event_type, entry.sequence);
            self.owners.insert(entry.event_id.clone(), uid.to_string());
            self.rows.entry(uid.to_string()).or_default().push(entry);
        }
        rejected
    }

    pub(crate) fn restore_sequencer(&mut self, saved: &EventSequencer) {
        self.sequencer.merge(saved);
    }

    pub fn entries_for(&self, uid: &str) -> &[IndexEntry] {
        self.rows.get(uid).map_or(&[], Vec::as_slice)
    }

    pub fn count_for(&self, uid: &str, event_type: EventType) -> usize {
        self.entries_for(uid)
            .iter()
            .filter(|r| r.event_type == event_type)
            .count()
    }

    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    pub fn contains(&self, event_id: &str) -> bool {
        self.owners.contains_key(event_id)
    }

    pub fn event_ids(&self) -> impl Iterator<Item = &str> {
        self.owners.keys().map(String::as_str)
    }
}
