use serde::{Deserialize, Serialize};

use crate::model::EventType;

/// Monotonic per-event-type sequence counters.
///
/// Counters are shared by every entity in a store, so `shot-3` names exactly
/// one shot no matter which entity recorded it. They never move backwards,
/// not even when events are removed, so ids stay unique for the lifetime of
/// the store (and across an export/import round trip).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "SequenceRepr", from = "SequenceRepr")]
pub struct EventSequencer {
    last: [u64; EventType::COUNT],
}

#[derive(Serialize, Deserialize, Default)]
#[serde(default)]
struct SequenceRepr {
    loc: u64,
    shot: u64,
    kill: u64,
    loss: u64,
    spot: u64,
    seen: u64,
    stop: u64,
    status: u64,
}

impl From<EventSequencer> for SequenceRepr {
    fn from(seq: EventSequencer) -> Self {
        SequenceRepr {
            loc: seq.last(EventType::Location),
            shot: seq.last(EventType::Shot),
            kill: seq.last(EventType::Kill),
            loss: seq.last(EventType::Loss),
            spot: seq.last(EventType::Spot),
            seen: seq.last(EventType::Seen),
            stop: seq.last(EventType::Stop),
            status: seq.last(EventType::Status),
        }
    }
}

impl From<SequenceRepr> for EventSequencer {
    fn from(repr: SequenceRepr) -> Self {
        let mut seq = EventSequencer::new();
        seq.observe(EventType::Location, repr.loc);
        seq.observe(EventType::Shot, repr.shot);
        seq.observe(EventType::Kill, repr.kill);
        seq.observe(EventType::Loss, repr.loss);
        seq.observe(EventType::Spot, repr.spot);
        seq.observe(EventType::Seen, repr.seen);
        seq.observe(EventType::Stop, repr.stop);
        seq.observe(EventType::Status, repr.status);
        seq
    }
}

impl EventSequencer {
    pub fn new() -> Self {
        Self {
            last: [0; EventType::COUNT],
        }
    }

    /// Advance the counter for `event_type` and return the new sequence number.
    /// The first event of every type gets 1.
    pub fn next_sequence(&mut self, event_type: EventType) -> u64 {
        let slot = &mut self.last[event_type.index()];
        *slot += 1;
        *slot
    }

    /// Last sequence number handed out for `event_type` (0 if none yet).
    pub fn last(&self, event_type: EventType) -> u64 {
        self.last[event_type.index()]
    }

    /// Raise the counter to at least `sequence`. Used when restoring state so
    /// that freshly minted ids can never collide with restored ones.
    pub fn observe(&mut self, event_type: EventType, sequence: u64) {
        let slot = &mut self.last[event_type.index()];
        *slot = (*slot).max(sequence);
    }

    /// Merge another sequencer into this one, keeping the higher counter per type.
    pub fn merge(&mut self, other: &EventSequencer) {
        for event_type in EventType::ALL {
            self.observe(event_type, other.last(event_type));
        }
    }
}
