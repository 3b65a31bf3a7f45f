use serde::{Deserialize, Serialize};

/// The eight event types an entity can record.
///
/// Variant order is the per-entity flattening order used when building the
/// event log. Chronological tie-breaking uses [`EventType::sort_rank`] instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum EventType {
    Location,
    Shot,
    Kill,
    Loss,
    Spot,
    Seen,
    Stop,
    Status,
}

labeled_enum!(EventType {
    Location => "location update",
    Shot => "shot",
    Kill => "kill",
    Loss => "loss",
    Spot => "spotted secondary",
    Seen => "seen by secondary",
    Stop => "stopped seeing secondary",
    Status => "status update",
});

impl EventType {
    pub(crate) fn index(self) -> usize {
        self as usize
    }

    /// Human-readable label used in the event log `event_type` column.
    pub fn label(self) -> &'static str {
        self.as_str()
    }

    /// Prefix of event ids of this type, e.g. `shot` in `shot-3`.
    pub fn short_code(self) -> &'static str {
        match self {
            EventType::Location => "loc",
            EventType::Shot => "shot",
            EventType::Kill => "kill",
            EventType::Loss => "loss",
            EventType::Spot => "spot",
            EventType::Seen => "seen",
            EventType::Stop => "stop",
            EventType::Status => "status",
        }
    }

    /// Tie-break rank among events sharing a timestamp. Positions come first
    /// so that events at the same instant see the fresh location.
    pub fn sort_rank(self) -> u8 {
        match self {
            EventType::Location => 0,
            EventType::Status => 1,
            EventType::Spot => 2,
            EventType::Seen => 3,
            EventType::Stop => 4,
            EventType::Shot => 5,
            EventType::Kill => 6,
            EventType::Loss => 7,
        }
    }

    /// Whether events of this type name a counterpart entity.
    pub fn has_secondary(self) -> bool {
        matches!(
            self,
            EventType::Kill | EventType::Loss | EventType::Spot | EventType::Seen | EventType::Stop
        )
    }

    /// Columns an event group of this type carries, in storage order.
    pub fn columns(self) -> &'static [Column] {
        match self {
            EventType::Location => &[Column::Time, Column::X, Column::Y, Column::Detail],
            EventType::Shot | EventType::Status => &[Column::Time, Column::Detail],
            _ => &[Column::Time, Column::Secondary, Column::Detail],
        }
    }

    /// The column whose appends mint index rows.
    pub fn trigger_column(self) -> Column {
        if self.has_secondary() {
            Column::Secondary
        } else {
            Column::Time
        }
    }

    pub fn event_id(self, sequence: u64) -> String {
        format!("{}-{sequence}", self.short_code())
    }
}

/// One column of an event group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Column {
    Time,
    X,
    Y,
    Secondary,
    Detail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    Float,
    Text,
}

impl Column {
    pub fn kind(self) -> ColumnKind {
        match self {
            Column::Time | Column::X | Column::Y => ColumnKind::Float,
            Column::Secondary | Column::Detail => ColumnKind::Text,
        }
    }
}

impl ColumnKind {
    pub fn describe(self) -> &'static str {
        match self {
            ColumnKind::Float => "float",
            ColumnKind::Text => "text",
        }
    }
}

const EVENT_LISTS: [(&str, EventType, Column); 23] = [
    ("location_time", EventType::Location, Column::Time),
    ("location_x", EventType::Location, Column::X),
    ("location_y", EventType::Location, Column::Y),
    ("location_detail", EventType::Location, Column::Detail),
    ("shots_time", EventType::Shot, Column::Time),
    ("shots_detail", EventType::Shot, Column::Detail),
    ("kills_time", EventType::Kill, Column::Time),
    ("kills_victim", EventType::Kill, Column::Secondary),
    ("kills_detail", EventType::Kill, Column::Detail),
    ("losses_time", EventType::Loss, Column::Time),
    ("losses_killer", EventType::Loss, Column::Secondary),
    ("losses_detail", EventType::Loss, Column::Detail),
    ("spot_time", EventType::Spot, Column::Time),
    ("spot_entity", EventType::Spot, Column::Secondary),
    ("spot_detail", EventType::Spot, Column::Detail),
    ("seen_time", EventType::Seen, Column::Time),
    ("seen_entity", EventType::Seen, Column::Secondary),
    ("seen_detail", EventType::Seen, Column::Detail),
    ("stop_time", EventType::Stop, Column::Time),
    ("stop_entity", EventType::Stop, Column::Secondary),
    ("stop_detail", EventType::Stop, Column::Detail),
    ("state_time", EventType::Status, Column::Time),
    ("state_detail", EventType::Status, Column::Detail),
];

/// A named event list: one column of one event type, e.g. `kills_victim`.
///
/// Only the 23 combinations in the lookup table exist; there is no way to
/// build an `EventList` for, say, the x column of shots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventList {
    event_type: EventType,
    column: Column,
}

impl EventList {
    pub fn new(event_type: EventType, column: Column) -> Option<Self> {
        EVENT_LISTS
            .iter()
            .any(|(_, t, c)| *t == event_type && *c == column)
            .then_some(EventList { event_type, column })
    }

    /// Look up a list by name, ignoring case.
    pub fn parse(name: &str) -> Option<Self> {
        let lowered = name.trim().to_lowercase();
        EVENT_LISTS
            .iter()
            .find(|(n, _, _)| *n == lowered)
            .map(|(_, event_type, column)| EventList {
                event_type: *event_type,
                column: *column,
            })
    }

    pub fn name(self) -> &'static str {
        EVENT_LISTS
            .iter()
            .find(|(_, t, c)| *t == self.event_type && *c == self.column)
            .map_or("", |(n, _, _)| *n)
    }

    pub fn event_type(self) -> EventType {
        self.event_type
    }

    pub fn column(self) -> Column {
        self.column
    }

    /// Appending to a trigger list mints one index row per value.
    pub fn is_trigger(self) -> bool {
        self.column == self.event_type.trigger_column()
    }

    pub fn all() -> impl Iterator<Item = EventList> {
        EVENT_LISTS.iter().map(|(_, event_type, column)| EventList {
            event_type: *event_type,
            column: *column,
        })
    }
}

impl std::fmt::Display for EventList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A typed batch of values for one event list.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Float(Vec<f64>),
    Text(Vec<String>),
}

impl ColumnData {
    pub fn kind(&self) -> ColumnKind {
        match self {
            ColumnData::Float(_) => ColumnKind::Float,
            ColumnData::Text(_) => ColumnKind::Text,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ColumnData::Float(v) => v.len(),
            ColumnData::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<Vec<f64>> for ColumnData {
    fn from(v: Vec<f64>) -> Self {
        ColumnData::Float(v)
    }
}

impl From<&[f64]> for ColumnData {
    fn from(v: &[f64]) -> Self {
        ColumnData::Float(v.to_vec())
    }
}

impl From<Vec<String>> for ColumnData {
    fn from(v: Vec<String>) -> Self {
        ColumnData::Text(v)
    }
}

impl From<Vec<&str>> for ColumnData {
    fn from(v: Vec<&str>) -> Self {
        ColumnData::Text(v.into_iter().map(str::to_string).collect())
    }
}

/// A row in the event index: where one event's data lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub sequence: u64,
    pub event_id: String,
    pub event_type: EventType,
    pub primary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary: Option<String>,
    /// Position of this event's values inside the primary entity's group.
    pub data_index: usize,
}

/// The stored values of a single event, resolved through the index.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventData {
    pub event_id: String,
    pub event_type: EventType,
    pub time: f64,
    pub primary: String,
    pub secondary: Option<String>,
    pub detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_serialize_as_strings() {
        let json = serde_json::to_string(&EventType::Spot).unwrap();
        assert_eq!(json, "\"spotted secondary\"");
        let back: EventType = serde_json::from_str("\"status update\"").unwrap();
        assert_eq!(back, EventType::Status);
        assert!(serde_json::from_str::<EventType>("\"teleport\"").is_err());
    }

    #[test]
    fn short_codes_are_distinct() {
        let codes: std::collections::HashSet<&str> =
            EventType::ALL.iter().map(|t| t.short_code()).collect();
        assert_eq!(codes.len(), EventType::COUNT);
        assert_eq!(EventType::Location.event_id(4), "loc-4");
    }

    #[test]
    fn labels_match_ignoring_case() {
        assert_eq!(EventType::from_label("Shot"), Some(EventType::Shot));
        assert_eq!(EventType::from_label(" Seen By Secondary "), Some(EventType::Seen));
        assert_eq!(EventType::from_label("loc"), None);
    }

    #[test]
    fn positions_sort_first() {
        let mut types = EventType::ALL.to_vec();
        types.sort_by_key(|t| t.sort_rank());
        assert_eq!(types.first(), Some(&EventType::Location));
        assert_eq!(types.last(), Some(&EventType::Loss));
    }

    #[test]
    fn list_names_are_case_insensitive() {
        let list = EventList::parse("Kills_Victim").unwrap();
        assert_eq!(list.event_type(), EventType::Kill);
        assert_eq!(list.column(), Column::Secondary);
        assert!(list.is_trigger());
        assert_eq!(list.name(), "kills_victim");
        assert!(EventList::parse("kills_x").is_none());
    }

    #[test]
    fn triggers_match_event_shape() {
        let triggers: Vec<&str> = EventList::all()
            .filter(|l| l.is_trigger())
            .map(|l| l.name())
            .collect();
        assert_eq!(
            triggers,
            vec![
                "location_time",
                "shots_time",
                "kills_victim",
                "losses_killer",
                "spot_entity",
                "seen_entity",
                "stop_entity",
                "state_time",
            ]
        );
        assert!(EventList::new(EventType::Shot, Column::X).is_none());
    }
}
