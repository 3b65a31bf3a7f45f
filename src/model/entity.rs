use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::event::{Column, ColumnData, ColumnKind, EventType};

/// Parallel columns holding every event of one type for one entity.
///
/// Only the columns named by [`EventType::columns`] are used; the others stay
/// empty and are left out of serialized state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventGroup {
    #[serde(default)]
    pub time: Vec<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub x: Vec<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub y: Vec<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub secondary: Vec<String>,
    #[serde(default)]
    pub detail: Vec<String>,
}

impl EventGroup {
    pub fn column_len(&self, column: Column) -> usize {
        match column {
            Column::Time => self.time.len(),
            Column::X => self.x.len(),
            Column::Y => self.y.len(),
            Column::Secondary => self.secondary.len(),
            Column::Detail => self.detail.len(),
        }
    }

    /// Lengths of the columns `event_type` uses, in storage order.
    pub fn lengths(&self, event_type: EventType) -> Vec<(Column, usize)> {
        event_type
            .columns()
            .iter()
            .map(|c| (*c, self.column_len(*c)))
            .collect()
    }

    /// `Some(len)` when every used column has the same length.
    pub fn consistent_len(&self, event_type: EventType) -> Option<usize> {
        let mut lens = event_type.columns().iter().map(|c| self.column_len(*c));
        let first = lens.next()?;
        lens.all(|l| l == first).then_some(first)
    }

    /// Append a typed batch to one column. On a kind mismatch nothing is
    /// appended and the expected kind is returned.
    pub fn extend(&mut self, column: Column, data: ColumnData) -> Result<(), ColumnKind> {
        match (column, data) {
            (Column::Time, ColumnData::Float(v)) => self.time.extend(v),
            (Column::X, ColumnData::Float(v)) => self.x.extend(v),
            (Column::Y, ColumnData::Float(v)) => self.y.extend(v),
            (Column::Secondary, ColumnData::Text(v)) => self.secondary.extend(v),
            (Column::Detail, ColumnData::Text(v)) => self.detail.extend(v),
            (column, _) => return Err(column.kind()),
        }
        Ok(())
    }

    /// Remove position `idx` from every column long enough to hold it.
    /// Returns false if some used column was too short.
    pub fn remove(&mut self, event_type: EventType, idx: usize) -> bool {
        let mut complete = true;
        for column in event_type.columns() {
            let removed = match column {
                Column::Time => remove_at(&mut self.time, idx),
                Column::X => remove_at(&mut self.x, idx),
                Column::Y => remove_at(&mut self.y, idx),
                Column::Secondary => remove_at(&mut self.secondary, idx),
                Column::Detail => remove_at(&mut self.detail, idx),
            };
            complete &= removed;
        }
        complete
    }
}

fn remove_at<T>(values: &mut Vec<T>, idx: usize) -> bool {
    if idx < values.len() {
        values.remove(idx);
        true
    } else {
        false
    }
}

/// One [`EventGroup`] per event type.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventGroups {
    pub location: EventGroup,
    pub shots: EventGroup,
    pub kills: EventGroup,
    pub losses: EventGroup,
    pub spot: EventGroup,
    pub seen: EventGroup,
    pub stop: EventGroup,
    pub status: EventGroup,
}

impl EventGroups {
    pub fn get(&self, event_type: EventType) -> &EventGroup {
        match event_type {
            EventType::Location => &self.location,
            EventType::Shot => &self.shots,
            EventType::Kill => &self.kills,
            EventType::Loss => &self.losses,
            EventType::Spot => &self.spot,
            EventType::Seen => &self.seen,
            EventType::Stop => &self.stop,
            EventType::Status => &self.status,
        }
    }

    pub fn get_mut(&mut self, event_type: EventType) -> &mut EventGroup {
        match event_type {
            EventType::Location => &mut self.location,
            EventType::Shot => &mut self.shots,
            EventType::Kill => &mut self.kills,
            EventType::Loss => &mut self.losses,
            EventType::Spot => &mut self.spot,
            EventType::Seen => &mut self.seen,
            EventType::Stop => &mut self.stop,
            EventType::Status => &mut self.status,
        }
    }
}

fn default_true() -> bool {
    true
}

/// A simulated unit and everything it recorded during the run.
///
/// Unset descriptive fields stay `None` here; defaults are applied when the
/// dataset is finalized, never written back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub uid: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, rename = "type")]
    pub unit_type: Option<String>,
    #[serde(default)]
    pub commander: Option<String>,
    #[serde(default)]
    pub level: Option<u32>,
    #[serde(default)]
    pub affiliation: Option<String>,
    #[serde(default)]
    pub force: Option<String>,
    #[serde(default)]
    pub init_comps: Option<i64>,
    #[serde(default)]
    pub cbt_per_comp: Option<f64>,
    #[serde(default)]
    pub system_entity: bool,
    #[serde(default = "default_true")]
    pub start_entity: bool,
    #[serde(default)]
    pub add_time: f64,
    #[serde(default)]
    pub events: EventGroups,
}

impl Entity {
    pub fn new(uid: impl Into<String>) -> Self {
        Entity {
            uid: uid.into(),
            name: None,
            unit_type: None,
            commander: None,
            level: None,
            affiliation: None,
            force: None,
            init_comps: None,
            cbt_per_comp: None,
            system_entity: false,
            start_entity: true,
            add_time: 0.0,
            events: EventGroups::default(),
        }
    }

    pub fn event_group(&self, event_type: EventType) -> &EventGroup {
        self.events.get(event_type)
    }

    /// Set one descriptive field from a loosely typed value.
    ///
    /// On failure the field is left untouched and the expected type is
    /// returned.
    pub fn set_field(&mut self, field: EntityField, value: &Value) -> Result<(), &'static str> {
        match field {
            EntityField::Name => self.name = coerce_text(value)?,
            EntityField::UnitType => self.unit_type = coerce_text(value)?,
            EntityField::Commander => self.commander = coerce_text(value)?,
            EntityField::Affiliation => self.affiliation = coerce_text(value)?,
            EntityField::Force => self.force = coerce_text(value)?,
            EntityField::Level => {
                self.level = coerce_int(value)?
                    .map(u32::try_from)
                    .transpose()
                    .map_err(|_| "non-negative integer")?;
            }
            EntityField::InitComps => self.init_comps = coerce_int(value)?,
            EntityField::CbtPerComp => self.cbt_per_comp = coerce_float(value)?,
            EntityField::SystemEntity => self.system_entity = coerce_flag(value)?,
            EntityField::StartEntity => self.start_entity = coerce_flag(value)?,
            EntityField::AddTime => {
                self.add_time = coerce_float(value)?.ok_or("float")?;
            }
        }
        Ok(())
    }
}

/// Descriptive entity fields that can be set by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum EntityField {
    Name,
    UnitType,
    Commander,
    Level,
    Affiliation,
    Force,
    InitComps,
    CbtPerComp,
    SystemEntity,
    StartEntity,
    AddTime,
}

labeled_enum!(EntityField {
    Name => "name",
    UnitType => "type",
    Commander => "commander",
    Level => "level",
    Affiliation => "affiliation",
    Force => "force",
    InitComps => "init_comps",
    CbtPerComp => "cbt_per_comp",
    SystemEntity => "system_entity",
    StartEntity => "start_entity",
    AddTime => "add_time",
});

impl EntityField {
    /// Parse a field name, also accepting the `unit_name`/`unit_type` aliases.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "unit_name" => Some(EntityField::Name),
            "unit_type" => Some(EntityField::UnitType),
            other => EntityField::from_label(other),
        }
    }
}

fn coerce_text(value: &Value) -> Result<Option<String>, &'static str> {
    match value {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s.clone())),
        Value::Number(n) => Ok(Some(n.to_string())),
        Value::Bool(b) => Ok(Some(b.to_string())),
        _ => Err("string"),
    }
}

fn coerce_int(value: &Value) -> Result<Option<i64>, &'static str> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Ok(Some(i))
            } else {
                match n.as_f64() {
                    Some(f) if f.fract() == 0.0 && f.is_finite() => Ok(Some(f as i64)),
                    _ => Err("integer"),
                }
            }
        }
        Value::String(s) => s.trim().parse::<i64>().map(Some).map_err(|_| "integer"),
        _ => Err("integer"),
    }
}

fn coerce_float(value: &Value) -> Result<Option<f64>, &'static str> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => n.as_f64().map(Some).ok_or("float"),
        Value::String(s) => s.trim().parse::<f64>().map(Some).map_err(|_| "float"),
        _ => Err("float"),
    }
}

fn coerce_flag(value: &Value) -> Result<bool, &'static str> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::Number(n) => match n.as_i64() {
            Some(0) => Ok(false),
            Some(1) => Ok(true),
            _ => Err("boolean"),
        },
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "1" | "true" => Ok(true),
            "0" | "false" => Ok(false),
            _ => Err("boolean"),
        },
        _ => Err("boolean"),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn new_entity_defaults() {
        let e = Entity::new("u1");
        assert!(e.start_entity);
        assert!(!e.system_entity);
        assert_eq!(e.add_time, 0.0);
        assert!(e.name.is_none());
    }

    #[test]
    fn extend_rejects_wrong_kind() {
        let mut group = EventGroup::default();
        assert_eq!(
            group.extend(Column::Time, ColumnData::from(vec!["a"])),
            Err(ColumnKind::Float)
        );
        assert!(group.time.is_empty());
        group.extend(Column::Time, ColumnData::from(vec![1.0, 2.0])).unwrap();
        assert_eq!(group.time, vec![1.0, 2.0]);
    }

    #[test]
    fn consistent_len_checks_used_columns_only() {
        let mut group = EventGroup::default();
        group.time = vec![1.0];
        group.detail = vec!["{}".into()];
        assert_eq!(group.consistent_len(EventType::Shot), Some(1));
        assert_eq!(group.consistent_len(EventType::Location), None);
    }

    #[test]
    fn set_field_coerces_values() {
        let mut e = Entity::new("u1");
        e.set_field(EntityField::Commander, &json!(42)).unwrap();
        e.set_field(EntityField::Level, &json!("2")).unwrap();
        e.set_field(EntityField::InitComps, &json!(4.0)).unwrap();
        e.set_field(EntityField::CbtPerComp, &json!("2.5")).unwrap();
        e.set_field(EntityField::SystemEntity, &json!(1)).unwrap();
        assert_eq!(e.commander.as_deref(), Some("42"));
        assert_eq!(e.level, Some(2));
        assert_eq!(e.init_comps, Some(4));
        assert_eq!(e.cbt_per_comp, Some(2.5));
        assert!(e.system_entity);
    }

    #[test]
    fn set_field_failure_leaves_field_alone() {
        let mut e = Entity::new("u1");
        e.init_comps = Some(3);
        assert_eq!(
            e.set_field(EntityField::InitComps, &json!("many")),
            Err("integer")
        );
        assert_eq!(e.init_comps, Some(3));
        assert!(e.set_field(EntityField::Level, &json!(-1)).is_err());
    }

    #[test]
    fn field_aliases() {
        assert_eq!(EntityField::parse("unit_name"), Some(EntityField::Name));
        assert_eq!(EntityField::parse("TYPE"), Some(EntityField::UnitType));
        assert_eq!(EntityField::parse("colour"), None);
    }
}
