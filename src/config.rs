//! Dataset configuration.
//!
//! A run is described by a flat JSON object of settings. Every setting has a
//! default, so a partial (or empty) object is a valid configuration; missing
//! and unknown keys are reported through `tracing` rather than rejected.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::ConfigError;
use crate::model::EventType;

const NOT_DEFINED: &str = "not defined";

/// Settings for one processing run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    /// Serial number of the run, used in output file names.
    #[serde(deserialize_with = "lenient_string")]
    pub serial: String,

    /// Case name, written to every view and used in output file names.
    #[serde(deserialize_with = "lenient_string")]
    pub case: String,

    /// Replication number, written to every view and used in output file names.
    #[serde(deserialize_with = "lenient_string")]
    pub replication: String,

    /// Directory output files are written to.
    pub output_location: PathBuf,

    /// Write the views as CSV.
    #[serde(deserialize_with = "flag")]
    pub output_csv: bool,

    /// Write the views as JSON lines.
    #[serde(deserialize_with = "flag")]
    pub output_jsonl: bool,

    #[serde(deserialize_with = "lenient_string")]
    pub model_name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub data_name: String,
    #[serde(deserialize_with = "lenient_string")]
    pub data_date: String,
    #[serde(deserialize_with = "lenient_string")]
    pub data_details: String,
    #[serde(deserialize_with = "lenient_string")]
    pub time_unit: String,
    #[serde(deserialize_with = "lenient_string")]
    pub distance_unit: String,
    #[serde(deserialize_with = "lenient_string")]
    pub cbt_pwr_unit: String,

    /// Suffix repeated unit names with `-{n}` instead of only warning.
    #[serde(deserialize_with = "flag")]
    pub force_unique_unit_names: bool,

    #[serde(deserialize_with = "flag")]
    pub drop_location_events: bool,
    #[serde(deserialize_with = "flag")]
    pub drop_seen_events: bool,
    #[serde(deserialize_with = "flag")]
    pub drop_spot_events: bool,
    #[serde(deserialize_with = "flag")]
    pub drop_shot_events: bool,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            serial: "0".to_string(),
            case: "case_name".to_string(),
            replication: "rep_num".to_string(),
            output_location: PathBuf::from("Output"),
            output_csv: true,
            output_jsonl: false,
            model_name: NOT_DEFINED.to_string(),
            data_name: NOT_DEFINED.to_string(),
            data_date: NOT_DEFINED.to_string(),
            data_details: NOT_DEFINED.to_string(),
            time_unit: NOT_DEFINED.to_string(),
            distance_unit: NOT_DEFINED.to_string(),
            cbt_pwr_unit: NOT_DEFINED.to_string(),
            force_unique_unit_names: true,
            drop_location_events: false,
            drop_seen_events: false,
            drop_spot_events: false,
            drop_shot_events: false,
        }
    }
}

impl DatasetConfig {
    /// Parse configuration from a JSON object.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the text is not a JSON object of
    /// settings with usable values.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let source = match serde_json::from_str(json)? {
            Value::Object(source) => source,
            other => {
                return Err(ConfigError::Parse(serde::de::Error::custom(format!(
                    "config must be a JSON object of settings, got {other}"
                ))));
            }
        };
        let known = Self::default().to_map();
        for key in source.keys().filter(|k| !known.contains_key(*k)) {
            tracing::warn!(key = %key, "ignoring unknown config setting");
        }
        let missing: Vec<&str> = known
            .keys()
            .filter(|k| !source.contains_key(*k))
            .map(String::as_str)
            .collect();
        if !missing.is_empty() {
            tracing::warn!(
                count = missing.len(),
                "settings not in config, using defaults: {}",
                missing.join(", ")
            );
        }
        let config: Self = serde_json::from_value(Value::Object(source))?;
        if !config.output_csv && !config.output_jsonl {
            tracing::warn!("config is not set to output csv or jsonl, no view files will be written");
        }
        Ok(config)
    }

    /// Load configuration from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Parse`] if its content is not a valid configuration.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::info!(path = %path.display(), "loading dataset config");
        Self::from_json_str(&contents)
    }

    /// Every setting as a JSON object, in declaration order.
    pub fn to_map(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }

    pub fn is_setting(key: &str) -> bool {
        Self::default().to_map().contains_key(key)
    }

    /// Change one setting by name.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownSetting`] for a key that is not a
    /// setting, or [`ConfigError::InvalidValue`] if the value does not fit.
    pub fn set(&mut self, key: &str, value: Value) -> Result<(), ConfigError> {
        let mut map = self.to_map();
        if !map.contains_key(key) {
            return Err(ConfigError::UnknownSetting(key.to_string()));
        }
        map.insert(key.to_string(), value);
        *self = serde_json::from_value(Value::Object(map)).map_err(|source| {
            ConfigError::InvalidValue {
                key: key.to_string(),
                source,
            }
        })?;
        Ok(())
    }

    /// Event types removed from the event log after it is built.
    pub fn dropped_event_types(&self) -> Vec<EventType> {
        [
            (self.drop_location_events, EventType::Location),
            (self.drop_seen_events, EventType::Seen),
            (self.drop_spot_events, EventType::Spot),
            (self.drop_shot_events, EventType::Shot),
        ]
        .into_iter()
        .filter_map(|(drop, event_type)| drop.then_some(event_type))
        .collect()
    }

    /// `{case}-{replication}_S{serial}`, with spaces replaced by underscores.
    pub fn output_stem(&self) -> String {
        format!("{}-{}_S{}", self.case, self.replication, self.serial).replace(' ', "_")
    }
}

/// Accept strings, numbers, and booleans for textual settings.
fn lenient_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null => Ok(String::new()),
        other => Err(serde::de::Error::custom(format!(
            "expected a string, got {other}"
        ))),
    }
}

/// Accept `true`/`false`, `1`/`0`, and their string forms for flags.
fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    match Value::deserialize(deserializer)? {
        Value::Bool(b) => Ok(b),
        Value::Number(n) => Ok(n.as_f64() == Some(1.0)),
        Value::String(s) => Ok(matches!(s.trim().to_lowercase().as_str(), "1" | "true")),
        Value::Null => Ok(false),
        other => Err(serde::de::Error::custom(format!(
            "expected a flag, got {other}"
        ))),
    }
}
