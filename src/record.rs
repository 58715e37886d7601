use anyhow::{Context, Result};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use time::OffsetDateTime;

/// The named fields of a description record, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    Date,
    Time,
    Operator,
    Station,
    Mode,
    Frequency,
    Weather,
}

impl Field {
    pub const ALL: [Field; 7] = [
        Field::Date,
        Field::Time,
        Field::Operator,
        Field::Station,
        Field::Mode,
        Field::Frequency,
        Field::Weather,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Field::Date => "date",
            Field::Time => "time",
            Field::Operator => "operator",
            Field::Station => "station",
            Field::Mode => "mode",
            Field::Frequency => "frequency",
            Field::Weather => "weather",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|field| field.key().eq_ignore_ascii_case(key.trim()))
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Additional labelled line shown after the fixed fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtraField {
    pub label: String,
    #[serde(deserialize_with = "lenient_required_text")]
    pub value: String,
}

/// Capture context overlaid on one image.
///
/// Absent and empty values are equivalent; both are skipped when formatting.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DescriptionRecord {
    pub enabled: bool,
    #[serde(deserialize_with = "lenient_text")]
    pub date: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub time: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub operator: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub station: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub mode: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub frequency: Option<String>,
    #[serde(deserialize_with = "lenient_text")]
    pub weather: Option<String>,
    pub extra: Vec<ExtraField>,
}

impl DescriptionRecord {
    /// An empty record with the overlay switched on.
    pub fn enabled() -> Self {
        Self {
            enabled: true,
            ..Self::default()
        }
    }

    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn with(mut self, field: Field, value: impl Into<String>) -> Self {
        self.set(field, value);
        self
    }

    pub fn with_extra(mut self, label: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.push(ExtraField {
            label: label.into(),
            value: value.into(),
        });
        self
    }

    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        *self.slot_mut(field) = Some(value.into());
    }

    /// The value of `field`, or `None` when it is missing or empty.
    pub fn get(&self, field: Field) -> Option<&str> {
        self.slot(field).as_deref().filter(|value| !value.is_empty())
    }

    /// Fills a missing date (`DD.MM.YYYY`) and time (`HH:MM`) from `stamp`.
    pub fn with_capture_stamp(mut self, stamp: OffsetDateTime) -> Self {
        if self.get(Field::Date).is_none() {
            self.set(
                Field::Date,
                format!(
                    "{:02}.{:02}.{:04}",
                    stamp.day(),
                    u8::from(stamp.month()),
                    stamp.year()
                ),
            );
        }
        if self.get(Field::Time).is_none() {
            self.set(
                Field::Time,
                format!("{:02}:{:02}", stamp.hour(), stamp.minute()),
            );
        }
        self
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        serde_json::from_str(content).with_context(|| "failed to parse description record")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read record: {}", path.display()))?;
        Self::from_json_str(&content).with_context(|| format!("invalid record: {}", path.display()))
    }

    fn slot(&self, field: Field) -> &Option<String> {
        match field {
            Field::Date => &self.date,
            Field::Time => &self.time,
            Field::Operator => &self.operator,
            Field::Station => &self.station,
            Field::Mode => &self.mode,
            Field::Frequency => &self.frequency,
            Field::Weather => &self.weather,
        }
    }

    fn slot_mut(&mut self, field: Field) -> &mut Option<String> {
        match field {
            Field::Date => &mut self.date,
            Field::Time => &mut self.time,
            Field::Operator => &mut self.operator,
            Field::Station => &mut self.station,
            Field::Mode => &mut self.mode,
            Field::Frequency => &mut self.frequency,
            Field::Weather => &mut self.weather,
        }
    }
}

// Numbers and booleans are shown as written; nested values are rejected.
fn scalar_text<E: de::Error>(value: serde_json::Value) -> Result<Option<String>, E> {
    match value {
        serde_json::Value::Null => Ok(None),
        serde_json::Value::String(text) => Ok(Some(text)),
        serde_json::Value::Number(number) => Ok(Some(number.to_string())),
        serde_json::Value::Bool(flag) => Ok(Some(flag.to_string())),
        other => Err(E::custom(format!(
            "expected a text value, found {}",
            match other {
                serde_json::Value::Array(_) => "an array",
                _ => "an object",
            }
        ))),
    }
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    scalar_text(serde_json::Value::deserialize(deserializer)?)
}

fn lenient_required_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(scalar_text(serde_json::Value::deserialize(deserializer)?)?.unwrap_or_default())
}
