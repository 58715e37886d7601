use serde::Serialize;
use tracing::warn;

use super::error::OverlayError;
use crate::record::{DescriptionRecord, Field};

pub const MAX_LINES: usize = 8;
pub const MAX_LAST_LINE_CHARS: usize = 50;
pub const ELLIPSIS: &str = "...";

/// Display labels for each field plus the text shown when formatting fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Labels {
    fields: [String; 7],
    placeholder: String,
}

impl Labels {
    pub fn english() -> Self {
        Self::from_parts(
            [
                "Date",
                "Time",
                "Operator",
                "Station",
                "Mode",
                "Frequency",
                "Weather",
            ],
            "Formatting error",
        )
    }

    pub fn ukrainian() -> Self {
        Self::from_parts(
            [
                "Дата",
                "Час",
                "Оператор",
                "Станція",
                "Режим",
                "Частота",
                "Погода",
            ],
            "Помилка форматування",
        )
    }

    pub fn for_locale(locale: &str) -> Option<Self> {
        match locale.trim().to_ascii_lowercase().as_str() {
            "en" | "english" => Some(Self::english()),
            "uk" | "ua" | "ukrainian" => Some(Self::ukrainian()),
            _ => None,
        }
    }

    pub fn label(&self, field: Field) -> &str {
        &self.fields[Self::index(field)]
    }

    pub fn set_label(&mut self, field: Field, label: impl Into<String>) {
        self.fields[Self::index(field)] = label.into();
    }

    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    fn from_parts(fields: [&str; 7], placeholder: &str) -> Self {
        Self {
            fields: fields.map(str::to_string),
            placeholder: placeholder.to_string(),
        }
    }

    fn index(field: Field) -> usize {
        Field::ALL
            .iter()
            .position(|candidate| *candidate == field)
            .unwrap_or_default()
    }
}

impl Default for Labels {
    fn default() -> Self {
        Self::english()
    }
}

/// Lines of one description box, at most [`MAX_LINES`] of them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct LineSet {
    lines: Vec<String>,
    #[serde(skip)]
    placeholder: bool,
}

impl LineSet {
    pub fn as_slice(&self) -> &[String] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// True when the lines are the formatting-failure placeholder.
    pub fn is_placeholder(&self) -> bool {
        self.placeholder
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }
}

#[derive(Debug, Clone, Default)]
pub struct LineFormatter {
    labels: Labels,
}

impl LineFormatter {
    pub fn new(labels: Labels) -> Self {
        Self { labels }
    }

    pub fn labels(&self) -> &Labels {
        &self.labels
    }

    /// Formats `record`, substituting a one-line placeholder on failure.
    pub fn format(&self, record: &DescriptionRecord) -> LineSet {
        match self.try_format(record) {
            Ok(lines) => lines,
            Err(err) => {
                warn!("{}; using placeholder line", err);
                LineSet {
                    lines: vec![self.labels.placeholder().to_string()],
                    placeholder: true,
                }
            }
        }
    }

    pub fn try_format(&self, record: &DescriptionRecord) -> Result<LineSet, OverlayError> {
        let mut lines = Vec::new();
        for field in Field::ALL {
            if let Some(value) = record.get(field) {
                check_single_line(field.key(), value)?;
                lines.push(format!("{}: {}", self.labels.label(field), value));
            }
        }
        for extra in &record.extra {
            if extra.value.is_empty() {
                continue;
            }
            check_single_line(&extra.label, &extra.label)?;
            check_single_line(&extra.label, &extra.value)?;
            lines.push(format!("{}: {}", extra.label, extra.value));
        }

        if lines.len() > MAX_LINES {
            lines.truncate(MAX_LINES);
            if let Some(last) = lines.last_mut() {
                truncate_with_ellipsis(last);
            }
        }

        Ok(LineSet {
            lines,
            placeholder: false,
        })
    }
}

fn check_single_line(name: &str, value: &str) -> Result<(), OverlayError> {
    match value.chars().find(|ch| ch.is_control()) {
        Some(ch) => Err(OverlayError::Formatting(format!(
            "`{}` contains control character {:?}",
            name, ch
        ))),
        None => Ok(()),
    }
}

fn truncate_with_ellipsis(line: &mut String) {
    if let Some((cut, _)) = line.char_indices().nth(MAX_LAST_LINE_CHARS) {
        line.truncate(cut);
        line.push_str(ELLIPSIS);
    }
}
