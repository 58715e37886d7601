use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::overlay::{Labels, default_font_candidates};
use crate::paths;
use crate::record::Field;

const DEFAULT_SETTINGS_TOML: &str = include_str!("../settings.toml");
pub const DEFAULT_JPEG_QUALITY: u8 = 95;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub font_path: Option<String>,
    pub font_candidates: Option<Vec<String>>,
    pub label_locale: String,
    pub label_overrides: BTreeMap<Field, String>,
    pub jpeg_quality: u8,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            font_path: None,
            font_candidates: None,
            label_locale: "en".to_string(),
            label_overrides: BTreeMap::new(),
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    font: Option<FontSettings>,
    labels: Option<LabelSettings>,
    output: Option<OutputSettings>,
}

#[derive(Debug, Default, Deserialize)]
struct FontSettings {
    path: Option<String>,
    candidates: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
struct LabelSettings {
    locale: Option<String>,
    overrides: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Default, Deserialize)]
struct OutputSettings {
    jpeg_quality: Option<u8>,
}

pub fn load_settings(extra_path: Option<&Path>) -> Result<Settings> {
    let mut settings = Settings::default();
    ensure_home_settings_file()?;

    let mut ordered_paths = Vec::new();
    ordered_paths.push(PathBuf::from("settings.toml"));
    ordered_paths.push(PathBuf::from("settings.local.toml"));

    if let Some(home) = paths::settings_dir() {
        ordered_paths.push(home.join("settings.toml"));
        ordered_paths.push(home.join("settings.local.toml"));
    }

    if let Some(extra) = extra_path {
        if !extra.exists() {
            return Err(anyhow!("settings file not found: {}", extra.display()));
        }
        ordered_paths.push(extra.to_path_buf());
    }

    for path in ordered_paths {
        if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("failed to read settings: {}", path.display()))?;
            let parsed: SettingsFile = toml::from_str(&content)
                .with_context(|| format!("failed to parse settings: {}", path.display()))?;
            settings.merge(parsed);
        }
    }

    Ok(settings)
}

impl Settings {
    /// Candidate font files in probe order.
    pub fn font_candidates(&self) -> Vec<PathBuf> {
        let mut candidates = Vec::new();
        if let Some(path) = &self.font_path {
            candidates.push(PathBuf::from(path));
        }
        match &self.font_candidates {
            Some(list) => candidates.extend(list.iter().map(PathBuf::from)),
            None => candidates.extend(default_font_candidates()),
        }
        candidates
    }

    pub fn labels(&self) -> Labels {
        let mut labels = Labels::for_locale(&self.label_locale).unwrap_or_default();
        for (field, label) in &self.label_overrides {
            labels.set_label(*field, label.clone());
        }
        labels
    }

    fn merge(&mut self, incoming: SettingsFile) {
        if let Some(font) = incoming.font {
            if let Some(path) = font.path {
                if !path.trim().is_empty() {
                    self.font_path = Some(path);
                }
            }
            if let Some(candidates) = font.candidates {
                let candidates: Vec<String> = candidates
                    .into_iter()
                    .filter(|path| !path.trim().is_empty())
                    .collect();
                if !candidates.is_empty() {
                    self.font_candidates = Some(candidates);
                }
            }
        }
        if let Some(labels) = incoming.labels {
            if let Some(locale) = labels.locale {
                if Labels::for_locale(&locale).is_some() {
                    self.label_locale = locale.trim().to_ascii_lowercase();
                } else if !locale.trim().is_empty() {
                    warn!("unknown label locale '{}', keeping '{}'", locale, self.label_locale);
                }
            }
            if let Some(overrides) = labels.overrides {
                for (key, label) in overrides {
                    match Field::from_key(&key) {
                        Some(field) if !label.trim().is_empty() => {
                            self.label_overrides.insert(field, label);
                        }
                        Some(_) => {}
                        None => warn!("unknown field '{}' in [labels.overrides]", key),
                    }
                }
            }
        }
        if let Some(output) = incoming.output {
            if let Some(quality) = output.jpeg_quality {
                if (1..=100).contains(&quality) {
                    self.jpeg_quality = quality;
                }
            }
        }
    }
}

fn ensure_home_settings_file() -> Result<()> {
    let Some(home) = paths::settings_dir() else {
        return Ok(());
    };
    fs::create_dir_all(&home)
        .with_context(|| format!("failed to create settings directory: {}", home.display()))?;
    let path = home.join("settings.toml");
    if !path.exists() {
        fs::write(&path, DEFAULT_SETTINGS_TOML)
            .with_context(|| format!("failed to write settings: {}", path.display()))?;
    }
    Ok(())
}
