use std::path::PathBuf;

use thiserror::Error;

/// Failure kinds raised inside the overlay engine.
///
/// None of these reach callers of [`super::OverlayEngine::apply`]; each one is
/// turned into a fallback at the component that raised it and logged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OverlayError {
    #[error("failed to load font {}: {reason}", path.display())]
    FontResolution { path: PathBuf, reason: String },
    #[error("failed to format description record: {0}")]
    Formatting(String),
    #[error("failed to render description overlay: {0}")]
    Render(String),
}

impl OverlayError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::FontResolution { .. } => "font",
            Self::Formatting(_) => "formatting",
            Self::Render(_) => "render",
        }
    }
}
