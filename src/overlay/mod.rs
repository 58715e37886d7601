//! Description-box overlay: a proportional box anchored bottom-left with the
//! record's lines fitted inside it.
//!
//! [`OverlayEngine::apply`] never fails and never touches the caller's
//! image. Font, formatting and drawing problems each degrade to a fallback
//! (built-in font, placeholder line, untouched copy) and are logged.

pub mod builtin_font;
pub mod draw;
pub mod error;
pub mod fit;
pub mod font;
pub mod geometry;
pub mod lines;

use image::{DynamicImage, GenericImageView};
use serde::Serialize;
use std::fmt;
use tracing::{debug, warn};

use crate::record::DescriptionRecord;
use crate::settings::Settings;
use draw::{OverlayPlan, draw_overlay};
use fit::TextFitter;

pub use error::OverlayError;
pub use fit::{Fitted, MIN_FITTED_FONT_SIZE, line_height, visible_lines};
pub use font::{FontHandle, FontResolver, FontSource, LocalFonts, default_font_candidates};
pub use geometry::{BoxRect, Geometry, Padding, TextArea};
pub use lines::{Labels, LineFormatter, LineSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Absent,
    Disabled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverlayOutcome {
    Applied {
        font_size: u32,
        line_height: u32,
        lines_drawn: usize,
        lines_total: usize,
        shrunk: bool,
    },
    Skipped(SkipReason),
    Degraded(OverlayError),
}

impl fmt::Display for OverlayOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Applied {
                font_size,
                lines_drawn,
                lines_total,
                ..
            } => write!(
                f,
                "description applied ({}/{} lines at {}px)",
                lines_drawn, lines_total, font_size
            ),
            Self::Skipped(SkipReason::Absent) => f.write_str("no description record"),
            Self::Skipped(SkipReason::Disabled) => f.write_str("description disabled"),
            Self::Degraded(err) => write!(f, "description skipped: {}", err),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Rendered {
    pub image: DynamicImage,
    pub outcome: OverlayOutcome,
}

impl Rendered {
    pub fn applied(&self) -> bool {
        matches!(self.outcome, OverlayOutcome::Applied { .. })
    }
}

/// Layout of a would-be overlay, computed without touching pixels or fonts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OverlayPreview {
    pub image_width: u32,
    pub image_height: u32,
    pub geometry: Geometry,
    pub lines: LineSet,
    pub lines_count: usize,
    pub fitted_font_size: u32,
    pub line_height: u32,
    pub visible_lines: usize,
}

/// Owns the font cache and label set used for every image it annotates.
#[derive(Debug)]
pub struct OverlayEngine {
    fonts: FontResolver,
    formatter: LineFormatter,
}

impl Default for OverlayEngine {
    fn default() -> Self {
        Self::new(
            FontResolver::new(default_font_candidates()),
            LineFormatter::default(),
        )
    }
}

impl OverlayEngine {
    pub fn new(fonts: FontResolver, formatter: LineFormatter) -> Self {
        Self { fonts, formatter }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            FontResolver::new(settings.font_candidates()),
            LineFormatter::new(settings.labels()),
        )
    }

    pub fn fonts(&self) -> &FontResolver {
        &self.fonts
    }

    pub fn formatter(&self) -> &LineFormatter {
        &self.formatter
    }

    /// Returns a copy of `image` with the description box drawn on it, or an
    /// unmodified copy when there is nothing to draw or drawing failed.
    pub fn apply(&self, image: &DynamicImage, record: Option<&DescriptionRecord>) -> DynamicImage {
        self.render(image, record).image
    }

    pub fn render(&self, image: &DynamicImage, record: Option<&DescriptionRecord>) -> Rendered {
        let Some(record) = record else {
            return unchanged(image, OverlayOutcome::Skipped(SkipReason::Absent));
        };
        if !record.enabled {
            return unchanged(image, OverlayOutcome::Skipped(SkipReason::Disabled));
        }

        match self.compose(image, record) {
            Ok(rendered) => rendered,
            Err(err) => {
                warn!("{}; returning image without description", err);
                unchanged(image, OverlayOutcome::Degraded(err))
            }
        }
    }

    pub fn preview(&self, width: u32, height: u32, record: &DescriptionRecord) -> OverlayPreview {
        let geometry = geometry::compute(width, height);
        let lines = self.formatter.format(record);
        let fitted_font_size = fit::shrink_size(geometry.font_size, lines.len(), geometry.text_area.height)
            .unwrap_or(geometry.font_size);
        let line_height = line_height(fitted_font_size);
        OverlayPreview {
            image_width: width,
            image_height: height,
            geometry,
            lines_count: lines.len(),
            visible_lines: visible_lines(lines.len(), line_height, geometry.text_area.height),
            lines,
            fitted_font_size,
            line_height,
        }
    }

    fn compose(
        &self,
        image: &DynamicImage,
        record: &DescriptionRecord,
    ) -> Result<Rendered, OverlayError> {
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(OverlayError::Render(format!(
                "empty image {}x{}",
                width, height
            )));
        }

        let geometry = geometry::compute(width, height);
        debug!(
            "description box: image {}x{}, box {}x{} at ({}, {}), padding {}x{}, font {}px",
            width,
            height,
            geometry.rect.width,
            geometry.rect.height,
            geometry.rect.x,
            geometry.rect.y,
            geometry.padding.horizontal,
            geometry.padding.vertical,
            geometry.font_size
        );

        let lines = self.formatter.format(record);
        let base = self.fonts.get(geometry.font_size);
        let fitted = TextFitter::new(&self.fonts).fit(lines.as_slice(), base, geometry.text_area);
        let shown = visible_lines(lines.len(), fitted.line_height, geometry.text_area.height);
        if shown < lines.len() {
            debug!(
                "{} of {} description lines do not fit and are dropped",
                lines.len() - shown,
                lines.len()
            );
        }

        let mut output = image.clone();
        draw_overlay(
            &mut output,
            &OverlayPlan {
                geometry: &geometry,
                lines: &lines.as_slice()[..shown],
                font: &fitted.font,
                line_height: fitted.line_height,
            },
        )?;
        debug!(
            "description text: {} lines at {}px, line height {}px",
            shown,
            fitted.font.size(),
            fitted.line_height
        );

        Ok(Rendered {
            image: output,
            outcome: OverlayOutcome::Applied {
                font_size: fitted.font.size(),
                line_height: fitted.line_height,
                lines_drawn: shown,
                lines_total: lines.len(),
                shrunk: fitted.shrunk,
            },
        })
    }
}

fn unchanged(image: &DynamicImage, outcome: OverlayOutcome) -> Rendered {
    Rendered {
        image: image.clone(),
        outcome,
    }
}
