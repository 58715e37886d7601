use std::sync::Arc;
use tracing::debug;

use super::font::{FontHandle, FontResolver};
use super::geometry::TextArea;

pub const MIN_FITTED_FONT_SIZE: u32 = 6;
const SHRINK_FACTOR: f64 = 0.9;

/// Single-spaced line advance: 120% of the font size, floored.
pub fn line_height(font_size: u32) -> u32 {
    (u64::from(font_size) * 12 / 10) as u32
}

/// Size to shrink to when `line_count` lines at `font_size` overflow
/// `area_height`, or `None` when they already fit.
pub fn shrink_size(font_size: u32, line_count: usize, area_height: u32) -> Option<u32> {
    let total = line_count as u64 * u64::from(line_height(font_size));
    if total <= u64::from(area_height) {
        return None;
    }
    let scale = f64::from(area_height) / total as f64;
    let size = (f64::from(font_size) * scale * SHRINK_FACTOR).floor() as u32;
    Some(size.max(MIN_FITTED_FONT_SIZE))
}

/// Number of lines the render pass draws: it stops at the first line whose
/// bottom would pass `area_height` and drops the rest without a marker.
///
/// Open question for the product owners: the shrink pass sizes for every
/// line while this pass clips on whole line heights, so rounding can still
/// drop lines after a shrink. Kept as is until they decide otherwise.
pub fn visible_lines(line_count: usize, line_height: u32, area_height: u32) -> usize {
    if line_height == 0 {
        return line_count;
    }
    line_count.min((area_height / line_height) as usize)
}

#[derive(Debug, Clone)]
pub struct Fitted {
    pub font: Arc<FontHandle>,
    pub line_height: u32,
    pub shrunk: bool,
}

pub struct TextFitter<'a> {
    resolver: &'a FontResolver,
}

impl<'a> TextFitter<'a> {
    pub fn new(resolver: &'a FontResolver) -> Self {
        Self { resolver }
    }

    /// Shrinks `font` once if `lines` overflow `area`.
    ///
    /// There is no second pass: a shrunk font that still overflows is kept and
    /// the render pass clips the remaining lines.
    pub fn fit(&self, lines: &[String], font: Arc<FontHandle>, area: TextArea) -> Fitted {
        let line_count = lines.len();
        match shrink_size(font.size(), line_count, area.height) {
            Some(size) => {
                debug!(
                    "shrinking font {}px -> {}px for {} lines in {}px",
                    font.size(),
                    size,
                    line_count,
                    area.height
                );
                let font = self.resolver.get(size);
                Fitted {
                    line_height: line_height(font.size()),
                    font,
                    shrunk: true,
                }
            }
            None => Fitted {
                line_height: line_height(font.size()),
                font,
                shrunk: false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::font::tests::FakeFonts;
    use crate::overlay::geometry;

    fn resolver() -> FontResolver {
        FontResolver::with_source(Vec::new(), Arc::new(FakeFonts::default()))
    }

    fn lines(count: usize) -> Vec<String> {
        (0..count).map(|index| format!("Line: {}", index)).collect()
    }

    #[test]
    fn line_height_is_floored() {
        assert_eq!(line_height(42), 50);
        assert_eq!(line_height(10), 12);
        assert_eq!(line_height(7), 8);
        assert_eq!(line_height(6), 7);
    }

    #[test]
    fn fitting_lines_keep_the_font() {
        let resolver = resolver();
        let base = resolver.get(20);
        let area = TextArea { width: 300, height: 96 };
        let fitted = TextFitter::new(&resolver).fit(&lines(4), Arc::clone(&base), area);
        assert!(!fitted.shrunk);
        assert!(Arc::ptr_eq(&fitted.font, &base));
        assert_eq!(fitted.line_height, 24);
    }

    #[test]
    fn overflow_shrinks_once() {
        // 1500x1300 page: 42px font, 50px lines, 228px of text area.
        let g = geometry::compute(1500, 1300);
        let resolver = resolver();
        let base = resolver.get(g.font_size);
        let fitted = TextFitter::new(&resolver).fit(&lines(7), base, g.text_area);
        assert!(fitted.shrunk);
        // floor(42 * 228/350 * 0.9) = 24
        assert_eq!(fitted.font.size(), 24);
        assert_eq!(fitted.line_height, 28);
        assert_eq!(visible_lines(7, fitted.line_height, g.text_area.height), 7);
        assert_eq!(resolver.cached_sizes(), vec![24, 42]);
    }

    #[test]
    fn shrink_never_goes_below_minimum() {
        assert_eq!(shrink_size(8, 8, 10), Some(MIN_FITTED_FONT_SIZE));
        assert_eq!(shrink_size(40, 8, 0), Some(MIN_FITTED_FONT_SIZE));
    }

    #[test]
    fn shrink_strictly_decreases() {
        for size in 8..120 {
            for lines in 1..=8 {
                for height in [0, 10, 57, 128, 300] {
                    if let Some(new_size) = shrink_size(size, lines, height) {
                        assert!(new_size < size, "{} -> {}", size, new_size);
                        assert!(new_size >= MIN_FITTED_FONT_SIZE);
                    }
                }
            }
        }
    }

    #[test]
    fn shrunk_font_can_still_clip_lines() {
        // 8 lines of 8px font need 72px; only 20px available.
        let resolver = resolver();
        let base = resolver.get(8);
        let area = TextArea { width: 100, height: 20 };
        let fitted = TextFitter::new(&resolver).fit(&lines(8), base, area);
        assert_eq!(fitted.font.size(), 6);
        assert_eq!(fitted.line_height, 7);
        assert_eq!(visible_lines(8, fitted.line_height, area.height), 2);
    }

    #[test]
    fn visible_lines_stops_at_first_overflow() {
        assert_eq!(visible_lines(5, 10, 50), 5);
        assert_eq!(visible_lines(5, 10, 49), 4);
        assert_eq!(visible_lines(0, 10, 49), 0);
        assert_eq!(visible_lines(3, 0, 0), 3);
    }
}
