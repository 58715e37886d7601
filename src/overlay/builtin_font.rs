//! Fallback face used when no outline font loads: the fixed fonts shipped
//! with `embedded-graphics`, magnified by whole pixels for large boxes.
//! The ISO 8859-5 set covers both the Latin and the Cyrillic labels.

use embedded_graphics::mono_font::iso_8859_5::{
    FONT_4X6, FONT_5X8, FONT_6X10, FONT_6X12, FONT_7X13_ITALIC, FONT_7X14, FONT_9X15, FONT_9X18,
    FONT_10X20,
};
use embedded_graphics::mono_font::{MonoFont, MonoTextStyle};
use embedded_graphics::pixelcolor::BinaryColor;

/// Ordered by cell height, italic where the family has one.
static LADDER: [&MonoFont<'static>; 9] = [
    &FONT_4X6,
    &FONT_5X8,
    &FONT_6X10,
    &FONT_6X12,
    &FONT_7X13_ITALIC,
    &FONT_7X14,
    &FONT_9X15,
    &FONT_9X18,
    &FONT_10X20,
];

#[derive(Clone, Copy)]
pub struct BuiltinFont {
    font: &'static MonoFont<'static>,
    scale: u32,
}

impl BuiltinFont {
    /// Tallest cell that still fits in `size_px`.
    pub fn for_size(size_px: u32) -> Self {
        let tallest = LADDER[LADDER.len() - 1].character_size.height;
        let scale = (size_px / tallest).max(1);
        let target = size_px / scale;
        let font = LADDER
            .iter()
            .rev()
            .copied()
            .find(|font| font.character_size.height <= target)
            .unwrap_or(LADDER[0]);
        Self { font, scale }
    }

    pub fn font(&self) -> &'static MonoFont<'static> {
        self.font
    }

    /// Side of the block each font pixel is painted as.
    pub fn scale(&self) -> u32 {
        self.scale
    }

    pub fn cell_height(&self) -> u32 {
        self.font.character_size.height * self.scale
    }

    pub fn style(&self) -> MonoTextStyle<'static, BinaryColor> {
        MonoTextStyle::new(self.font, BinaryColor::On)
    }
}
