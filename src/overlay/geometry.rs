//! Proportional placement of the description box.
//!
//! The ratios reproduce a printed template (a 4.29cm x 2.54cm box on a
//! 15cm x 13cm page) and are applied with integer arithmetic in units of
//! 1/10000 so that every result is the exact floor of the real product.

use serde::Serialize;

const SCALE: u64 = 10_000;

/// 28.60% of the image width.
pub const BOX_WIDTH_RATIO: u64 = 2_860;
/// 19.54% of the image height.
pub const BOX_HEIGHT_RATIO: u64 = 1_954;
/// 5.83% of the box width.
pub const PADDING_HORIZONTAL_RATIO: u64 = 583;
/// 5.12% of the box height.
pub const PADDING_VERTICAL_RATIO: u64 = 512;
/// 16.7% of the box height.
pub const FONT_SIZE_RATIO: u64 = 1_670;
/// 1.0% of the image width.
pub const EDGE_MARGIN_RATIO: u64 = 100;
/// 0.8% of the box width.
pub const STROKE_WIDTH_RATIO: u64 = 80;

pub const MIN_FONT_SIZE: u32 = 8;
pub const MIN_STROKE_WIDTH: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BoxRect {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Padding {
    pub horizontal: u32,
    pub vertical: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TextArea {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Geometry {
    pub rect: BoxRect,
    pub padding: Padding,
    pub margin: u32,
    pub font_size: u32,
    pub stroke_width: u32,
    pub text_area: TextArea,
}

impl Geometry {
    /// Top-left corner of the first text line.
    pub fn text_origin(&self) -> (i64, i64) {
        (
            self.rect.x + i64::from(self.padding.horizontal),
            self.rect.y + i64::from(self.padding.vertical),
        )
    }
}

fn ratio_of(value: u32, ratio: u64) -> u32 {
    // value * ratio fits in u64 for every u32 value; the quotient never exceeds value.
    (u64::from(value) * ratio / SCALE) as u32
}

/// Computes the box anchored to the bottom-left corner of a `width` x `height` image.
pub fn compute(image_width: u32, image_height: u32) -> Geometry {
    let rect_width = ratio_of(image_width, BOX_WIDTH_RATIO);
    let rect_height = ratio_of(image_height, BOX_HEIGHT_RATIO);

    let padding = Padding {
        horizontal: ratio_of(rect_width, PADDING_HORIZONTAL_RATIO),
        vertical: ratio_of(rect_height, PADDING_VERTICAL_RATIO),
    };

    let margin = ratio_of(image_width, EDGE_MARGIN_RATIO);
    let rect = BoxRect {
        x: i64::from(margin),
        y: i64::from(image_height) - i64::from(rect_height) - i64::from(margin),
        width: rect_width,
        height: rect_height,
    };

    let font_size = ratio_of(rect_height, FONT_SIZE_RATIO).max(MIN_FONT_SIZE);
    let stroke_width = ratio_of(rect_width, STROKE_WIDTH_RATIO).max(MIN_STROKE_WIDTH);

    let text_area = TextArea {
        width: rect_width - 2 * padding.horizontal,
        height: rect_height - 2 * padding.vertical,
    };

    Geometry {
        rect,
        padding,
        margin,
        font_size,
        stroke_width,
        text_area,
    }
}
