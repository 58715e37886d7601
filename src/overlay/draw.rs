//! Drawing onto every colour type `image` decodes to, without converting
//! the buffer, so the output keeps the input's channel layout and depth.

use embedded_graphics::Drawable;
use embedded_graphics::Pixel as Dot;
use embedded_graphics::draw_target::DrawTarget;
use embedded_graphics::geometry::{OriginDimensions, Point, Size};
use embedded_graphics::pixelcolor::BinaryColor;
use embedded_graphics::text::{Baseline, Text};
use image::{DynamicImage, Pixel, Primitive};
use imageproc::definitions::{Clamp, Image};
use imageproc::drawing::{draw_filled_rect_mut, draw_text_mut};
use imageproc::rect::Rect;

use super::builtin_font::BuiltinFont;
use super::error::OverlayError;
use super::font::{FontFace, FontHandle};
use super::geometry::Geometry;

/// Everything needed to paint one description box.
pub struct OverlayPlan<'a> {
    pub geometry: &'a Geometry,
    pub lines: &'a [String],
    pub font: &'a FontHandle,
    pub line_height: u32,
}

pub fn draw_overlay(image: &mut DynamicImage, plan: &OverlayPlan<'_>) -> Result<(), OverlayError> {
    let color = image.color();
    match image {
        DynamicImage::ImageLuma8(buffer) => draw_on(buffer, plan),
        DynamicImage::ImageLumaA8(buffer) => draw_on(buffer, plan),
        DynamicImage::ImageRgb8(buffer) => draw_on(buffer, plan),
        DynamicImage::ImageRgba8(buffer) => draw_on(buffer, plan),
        DynamicImage::ImageLuma16(buffer) => draw_on(buffer, plan),
        DynamicImage::ImageLumaA16(buffer) => draw_on(buffer, plan),
        DynamicImage::ImageRgb16(buffer) => draw_on(buffer, plan),
        DynamicImage::ImageRgba16(buffer) => draw_on(buffer, plan),
        DynamicImage::ImageRgb32F(buffer) => draw_on(buffer, plan),
        DynamicImage::ImageRgba32F(buffer) => draw_on(buffer, plan),
        _ => Err(OverlayError::Render(format!(
            "unsupported color type {:?}",
            color
        ))),
    }
}

fn draw_on<P>(canvas: &mut Image<P>, plan: &OverlayPlan<'_>) -> Result<(), OverlayError>
where
    P: Pixel,
    P::Subpixel: Into<f32> + Clamp<f32>,
{
    let ink = ink::<P>();
    draw_outline(canvas, plan.geometry, ink)?;

    let (text_x, text_y) = plan.geometry.text_origin();
    let mut line_y = text_y;
    for line in plan.lines {
        match plan.font.face() {
            FontFace::Outline { font, .. } => {
                let x = to_coord(text_x)?;
                let y = to_coord(line_y)?;
                draw_text_mut(canvas, ink, x, y, plan.font.px_scale(), font, line);
            }
            FontFace::Builtin => {
                let builtin = BuiltinFont::for_size(plan.font.size());
                let mut target = BlockTarget {
                    canvas: &mut *canvas,
                    origin: (text_x, line_y),
                    scale: builtin.scale(),
                    ink,
                };
                Text::with_baseline(line, Point::zero(), builtin.style(), Baseline::Top)
                    .draw(&mut target)?;
            }
        }
        line_y += i64::from(plan.line_height);
    }
    Ok(())
}

/// Outline of the inclusive rectangle `[x, y, x + width, y + height]`, the
/// stroke growing inward from the outer edge.
fn draw_outline<P: Pixel>(
    canvas: &mut Image<P>,
    geometry: &Geometry,
    ink: P,
) -> Result<(), OverlayError> {
    let rect = geometry.rect;
    let outer_w = rect.width + 1;
    let outer_h = rect.height + 1;
    let stroke = geometry.stroke_width;

    if stroke.saturating_mul(2) >= outer_w || stroke.saturating_mul(2) >= outer_h {
        return fill(canvas, rect.x, rect.y, outer_w, outer_h, ink);
    }

    let right = rect.x + i64::from(outer_w - stroke);
    let bottom = rect.y + i64::from(outer_h - stroke);
    let side_h = outer_h - 2 * stroke;
    fill(canvas, rect.x, rect.y, outer_w, stroke, ink)?;
    fill(canvas, rect.x, bottom, outer_w, stroke, ink)?;
    fill(canvas, rect.x, rect.y + i64::from(stroke), stroke, side_h, ink)?;
    fill(canvas, right, rect.y + i64::from(stroke), stroke, side_h, ink)
}

fn fill<P: Pixel>(
    canvas: &mut Image<P>,
    x: i64,
    y: i64,
    width: u32,
    height: u32,
    ink: P,
) -> Result<(), OverlayError> {
    if width == 0 || height == 0 {
        return Ok(());
    }
    let rect = Rect::at(to_coord(x)?, to_coord(y)?).of_size(width, height);
    draw_filled_rect_mut(canvas, rect, ink);
    Ok(())
}

/// Paints each lit pixel of an `embedded-graphics` drawing as a
/// `scale`-sided block of `ink`, offset by `origin`.
struct BlockTarget<'c, P: Pixel> {
    canvas: &'c mut Image<P>,
    origin: (i64, i64),
    scale: u32,
    ink: P,
}

impl<P: Pixel> OriginDimensions for BlockTarget<'_, P> {
    fn size(&self) -> Size {
        Size::new(self.canvas.width(), self.canvas.height())
    }
}

impl<P: Pixel> DrawTarget for BlockTarget<'_, P> {
    type Color = BinaryColor;
    type Error = OverlayError;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Dot<Self::Color>>,
    {
        let side = i64::from(self.scale);
        for Dot(point, color) in pixels {
            if color.is_off() {
                continue;
            }
            fill(
                &mut *self.canvas,
                self.origin.0 + i64::from(point.x) * side,
                self.origin.1 + i64::from(point.y) * side,
                self.scale,
                self.scale,
                self.ink,
            )?;
        }
        Ok(())
    }
}

fn to_coord(value: i64) -> Result<i32, OverlayError> {
    i32::try_from(value)
        .map_err(|_| OverlayError::Render(format!("coordinate {} out of range", value)))
}

/// Opaque black in the pixel's own channel layout.
fn ink<P: Pixel>() -> P {
    let full = [<P::Subpixel as Primitive>::DEFAULT_MAX_VALUE; 4];
    let mut ink = *P::from_slice(&full[..usize::from(P::CHANNEL_COUNT)]);
    ink.apply_without_alpha(|_| <P::Subpixel as Primitive>::DEFAULT_MIN_VALUE);
    ink
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::fit::line_height;
    use crate::overlay::font::FontResolver;
    use crate::overlay::font::tests::installed_font;
    use crate::overlay::geometry;
    use image::{Luma, LumaA, Rgb, Rgba, RgbImage};

    #[test]
    fn ink_is_opaque_black() {
        assert_eq!(ink::<Rgb<u8>>(), Rgb([0, 0, 0]));
        assert_eq!(ink::<Rgba<u8>>(), Rgba([0, 0, 0, 255]));
        assert_eq!(ink::<LumaA<u16>>(), LumaA([0, u16::MAX]));
        assert_eq!(ink::<Luma<u16>>(), Luma([0]));
        assert_eq!(ink::<Rgba<f32>>(), Rgba([0.0, 0.0, 0.0, 1.0]));
    }

    #[test]
    fn outline_covers_inclusive_rect_with_inward_stroke() {
        let g = geometry::compute(1500, 1300);
        let mut canvas = RgbImage::from_pixel(1500, 1300, Rgb([255, 255, 255]));
        draw_outline(&mut canvas, &g, Rgb([0, 0, 0])).expect("outline");

        let (x0, y0) = (g.rect.x as u32, g.rect.y as u32);
        let (x1, y1) = (x0 + g.rect.width, y0 + g.rect.height);
        let black = Rgb([0, 0, 0]);
        let white = Rgb([255, 255, 255]);

        assert_eq!(*canvas.get_pixel(x0, y0), black);
        assert_eq!(*canvas.get_pixel(x1, y1), black);
        assert_eq!(*canvas.get_pixel(x0 + g.stroke_width - 1, y0 + 100), black);
        assert_eq!(*canvas.get_pixel(x0 + g.stroke_width, y0 + 100), white);
        assert_eq!(*canvas.get_pixel(x1 - g.stroke_width + 1, y0 + 100), black);
        assert_eq!(*canvas.get_pixel(x1 - g.stroke_width, y0 + 100), white);
        assert_eq!(*canvas.get_pixel(x0 - 1, y0), white);
        assert_eq!(*canvas.get_pixel(x1 + 1, y1), white);
        assert_eq!(*canvas.get_pixel(x0 + 50, y0 + 50), white);
    }

    #[test]
    fn thin_box_is_filled() {
        // 11x5 box: a 3px stroke meets itself across the 6 outer rows.
        let mut g = geometry::compute(40, 30);
        g.stroke_width = 3;
        let mut canvas = RgbImage::from_pixel(60, 60, Rgb([255, 255, 255]));
        draw_outline(&mut canvas, &g, Rgb([0, 0, 0])).expect("outline");
        let (x0, y0) = (g.rect.x as u32, g.rect.y as u32);
        for y in y0..=y0 + g.rect.height {
            for x in x0..=x0 + g.rect.width {
                assert_eq!(*canvas.get_pixel(x, y), Rgb([0, 0, 0]));
            }
        }
    }

    fn white(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(RgbImage::from_pixel(width, height, Rgb([255, 255, 255])))
    }

    /// Rows and columns of dark pixels inside the box, outline excluded.
    fn inked_inside(canvas: &RgbImage, g: &Geometry) -> Vec<(u32, u32)> {
        let inset = g.stroke_width;
        let (x0, y0) = (g.rect.x as u32 + inset, g.rect.y as u32 + inset);
        let (x1, y1) = (
            g.rect.x as u32 + g.rect.width - inset,
            g.rect.y as u32 + g.rect.height - inset,
        );
        (y0..=y1)
            .flat_map(|y| (x0..=x1).map(move |x| (x, y)))
            .filter(|&(x, y)| canvas.get_pixel(x, y)[0] < 128)
            .collect()
    }

    fn row_span(points: &[(u32, u32)]) -> (u32, u32) {
        let top = points.iter().map(|&(_, y)| y).min().expect("ink");
        let bottom = points.iter().map(|&(_, y)| y).max().expect("ink");
        (top, bottom)
    }

    #[test]
    fn builtin_text_fits_its_line() {
        let g = geometry::compute(600, 400);
        let font = FontHandle::builtin(g.font_size);
        let lines = vec!["Date: 01.01.2024".to_string(), "Дата: 01.01.2024".to_string()];
        let plan = OverlayPlan {
            geometry: &g,
            lines: &lines,
            font: &font,
            line_height: line_height(g.font_size),
        };
        let mut image = white(600, 400);
        draw_overlay(&mut image, &plan).expect("draw");

        let inked = inked_inside(&image.to_rgb8(), &g);
        let (tx, ty) = g.text_origin();
        let cell = BuiltinFont::for_size(g.font_size).cell_height();
        let (top, bottom) = row_span(&inked);
        assert!(i64::from(top) >= ty);
        assert!(i64::from(bottom) < ty + i64::from(plan.line_height) + i64::from(cell));
        assert!(inked.iter().all(|&(x, _)| i64::from(x) >= tx));

        let second_line = inked
            .iter()
            .filter(|&&(_, y)| i64::from(y) >= ty + i64::from(plan.line_height))
            .count();
        assert!(second_line > 0);
    }

    #[test]
    fn large_builtin_text_is_magnified() {
        let g = geometry::compute(1500, 1300);
        let font = FontHandle::builtin(g.font_size);
        let lines = vec!["H".to_string()];
        let plan = OverlayPlan {
            geometry: &g,
            lines: &lines,
            font: &font,
            line_height: line_height(g.font_size),
        };
        let mut image = white(1500, 1300);
        draw_overlay(&mut image, &plan).expect("draw");

        let (top, bottom) = row_span(&inked_inside(&image.to_rgb8(), &g));
        let builtin = BuiltinFont::for_size(g.font_size);
        assert_eq!(builtin.scale(), 2);
        assert!(bottom - top + 1 > builtin.font().character_size.height);
        assert!(bottom - top < builtin.cell_height());
    }

    #[test]
    fn outline_text_has_an_em_of_the_font_size() {
        let Some(path) = installed_font() else {
            eprintln!("skipping: no system font installed");
            return;
        };
        let g = geometry::compute(1500, 1300);
        let resolver = FontResolver::new(vec![path]);
        let font = resolver.get(g.font_size);
        assert!(!font.is_builtin(), "{}", font.describe());

        let lines = vec!["HHHH".to_string(), "Hgjy".to_string()];
        let plan = OverlayPlan {
            geometry: &g,
            lines: &lines,
            font: &font,
            line_height: line_height(g.font_size),
        };
        let mut image = white(1500, 1300);
        draw_overlay(&mut image, &plan).expect("draw");

        let inked = inked_inside(&image.to_rgb8(), &g);
        let (tx, ty) = g.text_origin();
        let line_h = i64::from(plan.line_height);
        let first: Vec<(u32, u32)> = inked
            .iter()
            .copied()
            .filter(|&(_, y)| i64::from(y) < ty + line_h)
            .collect();
        let second: Vec<(u32, u32)> = inked
            .iter()
            .copied()
            .filter(|&(_, y)| i64::from(y) >= ty + line_h)
            .collect();

        // Latin cap height sits between 0.6 and 0.8 em.
        let (top, bottom) = row_span(&first);
        let cap_height = bottom - top + 1;
        let size = g.font_size;
        assert!(
            cap_height * 10 >= size * 6 && cap_height * 10 <= size * 8,
            "cap height {}px at {}px",
            cap_height,
            size
        );
        assert!(i64::from(top) >= ty);

        let (_, descender) = row_span(&second);
        assert!(i64::from(descender) < ty + 2 * line_h);
        let right = inked.iter().map(|&(x, _)| i64::from(x)).max().expect("ink");
        assert!(right < tx + i64::from(g.text_area.width));
    }
}
