use image::DynamicImage;

use super::font::{self, ADVANCE, GLYPH_HEIGHT, GLYPH_WIDTH};
use super::map_samples;
use crate::error::OperationError;
use crate::operation::{ensure_not_empty, Operation};

/// Font dots per unit of `font_scale`.
const DOTS_PER_SCALE: f64 = 2.0;

/// Draw white text onto an image.
///
/// `x` and `y` are fractions of the width and height locating the
/// bottom-left corner of the first glyph. Text running off the image is
/// clipped.
#[derive(Debug, Clone)]
pub struct AddText {
    text: String,
    font_scale: f64,
    x: f64,
    y: f64,
}

impl AddText {
    pub fn new(text: impl Into<String>, font_scale: f64, x: f64, y: f64) -> Self {
        Self {
            text: text.into(),
            font_scale,
            x,
            y,
        }
    }

    fn validate(&self) -> Result<(), OperationError> {
        if self.text.is_empty() {
            return Err(OperationError::invalid("must be given a non-empty string"));
        }
        if !(0.0..=1.0).contains(&self.x) || !(0.0..=1.0).contains(&self.y) {
            return Err(OperationError::invalid(format!(
                "expected x and y percentages to be between 0 and 1, got {:.2}. {:.2}",
                self.x, self.y
            )));
        }
        if !(self.font_scale > 0.0) {
            return Err(OperationError::invalid(format!(
                "expected font scale to be greater than 0, got {:.2}",
                self.font_scale
            )));
        }
        Ok(())
    }
}

impl Operation for AddText {
    fn run(&self, input: DynamicImage) -> Result<DynamicImage, OperationError> {
        ensure_not_empty(&input)?;
        self.validate()?;

        // A dot wider than the image paints the same pixels as one that fits.
        let largest = f64::from(input.width().max(input.height()));
        let dot = (self.font_scale * DOTS_PER_SCALE).round().clamp(1.0, largest) as i64;
        Ok(map_samples(input, |_, dst, layout| {
            let origin_x = (self.x * layout.width as f64) as i64;
            let baseline = (self.y * layout.height as f64) as i64;
            let top = baseline - GLYPH_HEIGHT as i64 * dot;

            for (n, c) in self.text.chars().enumerate() {
                let glyph_left = (n as i64)
                    .saturating_mul(ADVANCE as i64 * dot)
                    .saturating_add(origin_x);
                if glyph_left >= layout.width as i64 {
                    break;
                }
                for col in 0..GLYPH_WIDTH {
                    for row in 0..GLYPH_HEIGHT {
                        if !font::is_lit(c, col, row) {
                            continue;
                        }
                        let left = glyph_left + col as i64 * dot;
                        let upper = top + row as i64 * dot;
                        fill_dot(dst, layout, left, upper, dot);
                    }
                }
            }
        }))
    }

    fn name(&self) -> &'static str {
        "add_text"
    }
}

/// Paint a `size`x`size` white square, clipped to the image.
fn fill_dot(dst: &mut [u8], layout: super::Layout, left: i64, top: i64, size: i64) {
    let (x0, x1) = (left.max(0), (left + size).min(layout.width as i64));
    let (y0, y1) = (top.max(0), (top + size).min(layout.height as i64));
    for y in y0..y1 {
        for x in x0..x1 {
            let i = layout.index(x as usize, y as usize);
            dst[i..i + layout.channels].fill(u8::MAX);
        }
    }
}
