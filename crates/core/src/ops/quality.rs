use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView};

use crate::error::OperationError;
use crate::operation::{ensure_not_empty, Operation};

/// Pixelate an image by shrinking it by `quality` and scaling it back up with
/// nearest-neighbour sampling. The output keeps the input dimensions.
#[derive(Debug, Clone, Copy)]
pub struct Reduce {
    quality: f32,
}

impl Reduce {
    pub fn new(quality: f32) -> Self {
        Self { quality }
    }
}

impl Operation for Reduce {
    fn run(&self, input: DynamicImage) -> Result<DynamicImage, OperationError> {
        ensure_not_empty(&input)?;
        if !(self.quality > 0.0) {
            return Err(OperationError::invalid(format!(
                "expected quality to be greater than 0.0, got {:.2}",
                self.quality
            )));
        }

        let (width, height) = input.dimensions();
        let scaled_width = (width as f32 * self.quality) as u32;
        let scaled_height = (height as f32 * self.quality) as u32;
        if scaled_width == 0 || scaled_height == 0 {
            return Err(OperationError::invalid(
                "shrinking provided image resulted in a 0 width or height, cannot continue",
            ));
        }

        Ok(input
            .resize_exact(scaled_width, scaled_height, FilterType::Nearest)
            .resize_exact(width, height, FilterType::Nearest))
    }

    fn name(&self) -> &'static str {
        "reduce"
    }
}
