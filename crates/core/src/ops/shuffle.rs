use image::{imageops, DynamicImage, GenericImageView};
use rand::seq::SliceRandom;

use crate::error::OperationError;
use crate::operation::{ensure_not_empty, Operation};

/// Cut the image into a grid of tiles and reassemble them in random order.
///
/// The grid has `floor(sqrt(p))` rows and `floor(p / rows)` columns, so the
/// tile count can be slightly below the requested `p`. Remainder pixels that
/// do not fill a whole tile are trimmed from the right and bottom edges.
#[derive(Debug, Clone, Copy)]
pub struct Shuffle {
    partitions: i32,
}

impl Shuffle {
    pub fn new(partitions: i32) -> Self {
        Self { partitions }
    }
}

impl Operation for Shuffle {
    fn run(&self, input: DynamicImage) -> Result<DynamicImage, OperationError> {
        ensure_not_empty(&input)?;
        if self.partitions <= 1 {
            return Err(OperationError::invalid(format!(
                "expected partitions to be greater than 1, got {}",
                self.partitions
            )));
        }

        let (cols, rows) = input.dimensions();
        let too_many = || {
            OperationError::invalid(format!(
                "cannot fit {} partitions in a {} by {} image",
                self.partitions, rows, cols
            ))
        };
        let partitions = self.partitions as u64;
        if partitions >= u64::from(rows) * u64::from(cols) {
            return Err(too_many());
        }

        let grid_rows = (partitions as f64).sqrt().floor() as u32;
        let grid_cols = (partitions / u64::from(grid_rows)) as u32;
        let tile_width = cols / grid_cols;
        let tile_height = rows / grid_rows;
        if tile_width == 0 || tile_height == 0 {
            return Err(too_many());
        }

        let mut tiles: Vec<DynamicImage> = (0..grid_rows)
            .flat_map(|r| (0..grid_cols).map(move |c| (r, c)))
            .map(|(r, c)| input.crop_imm(c * tile_width, r * tile_height, tile_width, tile_height))
            .collect();
        tiles.shuffle(&mut rand::rng());

        let mut out = DynamicImage::new(grid_cols * tile_width, grid_rows * tile_height, input.color());
        for (i, tile) in tiles.iter().enumerate() {
            let i = i as u32;
            let x = (i % grid_cols) * tile_width;
            let y = (i / grid_cols) * tile_height;
            imageops::replace(&mut out, tile, i64::from(x), i64::from(y));
        }
        Ok(out)
    }

    fn name(&self) -> &'static str {
        "shuffle"
    }
}
