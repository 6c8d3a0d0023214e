use image::{DynamicImage, GrayImage, Luma};

use crate::error::OperationError;
use crate::operation::{ensure_not_empty, Operation};

/// Canny-style edge detection producing a binary single-channel map.
///
/// Gradients come from a 3x3 Sobel operator (L1 magnitude), are thinned by
/// non-maximum suppression and then linked with double-threshold hysteresis:
/// pixels at or above `higher` seed edges, pixels at or above `lower` extend
/// them.
#[derive(Debug, Clone, Copy)]
pub struct EdgeDetect {
    lower: f32,
    higher: f32,
}

impl EdgeDetect {
    pub fn new(lower: f32, higher: f32) -> Self {
        Self { lower, higher }
    }
}

const EDGE: u8 = 255;

impl Operation for EdgeDetect {
    fn run(&self, input: DynamicImage) -> Result<DynamicImage, OperationError> {
        ensure_not_empty(&input)?;
        if !(self.lower >= 0.0) || !(self.higher >= 0.0) {
            return Err(OperationError::invalid(format!(
                "expected t_lower and t_higher to be greater than or equal to 0, got {:.2} and {:.2}",
                self.lower, self.higher
            )));
        }
        let (low, high) = if self.lower <= self.higher {
            (self.lower, self.higher)
        } else {
            (self.higher, self.lower)
        };

        let gray = input.to_luma8();
        let (width, height) = (gray.width() as usize, gray.height() as usize);
        let (magnitude, direction) = sobel(&gray);
        let thinned = suppress_non_maxima(&magnitude, &direction, width, height);
        let edges = hysteresis(&thinned, width, height, low, high);

        let mut out = GrayImage::new(width as u32, height as u32);
        for (i, is_edge) in edges.into_iter().enumerate() {
            if is_edge {
                let (x, y) = (i % width, i / width);
                out.put_pixel(x as u32, y as u32, Luma([EDGE]));
            }
        }
        Ok(DynamicImage::ImageLuma8(out))
    }

    fn name(&self) -> &'static str {
        "edge_detect"
    }
}

/// Quantized gradient direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Horizontal,
    Diagonal,
    Vertical,
    AntiDiagonal,
}

fn sobel(gray: &GrayImage) -> (Vec<f32>, Vec<Direction>) {
    let (w, h) = (gray.width() as i64, gray.height() as i64);
    let at = |x: i64, y: i64| -> f32 {
        let x = x.clamp(0, w - 1) as u32;
        let y = y.clamp(0, h - 1) as u32;
        f32::from(gray.get_pixel(x, y)[0])
    };

    let len = (w * h) as usize;
    let mut magnitude = Vec::with_capacity(len);
    let mut direction = Vec::with_capacity(len);
    for y in 0..h {
        for x in 0..w {
            let gx = at(x + 1, y - 1) + 2.0 * at(x + 1, y) + at(x + 1, y + 1)
                - at(x - 1, y - 1)
                - 2.0 * at(x - 1, y)
                - at(x - 1, y + 1);
            let gy = at(x - 1, y + 1) + 2.0 * at(x, y + 1) + at(x + 1, y + 1)
                - at(x - 1, y - 1)
                - 2.0 * at(x, y - 1)
                - at(x + 1, y - 1);
            magnitude.push(gx.abs() + gy.abs());
            direction.push(quantize(gx, gy));
        }
    }
    (magnitude, direction)
}

fn quantize(gx: f32, gy: f32) -> Direction {
    let angle = gy.atan2(gx).to_degrees().rem_euclid(180.0);
    if !(22.5..157.5).contains(&angle) {
        Direction::Horizontal
    } else if angle < 67.5 {
        Direction::Diagonal
    } else if angle < 112.5 {
        Direction::Vertical
    } else {
        Direction::AntiDiagonal
    }
}

fn suppress_non_maxima(
    magnitude: &[f32],
    direction: &[Direction],
    width: usize,
    height: usize,
) -> Vec<f32> {
    let get = |x: i64, y: i64| -> f32 {
        if x < 0 || y < 0 || x >= width as i64 || y >= height as i64 {
            0.0
        } else {
            magnitude[y as usize * width + x as usize]
        }
    };

    let mut out = vec![0.0; magnitude.len()];
    for y in 0..height {
        for x in 0..width {
            let i = y * width + x;
            let m = magnitude[i];
            let (dx, dy) = match direction[i] {
                Direction::Horizontal => (1, 0),
                Direction::Diagonal => (1, 1),
                Direction::Vertical => (0, 1),
                Direction::AntiDiagonal => (-1, 1),
            };
            let (xi, yi) = (x as i64, y as i64);
            if m >= get(xi + dx, yi + dy) && m >= get(xi - dx, yi - dy) {
                out[i] = m;
            }
        }
    }
    out
}

fn hysteresis(magnitude: &[f32], width: usize, height: usize, low: f32, high: f32) -> Vec<bool> {
    let mut edges = vec![false; magnitude.len()];
    let mut stack: Vec<usize> = magnitude
        .iter()
        .enumerate()
        .filter(|&(_, &m)| m > 0.0 && m >= high)
        .map(|(i, _)| i)
        .collect();
    for &i in &stack {
        edges[i] = true;
    }

    while let Some(i) = stack.pop() {
        let (x, y) = ((i % width) as i64, (i / width) as i64);
        for dy in -1..=1 {
            for dx in -1..=1 {
                let (nx, ny) = (x + dx, y + dy);
                if nx < 0 || ny < 0 || nx >= width as i64 || ny >= height as i64 {
                    continue;
                }
                let n = ny as usize * width + nx as usize;
                if !edges[n] && magnitude[n] > 0.0 && magnitude[n] >= low {
                    edges[n] = true;
                    stack.push(n);
                }
            }
        }
    }
    edges
}
