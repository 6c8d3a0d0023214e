use image::{DynamicImage, RgbImage};
use rand::Rng;

use super::reflect_101;
use crate::error::OperationError;
use crate::operation::{ensure_not_empty, Operation};

/// Convolve each RGB channel with its own randomly generated kernel.
///
/// Kernel weights are drawn uniformly from `min..=max`. With `normalize`
/// each kernel is scaled to sum to one (kernels summing to zero are left
/// as they are). The output is always RGB8; alpha is dropped.
#[derive(Debug, Clone, Copy)]
pub struct RandomFilter {
    kernel_size: i32,
    min: i32,
    max: i32,
    normalize: bool,
}

impl RandomFilter {
    pub fn new(kernel_size: i32, min: i32, max: i32, normalize: bool) -> Self {
        Self {
            kernel_size,
            min,
            max,
            normalize,
        }
    }

    fn random_kernel(&self, rng: &mut impl Rng) -> Kernel {
        let size = self.kernel_size as usize;
        let (min, max) = (self.min as f32, self.max as f32);
        let mut weights: Vec<f32> = (0..size * size)
            .map(|_| rng.random_range(min..=max))
            .collect();

        if self.normalize {
            let sum: f32 = weights.iter().sum();
            if sum.abs() > f32::EPSILON {
                weights.iter_mut().for_each(|w| *w /= sum);
            }
        }
        Kernel { size, weights }
    }
}

impl Operation for RandomFilter {
    fn run(&self, input: DynamicImage) -> Result<DynamicImage, OperationError> {
        ensure_not_empty(&input)?;
        if self.kernel_size <= 0 {
            return Err(OperationError::invalid(format!(
                "expected kernel size to be greater than 0, got {}",
                self.kernel_size
            )));
        }
        if self.min > self.max {
            return Err(OperationError::invalid(format!(
                "expected min to be less than or equal to max, got {} and {}",
                self.min, self.max
            )));
        }

        let rgb = input.to_rgb8();
        let (width, height) = (rgb.width() as usize, rgb.height() as usize);
        // Past this size reflect-101 only revisits the same samples.
        let max_kernel = 2 * width.max(height) + 1;
        if self.kernel_size as usize > max_kernel {
            return Err(OperationError::invalid(format!(
                "expected kernel size to be at most {max_kernel} for a {width} by {height} image, got {}",
                self.kernel_size
            )));
        }
        let mut rng = rand::rng();
        let kernels: [Kernel; 3] = std::array::from_fn(|_| self.random_kernel(&mut rng));
        let planes: [Vec<u8>; 3] = std::array::from_fn(|c| {
            rgb.as_raw().iter().skip(c).step_by(3).copied().collect()
        });

        // Channels are independent, so convolve them side by side.
        let filtered: Vec<Vec<u8>> = std::thread::scope(|s| {
            let handles: Vec<_> = planes
                .iter()
                .zip(&kernels)
                .map(|(plane, kernel)| s.spawn(move || convolve(plane, width, height, kernel)))
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap_or_else(|panic| std::panic::resume_unwind(panic)))
                .collect()
        });

        let out = RgbImage::from_fn(width as u32, height as u32, |x, y| {
            let i = y as usize * width + x as usize;
            image::Rgb([filtered[0][i], filtered[1][i], filtered[2][i]])
        });
        Ok(DynamicImage::ImageRgb8(out))
    }

    fn name(&self) -> &'static str {
        "random_filter"
    }
}

#[derive(Debug, Clone)]
struct Kernel {
    size: usize,
    /// Row-major weights.
    weights: Vec<f32>,
}

/// Correlate `plane` with `kernel` anchored at its centre, saturating to u8.
fn convolve(plane: &[u8], width: usize, height: usize, kernel: &Kernel) -> Vec<u8> {
    let anchor = (kernel.size / 2) as i64;
    let mut out = Vec::with_capacity(plane.len());
    for y in 0..height as i64 {
        for x in 0..width as i64 {
            let mut acc = 0.0f32;
            for ky in 0..kernel.size {
                let sy = reflect_101(y + ky as i64 - anchor, height as i64);
                for kx in 0..kernel.size {
                    let sx = reflect_101(x + kx as i64 - anchor, width as i64);
                    acc += kernel.weights[ky * kernel.size + kx] * f32::from(plane[sy * width + sx]);
                }
            }
            out.push(acc.round().clamp(0.0, 255.0) as u8);
        }
    }
    out
}
