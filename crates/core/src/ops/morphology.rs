use std::fmt;
use std::str::FromStr;

use image::DynamicImage;

use super::{map_samples, Layout};
use crate::error::OperationError;
use crate::operation::{ensure_not_empty, Operation};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MorphologyKind {
    /// Grow bright regions (windowed maximum).
    Dilate,
    /// Shrink bright regions (windowed minimum).
    Erode,
}

impl fmt::Display for MorphologyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Dilate => f.write_str("Dilate"),
            Self::Erode => f.write_str("Erode"),
        }
    }
}

impl FromStr for MorphologyKind {
    type Err = OperationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("dilate") {
            Ok(Self::Dilate)
        } else if s.eq_ignore_ascii_case("erode") {
            Ok(Self::Erode)
        } else {
            Err(OperationError::invalid(format!(
                "invalid morphology operation: {s}"
            )))
        }
    }
}

/// Rectangular-kernel dilation or erosion, applied `iterations` times.
#[derive(Debug, Clone, Copy)]
pub struct Morphology {
    kernel_size: i32,
    iterations: i32,
    kind: MorphologyKind,
}

impl Morphology {
    pub fn new(kernel_size: i32, iterations: i32, kind: MorphologyKind) -> Self {
        Self {
            kernel_size,
            iterations,
            kind,
        }
    }
}

impl Operation for Morphology {
    fn run(&self, input: DynamicImage) -> Result<DynamicImage, OperationError> {
        ensure_not_empty(&input)?;
        if self.kernel_size <= 0 || self.iterations <= 0 {
            return Err(OperationError::invalid(format!(
                "expected kernel size and iterations to be greater than 0, got {} and {}",
                self.kernel_size, self.iterations
            )));
        }

        let kernel = self.kernel_size as usize;
        let iterations = self.iterations as usize;
        let pick: fn(u8, u8) -> u8 = match self.kind {
            MorphologyKind::Dilate => u8::max,
            MorphologyKind::Erode => u8::min,
        };

        Ok(map_samples(input, |src, dst, layout| {
            let mut current = src.to_vec();
            let mut scratch = vec![0u8; src.len()];
            for _ in 0..iterations {
                window_pass(&current, &mut scratch, layout, kernel, pick, Axis::X);
                window_pass(&scratch, &mut current, layout, kernel, pick, Axis::Y);
            }
            dst.copy_from_slice(&current);
        }))
    }

    fn name(&self) -> &'static str {
        match self.kind {
            MorphologyKind::Dilate => "dilate",
            MorphologyKind::Erode => "erode",
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Axis {
    X,
    Y,
}

/// One separable pass of the rectangular window. Samples outside the image
/// are ignored rather than padded, so borders never bleed in.
fn window_pass(
    src: &[u8],
    dst: &mut [u8],
    layout: Layout,
    kernel: usize,
    pick: fn(u8, u8) -> u8,
    axis: Axis,
) {
    let before = kernel / 2;
    let after = kernel - 1 - before;
    let len = match axis {
        Axis::X => layout.width,
        Axis::Y => layout.height,
    };

    for y in 0..layout.height {
        for x in 0..layout.width {
            let pos = match axis {
                Axis::X => x,
                Axis::Y => y,
            };
            let start = pos.saturating_sub(before);
            let end = (pos + after).min(len - 1);
            let out = layout.index(x, y);
            for c in 0..layout.channels {
                let mut acc = src[out + c];
                for p in start..=end {
                    let i = match axis {
                        Axis::X => layout.index(p, y),
                        Axis::Y => layout.index(x, p),
                    };
                    acc = pick(acc, src[i + c]);
                }
                dst[out + c] = acc;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use image::{GrayImage, Luma};

    use super::*;

    /// 9x9 black image with a single white pixel in the centre.
    fn dot() -> DynamicImage {
        let mut img = GrayImage::new(9, 9);
        img.put_pixel(4, 4, Luma([255]));
        DynamicImage::ImageLuma8(img)
    }

    fn white_count(img: &DynamicImage) -> usize {
        img.to_luma8().pixels().filter(|p| p[0] == 255).count()
    }

    #[test]
    fn zero_kernel_is_rejected() {
        let err = Morphology::new(0, 3, MorphologyKind::Dilate)
            .run(dot())
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "expected kernel size and iterations to be greater than 0, got 0 and 3"
        );
    }

    #[test]
    fn negative_kernel_is_rejected() {
        let err = Morphology::new(-1, 3, MorphologyKind::Dilate)
            .run(dot())
            .unwrap_err();
        assert!(matches!(err, OperationError::InvalidParameter(_)));
    }

    #[test]
    fn dilate_grows_dot_into_square() {
        let out = Morphology::new(3, 1, MorphologyKind::Dilate)
            .run(dot())
            .unwrap();
        assert_eq!(white_count(&out), 9);
    }

    #[test]
    fn iterations_compound() {
        let out = Morphology::new(3, 2, MorphologyKind::Dilate)
            .run(dot())
            .unwrap();
        assert_eq!(white_count(&out), 25);
    }

    #[test]
    fn erode_removes_isolated_dot() {
        let out = Morphology::new(3, 1, MorphologyKind::Erode)
            .run(dot())
            .unwrap();
        assert_eq!(white_count(&out), 0);
    }

    #[test]
    fn kind_parses_case_insensitively() {
        assert_eq!("dilate".parse::<MorphologyKind>(), Ok(MorphologyKind::Dilate));
        assert_eq!("Erode".parse::<MorphologyKind>(), Ok(MorphologyKind::Erode));
        assert!("open".parse::<MorphologyKind>().is_err());
    }
}
