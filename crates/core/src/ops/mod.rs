//! Concrete [`Operation`](crate::Operation) implementations.
//!
//! Constructors never fail; each `run` validates its own parameters first.

mod colors;
mod edges;
mod filter;
mod font;
mod morphology;
mod quality;
mod shuffle;
mod text;

use image::{DynamicImage, ImageBuffer, Pixel};

pub use colors::{Invert, Saturate};
pub use edges::EdgeDetect;
pub use filter::RandomFilter;
pub use morphology::{Morphology, MorphologyKind};
pub use quality::Reduce;
pub use shuffle::Shuffle;
pub use text::AddText;

/// Shape of an interleaved 8-bit sample buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Layout {
    pub width: usize,
    pub height: usize,
    pub channels: usize,
}

impl Layout {
    pub fn index(&self, x: usize, y: usize) -> usize {
        (y * self.width + x) * self.channels
    }
}

/// Run `f` over the interleaved samples of `input`, writing into a copy.
///
/// 8-bit layouts are preserved; anything else is converted to RGBA8 first.
pub(crate) fn map_samples<F>(input: DynamicImage, f: F) -> DynamicImage
where
    F: FnOnce(&[u8], &mut [u8], Layout),
{
    match input {
        DynamicImage::ImageLuma8(src) => DynamicImage::ImageLuma8(apply(src, f)),
        DynamicImage::ImageLumaA8(src) => DynamicImage::ImageLumaA8(apply(src, f)),
        DynamicImage::ImageRgb8(src) => DynamicImage::ImageRgb8(apply(src, f)),
        DynamicImage::ImageRgba8(src) => DynamicImage::ImageRgba8(apply(src, f)),
        other => DynamicImage::ImageRgba8(apply(other.to_rgba8(), f)),
    }
}

fn apply<P, F>(src: ImageBuffer<P, Vec<u8>>, f: F) -> ImageBuffer<P, Vec<u8>>
where
    P: Pixel<Subpixel = u8>,
    F: FnOnce(&[u8], &mut [u8], Layout),
{
    let layout = Layout {
        width: src.width() as usize,
        height: src.height() as usize,
        channels: usize::from(P::CHANNEL_COUNT),
    };
    let mut dst = src.clone();
    f(src.as_raw().as_slice(), &mut *dst, layout);
    dst
}

/// Mirror an out-of-range coordinate back into `0..len` without repeating
/// the edge sample (`gfedcb|abcdefgh|gfedcba`).
pub(crate) fn reflect_101(mut pos: i64, len: i64) -> usize {
    if len <= 1 {
        return 0;
    }
    loop {
        if pos < 0 {
            pos = -pos;
        } else if pos >= len {
            pos = 2 * (len - 1) - pos;
        } else {
            return pos as usize;
        }
    }
}
