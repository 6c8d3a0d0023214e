use image::DynamicImage;

use super::map_samples;
use crate::error::OperationError;
use crate::operation::{ensure_not_empty, Operation};

/// Replace every colour sample `v` with `255 - v`. Alpha is left alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct Invert;

impl Invert {
    pub fn new() -> Self {
        Self
    }
}

impl Operation for Invert {
    fn run(&self, mut input: DynamicImage) -> Result<DynamicImage, OperationError> {
        ensure_not_empty(&input)?;
        input.invert();
        Ok(input)
    }

    fn name(&self) -> &'static str {
        "invert"
    }
}

/// Scale the saturation channel of an image in HLS space.
///
/// Values below `1.0` wash colours out, values above it intensify them.
/// Grayscale inputs come back unchanged.
#[derive(Debug, Clone, Copy)]
pub struct Saturate {
    value: f32,
}

impl Saturate {
    pub fn new(value: f32) -> Self {
        Self { value }
    }
}

impl Operation for Saturate {
    fn run(&self, input: DynamicImage) -> Result<DynamicImage, OperationError> {
        ensure_not_empty(&input)?;
        // Written as a negated comparison so NaN is rejected too.
        if !(self.value > 0.0) {
            return Err(OperationError::invalid(format!(
                "expected saturation value to be greater than 0, got {:.6}",
                self.value
            )));
        }

        let value = self.value;
        Ok(map_samples(input, |src, dst, layout| {
            if layout.channels < 3 {
                return;
            }
            for (s, d) in src
                .chunks_exact(layout.channels)
                .zip(dst.chunks_exact_mut(layout.channels))
            {
                let (h, l, sat) = rgb_to_hls(s[0], s[1], s[2]);
                let (r, g, b) = hls_to_rgb(h, l, (sat * value).clamp(0.0, 1.0));
                d[0] = r;
                d[1] = g;
                d[2] = b;
            }
        }))
    }

    fn name(&self) -> &'static str {
        "saturate"
    }
}

fn rgb_to_hls(r: u8, g: u8, b: u8) -> (f32, f32, f32) {
    let (r, g, b) = (r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let l = (max + min) / 2.0;
    if max == min {
        return (0.0, l, 0.0);
    }

    let delta = max - min;
    let s = if l <= 0.5 {
        delta / (max + min)
    } else {
        delta / (2.0 - max - min)
    };

    let rc = (max - r) / delta;
    let gc = (max - g) / delta;
    let bc = (max - b) / delta;
    let h = if r == max {
        bc - gc
    } else if g == max {
        2.0 + rc - bc
    } else {
        4.0 + gc - rc
    };

    ((h / 6.0).rem_euclid(1.0), l, s)
}

fn hls_to_rgb(h: f32, l: f32, s: f32) -> (u8, u8, u8) {
    if s == 0.0 {
        let v = to_u8(l);
        return (v, v, v);
    }
    let m2 = if l <= 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let m1 = 2.0 * l - m2;
    (
        to_u8(hue_component(m1, m2, h + 1.0 / 3.0)),
        to_u8(hue_component(m1, m2, h)),
        to_u8(hue_component(m1, m2, h - 1.0 / 3.0)),
    )
}

fn hue_component(m1: f32, m2: f32, hue: f32) -> f32 {
    let hue = hue.rem_euclid(1.0);
    if hue < 1.0 / 6.0 {
        m1 + (m2 - m1) * hue * 6.0
    } else if hue < 0.5 {
        m2
    } else if hue < 2.0 / 3.0 {
        m1 + (m2 - m1) * (2.0 / 3.0 - hue) * 6.0
    } else {
        m1
    }
}

fn to_u8(v: f32) -> u8 {
    (v * 255.0).round().clamp(0.0, 255.0) as u8
}
