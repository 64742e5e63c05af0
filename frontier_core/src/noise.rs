//! Hash-driven gradient noise used to classify regions.
//!
//! Gradients at lattice corners are picked by hashing the corner with the
//! noise hasher. Interpolation runs in decimal arithmetic so every client
//! quantizes to the same integer.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::config::{ConfigError, MirrorAxes, WorldParameters};
use crate::hash::{LocationHash, PermutationHash};
use crate::sector::Coordinate;

pub const NOISE_MAX: i32 = 32;
const OCTAVES: u32 = 3;

/// Unit vectors 22.5° apart, in thousandths.
const GRADIENTS: [(i64, i64); 16] = [
    (1000, 0),
    (923, 382),
    (707, 707),
    (382, 923),
    (0, 1000),
    (-383, 923),
    (-708, 707),
    (-924, 382),
    (-1000, 0),
    (-924, -383),
    (-708, -708),
    (-383, -924),
    (-1, -1000),
    (382, -924),
    (707, -708),
    (923, -383),
];

fn gradient(index: u8) -> (Decimal, Decimal) {
    let (gx, gy) = GRADIENTS[index as usize & 0x0f];
    (Decimal::new(gx, 3), Decimal::new(gy, 3))
}

#[derive(Debug, Clone)]
pub struct NoiseField {
    hasher: PermutationHash,
    scale: i32,
    mirror: MirrorAxes,
}

impl NoiseField {
    pub fn new(params: &WorldParameters) -> Result<Self, ConfigError> {
        let hasher = PermutationHash::new(&params.noise_seed, params.noise_rounds)?;
        Self::with_hasher(hasher, params.scale, params.mirror)
    }

    pub fn with_hasher(
        hasher: PermutationHash,
        scale: i32,
        mirror: MirrorAxes,
    ) -> Result<Self, ConfigError> {
        if scale <= 0 {
            return Err(ConfigError::Invalid(format!(
                "noise scale must be positive, got {scale}"
            )));
        }
        Ok(Self {
            hasher,
            scale,
            mirror,
        })
    }

    pub fn scale(&self) -> i32 {
        self.scale
    }

    /// Gradient index in `0..16` for a lattice corner at the given scale.
    pub fn random(&mut self, x: i64, y: i64, scale: i64) -> u8 {
        let digest = self.hasher.digest_i64(&[x, y, scale]);
        LocationHash::from_field(&digest).low_nibble()
    }

    /// Raw single-octave value at `point` for lattice spacing `scale`.
    pub fn value_at(&mut self, point: Coordinate, scale: i64) -> Decimal {
        let (px, py) = (point.x as i64, point.y as i64);
        let left = px - px.rem_euclid(scale);
        let bottom = py - py.rem_euclid(scale);
        let corners = [
            (left, bottom),
            (left + scale, bottom),
            (left, bottom + scale),
            (left + scale, bottom + scale),
        ];

        let s = Decimal::from(scale);
        let (dpx, dpy) = (Decimal::from(px), Decimal::from(py));
        let mut total = Decimal::ZERO;
        for (cx, cy) in corners {
            let (gx, gy) = gradient(self.random(cx, cy, scale));
            let (dcx, dcy) = (Decimal::from(cx), Decimal::from(cy));
            let weight = (Decimal::ONE - (dpx / s - dcx / s).abs())
                * (Decimal::ONE - (dpy / s - dcy / s).abs());
            let dot = (dpx - dcx) / s * gx + (dpy - dcy) / s * gy;
            total += weight * dot;
        }
        total
    }

    /// Blended three-octave value quantized into `[0, NOISE_MAX)`.
    pub fn quantized_value_at(&mut self, point: Coordinate) -> i32 {
        let mut point = point;
        if self.mirror.contains(MirrorAxes::X) {
            point.x = point.x.saturating_abs();
        }
        if self.mirror.contains(MirrorAxes::Y) {
            point.y = point.y.saturating_abs();
        }

        let base = self.scale as i64;
        let octaves: Vec<Decimal> = (0..OCTAVES)
            .map(|octave| self.value_at(point, base << octave))
            .collect();
        let blended = (octaves[0] * Decimal::TWO + octaves[1] + octaves[2]) / Decimal::from(4);
        let half = NOISE_MAX / 2;
        let scaled = (blended * Decimal::from(half)).floor();
        let value = scaled.to_i32().unwrap_or(0) + half;
        value.clamp(0, NOISE_MAX - 1)
    }
}
