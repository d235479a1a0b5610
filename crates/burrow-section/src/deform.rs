//! Deformation samples and profile curves.
//!
//! Both are consumed through traits so callers can plug in textures or
//! authored curves; [`NoiseField`] and [`KeyedProfiles`] are the defaults.

use noise::{Fbm, MultiFractal, NoiseFn, Perlin};
use serde::{Deserialize, Serialize};

/// Source of normalized displacement samples.
pub trait DeformationSource {
    /// Sample in `[0, 1]` for a longitudinal column and a ring position.
    /// `0.5` means no displacement.
    fn sample(&self, step: usize, ring_position: usize) -> f64;
}

impl<F> DeformationSource for F
where
    F: Fn(usize, usize) -> f64,
{
    fn sample(&self, step: usize, ring_position: usize) -> f64 {
        self(step, ring_position)
    }
}

/// Deformation source that never displaces anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatField;

impl DeformationSource for FlatField {
    fn sample(&self, _step: usize, _ring_position: usize) -> f64 {
        0.5
    }
}

/// Fractal Perlin noise over the (column, ring position) grid.
#[derive(Debug, Clone)]
pub struct NoiseField {
    fbm: Fbm<Perlin>,
}

impl NoiseField {
    /// Noise with the default octave setup.
    pub fn new(seed: u32) -> Self {
        Self {
            fbm: Fbm::<Perlin>::new(seed)
                .set_octaves(4)
                .set_frequency(0.05)
                .set_persistence(0.5),
        }
    }
}

impl DeformationSource for NoiseField {
    fn sample(&self, step: usize, ring_position: usize) -> f64 {
        let v = self.fbm.get([step as f64, ring_position as f64]);
        ((v + 1.0) * 0.5).clamp(0.0, 1.0)
    }
}

/// Deformation texture column for a distance along the path.
///
/// The distance is measured in steps and folded back and forth across the
/// texture width, so long tunnels mirror the texture instead of wrapping.
pub fn noise_column(distance: f64, step_size: f64, resolution: usize) -> usize {
    if resolution == 0 || step_size <= 0.0 {
        return 0;
    }
    let steps = (distance.max(0.0) / step_size).floor() as usize;
    let tile = steps / resolution;
    let within = steps % resolution;
    if tile % 2 == 0 {
        within
    } else {
        resolution - 1 - within
    }
}

/// Profile curves used by ring generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProfileCurve {
    /// Blend from full rounding (0) to none (1).
    Roundness,
    /// Blend applied to taper rotation and boost.
    RotationBlend,
}

/// Evaluator for the profile curves.
pub trait ProfileSource {
    /// Blend factor at `x` in `[0, 1]`.
    fn evaluate(&self, curve: ProfileCurve, x: f64) -> f64;
}

/// Piecewise-linear curve through sorted `(x, y)` keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyedCurve {
    keys: Vec<[f64; 2]>,
}

impl KeyedCurve {
    /// Build a curve; keys are sorted by `x`.
    pub fn new(mut keys: Vec<[f64; 2]>) -> Self {
        keys.sort_by(|a, b| a[0].total_cmp(&b[0]));
        Self { keys }
    }

    /// Straight line from `(0, 0)` to `(1, 1)`.
    pub fn linear() -> Self {
        Self::new(vec![[0.0, 0.0], [1.0, 1.0]])
    }

    /// Value at `x`, held constant outside the key range.
    pub fn evaluate(&self, x: f64) -> f64 {
        let (first, last) = match (self.keys.first(), self.keys.last()) {
            (Some(f), Some(l)) => (f, l),
            _ => return x,
        };
        if x <= first[0] {
            return first[1];
        }
        if x >= last[0] {
            return last[1];
        }
        let hi = self.keys.partition_point(|k| k[0] < x);
        let (a, b) = (self.keys[hi - 1], self.keys[hi]);
        let span = b[0] - a[0];
        if span <= 0.0 {
            return b[1];
        }
        a[1] + (b[1] - a[1]) * (x - a[0]) / span
    }
}

/// Roundness and rotation-blend curves as keyed polylines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyedProfiles {
    /// Roundness blend.
    pub roundness: KeyedCurve,
    /// Taper rotation blend.
    pub rotation_blend: KeyedCurve,
}

impl Default for KeyedProfiles {
    fn default() -> Self {
        Self {
            // Eases out so most of the rounding sits near the roof.
            roundness: KeyedCurve::new(vec![
                [0.0, 0.0],
                [0.1, 0.35],
                [0.25, 0.65],
                [0.5, 0.9],
                [1.0, 1.0],
            ]),
            rotation_blend: KeyedCurve::new(vec![[0.0, 0.0], [0.5, 0.75], [1.0, 1.0]]),
        }
    }
}

impl ProfileSource for KeyedProfiles {
    fn evaluate(&self, curve: ProfileCurve, x: f64) -> f64 {
        let x = x.clamp(0.0, 1.0);
        match curve {
            ProfileCurve::Roundness => self.roundness.evaluate(x),
            ProfileCurve::RotationBlend => self.rotation_blend.evaluate(x),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_field_is_neutral() {
        assert_eq!(FlatField.sample(10, 3), 0.5);
    }

    #[test]
    fn test_noise_field_range_and_determinism() {
        let field = NoiseField::new(7);
        for step in 0..50 {
            for pos in 0..20 {
                let s = field.sample(step, pos);
                assert!((0.0..=1.0).contains(&s));
                assert_eq!(s, NoiseField::new(7).sample(step, pos));
            }
        }
    }

    #[test]
    fn test_closure_source() {
        let source = |step: usize, pos: usize| (step + pos) as f64 / 100.0;
        assert!((source.sample(3, 4) - 0.07).abs() < 1e-12);
    }

    #[test]
    fn test_noise_column_ping_pong() {
        assert_eq!(noise_column(0.0, 50.0, 500), 0);
        assert_eq!(noise_column(50.0 * 499.0, 50.0, 500), 499);
        assert_eq!(noise_column(50.0 * 500.0, 50.0, 500), 499);
        assert_eq!(noise_column(50.0 * 501.0, 50.0, 500), 498);
        assert_eq!(noise_column(50.0 * 1000.0, 50.0, 500), 0);
        assert_eq!(noise_column(123.0, 0.0, 500), 0);
    }

    #[test]
    fn test_keyed_curve() {
        let curve = KeyedCurve::new(vec![[1.0, 1.0], [0.0, 0.0], [0.5, 0.8]]);
        assert_eq!(curve.evaluate(-1.0), 0.0);
        assert_eq!(curve.evaluate(2.0), 1.0);
        assert!((curve.evaluate(0.25) - 0.4).abs() < 1e-12);
        assert!((curve.evaluate(0.75) - 0.9).abs() < 1e-12);
    }

    #[test]
    fn test_default_profiles_span_unit_range() {
        let profiles = KeyedProfiles::default();
        for curve in [ProfileCurve::Roundness, ProfileCurve::RotationBlend] {
            assert_eq!(profiles.evaluate(curve, 0.0), 0.0);
            assert_eq!(profiles.evaluate(curve, 1.0), 1.0);
        }
    }
}
