//! Explicit state threaded through the ring walk.

use burrow_math::{Point3, Vec3};
use burrow_path::Path;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::{GenerationSettings, RingLayout, SectionShape, SignMode, TaperPlan};

/// Per-segment constants.
#[derive(Debug, Clone)]
pub(crate) struct SegmentContext<'a> {
    pub path: &'a Path,
    pub segment: usize,
    pub steps: usize,
    pub start_distance: f64,
    pub end_distance: f64,
    pub taper: TaperPlan,
    pub shape: SectionShape,
    pub width: f64,
    pub horizontal_step: f64,
    pub vertical_step: f64,
    pub rounding: f64,
}

impl<'a> SegmentContext<'a> {
    pub fn new(
        path: &'a Path,
        segment: usize,
        steps: usize,
        taper: TaperPlan,
        shape: SectionShape,
        layout: &RingLayout,
        settings: &GenerationSettings,
    ) -> Self {
        Self {
            path,
            segment,
            steps,
            start_distance: path.distance_at_point(segment),
            end_distance: path.distance_at_point(segment + 1),
            taper,
            shape,
            width: shape.width(),
            horizontal_step: shape.horizontal_step(layout),
            vertical_step: shape.vertical_step(layout),
            rounding: shape.rounding(settings),
        }
    }

    /// Distance along the path of ring `step`; the last ring lands on the
    /// segment end.
    pub fn distance_at_step(&self, step: usize, step_size: f64) -> f64 {
        if step >= self.steps {
            self.end_distance
        } else {
            self.start_distance + step as f64 * step_size
        }
    }
}

/// Running state of one ring.
#[derive(Debug, Clone)]
pub(crate) struct RingState {
    pub step: usize,
    pub distance: f64,
    pub origin: Point3,
    pub right: Vec3,
    pub forward: Vec3,
    pub column: usize,
    /// First vertex of the ring; the closing vertex copies it.
    pub first: Point3,
    /// Most recently emitted vertex.
    pub latest: Point3,
    /// Base of the surface currently being swept.
    pub wall_start: Point3,
    pub roof_origin: Point3,
}

/// Sign of the floor displacement at `distance` along a path and a ring
/// position, following [`GenerationSettings::floor_sign`].
pub fn floor_sign(settings: &GenerationSettings, distance: f64, ring_position: usize) -> f64 {
    let positive = match settings.floor_sign {
        SignMode::Deterministic => {
            let along = (distance * 1000.0).round() as i64 as u64;
            let seed = settings.sign_seed
                ^ along.wrapping_mul(0x9E37_79B9_7F4A_7C15)
                ^ (ring_position as u64).wrapping_mul(0xC2B2_AE3D_27D4_EB4F);
            StdRng::seed_from_u64(seed).random_bool(0.5)
        }
        SignMode::Random => rand::rng().random_bool(0.5),
    };
    if positive {
        1.0
    } else {
        -1.0
    }
}
