//! Generation parameters.

use serde::{Deserialize, Serialize};

use crate::RingLayout;

/// World units per unit of width or height scale.
pub const UNITS_PER_SCALE: f64 = 100.0;

/// How the sign of floor deformation is chosen.
///
/// `Deterministic` derives the sign from where the vertex sits, so the same
/// segment always regenerates to the same ring and cached ends stay valid.
/// `Random` draws a fresh sign per vertex; regenerating a segment then moves
/// its floor and a replayed cache ring no longer matches a recomputed one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignMode {
    /// Sign seeded from longitudinal position and ring position.
    #[default]
    Deterministic,
    /// Sign drawn from the thread RNG on every call.
    Random,
}

/// Constants of the ring walk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    /// Longitudinal distance between rings.
    pub step_size: f64,
    /// Width of the deformation texture in steps; the lookup column
    /// ping-pongs across it.
    pub noise_resolution: usize,
    /// Largest vertical floor displacement at full floor weight.
    pub max_floor_deformation: f64,
    /// Largest wall and roof displacement at full wall weight.
    pub max_wall_deformation: f64,
    /// Rounding of the upper wall and roof vault.
    pub round_value: f64,
    /// Number of steps over which a taper ramps out.
    pub taper_steps: usize,
    /// Wall rotation at the junction end of a taper, in degrees.
    pub taper_angle: f64,
    /// Extra rounding added at the junction end of a taper.
    pub taper_boost: f64,
    /// Floor deformation sign policy.
    pub floor_sign: SignMode,
    /// Mixed into deterministic floor signs.
    pub sign_seed: u64,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            step_size: 50.0,
            noise_resolution: 500,
            max_floor_deformation: 50.0,
            max_wall_deformation: 100.0,
            round_value: 100.0,
            taper_steps: 5,
            taper_angle: 45.0,
            taper_boost: 100.0,
            floor_sign: SignMode::Deterministic,
            sign_seed: 0,
        }
    }
}

/// Size and roughness of a tunnel or junction cross-section.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SectionShape {
    /// Width in units of [`UNITS_PER_SCALE`].
    pub width_scale: f64,
    /// Wall height in units of [`UNITS_PER_SCALE`].
    pub height_scale: f64,
    /// Floor deformation weight in `[0, 1]`.
    pub floor_deformation: f64,
    /// Wall deformation weight in `[0, 1]`.
    pub wall_deformation: f64,
}

impl Default for SectionShape {
    fn default() -> Self {
        Self {
            width_scale: 5.0,
            height_scale: 3.0,
            floor_deformation: 0.25,
            wall_deformation: 0.25,
        }
    }
}

impl SectionShape {
    /// Floor width.
    pub fn width(&self) -> f64 {
        self.width_scale * UNITS_PER_SCALE
    }

    /// Wall height.
    pub fn height(&self) -> f64 {
        self.height_scale * UNITS_PER_SCALE
    }

    /// Spacing between floor vertices.
    pub fn horizontal_step(&self, layout: &RingLayout) -> f64 {
        self.width() / (layout.horizontal.max(2) - 1) as f64
    }

    /// Spacing between wall vertices.
    pub fn vertical_step(&self, layout: &RingLayout) -> f64 {
        self.height() / layout.vertical.max(1) as f64
    }

    /// Rounding magnitude, limited so the roof keeps half the floor width.
    pub fn rounding(&self, settings: &GenerationSettings) -> f64 {
        settings.round_value.clamp(0.0, self.width() * 0.25)
    }
}

/// Which walls of a segment end taper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SideMask {
    /// Right wall tapers.
    pub right: bool,
    /// Left wall tapers.
    pub left: bool,
}

impl SideMask {
    /// No taper.
    pub const NONE: Self = Self {
        right: false,
        left: false,
    };
    /// Both walls taper.
    pub const BOTH: Self = Self {
        right: true,
        left: true,
    };

    /// True when either wall tapers.
    pub fn any(&self) -> bool {
        self.right || self.left
    }
}

/// Taper at the two ends of a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TaperPlan {
    /// Walls tapering out of the segment start.
    pub start: SideMask,
    /// Walls tapering into the segment end.
    pub end: SideMask,
}
