//! Network configuration.

use burrow_path::EditPolicy;
use burrow_section::{GenerationSettings, RingLayout, SectionShape};
use serde::{Deserialize, Serialize};

use crate::{NetworkError, Result};

/// End-to-end snapping parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SnapSettings {
    /// A free end snaps to candidates closer than this.
    pub snap_distance: f64,
    /// Distance behind a snapped end that the penultimate point is pulled
    /// towards.
    pub approach_distance: f64,
    /// Share of its old position the penultimate point keeps when pulled
    /// onto its approach target.
    pub approach_lerp: f64,
}

impl Default for SnapSettings {
    fn default() -> Self {
        Self {
            snap_distance: 400.0,
            approach_distance: 600.0,
            approach_lerp: 0.2,
        }
    }
}

/// Everything a [`Network`](crate::Network) is configured with.
///
/// Every table and field is optional in TOML:
///
/// ```toml
/// noise_seed = 7
///
/// [layout]
/// horizontal = 25
/// vertical = 20
///
/// [generation]
/// step_size = 50.0
/// floor_sign = "deterministic"
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Ring vertex counts, shared by every tunnel and junction.
    pub layout: RingLayout,
    /// Ring walk constants.
    pub generation: GenerationSettings,
    /// Point spacing while dragging.
    pub editing: EditPolicy,
    /// End-to-end snapping.
    pub snapping: SnapSettings,
    /// Cross-section of new tunnels and junctions.
    pub shape: SectionShape,
    /// Seed of the default noise field.
    pub noise_seed: u32,
}

impl NetworkConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: &str| Err(NetworkError::InvalidConfig(msg.into()));
        if !self.layout.is_valid() {
            return invalid("layout needs at least 2 horizontal and 1 vertical vertex");
        }
        let g = &self.generation;
        if g.step_size <= 0.0 {
            return invalid("step_size must be positive");
        }
        if g.noise_resolution == 0 {
            return invalid("noise_resolution must be positive");
        }
        if g.max_floor_deformation < 0.0 || g.max_wall_deformation < 0.0 {
            return invalid("deformation maxima must not be negative");
        }
        if g.round_value < 0.0 {
            return invalid("round_value must not be negative");
        }
        if !(0.0..=90.0).contains(&g.taper_angle) {
            return invalid("taper_angle must be between 0 and 90 degrees");
        }
        if self.shape.width_scale <= 0.0 || self.shape.height_scale <= 0.0 {
            return invalid("shape scales must be positive");
        }
        let unit = 0.0..=1.0;
        if !unit.contains(&self.shape.floor_deformation)
            || !unit.contains(&self.shape.wall_deformation)
        {
            return invalid("deformation weights must be between 0 and 1");
        }
        if self.editing.end_offset < 0.0 || self.editing.max_spacing <= self.editing.end_offset {
            return invalid("max_spacing must exceed a non-negative end_offset");
        }
        if self.snapping.snap_distance < 0.0 || self.snapping.approach_distance < 0.0 {
            return invalid("snap distances must not be negative");
        }
        if !unit.contains(&self.snapping.approach_lerp) {
            return invalid("approach_lerp must be between 0 and 1");
        }
        Ok(())
    }
}
