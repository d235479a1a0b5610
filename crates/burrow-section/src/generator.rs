//! The ring walk: one ring per longitudinal step, one vertex per ring position.

use burrow_math::{lerp, normalize_or_zero, rotate_yaw, up, Point2, Point3, Tolerance};
use burrow_path::Path;
use tracing::{debug, trace, warn};

use crate::context::{floor_sign, RingState, SegmentContext};
use crate::deform::noise_column;
use crate::{
    DeformationSource, GenerationSettings, ProfileCurve, ProfileSource, Ring, RingLayout,
    RingSource, SectionMesh, SectionShape, SegmentEnd, Surface, TaperPlan,
};

/// Everything needed to generate one segment.
#[derive(Debug, Clone)]
pub struct SegmentRequest<'a> {
    /// Path in the tunnel's local space.
    pub path: &'a Path,
    /// Segment index from the path start.
    pub segment: usize,
    /// Cross-section size and roughness.
    pub shape: SectionShape,
    /// Wall tapers at the segment ends.
    pub taper: TaperPlan,
    /// Source of the first ring.
    pub start: RingSource,
    /// Source of the last ring.
    pub end: RingSource,
}

/// Output of one segment.
#[derive(Debug, Clone)]
pub struct GeneratedSection {
    /// Segment index from the path start.
    pub segment: usize,
    /// Ground and wall arrays, one ring per row.
    pub mesh: SectionMesh,
    /// First ring.
    pub first_ring: Ring,
    /// Last ring.
    pub last_ring: Ring,
    /// Number of rings.
    pub rings: usize,
}

impl GeneratedSection {
    /// Last ring in cache form.
    pub fn end(&self, layout: &RingLayout) -> SegmentEnd {
        SegmentEnd::from_ring(layout, &self.last_ring)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Right,
    Left,
}

#[derive(Debug, Clone, Copy, Default)]
struct Taper {
    /// Yaw applied to the lateral vector, radians.
    angle: f64,
    extra: f64,
    active: bool,
}

/// Walks a path segment and emits cross-section rings.
pub struct SectionGenerator<'a> {
    layout: RingLayout,
    settings: &'a GenerationSettings,
    deformation: &'a dyn DeformationSource,
    profiles: &'a dyn ProfileSource,
}

impl<'a> SectionGenerator<'a> {
    /// Create a generator.
    pub fn new(
        layout: RingLayout,
        settings: &'a GenerationSettings,
        deformation: &'a dyn DeformationSource,
        profiles: &'a dyn ProfileSource,
    ) -> Self {
        Self {
            layout,
            settings,
            deformation,
            profiles,
        }
    }

    /// Ring layout in use.
    pub fn layout(&self) -> &RingLayout {
        &self.layout
    }

    /// Number of longitudinal steps for a segment of `length`.
    ///
    /// A segment of `n` steps has `n + 1` rings; the last step may be short.
    pub fn step_count(&self, length: f64) -> usize {
        if self.settings.step_size <= 0.0 || length <= Tolerance::DEFAULT.linear {
            return 0;
        }
        ((length / self.settings.step_size) - 1e-6).ceil().max(1.0) as usize
    }

    /// Rounding at normalized position `x`: `amount` at 0, nothing at 1.
    pub fn rounding(&self, amount: f64, x: f64) -> f64 {
        lerp(amount, 0.0, self.profiles.evaluate(ProfileCurve::Roundness, x))
    }

    /// Generate one segment.
    ///
    /// Returns `None` when the segment does not exist or has no length.
    pub fn generate(&self, request: &SegmentRequest<'_>) -> Option<GeneratedSection> {
        if !self.layout.is_valid() {
            warn!(layout = ?self.layout, "ring layout cannot produce rings");
            return None;
        }
        if request.segment >= request.path.segment_count() {
            debug!(segment = request.segment, "segment out of range, skipped");
            return None;
        }
        let length = request.path.segment_length(request.segment);
        let steps = self.step_count(length);
        if steps == 0 {
            debug!(segment = request.segment, length, "degenerate segment, skipped");
            return None;
        }

        let ctx = SegmentContext::new(
            request.path,
            request.segment,
            steps,
            request.taper,
            request.shape,
            &self.layout,
            self.settings,
        );
        trace!(segment = ctx.segment, steps, length, "generating segment");

        let mut mesh = SectionMesh::default();
        let mut previous: Option<Ring> = None;
        let mut first_ring = Ring::default();

        for step in 0..=steps {
            let distance = ctx.distance_at_step(step, self.settings.step_size);
            let source = if step == 0 {
                &request.start
            } else if step == steps {
                &request.end
            } else {
                &RingSource::Fresh
            };

            let reused = match source {
                RingSource::Fresh => None,
                RingSource::Replay(end) => self.adopt(&ctx, end.to_ring(), distance),
                RingSource::Seed(ring) => self.adopt(&ctx, ring.clone(), distance),
            };
            let ring = match reused {
                Some(ring) => ring,
                None => self.fresh_ring(&ctx, step, distance, previous.as_ref()),
            };

            mesh.push_ring(&self.layout, &ring);
            if step == 0 {
                first_ring = ring.clone();
            }
            previous = Some(ring);
        }
        mesh.close_ring_grid(&self.layout, steps + 1);

        Some(GeneratedSection {
            segment: request.segment,
            mesh,
            first_ring,
            last_ring: previous.unwrap_or_default(),
            rings: steps + 1,
        })
    }

    /// Accept a borrowed ring if it fits the layout, filling in UVs.
    fn adopt(&self, ctx: &SegmentContext<'_>, mut ring: Ring, distance: f64) -> Option<Ring> {
        if ring.len() != self.layout.ring_len() {
            warn!(
                segment = ctx.segment,
                expected = self.layout.ring_len(),
                got = ring.len(),
                "boundary ring does not fit the layout, generating fresh"
            );
            return None;
        }
        if ring.uvs.len() != ring.len() {
            ring.uvs = self.ring_uvs(ctx, distance);
        }
        Some(ring)
    }

    fn ring_uvs(&self, ctx: &SegmentContext<'_>, distance: f64) -> Vec<Point2> {
        let v = if ctx.width > 0.0 { distance / ctx.width } else { 0.0 };
        let ground = self.layout.ground_len();
        let walls = self.layout.wall_len();
        let ground_uvs = (0..ground).map(|k| Point2::new(k as f64 / (ground - 1).max(1) as f64, v));
        let wall_uvs = (0..walls).map(|q| Point2::new(q as f64 / (walls - 1).max(1) as f64, v));
        ground_uvs.chain(wall_uvs).collect()
    }

    fn fresh_ring(
        &self,
        ctx: &SegmentContext<'_>,
        step: usize,
        distance: f64,
        previous: Option<&Ring>,
    ) -> Ring {
        let origin = ctx.path.position_at_distance(distance);
        let right = ctx.path.right_at_distance(distance);
        let forward = up().cross(&right);
        let floor_start = origin - right * (ctx.width * 0.5);
        let mut state = RingState {
            step,
            distance,
            origin,
            right,
            forward,
            column: noise_column(
                distance,
                self.settings.step_size,
                self.settings.noise_resolution,
            ),
            first: floor_start,
            latest: floor_start,
            wall_start: floor_start,
            roof_origin: floor_start,
        };

        let len = self.layout.ring_len();
        let mut vertices = Vec::with_capacity(len);
        for position in 0..len {
            if position == len - 1 {
                vertices.push(state.first);
                break;
            }
            let mut v = match self.layout.surface_at(position) {
                Surface::Floor => self.floor_vertex(ctx, &mut state, position),
                Surface::RightWall => self.right_wall_vertex(ctx, &mut state, position),
                Surface::Roof => self.roof_vertex(ctx, &mut state, position),
                Surface::LeftWall => self.left_wall_vertex(ctx, &state, position),
            };
            if let Some(before) = previous.and_then(|r| r.vertices.get(position)) {
                v = correct_overlap(v, *before, &state);
            }
            if position == 0 {
                state.first = v;
            }
            state.latest = v;
            vertices.push(v);
        }

        Ring {
            vertices,
            uvs: self.ring_uvs(ctx, distance),
        }
    }

    fn floor_vertex(&self, ctx: &SegmentContext<'_>, state: &mut RingState, position: usize) -> Point3 {
        if position == 0 {
            state.wall_start = state.latest;
            return state.latest;
        }
        let mut v = state.wall_start + state.right * (ctx.horizontal_step * position as f64);
        let weight = lerp(0.0, self.settings.max_floor_deformation, ctx.shape.floor_deformation);
        let sample = self.deformation.sample(state.column, position);
        v.z += lerp(-1.0, 1.0, sample) * weight * floor_sign(self.settings, state.distance, position);
        v
    }

    fn right_wall_vertex(
        &self,
        ctx: &SegmentContext<'_>,
        state: &mut RingState,
        position: usize,
    ) -> Point3 {
        let j = position - self.layout.right_wall_start();
        if j == 0 {
            state.wall_start = state.latest;
            return state.latest;
        }
        let taper = self.taper(ctx, state.step, Side::Right);
        let lateral = rotate_yaw(&state.right, taper.angle);
        let height = j as f64 / self.layout.vertical as f64;
        let inward = self.rounding(ctx.rounding + taper.extra, 1.0 - height);
        let mut v = state.wall_start + up() * (j as f64 * ctx.vertical_step) - lateral * inward;
        if !taper.active {
            v += state.right * self.wall_offset(ctx, state, position);
        }
        v
    }

    fn roof_vertex(&self, ctx: &SegmentContext<'_>, state: &mut RingState, position: usize) -> Point3 {
        let k = position - self.layout.roof_start();
        let h = self.layout.horizontal;
        if k == 0 {
            state.roof_origin = state.wall_start
                + up() * (self.layout.vertical as f64 * ctx.vertical_step)
                - state.right * ctx.rounding;
        }
        let span = ctx.width - 2.0 * ctx.rounding;
        let roof_step = span / (h - 1) as f64;
        let mut v = state.roof_origin - state.right * (k as f64 * roof_step);
        let across = (2.0 * k as f64 / (h - 1) as f64 - 1.0).abs();
        v.z += self.rounding(ctx.rounding, across) * 0.5 + self.wall_offset(ctx, state, position);
        v
    }

    fn left_wall_vertex(&self, ctx: &SegmentContext<'_>, state: &RingState, position: usize) -> Point3 {
        // Counts down from the roof: m = 1 is the top, m = V the floor.
        let m = position - self.layout.left_wall_start() + 1;
        let taper = self.taper(ctx, state.step, Side::Left);
        let lateral = rotate_yaw(&state.right, taper.angle);
        let vertical = self.layout.vertical;
        let depth = m as f64 / vertical as f64;
        let inward = self.rounding(ctx.rounding + taper.extra, depth);
        let rise = (vertical - m) as f64 * ctx.vertical_step;
        let mut v = state.first + up() * rise + lateral * inward;
        if !taper.active {
            v += state.right * self.wall_offset(ctx, state, position);
        }
        v
    }

    fn wall_offset(&self, ctx: &SegmentContext<'_>, state: &RingState, position: usize) -> f64 {
        let weight = lerp(0.0, self.settings.max_wall_deformation, ctx.shape.wall_deformation);
        lerp(-1.0, 1.0, self.deformation.sample(state.column, position)) * weight
    }

    fn taper(&self, ctx: &SegmentContext<'_>, step: usize, side: Side) -> Taper {
        let n = self.settings.taper_steps;
        if n == 0 {
            return Taper::default();
        }
        let max_angle = self.settings.taper_angle.to_radians();
        let boost = self.settings.taper_boost;
        let (start_sign, end_sign) = match side {
            Side::Right => (-1.0, 1.0),
            Side::Left => (1.0, -1.0),
        };
        let includes = |mask: crate::SideMask| match side {
            Side::Right => mask.right,
            Side::Left => mask.left,
        };

        if includes(ctx.taper.start) && step <= n {
            let alpha = step as f64 / n as f64;
            let blend = self.profiles.evaluate(ProfileCurve::RotationBlend, alpha);
            return Taper {
                angle: lerp(start_sign * max_angle, 0.0, alpha),
                extra: lerp(boost, 0.0, blend),
                active: true,
            };
        }
        if includes(ctx.taper.end) && step + n >= ctx.steps {
            let alpha = (step + n - ctx.steps) as f64 / n as f64;
            let blend = self.profiles.evaluate(ProfileCurve::RotationBlend, alpha);
            return Taper {
                angle: lerp(0.0, end_sign * max_angle, alpha),
                extra: lerp(0.0, boost, blend),
                active: true,
            };
        }
        Taper::default()
    }
}

/// Keep a vertex from falling behind the same position on the previous ring.
fn correct_overlap(v: Point3, before: Point3, state: &RingState) -> Point3 {
    let current = normalize_or_zero(&(v - state.origin)).dot(&state.forward);
    let previous = normalize_or_zero(&(before - state.origin)).dot(&state.forward);
    if previous >= current {
        before
    } else {
        v
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FlatField, KeyedProfiles, NoiseField, SegmentEndCache, SideMask};
    use approx::assert_relative_eq;

    fn straight(points: usize, spacing: f64) -> Path {
        let positions: Vec<Point3> = (0..points)
            .map(|i| Point3::new(i as f64 * spacing, 0.0, 0.0))
            .collect();
        Path::from_positions(&positions)
    }

    fn request(path: &Path, segment: usize) -> SegmentRequest<'_> {
        SegmentRequest {
            path,
            segment,
            shape: SectionShape::default(),
            taper: TaperPlan::default(),
            start: RingSource::Fresh,
            end: RingSource::Fresh,
        }
    }

    #[test]
    fn test_ring_length_and_closure() {
        let settings = GenerationSettings::default();
        let profiles = KeyedProfiles::default();
        let noise = NoiseField::new(3);
        let path = straight(2, 400.0);
        for (h, v) in [(2, 1), (5, 3), (25, 20), (8, 11)] {
            let gen = SectionGenerator::new(RingLayout::new(h, v), &settings, &noise, &profiles);
            let section = gen.generate(&request(&path, 0)).unwrap();
            for r in 0..section.rings {
                let ring = section.mesh.ring(gen.layout(), r).unwrap();
                assert_eq!(ring.len(), 2 * h + 2 * v);
                assert!(ring.is_closed());
            }
        }
    }

    #[test]
    fn test_scenario_ring_counts_and_seam() {
        let settings = GenerationSettings::default();
        let profiles = KeyedProfiles::default();
        let noise = NoiseField::new(11);
        let layout = RingLayout::new(25, 20);
        let gen = SectionGenerator::new(layout, &settings, &noise, &profiles);
        let path = straight(3, 750.0);
        let mut cache = SegmentEndCache::new();

        let first = gen.generate(&request(&path, 0)).unwrap();
        assert_eq!(first.rings, 16);
        assert_eq!(first.mesh.ground_vertices.len(), 16 * 25);
        assert_eq!(first.mesh.wall_vertices.len(), 16 * 65);
        assert_eq!(first.last_ring.len(), 90);
        cache.store(0, first.end(&layout));

        let plan = crate::seam::plan(
            &cache,
            crate::SeamQuery {
                segment: 1,
                ..Default::default()
            },
        );
        let second = gen
            .generate(&SegmentRequest {
                start: plan.start,
                end: plan.end,
                ..request(&path, 1)
            })
            .unwrap();
        assert_eq!(second.first_ring, cache.get(0).unwrap().to_ring());
    }

    #[test]
    fn test_regeneration_is_idempotent() {
        let settings = GenerationSettings::default();
        let profiles = KeyedProfiles::default();
        let noise = NoiseField::new(5);
        let gen = SectionGenerator::new(RingLayout::new(9, 6), &settings, &noise, &profiles);
        let path = Path::from_positions(&[
            Point3::origin(),
            Point3::new(400.0, 150.0, 0.0),
            Point3::new(800.0, 0.0, 30.0),
        ]);
        let mut req = request(&path, 1);
        req.taper = TaperPlan {
            start: SideMask::BOTH,
            end: SideMask { right: true, left: false },
        };
        let a = gen.generate(&req).unwrap();
        let b = gen.generate(&req).unwrap();
        assert_eq!(a.mesh, b.mesh);
        assert_eq!(a.last_ring, b.last_ring);
    }

    #[test]
    fn test_flat_cross_section_geometry() {
        let settings = GenerationSettings::default();
        let profiles = KeyedProfiles::default();
        let layout = RingLayout::new(5, 4);
        let gen = SectionGenerator::new(layout, &settings, &FlatField, &profiles);
        let path = straight(2, 100.0);
        let section = gen.generate(&request(&path, 0)).unwrap();
        let ring = section.mesh.ring(&layout, 0).unwrap();
        let shape = SectionShape::default();

        // Floor spans the full width at path height, right of travel is -Y.
        assert_relative_eq!(ring.vertices[0].y, shape.width() * 0.5, epsilon = 1e-9);
        assert_relative_eq!(ring.vertices[4].y, -shape.width() * 0.5, epsilon = 1e-9);
        for v in &ring.vertices[0..5] {
            assert_relative_eq!(v.z, 0.0, epsilon = 1e-9);
        }
        // Right wall starts on the floor corner and rises.
        assert_eq!(ring.vertices[5], ring.vertices[4]);
        assert!(ring.vertices[6].z > 0.0);
        // Roof vault peaks in the middle.
        let roof = &ring.vertices[9..14];
        assert!(roof[2].z > roof[0].z);
        assert_relative_eq!(roof[0].z, roof[4].z, epsilon = 1e-9);
        assert_relative_eq!(roof[0].z, shape.height(), epsilon = 1e-9);
        // Symmetric walls without noise.
        assert_relative_eq!(ring.vertices[6].y, -ring.vertices[16].y, epsilon = 1e-9);
    }

    #[test]
    fn test_rounding_extremes() {
        let settings = GenerationSettings::default();
        let profiles = KeyedProfiles::default();
        let gen = SectionGenerator::new(RingLayout::default(), &settings, &FlatField, &profiles);
        assert_relative_eq!(gen.rounding(settings.round_value, 0.0), settings.round_value);
        assert_relative_eq!(gen.rounding(settings.round_value, 1.0), 0.0);
    }

    #[test]
    fn test_step_count() {
        let settings = GenerationSettings::default();
        let profiles = KeyedProfiles::default();
        let gen = SectionGenerator::new(RingLayout::default(), &settings, &FlatField, &profiles);
        assert_eq!(gen.step_count(750.0), 15);
        assert_eq!(gen.step_count(760.0), 16);
        assert_eq!(gen.step_count(10.0), 1);
        assert_eq!(gen.step_count(0.0), 0);
    }

    #[test]
    fn test_short_final_step_lands_on_segment_end() {
        let settings = GenerationSettings::default();
        let profiles = KeyedProfiles::default();
        let layout = RingLayout::new(3, 2);
        let gen = SectionGenerator::new(layout, &settings, &FlatField, &profiles);
        let path = straight(2, 120.0);
        let section = gen.generate(&request(&path, 0)).unwrap();
        assert_eq!(section.rings, 4);
        let last = section.mesh.ring(&layout, 3).unwrap();
        // Middle floor vertex sits on the path.
        assert_relative_eq!(last.vertices[1].x, 120.0, epsilon = 1e-6);
    }

    #[test]
    fn test_misfit_seed_falls_back_to_fresh() {
        let settings = GenerationSettings::default();
        let profiles = KeyedProfiles::default();
        let layout = RingLayout::new(4, 3);
        let gen = SectionGenerator::new(layout, &settings, &FlatField, &profiles);
        let path = straight(2, 100.0);
        let mut req = request(&path, 0);
        req.start = RingSource::Seed(Ring::from_vertices(vec![Point3::origin(); 3]));
        let section = gen.generate(&req).unwrap();
        assert_eq!(section.first_ring.len(), layout.ring_len());
        assert_eq!(section.first_ring.uvs.len(), layout.ring_len());
    }

    #[test]
    fn test_seed_gets_uvs() {
        let settings = GenerationSettings::default();
        let profiles = KeyedProfiles::default();
        let layout = RingLayout::new(4, 3);
        let gen = SectionGenerator::new(layout, &settings, &FlatField, &profiles);
        let path = straight(2, 100.0);
        let seed = Ring::from_vertices(vec![Point3::new(1.0, 2.0, 3.0); layout.ring_len()]);
        let mut req = request(&path, 0);
        req.end = RingSource::Seed(seed.clone());
        let section = gen.generate(&req).unwrap();
        assert_eq!(section.last_ring.vertices, seed.vertices);
        assert_eq!(section.last_ring.uvs.len(), layout.ring_len());
    }

    #[test]
    fn test_out_of_range_segment() {
        let settings = GenerationSettings::default();
        let profiles = KeyedProfiles::default();
        let gen = SectionGenerator::new(RingLayout::default(), &settings, &FlatField, &profiles);
        let path = straight(2, 100.0);
        assert!(gen.generate(&request(&path, 1)).is_none());
    }

    /// A corner at x = 100 turning from +Y to -X within the first step.
    fn hairpin() -> Path {
        Path::from_positions(&[
            Point3::origin(),
            Point3::new(100.0, 0.0, 0.0),
            Point3::new(0.0, 10.0, 0.0),
        ])
    }

    #[test]
    fn test_overlap_reuses_vertices_behind_previous_ring() {
        let settings = GenerationSettings::default();
        let profiles = KeyedProfiles::default();
        let layout = RingLayout::new(5, 4);
        let gen = SectionGenerator::new(layout, &settings, &FlatField, &profiles);
        let path = hairpin();
        let section = gen.generate(&request(&path, 1)).unwrap();
        assert!(section.rings >= 3);

        let rings: Vec<Ring> = (0..section.rings)
            .map(|r| section.mesh.ring(&layout, r).unwrap())
            .collect();
        // The outer floor corner of the first ring sits ahead of the turned
        // second ring, so the second ring keeps it.
        assert_eq!(rings[1].vertices[0], rings[0].vertices[0]);
        let reused = rings
            .windows(2)
            .flat_map(|pair| pair[0].vertices.iter().zip(&pair[1].vertices))
            .filter(|(a, b)| a == b)
            .count();
        assert!(reused > 1);
        for ring in &rings {
            assert!(ring.is_closed());
        }
    }

    #[test]
    fn test_borrowed_end_rings_are_not_corrected() {
        let settings = GenerationSettings::default();
        let profiles = KeyedProfiles::default();
        let layout = RingLayout::new(5, 4);
        let gen = SectionGenerator::new(layout, &settings, &FlatField, &profiles);
        let path = hairpin();
        // Far behind the end of travel, so a corrected ring would differ.
        let behind = Ring::from_vertices(vec![Point3::new(1000.0, 0.0, 0.0); layout.ring_len()]);

        let mut seeded = request(&path, 1);
        seeded.end = RingSource::Seed(behind.clone());
        let section = gen.generate(&seeded).unwrap();
        assert_eq!(section.last_ring.vertices, behind.vertices);

        let mut replayed = request(&path, 1);
        replayed.end = RingSource::Replay(SegmentEnd::from_ring(&layout, &behind));
        let section = gen.generate(&replayed).unwrap();
        assert_eq!(section.last_ring.vertices, behind.vertices);
    }

    #[test]
    fn test_taper_keeps_rings_closed() {
        let settings = GenerationSettings::default();
        let profiles = KeyedProfiles::default();
        let noise = NoiseField::new(1);
        let layout = RingLayout::new(7, 5);
        let gen = SectionGenerator::new(layout, &settings, &noise, &profiles);
        let path = straight(2, 300.0);
        let mut req = request(&path, 0);
        req.taper = TaperPlan {
            start: SideMask::BOTH,
            end: SideMask::BOTH,
        };
        let section = gen.generate(&req).unwrap();
        for r in 0..section.rings {
            assert!(section.mesh.ring(&layout, r).unwrap().is_closed());
        }
    }
}
