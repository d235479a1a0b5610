//! The junction walk.
//!
//! A junction is a square grid `H` rows long and `H` columns wide laid out in
//! junction-local space: `+X` continues the parent's direction of travel,
//! right of travel is `-Y`, and the origin sits on the parent's end floor
//! centre. Row 0 is the parent's end ring; every later row is walked around
//! its floor, the walls of closed sides and the roof.

use burrow_math::{lerp, up, Point2, Point3, Vec3};
use burrow_section::{
    floor_sign, noise_column, DeformationSource, ExitRing, GenerationSettings, GridPatch,
    ProfileCurve, ProfileSource, Ring, RingLayout, SectionMesh, SectionShape,
};
use tracing::{debug, trace, warn};

use crate::{ExitRings, JunctionKind};

/// Everything needed to generate one junction.
#[derive(Debug, Clone)]
pub struct JunctionRequest<'a> {
    /// Which sides open.
    pub kind: JunctionKind,
    /// Cross-section size and roughness.
    pub shape: SectionShape,
    /// The parent's end ring in junction-local space.
    ///
    /// Without a seed, or with one that does not fit the layout, row 0 is a
    /// freshly computed closed ring.
    pub seed: Option<&'a Ring>,
}

/// Output of one junction walk.
#[derive(Debug, Clone)]
pub struct JunctionOutput {
    /// Ground grid, wall grid and, for [`JunctionKind::RightLeft`], the end
    /// wall.
    pub mesh: SectionMesh,
    /// Row 0 as used by the walk.
    pub entry: ExitRing,
    /// Closed rings for every open exit.
    pub exits: ExitRings,
}

/// Right of travel in junction-local space.
fn right() -> Vec3 {
    Vec3::new(0.0, -1.0, 0.0)
}

#[derive(Debug, Clone, Copy)]
struct Dimensions {
    width: f64,
    height: f64,
    horizontal_step: f64,
    vertical_step: f64,
    rounding: f64,
}

/// Boundary runs of every row. Wall rows are empty on open sides, except
/// row 0 which always carries the parent's walls.
#[derive(Debug, Default)]
struct Grid {
    floor: Vec<Vec<Point3>>,
    right_wall: Vec<Vec<Point3>>,
    roof: Vec<Vec<Point3>>,
    left_wall: Vec<Vec<Point3>>,
}

/// Walks a junction grid and publishes its exit rings.
pub struct JunctionGenerator<'a> {
    layout: RingLayout,
    settings: &'a GenerationSettings,
    deformation: &'a dyn DeformationSource,
    profiles: &'a dyn ProfileSource,
}

impl<'a> JunctionGenerator<'a> {
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

    /// Generate a junction. Returns `None` for a layout that cannot produce
    /// rings.
    pub fn generate(&self, request: &JunctionRequest<'_>) -> Option<JunctionOutput> {
        if !self.layout.is_valid() {
            warn!(layout = ?self.layout, "ring layout cannot produce junctions");
            return None;
        }
        let kind = request.kind;
        let dims = Dimensions {
            width: request.shape.width(),
            height: request.shape.height(),
            horizontal_step: request.shape.horizontal_step(&self.layout),
            vertical_step: request.shape.vertical_step(&self.layout),
            rounding: request.shape.rounding(self.settings),
        };
        debug!(?kind, width = dims.width, "generating junction");

        let entry = self.entry_row(&dims, &request.shape, request.seed);
        let mut grid = Grid::default();
        grid.floor.push(entry.floor.clone());
        grid.right_wall.push(entry.right_wall.clone());
        grid.roof.push(entry.roof.clone());
        grid.left_wall.push(entry.left_wall.clone());

        for row in 1..self.layout.horizontal {
            let floor = self.floor_row(&dims, &request.shape, row);
            let column = self.column(&dims, row);
            grid.right_wall.push(if kind.right_open() {
                Vec::new()
            } else {
                self.right_wall_row(&dims, &request.shape, column, &floor)
            });
            grid.left_wall.push(if kind.left_open() {
                Vec::new()
            } else {
                self.left_wall_row(&dims, &request.shape, column, &floor)
            });
            grid.roof.push(self.roof_row(
                &dims,
                &request.shape,
                row,
                !kind.right_open(),
                !kind.left_open(),
            ));
            grid.floor.push(floor);
        }

        let mesh = self.mesh(kind, &dims, &grid);
        let exits = self.exits(kind, &dims, &grid);
        trace!(vertices = mesh.vertex_count(), "junction walk done");
        Some(JunctionOutput { mesh, entry, exits })
    }

    /// Rounding at normalized position `x`: `amount` at 0, nothing at 1.
    pub fn rounding(&self, amount: f64, x: f64) -> f64 {
        lerp(amount, 0.0, self.profiles.evaluate(ProfileCurve::Roundness, x))
    }

    fn entry_row(&self, dims: &Dimensions, shape: &SectionShape, seed: Option<&Ring>) -> ExitRing {
        if let Some(ring) = seed {
            match ExitRing::from_ring(&self.layout, ring) {
                Some(exit) => return exit,
                None => warn!(
                    expected = self.layout.ring_len(),
                    got = ring.len(),
                    "junction seed does not fit the layout, computing entry ring"
                ),
            }
        }
        let floor = self.floor_row(dims, shape, 0);
        let column = self.column(dims, 0);
        ExitRing {
            right_wall: self.right_wall_row(dims, shape, column, &floor),
            roof: self.roof_row(dims, shape, 0, true, true),
            left_wall: self.left_wall_row(dims, shape, column, &floor),
            floor,
        }
    }

    fn column(&self, dims: &Dimensions, row: usize) -> usize {
        noise_column(
            row as f64 * dims.horizontal_step,
            self.settings.step_size,
            self.settings.noise_resolution,
        )
    }

    fn wall_offset(&self, shape: &SectionShape, column: usize, position: usize) -> f64 {
        let weight = lerp(0.0, self.settings.max_wall_deformation, shape.wall_deformation);
        lerp(-1.0, 1.0, self.deformation.sample(column, position)) * weight
    }

    fn floor_row(&self, dims: &Dimensions, shape: &SectionShape, row: usize) -> Vec<Point3> {
        let along = row as f64 * dims.horizontal_step;
        let column = self.column(dims, row);
        let weight = lerp(0.0, self.settings.max_floor_deformation, shape.floor_deformation);
        (0..self.layout.horizontal)
            .map(|k| {
                let sample = self.deformation.sample(column, k);
                let z = lerp(-1.0, 1.0, sample) * weight * floor_sign(self.settings, along, k);
                Point3::new(
                    along,
                    dims.width * 0.5 - k as f64 * dims.horizontal_step,
                    z,
                )
            })
            .collect()
    }

    fn right_wall_row(
        &self,
        dims: &Dimensions,
        shape: &SectionShape,
        column: usize,
        floor: &[Point3],
    ) -> Vec<Point3> {
        let corner = floor[floor.len() - 1];
        let vertical = self.layout.vertical;
        (0..vertical)
            .map(|j| {
                if j == 0 {
                    return corner;
                }
                let inward = self.rounding(dims.rounding, 1.0 - j as f64 / vertical as f64);
                let noise = self.wall_offset(shape, column, self.layout.right_wall_start() + j);
                corner + up() * (j as f64 * dims.vertical_step) - right() * inward
                    + right() * noise
            })
            .collect()
    }

    fn left_wall_row(
        &self,
        dims: &Dimensions,
        shape: &SectionShape,
        column: usize,
        floor: &[Point3],
    ) -> Vec<Point3> {
        let corner = floor[0];
        let vertical = self.layout.vertical;
        (1..=vertical)
            .map(|m| {
                if m == vertical {
                    return corner;
                }
                let inward = self.rounding(dims.rounding, m as f64 / vertical as f64);
                let noise = self.wall_offset(shape, column, self.layout.left_wall_start() + m - 1);
                corner + up() * ((vertical - m) as f64 * dims.vertical_step) + right() * inward
                    + right() * noise
            })
            .collect()
    }

    /// Roof run from the right edge to the left edge; open sides reach the
    /// full floor width.
    fn roof_row(
        &self,
        dims: &Dimensions,
        shape: &SectionShape,
        row: usize,
        right_closed: bool,
        left_closed: bool,
    ) -> Vec<Point3> {
        let h = self.layout.horizontal;
        let last = (h - 1) as f64;
        let along = row as f64 * dims.horizontal_step;
        let column = self.column(dims, row);
        let half = dims.width * 0.5;
        let right_edge = -half + if right_closed { dims.rounding } else { 0.0 };
        let left_edge = half - if left_closed { dims.rounding } else { 0.0 };
        let across_rows = (2.0 * row as f64 / last - 1.0).abs();
        (0..h)
            .map(|k| {
                let across = (2.0 * k as f64 / last - 1.0).abs();
                let vault = self.rounding(dims.rounding, across.min(across_rows)) * 0.5;
                let noise = self.wall_offset(shape, column, self.layout.roof_start() + k);
                Point3::new(
                    along,
                    lerp(right_edge, left_edge, k as f64 / last),
                    dims.height + vault + noise,
                )
            })
            .collect()
    }

    fn mesh(&self, kind: JunctionKind, dims: &Dimensions, grid: &Grid) -> SectionMesh {
        let h = self.layout.horizontal;
        let rows = grid.floor.len();
        let row_v = |i: usize| i as f64 / (rows - 1).max(1) as f64;
        let mut mesh = SectionMesh::default();

        for (i, floor) in grid.floor.iter().enumerate() {
            for (k, p) in floor.iter().enumerate() {
                mesh.ground_vertices.push(*p);
                mesh.ground_uvs.push(Point2::new(k as f64 / (h - 1) as f64, row_v(i)));
            }
        }
        mesh.ground_patches.push(GridPatch {
            offset: 0,
            rows,
            columns: h,
        });

        let mut columns = 0;
        for i in 0..rows {
            let mut row = Vec::new();
            if !kind.right_open() {
                row.extend_from_slice(&grid.right_wall[i]);
            }
            row.extend_from_slice(&grid.roof[i]);
            if !kind.left_open() {
                row.extend_from_slice(&grid.left_wall[i]);
            }
            columns = row.len();
            for (c, p) in row.iter().enumerate() {
                mesh.wall_vertices.push(*p);
                mesh.wall_uvs.push(Point2::new(c as f64 / (columns - 1).max(1) as f64, row_v(i)));
            }
        }
        mesh.wall_patches.push(GridPatch {
            offset: 0,
            rows,
            columns,
        });

        if !kind.straight_open() {
            self.end_wall(&mut mesh, dims, grid);
        }
        mesh
    }

    /// Close the straight side with a wall from the last floor row up to the
    /// last roof row.
    fn end_wall(&self, mesh: &mut SectionMesh, dims: &Dimensions, grid: &Grid) {
        let h = self.layout.horizontal;
        let vertical = self.layout.vertical;
        let (Some(floor), Some(roof)) = (grid.floor.last(), grid.roof.last()) else {
            return;
        };
        let offset = mesh.wall_vertices.len();
        for j in 0..=vertical {
            for k in 0..h {
                let p = if j == vertical {
                    roof[h - 1 - k]
                } else {
                    floor[k] + up() * (j as f64 * dims.vertical_step)
                };
                mesh.wall_vertices.push(p);
                mesh.wall_uvs.push(Point2::new(
                    k as f64 / (h - 1) as f64,
                    j as f64 / vertical as f64,
                ));
            }
        }
        mesh.wall_patches.push(GridPatch {
            offset,
            rows: vertical + 1,
            columns: h,
        });
    }

    fn ascending_pillar(&self, dims: &Dimensions, corner: Point3) -> Vec<Point3> {
        (0..self.layout.vertical)
            .map(|j| corner + up() * (j as f64 * dims.vertical_step))
            .collect()
    }

    fn descending_pillar(&self, dims: &Dimensions, corner: Point3) -> Vec<Point3> {
        let vertical = self.layout.vertical;
        (1..=vertical)
            .map(|m| corner + up() * ((vertical - m) as f64 * dims.vertical_step))
            .collect()
    }

    fn exits(&self, kind: JunctionKind, dims: &Dimensions, grid: &Grid) -> ExitRings {
        let h = self.layout.horizontal;
        let last = h - 1;
        let far = &grid.floor[last];

        let straight = kind.straight_open().then(|| ExitRing {
            floor: far.clone(),
            right_wall: if kind.right_open() {
                self.ascending_pillar(dims, far[last])
            } else {
                grid.right_wall[last].clone()
            },
            roof: grid.roof[last].clone(),
            left_wall: if kind.left_open() {
                self.descending_pillar(dims, far[0])
            } else {
                grid.left_wall[last].clone()
            },
        });

        let right = kind.right_open().then(|| ExitRing {
            floor: (0..h).map(|q| grid.floor[last - q][last]).collect(),
            right_wall: grid.right_wall[0].clone(),
            roof: (0..h).map(|q| grid.roof[q][0]).collect(),
            left_wall: self.descending_pillar(dims, far[last]),
        });

        let left = kind.left_open().then(|| ExitRing {
            floor: (0..h).map(|q| grid.floor[q][0]).collect(),
            right_wall: self.ascending_pillar(dims, far[0]),
            roof: (0..h).map(|q| grid.roof[last - q][last]).collect(),
            left_wall: grid.left_wall[0].clone(),
        });

        ExitRings {
            straight,
            right,
            left,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ExitDirection;
    use approx::assert_relative_eq;
    use burrow_path::Path;
    use burrow_section::{
        FlatField, KeyedProfiles, NoiseField, RingSource, SectionGenerator, SegmentRequest,
        TaperPlan,
    };

    const KINDS: [JunctionKind; 4] = [
        JunctionKind::Right,
        JunctionKind::Left,
        JunctionKind::RightLeft,
        JunctionKind::All,
    ];

    fn generate(
        layout: RingLayout,
        kind: JunctionKind,
        deformation: &dyn DeformationSource,
        seed: Option<&Ring>,
    ) -> JunctionOutput {
        let settings = GenerationSettings::default();
        let profiles = KeyedProfiles::default();
        JunctionGenerator::new(layout, &settings, deformation, &profiles)
            .generate(&JunctionRequest {
                kind,
                shape: SectionShape::default(),
                seed,
            })
            .unwrap()
    }

    /// Last ring of a tunnel that ends at the junction origin.
    fn parent_ring(layout: RingLayout) -> Ring {
        let settings = GenerationSettings::default();
        let profiles = KeyedProfiles::default();
        let noise = NoiseField::new(2);
        let path = Path::from_positions(&[Point3::new(-300.0, 0.0, 0.0), Point3::origin()]);
        SectionGenerator::new(layout, &settings, &noise, &profiles)
            .generate(&SegmentRequest {
                path: &path,
                segment: 0,
                shape: SectionShape::default(),
                taper: TaperPlan::default(),
                start: RingSource::Fresh,
                end: RingSource::Fresh,
            })
            .unwrap()
            .last_ring
    }

    #[test]
    fn test_exit_rings_are_closed() {
        let layout = RingLayout::new(7, 4);
        let noise = NoiseField::new(9);
        let seed = parent_ring(layout);
        for kind in KINDS {
            for seed in [None, Some(&seed)] {
                let out = generate(layout, kind, &noise, seed);
                for direction in kind.exits() {
                    let ring = out.exits.get(direction).unwrap().to_ring();
                    assert_eq!(ring.len(), layout.ring_len(), "{kind:?} {direction:?}");
                    assert!(ring.is_closed(), "{kind:?} {direction:?}");
                    // Right wall starts on the last floor vertex.
                    assert_eq!(
                        ring.vertices[layout.right_wall_start()],
                        ring.vertices[layout.right_wall_start() - 1]
                    );
                }
            }
        }
    }

    #[test]
    fn test_exit_sets_follow_kind() {
        let layout = RingLayout::new(5, 3);
        for kind in KINDS {
            let out = generate(layout, kind, &FlatField, None);
            let published: Vec<ExitDirection> = out.exits.directions().collect();
            assert_eq!(published, kind.exits());
        }
    }

    #[test]
    fn test_row_zero_replays_seed() {
        let layout = RingLayout::new(6, 4);
        let seed = parent_ring(layout);
        let out = generate(layout, JunctionKind::All, &NoiseField::new(4), Some(&seed));
        assert_eq!(&out.mesh.ground_vertices[..6], &seed.vertices[..6]);
        assert_eq!(out.entry.to_ring().vertices, seed.vertices);
        // Open sides drop the walls, so the first wall row is the roof.
        assert_eq!(
            &out.mesh.wall_vertices[..6],
            &seed.vertices[layout.roof_start()..layout.left_wall_start()]
        );
    }

    #[test]
    fn test_misfit_seed_is_replaced() {
        let layout = RingLayout::new(5, 3);
        let seed = Ring::from_vertices(vec![Point3::origin(); 4]);
        let out = generate(layout, JunctionKind::Right, &FlatField, Some(&seed));
        assert_eq!(out.entry.to_ring().len(), layout.ring_len());
        assert!(out.entry.to_ring().is_closed());
    }

    #[test]
    fn test_corner_pillars_are_shared() {
        let layout = RingLayout::new(7, 5);
        for kind in [JunctionKind::Right, JunctionKind::All] {
            let out = generate(layout, kind, &NoiseField::new(1), None);
            let straight = out.exits.get(ExitDirection::Straight).unwrap();
            let right = out.exits.get(ExitDirection::Right).unwrap();
            for j in 0..layout.vertical {
                assert_eq!(
                    straight.right_wall[j],
                    right.left_wall[layout.vertical - 1 - j]
                );
            }
        }
        let out = generate(layout, JunctionKind::Left, &NoiseField::new(1), None);
        let straight = out.exits.get(ExitDirection::Straight).unwrap();
        let left = out.exits.get(ExitDirection::Left).unwrap();
        for j in 0..layout.vertical {
            assert_eq!(straight.left_wall[layout.vertical - 1 - j], left.right_wall[j]);
        }
    }

    #[test]
    fn test_side_exits_reuse_parent_walls() {
        let layout = RingLayout::new(5, 3);
        let seed = parent_ring(layout);
        let entry = ExitRing::from_ring(&layout, &seed).unwrap();
        let out = generate(layout, JunctionKind::RightLeft, &FlatField, Some(&seed));
        assert_eq!(out.exits.right.as_ref().unwrap().right_wall, entry.right_wall);
        assert_eq!(out.exits.left.as_ref().unwrap().left_wall, entry.left_wall);
    }

    #[test]
    fn test_patch_layout_per_kind() {
        let layout = RingLayout::new(5, 3);
        let out = generate(layout, JunctionKind::RightLeft, &FlatField, None);
        assert_eq!(out.mesh.ground_patches.len(), 1);
        assert_eq!(out.mesh.ground_vertices.len(), 25);
        assert_eq!(out.mesh.wall_patches.len(), 2);
        assert_eq!(out.mesh.wall_patches[0].columns, 5);
        assert_eq!(out.mesh.wall_patches[1].rows, 4);
        assert_eq!(out.mesh.wall_vertices.len(), 25 + 20);

        let out = generate(layout, JunctionKind::Right, &FlatField, None);
        assert_eq!(out.mesh.wall_patches.len(), 1);
        assert_eq!(out.mesh.wall_patches[0].columns, 5 + 3);

        let out = generate(layout, JunctionKind::Left, &FlatField, None);
        assert_eq!(out.mesh.wall_patches[0].columns, 3 + 5);
        assert_eq!(out.mesh.wall_uvs.len(), out.mesh.wall_vertices.len());
    }

    #[test]
    fn test_flat_footprint_is_square() {
        let layout = RingLayout::new(5, 3);
        let out = generate(layout, JunctionKind::All, &FlatField, None);
        let width = SectionShape::default().width();
        let far = out.mesh.ground_vertices[24];
        assert_relative_eq!(far.x, width, epsilon = 1e-9);
        assert_relative_eq!(far.y, -width * 0.5, epsilon = 1e-9);
        assert_relative_eq!(far.z, 0.0, epsilon = 1e-9);
        // Open roof edges reach the full width.
        let straight = out.exits.straight.as_ref().unwrap();
        assert_relative_eq!(straight.roof[0].y, -width * 0.5, epsilon = 1e-9);
        assert_relative_eq!(straight.roof[4].y, width * 0.5, epsilon = 1e-9);
    }

    #[test]
    fn test_junction_walk_is_deterministic() {
        let layout = RingLayout::new(6, 4);
        let noise = NoiseField::new(12);
        let seed = parent_ring(layout);
        let a = generate(layout, JunctionKind::All, &noise, Some(&seed));
        let b = generate(layout, JunctionKind::All, &noise, Some(&seed));
        assert_eq!(a.mesh, b.mesh);
        assert_eq!(a.exits, b.exits);
    }
}
