//! Rings, cached segment ends, exit rings and per-section vertex buffers.

use burrow_math::{Point2, Point3, Transform};

use crate::RingLayout;

/// One cross-section ring in winding order, with optional texture coordinates.
///
/// Rings borrowed from a neighbour carry no UVs; the generator fills them in.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ring {
    /// Vertex positions.
    pub vertices: Vec<Point3>,
    /// Texture coordinates, either empty or one per vertex.
    pub uvs: Vec<Point2>,
}

impl Ring {
    /// A ring without texture coordinates.
    pub fn from_vertices(vertices: Vec<Point3>) -> Self {
        Self {
            vertices,
            uvs: Vec::new(),
        }
    }

    /// Number of vertices.
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// True when the ring has no vertices.
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// True when the last vertex repeats the first.
    pub fn is_closed(&self) -> bool {
        match (self.vertices.first(), self.vertices.last()) {
            (Some(a), Some(b)) => self.vertices.len() > 1 && a == b,
            _ => false,
        }
    }

    /// The ring with every vertex mapped through `transform`.
    pub fn transformed(&self, transform: &Transform) -> Self {
        Self {
            vertices: self
                .vertices
                .iter()
                .map(|v| transform.apply_point(v))
                .collect(),
            uvs: self.uvs.clone(),
        }
    }
}

/// The last ring of a generated segment, split the way meshes are stored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SegmentEnd {
    /// Floor vertices.
    pub ground: Vec<Point3>,
    /// Floor texture coordinates.
    pub ground_uvs: Vec<Point2>,
    /// Right wall, roof and left wall vertices.
    pub walls: Vec<Point3>,
    /// Wall texture coordinates.
    pub wall_uvs: Vec<Point2>,
}

impl SegmentEnd {
    /// Split a ring at the floor/wall boundary.
    pub fn from_ring(layout: &RingLayout, ring: &Ring) -> Self {
        let split = layout.ground_len().min(ring.vertices.len());
        let uv_split = split.min(ring.uvs.len());
        Self {
            ground: ring.vertices[..split].to_vec(),
            ground_uvs: ring.uvs[..uv_split].to_vec(),
            walls: ring.vertices[split..].to_vec(),
            wall_uvs: ring.uvs[uv_split..].to_vec(),
        }
    }

    /// Join the two halves back into one ring.
    pub fn to_ring(&self) -> Ring {
        let mut vertices = Vec::with_capacity(self.ground.len() + self.walls.len());
        vertices.extend_from_slice(&self.ground);
        vertices.extend_from_slice(&self.walls);
        let mut uvs = Vec::with_capacity(self.ground_uvs.len() + self.wall_uvs.len());
        uvs.extend_from_slice(&self.ground_uvs);
        uvs.extend_from_slice(&self.wall_uvs);
        Ring { vertices, uvs }
    }

    /// The same ring seen from the opposite direction of travel.
    ///
    /// Floor and wall runs are reversed independently, which keeps the
    /// floor-right-roof-left winding for a viewer facing the other way.
    pub fn reversed(&self) -> Self {
        let rev = |v: &[Point3]| v.iter().rev().copied().collect::<Vec<_>>();
        let rev_uv = |v: &[Point2]| v.iter().rev().copied().collect::<Vec<_>>();
        Self {
            ground: rev(&self.ground),
            ground_uvs: rev_uv(&self.ground_uvs),
            walls: rev(&self.walls),
            wall_uvs: rev_uv(&self.wall_uvs),
        }
    }
}

/// The boundary a neighbour exposes for one exit direction.
///
/// Runs follow the ring winding as seen by a tunnel leaving through the exit:
/// floor left to right, right wall bottom to top, roof right to left, left
/// wall top to bottom ending on the first floor vertex.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExitRing {
    /// Floor run.
    pub floor: Vec<Point3>,
    /// Right wall run.
    pub right_wall: Vec<Point3>,
    /// Roof run.
    pub roof: Vec<Point3>,
    /// Left wall run.
    pub left_wall: Vec<Point3>,
}

impl ExitRing {
    /// Cut a full ring into its four runs.
    pub fn from_ring(layout: &RingLayout, ring: &Ring) -> Option<Self> {
        if ring.len() != layout.ring_len() {
            return None;
        }
        let v = &ring.vertices;
        Some(Self {
            floor: v[..layout.right_wall_start()].to_vec(),
            right_wall: v[layout.right_wall_start()..layout.roof_start()].to_vec(),
            roof: v[layout.roof_start()..layout.left_wall_start()].to_vec(),
            left_wall: v[layout.left_wall_start()..].to_vec(),
        })
    }

    /// Concatenate the runs into one ring.
    pub fn to_ring(&self) -> Ring {
        let mut vertices = Vec::with_capacity(
            self.floor.len() + self.right_wall.len() + self.roof.len() + self.left_wall.len(),
        );
        vertices.extend_from_slice(&self.floor);
        vertices.extend_from_slice(&self.right_wall);
        vertices.extend_from_slice(&self.roof);
        vertices.extend_from_slice(&self.left_wall);
        Ring::from_vertices(vertices)
    }

    /// Midpoint of the floor run's end vertices.
    pub fn floor_center(&self) -> Option<Point3> {
        let a = self.floor.first()?;
        let b = self.floor.last()?;
        Some(Point3::from((a.coords + b.coords) * 0.5))
    }
}

/// A rectangular grid of vertices inside one of a section's vertex arrays.
///
/// Row `r`, column `c` lives at `offset + r * columns + c`. Consecutive rows
/// are stitched into quads by the mesh builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridPatch {
    /// Index of the first vertex.
    pub offset: usize,
    /// Number of rows.
    pub rows: usize,
    /// Vertices per row.
    pub columns: usize,
}

impl GridPatch {
    /// Number of vertices covered.
    pub fn len(&self) -> usize {
        self.rows * self.columns
    }

    /// True when the patch covers nothing.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Vertex and UV arrays for one generated tunnel segment or junction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SectionMesh {
    /// Floor vertices.
    pub ground_vertices: Vec<Point3>,
    /// Floor texture coordinates.
    pub ground_uvs: Vec<Point2>,
    /// Wall and roof vertices.
    pub wall_vertices: Vec<Point3>,
    /// Wall and roof texture coordinates.
    pub wall_uvs: Vec<Point2>,
    /// Grids inside `ground_vertices`.
    pub ground_patches: Vec<GridPatch>,
    /// Grids inside `wall_vertices`.
    pub wall_patches: Vec<GridPatch>,
}

impl SectionMesh {
    /// Append a full ring, splitting it into ground and wall arrays.
    pub fn push_ring(&mut self, layout: &RingLayout, ring: &Ring) {
        let end = SegmentEnd::from_ring(layout, ring);
        self.ground_vertices.extend(end.ground);
        self.ground_uvs.extend(end.ground_uvs);
        self.wall_vertices.extend(end.walls);
        self.wall_uvs.extend(end.wall_uvs);
    }

    /// Describe the arrays as one ring-per-row grid each.
    pub fn close_ring_grid(&mut self, layout: &RingLayout, rings: usize) {
        self.ground_patches = vec![GridPatch {
            offset: 0,
            rows: rings,
            columns: layout.ground_len(),
        }];
        self.wall_patches = vec![GridPatch {
            offset: 0,
            rows: rings,
            columns: layout.wall_len(),
        }];
    }

    /// Ring `index` of a tunnel section.
    pub fn ring(&self, layout: &RingLayout, index: usize) -> Option<Ring> {
        let g = layout.ground_len();
        let w = layout.wall_len();
        let ground = self.ground_vertices.get(index * g..(index + 1) * g)?;
        let walls = self.wall_vertices.get(index * w..(index + 1) * w)?;
        let ground_uvs = self.ground_uvs.get(index * g..(index + 1) * g).unwrap_or(&[]);
        let wall_uvs = self.wall_uvs.get(index * w..(index + 1) * w).unwrap_or(&[]);
        Some(
            SegmentEnd {
                ground: ground.to_vec(),
                ground_uvs: ground_uvs.to_vec(),
                walls: walls.to_vec(),
                wall_uvs: wall_uvs.to_vec(),
            }
            .to_ring(),
        )
    }

    /// Number of vertices in both arrays.
    pub fn vertex_count(&self) -> usize {
        self.ground_vertices.len() + self.wall_vertices.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered_ring(layout: &RingLayout) -> Ring {
        let mut vertices: Vec<Point3> = (0..layout.ring_len())
            .map(|i| Point3::new(i as f64, 0.0, 0.0))
            .collect();
        let first = vertices[0];
        if let Some(last) = vertices.last_mut() {
            *last = first;
        }
        vertices[layout.horizontal] = vertices[layout.horizontal - 1];
        let uvs = (0..layout.ring_len())
            .map(|i| Point2::new(i as f64, 0.0))
            .collect();
        Ring { vertices, uvs }
    }

    #[test]
    fn test_segment_end_split_join() {
        let layout = RingLayout::new(4, 3);
        let ring = numbered_ring(&layout);
        let end = SegmentEnd::from_ring(&layout, &ring);
        assert_eq!(end.ground.len(), 4);
        assert_eq!(end.walls.len(), 10);
        assert_eq!(end.to_ring(), ring);
    }

    #[test]
    fn test_reversed_keeps_closure() {
        let layout = RingLayout::new(4, 3);
        let ring = numbered_ring(&layout);
        let reversed = SegmentEnd::from_ring(&layout, &ring).reversed().to_ring();
        assert!(reversed.is_closed());
        assert_eq!(reversed.vertices[0], ring.vertices[3]);
        // Right wall of the reversed ring starts on its last floor vertex.
        assert_eq!(reversed.vertices[4], reversed.vertices[3]);
    }

    #[test]
    fn test_exit_ring_round_trip() {
        let layout = RingLayout::new(4, 3);
        let ring = numbered_ring(&layout);
        let exit = ExitRing::from_ring(&layout, &ring).unwrap();
        assert_eq!(exit.right_wall.len(), 3);
        assert_eq!(exit.roof.len(), 4);
        assert_eq!(exit.to_ring().vertices, ring.vertices);
        assert!(ExitRing::from_ring(&RingLayout::new(5, 3), &ring).is_none());
    }

    #[test]
    fn test_section_mesh_ring_access() {
        let layout = RingLayout::new(4, 3);
        let ring = numbered_ring(&layout);
        let mut mesh = SectionMesh::default();
        mesh.push_ring(&layout, &ring);
        mesh.push_ring(&layout, &ring);
        mesh.close_ring_grid(&layout, 2);
        assert_eq!(mesh.vertex_count(), 28);
        assert_eq!(mesh.ring(&layout, 1), Some(ring));
        assert!(mesh.ring(&layout, 2).is_none());
        assert_eq!(mesh.wall_patches[0].len(), 20);
    }
}
