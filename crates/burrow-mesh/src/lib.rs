#![warn(missing_docs)]

//! Reference triangulation for burrow section meshes.
//!
//! Section meshes arrive as ground and wall vertex arrays described by grid
//! patches. This crate stitches consecutive patch rows into quads, computes
//! smooth normals and tangents, and flattens the result into a GPU-friendly
//! [`TriangleMesh`]. Triangles wind so that their normals face the inside of
//! the tunnel.

use burrow_math::{normalize_or_zero, Point2, Point3, Vec3};
use burrow_section::{GridPatch, SectionMesh};

/// Output triangle mesh for rendering and export.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TriangleMesh {
    /// Flat array of vertex positions: `[x0, y0, z0, x1, y1, z1, ...]`.
    pub vertices: Vec<f32>,
    /// Flat array of triangle indices.
    pub indices: Vec<u32>,
    /// Flat array of vertex normals, same length as `vertices`.
    pub normals: Vec<f32>,
    /// Flat array of vertex tangents, same length as `vertices`.
    pub tangents: Vec<f32>,
    /// Flat array of texture coordinates: `[u0, v0, u1, v1, ...]`.
    pub uvs: Vec<f32>,
}

impl TriangleMesh {
    /// Create an empty mesh.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of triangles.
    pub fn num_triangles(&self) -> usize {
        self.indices.len() / 3
    }

    /// Number of vertices.
    pub fn num_vertices(&self) -> usize {
        self.vertices.len() / 3
    }

    /// Merge another mesh into this one.
    pub fn merge(&mut self, other: &TriangleMesh) {
        let offset = self.num_vertices() as u32;
        self.vertices.extend_from_slice(&other.vertices);
        self.normals.extend_from_slice(&other.normals);
        self.tangents.extend_from_slice(&other.tangents);
        self.uvs.extend_from_slice(&other.uvs);
        self.indices.extend(other.indices.iter().map(|&i| i + offset));
    }
}

/// Triangle indices into the ground and wall arrays of a section.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Triangles {
    /// Indices into `ground_vertices`.
    pub ground: Vec<u32>,
    /// Indices into `wall_vertices`.
    pub walls: Vec<u32>,
}

impl Triangles {
    /// Total number of triangles.
    pub fn len(&self) -> usize {
        (self.ground.len() + self.walls.len()) / 3
    }

    /// True when there are no triangles.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Per-vertex normals and tangents for both arrays of a section.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Shading {
    /// Ground normals.
    pub ground_normals: Vec<Vec3>,
    /// Ground tangents.
    pub ground_tangents: Vec<Vec3>,
    /// Wall normals.
    pub wall_normals: Vec<Vec3>,
    /// Wall tangents.
    pub wall_tangents: Vec<Vec3>,
}

/// Stitch every patch of a section into triangles.
pub fn triangulate(mesh: &SectionMesh) -> Triangles {
    Triangles {
        ground: triangulate_patches(&mesh.ground_vertices, &mesh.ground_patches),
        walls: triangulate_patches(&mesh.wall_vertices, &mesh.wall_patches),
    }
}

fn triangulate_patches(vertices: &[Point3], patches: &[GridPatch]) -> Vec<u32> {
    let mut indices = Vec::new();
    for patch in patches {
        if patch.rows < 2 || patch.columns < 2 || patch.offset + patch.len() > vertices.len() {
            continue;
        }
        for r in 0..patch.rows - 1 {
            for c in 0..patch.columns - 1 {
                let a = patch.offset + r * patch.columns + c;
                let b = a + 1;
                let next = a + patch.columns;
                let d = next + 1;
                push_triangle(&mut indices, vertices, [a, b, next]);
                push_triangle(&mut indices, vertices, [b, d, next]);
            }
        }
    }
    indices
}

/// Append a triangle unless two of its corners coincide.
fn push_triangle(indices: &mut Vec<u32>, vertices: &[Point3], tri: [usize; 3]) {
    let [a, b, c] = tri.map(|i| vertices[i]);
    if a == b || b == c || a == c {
        return;
    }
    indices.extend(tri.map(|i| i as u32));
}

/// Area-weighted vertex normals and row-direction tangents.
pub fn shade(mesh: &SectionMesh, triangles: &Triangles) -> Shading {
    let ground_normals = vertex_normals(&mesh.ground_vertices, &triangles.ground);
    let wall_normals = vertex_normals(&mesh.wall_vertices, &triangles.walls);
    Shading {
        ground_tangents: vertex_tangents(&mesh.ground_vertices, &mesh.ground_patches, &ground_normals),
        wall_tangents: vertex_tangents(&mesh.wall_vertices, &mesh.wall_patches, &wall_normals),
        ground_normals,
        wall_normals,
    }
}

fn vertex_normals(vertices: &[Point3], indices: &[u32]) -> Vec<Vec3> {
    let mut normals = vec![Vec3::zeros(); vertices.len()];
    for tri in indices.chunks_exact(3) {
        let [a, b, c] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        // Cross product length is twice the area, which weights the sum.
        let n = (vertices[b] - vertices[a]).cross(&(vertices[c] - vertices[a]));
        normals[a] += n;
        normals[b] += n;
        normals[c] += n;
    }
    normals.iter().map(normalize_or_zero).collect()
}

fn vertex_tangents(vertices: &[Point3], patches: &[GridPatch], normals: &[Vec3]) -> Vec<Vec3> {
    let mut tangents = vec![Vec3::zeros(); vertices.len()];
    for patch in patches {
        if patch.columns < 2 || patch.offset + patch.len() > vertices.len() {
            continue;
        }
        for r in 0..patch.rows {
            let row = patch.offset + r * patch.columns;
            for c in 0..patch.columns {
                let (lo, hi) = if c + 1 < patch.columns { (c, c + 1) } else { (c - 1, c) };
                let along = vertices[row + hi] - vertices[row + lo];
                let n = normals[row + c];
                tangents[row + c] = normalize_or_zero(&(along - n * n.dot(&along)));
            }
        }
    }
    tangents
}

/// Flatten a shaded section into one triangle mesh.
pub fn to_triangle_mesh(mesh: &SectionMesh, triangles: &Triangles, shading: &Shading) -> TriangleMesh {
    let mut out = flatten(
        &mesh.ground_vertices,
        &mesh.ground_uvs,
        &triangles.ground,
        &shading.ground_normals,
        &shading.ground_tangents,
    );
    out.merge(&flatten(
        &mesh.wall_vertices,
        &mesh.wall_uvs,
        &triangles.walls,
        &shading.wall_normals,
        &shading.wall_tangents,
    ));
    out
}

fn flatten(
    vertices: &[Point3],
    uvs: &[Point2],
    indices: &[u32],
    normals: &[Vec3],
    tangents: &[Vec3],
) -> TriangleMesh {
    let xyz = |v: &[Vec3]| -> Vec<f32> {
        v.iter()
            .flat_map(|n| [n.x as f32, n.y as f32, n.z as f32])
            .collect()
    };
    TriangleMesh {
        vertices: vertices
            .iter()
            .flat_map(|p| [p.x as f32, p.y as f32, p.z as f32])
            .collect(),
        indices: indices.to_vec(),
        normals: xyz(normals),
        tangents: xyz(tangents),
        uvs: uvs.iter().flat_map(|t| [t.x as f32, t.y as f32]).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burrow_path::Path;
    use burrow_section::{
        FlatField, GenerationSettings, KeyedProfiles, RingLayout, RingSource, SectionGenerator,
        SectionShape, SegmentRequest, TaperPlan,
    };

    fn flat_section(layout: RingLayout) -> SectionMesh {
        let settings = GenerationSettings::default();
        let profiles = KeyedProfiles::default();
        let path = Path::from_positions(&[Point3::origin(), Point3::new(100.0, 0.0, 0.0)]);
        let generator = SectionGenerator::new(layout, &settings, &FlatField, &profiles);
        generator
            .generate(&SegmentRequest {
                path: &path,
                segment: 0,
                shape: SectionShape::default(),
                taper: TaperPlan::default(),
                start: RingSource::Fresh,
                end: RingSource::Fresh,
            })
            .unwrap()
            .mesh
    }

    #[test]
    fn test_grid_triangle_count() {
        let vertices: Vec<Point3> = (0..12)
            .map(|i| Point3::new((i / 4) as f64, (i % 4) as f64, 0.0))
            .collect();
        let patch = GridPatch {
            offset: 0,
            rows: 3,
            columns: 4,
        };
        let indices = triangulate_patches(&vertices, &[patch]);
        assert_eq!(indices.len() / 3, 2 * 3 * 2);
    }

    #[test]
    fn test_patch_past_array_is_skipped() {
        let vertices = vec![Point3::origin(); 4];
        let patch = GridPatch {
            offset: 2,
            rows: 2,
            columns: 2,
        };
        assert!(triangulate_patches(&vertices, &[patch]).is_empty());
    }

    #[test]
    fn test_degenerate_triangles_dropped() {
        let vertices = vec![Point3::origin(); 4];
        let patch = GridPatch {
            offset: 0,
            rows: 2,
            columns: 2,
        };
        assert!(triangulate_patches(&vertices, &[patch]).is_empty());
    }

    #[test]
    fn test_floor_normals_face_up() {
        let mesh = flat_section(RingLayout::new(5, 4));
        let triangles = triangulate(&mesh);
        let shading = shade(&mesh, &triangles);
        assert!(!triangles.is_empty());
        for n in &shading.ground_normals {
            assert!((n.z - 1.0).abs() < 1e-9, "floor normal {n:?}");
        }
    }

    #[test]
    fn test_roof_normals_face_down() {
        let layout = RingLayout::new(5, 4);
        let mesh = flat_section(layout);
        let triangles = triangulate(&mesh);
        let shading = shade(&mesh, &triangles);
        // Middle roof vertex of the first ring.
        let roof_mid = layout.roof_start() - layout.ground_len() + 2;
        assert!(shading.wall_normals[roof_mid].z < 0.0);
    }

    #[test]
    fn test_flattened_mesh_sizes() {
        let mesh = flat_section(RingLayout::new(5, 4));
        let triangles = triangulate(&mesh);
        let shading = shade(&mesh, &triangles);
        let out = to_triangle_mesh(&mesh, &triangles, &shading);
        assert_eq!(out.num_vertices(), mesh.vertex_count());
        assert_eq!(out.normals.len(), out.vertices.len());
        assert_eq!(out.tangents.len(), out.vertices.len());
        assert_eq!(out.uvs.len(), mesh.vertex_count() * 2);
        assert_eq!(out.num_triangles(), triangles.len());
        let max = out.indices.iter().copied().max().unwrap() as usize;
        assert!(max < out.num_vertices());
    }
}
