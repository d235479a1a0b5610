//! The mesh building strategy the network hands generated sections to.

use std::collections::BTreeMap;

use burrow_math::{Point3, Transform, Vec3};
use burrow_mesh::{Shading, TriangleMesh, Triangles};
use burrow_section::SectionMesh;

use crate::{JunctionId, TunnelId};

/// What a section mesh belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MeshTarget {
    /// One segment of a tunnel, indexed from the path start.
    TunnelSegment {
        /// Owning tunnel.
        tunnel: TunnelId,
        /// Segment index.
        segment: usize,
    },
    /// A junction.
    Junction(JunctionId),
}

/// Turns section vertex arrays into renderable meshes.
///
/// The default `triangulate` and `shade` use the strip triangulator from
/// `burrow-mesh`; implementors only have to decide what `commit` does.
pub trait MeshBuilder {
    /// Build triangle indices for a section.
    fn triangulate(&mut self, _target: MeshTarget, mesh: &SectionMesh) -> Triangles {
        burrow_mesh::triangulate(mesh)
    }

    /// Compute normals and tangents.
    fn shade(&mut self, _target: MeshTarget, mesh: &SectionMesh, triangles: &Triangles) -> Shading {
        burrow_mesh::shade(mesh, triangles)
    }

    /// Store or upload the finished mesh, replacing any earlier mesh of
    /// `target`. `placement` maps the section's local space to world space.
    fn commit(
        &mut self,
        target: MeshTarget,
        placement: &Transform,
        mesh: &SectionMesh,
        triangles: Triangles,
        shading: Shading,
    );

    /// Drop the mesh of `target`.
    fn discard(&mut self, _target: MeshTarget) {}
}

/// A [`MeshBuilder`] that keeps every committed mesh in world space.
#[derive(Debug, Clone, Default)]
pub struct MeshCollector {
    meshes: BTreeMap<MeshTarget, TriangleMesh>,
    commits: usize,
}

impl MeshCollector {
    /// Create an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Mesh committed for `target`.
    pub fn get(&self, target: MeshTarget) -> Option<&TriangleMesh> {
        self.meshes.get(&target)
    }

    /// Number of live meshes.
    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    /// True when nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    /// Number of commits so far, replaced meshes included.
    pub fn commits(&self) -> usize {
        self.commits
    }

    /// Targets with a live mesh, in a stable order.
    pub fn targets(&self) -> impl Iterator<Item = MeshTarget> + '_ {
        self.meshes.keys().copied()
    }

    /// All live meshes merged into one.
    pub fn combined(&self) -> TriangleMesh {
        let mut out = TriangleMesh::new();
        for mesh in self.meshes.values() {
            out.merge(mesh);
        }
        out
    }
}

impl MeshBuilder for MeshCollector {
    fn commit(
        &mut self,
        target: MeshTarget,
        placement: &Transform,
        mesh: &SectionMesh,
        triangles: Triangles,
        shading: Shading,
    ) {
        let (world, shading) = place(mesh, &shading, placement);
        let flat = burrow_mesh::to_triangle_mesh(&world, &triangles, &shading);
        self.meshes.insert(target, flat);
        self.commits += 1;
    }

    fn discard(&mut self, target: MeshTarget) {
        self.meshes.remove(&target);
    }
}

fn place(mesh: &SectionMesh, shading: &Shading, placement: &Transform) -> (SectionMesh, Shading) {
    let points = |v: &[Point3]| -> Vec<Point3> { v.iter().map(|p| placement.apply_point(p)).collect() };
    let vecs = |v: &[Vec3]| -> Vec<Vec3> { v.iter().map(|n| placement.apply_vec(n)).collect() };
    (
        SectionMesh {
            ground_vertices: points(&mesh.ground_vertices),
            wall_vertices: points(&mesh.wall_vertices),
            ..mesh.clone()
        },
        Shading {
            ground_normals: vecs(&shading.ground_normals),
            ground_tangents: vecs(&shading.ground_tangents),
            wall_normals: vecs(&shading.wall_normals),
            wall_tangents: vecs(&shading.wall_tangents),
        },
    )
}
