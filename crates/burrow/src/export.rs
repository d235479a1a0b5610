//! Binary STL export of collected meshes.

use std::fs;

use burrow_mesh::TriangleMesh;

use crate::{BurrowError, Result};

const HEADER: &[u8; 80] =
    b"burrow STL export                                                               ";

/// Encode a mesh as binary STL, with facet normals taken from the winding.
pub fn to_stl_bytes(mesh: &TriangleMesh) -> Result<Vec<u8>> {
    let num_triangles = mesh.indices.len() / 3;
    if num_triangles == 0 {
        return Err(BurrowError::EmptyGeometry);
    }
    let mut data = Vec::with_capacity(84 + num_triangles * 50);
    data.extend_from_slice(HEADER);
    data.extend_from_slice(&(num_triangles as u32).to_le_bytes());

    let vertex = |i: u32| {
        let i = i as usize * 3;
        [mesh.vertices[i], mesh.vertices[i + 1], mesh.vertices[i + 2]]
    };
    for tri in mesh.indices.chunks_exact(3) {
        let [v0, v1, v2] = [vertex(tri[0]), vertex(tri[1]), vertex(tri[2])];
        let e1 = [v1[0] - v0[0], v1[1] - v0[1], v1[2] - v0[2]];
        let e2 = [v2[0] - v0[0], v2[1] - v0[1], v2[2] - v0[2]];
        let n = [
            e1[1] * e2[2] - e1[2] * e2[1],
            e1[2] * e2[0] - e1[0] * e2[2],
            e1[0] * e2[1] - e1[1] * e2[0],
        ];
        let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
        let n = if len > 1e-10 {
            [n[0] / len, n[1] / len, n[2] / len]
        } else {
            [0.0, 0.0, 1.0]
        };

        for v in [n, v0, v1, v2] {
            for c in v {
                data.extend_from_slice(&c.to_le_bytes());
            }
        }
        // Attribute byte count
        data.extend_from_slice(&[0, 0]);
    }
    Ok(data)
}

/// Write a mesh to a binary STL file.
pub fn write_stl(mesh: &TriangleMesh, path: impl AsRef<std::path::Path>) -> Result<()> {
    let bytes = to_stl_bytes(mesh)?;
    fs::write(path, bytes)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> TriangleMesh {
        TriangleMesh {
            vertices: vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            indices: vec![0, 1, 2],
            ..TriangleMesh::new()
        }
    }

    #[test]
    fn test_stl_layout() {
        let bytes = to_stl_bytes(&triangle()).unwrap();
        assert_eq!(bytes.len(), 84 + 50);
        assert_eq!(u32::from_le_bytes([bytes[80], bytes[81], bytes[82], bytes[83]]), 1);
        let nz = f32::from_le_bytes([bytes[92], bytes[93], bytes[94], bytes[95]]);
        assert_eq!(nz, 1.0);
    }

    #[test]
    fn test_empty_mesh_is_rejected() {
        assert!(matches!(
            to_stl_bytes(&TriangleMesh::new()),
            Err(BurrowError::EmptyGeometry)
        ));
    }
}
