#![warn(missing_docs)]

//! Math types for burrow.
//!
//! Thin wrappers around nalgebra: points, vectors, rigid placements of
//! tunnels and junctions, interpolation helpers and tolerances. The world is
//! right-handed with +Z up; a frame facing +X has its right vector at -Y.

use nalgebra::{Matrix4, Vector3, Vector4};

/// A point in 3D space.
pub type Point3 = nalgebra::Point3<f64>;

/// A vector in 3D space.
pub type Vec3 = Vector3<f64>;

/// A point in 2D texture space.
pub type Point2 = nalgebra::Point2<f64>;

/// The world up axis.
pub fn up() -> Vec3 {
    Vec3::z()
}

/// Linear interpolation between `a` and `b`.
pub fn lerp(a: f64, b: f64, alpha: f64) -> f64 {
    a + (b - a) * alpha
}

/// Linear interpolation between two points.
pub fn lerp_point(a: &Point3, b: &Point3, alpha: f64) -> Point3 {
    a + (b - a) * alpha
}

/// Heading of `v` in the XY plane, in radians from +X toward +Y.
pub fn yaw_of(v: &Vec3) -> f64 {
    v.y.atan2(v.x)
}

/// Rotate `v` about +Z by `angle` radians.
pub fn rotate_yaw(v: &Vec3, angle: f64) -> Vec3 {
    let (s, c) = angle.sin_cos();
    Vec3::new(c * v.x - s * v.y, s * v.x + c * v.y, v.z)
}

/// Drop the vertical component and renormalize, or `None` if nothing is left.
pub fn flatten(v: &Vec3) -> Option<Vec3> {
    Vec3::new(v.x, v.y, 0.0).try_normalize(1e-12)
}

/// Normalize `v`, returning the zero vector when it has no length.
pub fn normalize_or_zero(v: &Vec3) -> Vec3 {
    v.try_normalize(1e-12).unwrap_or_else(Vec3::zeros)
}

/// Placement of a tunnel or junction: yaw about +Z plus a translation,
/// stored as a 4x4 matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    /// The underlying 4x4 matrix.
    pub matrix: Matrix4<f64>,
}

impl Transform {
    /// Identity transform.
    pub fn identity() -> Self {
        Self {
            matrix: Matrix4::identity(),
        }
    }

    /// Translation by `(dx, dy, dz)`.
    pub fn translation(dx: f64, dy: f64, dz: f64) -> Self {
        let mut m = Matrix4::identity();
        m[(0, 3)] = dx;
        m[(1, 3)] = dy;
        m[(2, 3)] = dz;
        Self { matrix: m }
    }

    /// Rotation about the Z axis by `angle` radians.
    pub fn rotation_z(angle: f64) -> Self {
        let (s, c) = angle.sin_cos();
        let mut m = Matrix4::identity();
        m[(0, 0)] = c;
        m[(0, 1)] = -s;
        m[(1, 0)] = s;
        m[(1, 1)] = c;
        Self { matrix: m }
    }

    /// Place a local frame at `origin` turned by `yaw` radians about +Z.
    ///
    /// Local +X maps to the heading, local +Z stays up.
    pub fn placement(origin: &Point3, yaw: f64) -> Self {
        Self::translation(origin.x, origin.y, origin.z).then(&Self::rotation_z(yaw))
    }

    /// Compose: `self` then `other` (self * other).
    ///
    /// The result applies `other` first, then `self`.
    pub fn then(&self, other: &Transform) -> Self {
        Self {
            matrix: self.matrix * other.matrix,
        }
    }

    /// Transform a point.
    pub fn apply_point(&self, p: &Point3) -> Point3 {
        let v = self.matrix * Vector4::new(p.x, p.y, p.z, 1.0);
        Point3::new(v.x, v.y, v.z)
    }

    /// Transform a direction vector (ignores translation).
    pub fn apply_vec(&self, v: &Vec3) -> Vec3 {
        let r = self.matrix * Vector4::new(v.x, v.y, v.z, 0.0);
        Vec3::new(r.x, r.y, r.z)
    }

    /// Inverse assuming the upper-left 3x3 block is a rotation.
    ///
    /// Never fails; the result is meaningless for transforms with scale or
    /// shear.
    pub fn rigid_inverse(&self) -> Self {
        let r = self.matrix.fixed_view::<3, 3>(0, 0).transpose();
        let t = self.matrix.fixed_view::<3, 1>(0, 3).into_owned();
        let t_inv = -(r * t);
        let mut m = Matrix4::identity();
        m.fixed_view_mut::<3, 3>(0, 0).copy_from(&r);
        m.fixed_view_mut::<3, 1>(0, 3).copy_from(&t_inv);
        Self { matrix: m }
    }

    /// Transform taking coordinates in `from`'s local space into `to`'s.
    pub fn between(from: &Transform, to: &Transform) -> Self {
        to.rigid_inverse().then(from)
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::identity()
    }
}

/// Length below which a segment or distance counts as zero.
#[derive(Debug, Clone, Copy)]
pub struct Tolerance {
    /// Linear distance tolerance in world units.
    pub linear: f64,
}

impl Tolerance {
    /// 1e-6 world units.
    pub const DEFAULT: Self = Self { linear: 1e-6 };
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    #[test]
    fn test_identity_transform() {
        let t = Transform::identity();
        let p = Point3::new(1.0, 2.0, 3.0);
        let result = t.apply_point(&p);
        assert!((result - p).norm() < 1e-12);
    }

    #[test]
    fn test_translation() {
        let t = Transform::translation(10.0, 20.0, 30.0);
        let result = t.apply_point(&Point3::new(1.0, 2.0, 3.0));
        assert!((result.x - 11.0).abs() < 1e-12);
        assert!((result.y - 22.0).abs() < 1e-12);
        assert!((result.z - 33.0).abs() < 1e-12);
    }

    #[test]
    fn test_rotation_z_90() {
        let t = Transform::rotation_z(PI / 2.0);
        let result = t.apply_point(&Point3::new(1.0, 0.0, 0.0));
        assert!(result.x.abs() < 1e-12);
        assert!((result.y - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_placement_maps_local_forward_to_heading() {
        let t = Transform::placement(&Point3::new(5.0, 0.0, 1.0), PI / 2.0);
        let p = t.apply_point(&Point3::new(2.0, 0.0, 0.0));
        assert!((p - Point3::new(5.0, 2.0, 1.0)).norm() < 1e-12);
        let up_after = t.apply_vec(&up());
        assert!((up_after - up()).norm() < 1e-12);
    }

    #[test]
    fn test_rigid_inverse_undoes_placement() {
        let t = Transform::placement(&Point3::new(3.0, -4.0, 2.0), 0.7);
        let p = Point3::new(12.0, -1.0, 5.0);
        let back = t.rigid_inverse().apply_point(&t.apply_point(&p));
        assert!((back - p).norm() < 1e-12);
        let identity = t.then(&t.rigid_inverse());
        assert!((identity.matrix - Matrix4::identity()).norm() < 1e-12);
    }

    #[test]
    fn test_between_round_trip() {
        let a = Transform::placement(&Point3::new(100.0, 0.0, 0.0), 0.3);
        let b = Transform::placement(&Point3::new(-20.0, 50.0, 0.0), -1.2);
        let p_in_a = Point3::new(7.0, 8.0, 9.0);
        let p_in_b = Transform::between(&a, &b).apply_point(&p_in_a);
        let world_a = a.apply_point(&p_in_a);
        let world_b = b.apply_point(&p_in_b);
        assert!((world_a - world_b).norm() < 1e-9);
    }

    #[test]
    fn test_rotate_yaw_and_flatten() {
        let r = rotate_yaw(&Vec3::new(0.0, -1.0, 0.0), -PI / 2.0);
        assert!((r - Vec3::new(-1.0, 0.0, 0.0)).norm() < 1e-12);
        assert!(flatten(&Vec3::z()).is_none());
        let f = flatten(&Vec3::new(3.0, 4.0, 10.0)).unwrap();
        assert!((f.norm() - 1.0).abs() < 1e-12);
        assert!(f.z.abs() < 1e-12);
    }

    #[test]
    fn test_lerp_and_yaw() {
        assert!((lerp(100.0, 0.0, 0.25) - 75.0).abs() < 1e-12);
        assert!((yaw_of(&Vec3::new(0.0, 1.0, 0.0)) - PI / 2.0).abs() < 1e-12);
        assert_eq!(normalize_or_zero(&Vec3::zeros()), Vec3::zeros());
    }
}
