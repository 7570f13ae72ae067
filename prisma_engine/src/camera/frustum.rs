/// Frustum - six clipping planes for visibility culling.
///
/// Each plane is represented as a Vec4 (A, B, C, D) where:
/// - (A, B, C) is the inward-pointing unit normal
/// - D is the signed distance
/// - A point P is inside the frustum if dot(plane, P_homogeneous) >= 0 for all planes
///
/// Planes are extracted for a [0, 1] clip depth range (Vulkan convention,
/// `Mat4::perspective_rh` / `Mat4::orthographic_rh`).

use glam::{Mat4, Vec3, Vec4};

/// Frustum plane indices
pub const PLANE_LEFT: usize = 0;
pub const PLANE_RIGHT: usize = 1;
pub const PLANE_BOTTOM: usize = 2;
pub const PLANE_TOP: usize = 3;
pub const PLANE_NEAR: usize = 4;
pub const PLANE_FAR: usize = 5;

/// Six frustum planes for culling.
///
/// Works with both perspective and orthographic projections.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    /// Frustum planes: left, right, bottom, top, near, far
    pub planes: [Vec4; 6],
}

impl Frustum {
    /// Extract frustum planes from a view-projection matrix.
    ///
    /// Gribb & Hartmann, with the near plane taken from row 2 alone since
    /// clip depth starts at 0.
    pub fn from_view_projection(vp: &Mat4) -> Self {
        let r0 = vp.row(0);
        let r1 = vp.row(1);
        let r2 = vp.row(2);
        let r3 = vp.row(3);

        let mut planes = [r3 + r0, r3 - r0, r3 + r1, r3 - r1, r2, r3 - r2];

        for plane in &mut planes {
            let normal_len = plane.truncate().length();
            if normal_len > 0.0 {
                *plane /= normal_len;
            }
        }

        Self { planes }
    }

    /// Signed distance from a plane to a point (positive = inside)
    pub fn distance_to_plane(&self, plane: usize, point: Vec3) -> f32 {
        let p = self.planes[plane];
        p.truncate().dot(point) + p.w
    }

    pub fn contains_point(&self, point: Vec3) -> bool {
        (0..6).all(|i| self.distance_to_plane(i, point) >= 0.0)
    }

    /// Test if a bounding sphere intersects this frustum.
    ///
    /// Conservative: may report spheres near a frustum corner as visible,
    /// never culls a visible one.
    pub fn intersects_sphere(&self, center: Vec3, radius: f32) -> bool {
        (0..6).all(|i| self.distance_to_plane(i, center) >= -radius)
    }
}

#[cfg(test)]
#[path = "frustum_tests.rs"]
mod tests;
