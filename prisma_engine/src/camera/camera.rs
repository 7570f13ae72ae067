/// Camera - passive view description consumed by the renderer.
///
/// The renderer never moves or owns a camera. The caller builds one per
/// frame (or keeps one around) and hands it in by reference. Derived data
/// (world position, frustum) is computed once when the matrices are set.

use glam::{Mat4, Vec3};
use crate::graphics_device::{Rect2D, Viewport};
use super::frustum::Frustum;

#[derive(Debug, Clone)]
pub struct Camera {
    view_matrix: Mat4,
    projection_matrix: Mat4,
    position: Vec3,
    near: f32,
    far: f32,
    frustum: Frustum,
    viewport: Viewport,
    scissor: Option<Rect2D>,
}

impl Camera {
    /// Create a camera from explicit matrices.
    ///
    /// `near`/`far` must be the clip distances baked into `projection`;
    /// they drive cascade splitting.
    pub fn new(view: Mat4, projection: Mat4, near: f32, far: f32, viewport: Viewport) -> Self {
        Self {
            view_matrix: view,
            projection_matrix: projection,
            position: view.inverse().w_axis.truncate(),
            near,
            far,
            frustum: Frustum::from_view_projection(&(projection * view)),
            viewport,
            scissor: None,
        }
    }

    /// Right-handed perspective camera looking from `eye` at `target`
    #[allow(clippy::too_many_arguments)]
    pub fn perspective(
        eye: Vec3,
        target: Vec3,
        up: Vec3,
        fov_y_radians: f32,
        aspect: f32,
        near: f32,
        far: f32,
        viewport: Viewport,
    ) -> Self {
        let view = Mat4::look_at_rh(eye, target, up);
        let projection = Mat4::perspective_rh(fov_y_radians, aspect, near, far);
        Self::new(view, projection, near, far, viewport)
    }

    // ===== GETTERS =====

    /// View matrix (inverse of the camera's world transform).
    pub fn view_matrix(&self) -> &Mat4 {
        &self.view_matrix
    }

    pub fn projection_matrix(&self) -> &Mat4 {
        &self.projection_matrix
    }

    /// Combined view-projection matrix (projection * view).
    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix * self.view_matrix
    }

    /// World-space eye position
    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn near(&self) -> f32 {
        self.near
    }

    pub fn far(&self) -> f32 {
        self.far
    }

    pub fn frustum(&self) -> &Frustum {
        &self.frustum
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Scissor rectangle, if set.
    pub fn scissor(&self) -> Option<&Rect2D> {
        self.scissor.as_ref()
    }

    /// Effective scissor: explicit scissor or viewport bounds as Rect2D.
    pub fn effective_scissor(&self) -> Rect2D {
        self.scissor.unwrap_or(Rect2D {
            x: self.viewport.x as i32,
            y: self.viewport.y as i32,
            width: self.viewport.width as u32,
            height: self.viewport.height as u32,
        })
    }

    /// Signed view-space depth of a world-space point
    ///
    /// Positive in front of the camera, negative behind it.
    pub fn view_depth(&self, world_point: Vec3) -> f32 {
        -self.view_matrix.transform_point3(world_point).z
    }

    // ===== SETTERS =====

    /// Replace both matrices; position and frustum are rederived.
    pub fn set_matrices(&mut self, view: Mat4, projection: Mat4, near: f32, far: f32) {
        *self = Self { scissor: self.scissor, ..Self::new(view, projection, near, far, self.viewport) };
    }

    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Set the scissor rectangle. `None` means same as viewport.
    pub fn set_scissor(&mut self, scissor: Option<Rect2D>) {
        self.scissor = scissor;
    }
}

#[cfg(test)]
#[path = "camera_tests.rs"]
mod tests;
