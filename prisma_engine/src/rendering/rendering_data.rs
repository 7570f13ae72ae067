/// RenderingData - immutable per-frame snapshot of camera, time and toggles
///
/// Built once by the renderer before any pass runs. Only getters are
/// exposed, so passes and features cannot change it mid-frame.

use glam::{Mat4, Vec3};
use crate::camera::Camera;
use crate::frame::FrameContext;
use crate::graphics_device::Extent2D;

/// Frame-level feature switches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderToggles {
    pub enable_shadows: bool,
    pub enable_post_processing: bool,
    pub enable_skybox: bool,
    pub debug_view: bool,
}

impl Default for RenderToggles {
    fn default() -> Self {
        Self {
            enable_shadows: true,
            enable_post_processing: true,
            enable_skybox: true,
            debug_view: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RenderingData {
    view: Mat4,
    projection: Mat4,
    view_projection: Mat4,
    inverse_view_projection: Mat4,
    camera_position: Vec3,
    near: f32,
    far: f32,
    time: f64,
    delta_time: f32,
    frame_index: u64,
    screen: Extent2D,
    toggles: RenderToggles,
}

impl RenderingData {
    pub fn new(camera: &Camera, frame: &FrameContext, screen: Extent2D, toggles: RenderToggles) -> Self {
        let view_projection = camera.view_projection_matrix();
        Self {
            view: *camera.view_matrix(),
            projection: *camera.projection_matrix(),
            view_projection,
            inverse_view_projection: view_projection.inverse(),
            camera_position: camera.position(),
            near: camera.near(),
            far: camera.far(),
            time: frame.total_time,
            delta_time: frame.delta_time,
            frame_index: frame.frame_index,
            screen,
            toggles,
        }
    }

    pub fn view(&self) -> &Mat4 {
        &self.view
    }

    pub fn projection(&self) -> &Mat4 {
        &self.projection
    }

    pub fn view_projection(&self) -> &Mat4 {
        &self.view_projection
    }

    pub fn inverse_view_projection(&self) -> &Mat4 {
        &self.inverse_view_projection
    }

    pub fn camera_position(&self) -> Vec3 {
        self.camera_position
    }

    pub fn near(&self) -> f32 {
        self.near
    }

    pub fn far(&self) -> f32 {
        self.far
    }

    /// Seconds since the first frame
    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn delta_time(&self) -> f32 {
        self.delta_time
    }

    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    pub fn screen_size(&self) -> Extent2D {
        self.screen
    }

    pub fn toggles(&self) -> &RenderToggles {
        &self.toggles
    }
}

#[cfg(test)]
#[path = "rendering_data_tests.rs"]
mod tests;
