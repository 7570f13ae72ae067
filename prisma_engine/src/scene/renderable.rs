/// Renderable - what a scene hands to the queue builder for one sub-mesh

use glam::{Mat4, Vec3};
use slotmap::new_key_type;
use crate::graphics_device::{DepthState, StencilState};
use crate::render_queue::{GeometryHandle, MaterialRef, RenderQueueId};

new_key_type! {
    /// Stable key of a renderable in a `Scene`
    pub struct RenderableKey;
}

#[derive(Debug, Clone, PartialEq)]
pub struct Renderable {
    pub name: String,
    pub world_matrix: Mat4,
    /// Bounding sphere center in local space
    pub bounds_center: Vec3,
    /// Bounding sphere radius in local space
    pub bounds_radius: f32,
    pub material: MaterialRef,
    pub geometry: GeometryHandle,
    pub sub_mesh_index: u32,
    pub queue_id: u32,
    pub depth_state: DepthState,
    pub stencil_state: StencilState,
    pub visible: bool,
    pub cast_shadows: bool,
}

impl Renderable {
    /// Opaque, visible, shadow-casting renderable at the origin
    pub fn new(name: &str, material: MaterialRef, geometry: GeometryHandle) -> Self {
        Self {
            name: name.to_string(),
            world_matrix: Mat4::IDENTITY,
            bounds_center: Vec3::ZERO,
            bounds_radius: 1.0,
            material,
            geometry,
            sub_mesh_index: 0,
            queue_id: RenderQueueId::OPAQUE,
            depth_state: DepthState::default_opaque(),
            stencil_state: StencilState::disabled(),
            visible: true,
            cast_shadows: true,
        }
    }

    pub fn with_transform(mut self, world_matrix: Mat4) -> Self {
        self.world_matrix = world_matrix;
        self
    }

    pub fn with_bounds(mut self, center: Vec3, radius: f32) -> Self {
        self.bounds_center = center;
        self.bounds_radius = radius;
        self
    }

    pub fn with_queue(mut self, queue_id: u32) -> Self {
        self.queue_id = queue_id;
        self
    }

    pub fn with_depth_state(mut self, depth_state: DepthState) -> Self {
        self.depth_state = depth_state;
        self
    }

    pub fn with_stencil_state(mut self, stencil_state: StencilState) -> Self {
        self.stencil_state = stencil_state;
        self
    }

    pub fn with_cast_shadows(mut self, cast_shadows: bool) -> Self {
        self.cast_shadows = cast_shadows;
        self
    }

    /// Bounding sphere in world space
    ///
    /// The radius is scaled by the largest axis scale of the transform.
    pub fn world_bounds(&self) -> (Vec3, f32) {
        let center = self.world_matrix.transform_point3(self.bounds_center);
        let scale = self
            .world_matrix
            .x_axis
            .truncate()
            .length()
            .max(self.world_matrix.y_axis.truncate().length())
            .max(self.world_matrix.z_axis.truncate().length());
        (center, self.bounds_radius * scale)
    }
}
