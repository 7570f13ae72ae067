/// RenderObject - one drawable instance queued for the current frame

use glam::{Mat4, Vec3};
use crate::graphics_device::{BufferKey, DepthState, IndexType, PipelineKey, StencilState};

/// Material as seen by the queues: a stable numeric id for sorting and
/// the pipeline it draws with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MaterialRef {
    pub id: u32,
    pub pipeline: PipelineKey,
}

/// Geometry to draw: indexed when an index buffer is present
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeometryHandle {
    pub vertex_buffer: BufferKey,
    pub index_buffer: Option<(BufferKey, IndexType)>,
    /// Index count for indexed geometry, vertex count otherwise
    pub element_count: u32,
    pub first_element: u32,
    pub vertex_offset: i32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderObject {
    pub name: String,
    pub world_matrix: Mat4,
    /// World-space bounding sphere
    pub bounds_center: Vec3,
    pub bounds_radius: f32,
    pub material: MaterialRef,
    pub geometry: GeometryHandle,
    pub sub_mesh_index: u32,
    pub queue_id: u32,
    pub depth_state: DepthState,
    pub stencil_state: StencilState,
    /// Signed view-space depth of the bounds center (negative: behind the camera)
    pub distance_to_camera: f32,
    pub cast_shadows: bool,
}

impl RenderObject {
    pub fn material_id(&self) -> u32 {
        self.material.id
    }
}

/// Map a float distance onto a `u32` whose unsigned order is the float order
///
/// Negative values have every bit inverted, non-negative values only the
/// sign bit, so `-inf < -1.0 < 0.0 < 1.0 < inf` holds on the keys. `-0.0`
/// is folded into `0.0` so equal distances always share a key.
pub fn distance_key(distance: f32) -> u32 {
    let distance = if distance == 0.0 { 0.0 } else { distance };
    let bits = distance.to_bits();
    if bits & 0x8000_0000 != 0 {
        !bits
    } else {
        bits ^ 0x8000_0000
    }
}

/// Sort key for one object under the given mode
///
/// `BackToFront` is the complement of the `FrontToBack` key, so it orders
/// correctly for negative distances too.
pub fn calculate_sort_key(object: &RenderObject, mode: super::SortMode) -> u64 {
    use super::SortMode;
    match mode {
        SortMode::None => 0,
        SortMode::FrontToBack => distance_key(object.distance_to_camera) as u64,
        SortMode::BackToFront => (!distance_key(object.distance_to_camera)) as u64,
        SortMode::ByMaterial => object.material_id() as u64,
        SortMode::MaterialThenDistance => {
            ((object.material_id() as u64) << 32) | distance_key(object.distance_to_camera) as u64
        }
    }
}

#[cfg(test)]
#[path = "render_object_tests.rs"]
mod tests;
