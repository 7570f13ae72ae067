/// RenderQueueBuilder - turns scene renderables into queued render objects

use crate::camera::Camera;
use crate::scene::{RenderScene, Renderable};
use super::render_object::RenderObject;
use super::render_queue_manager::RenderQueueManager;

/// Counters of one `build` call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildStats {
    pub visited: u32,
    pub hidden: u32,
    pub culled: u32,
    pub queued: u32,
}

pub struct RenderQueueBuilder;

impl RenderQueueBuilder {
    /// Append every visible renderable of `scene` to `manager`
    ///
    /// The manager is not cleared first. With culling on, renderables whose
    /// world bounding sphere misses the camera frustum are dropped.
    pub fn build(
        scene: &dyn RenderScene,
        camera: &Camera,
        manager: &mut RenderQueueManager,
        enable_frustum_culling: bool,
    ) -> BuildStats {
        let mut stats = BuildStats::default();
        scene.for_each_renderable(&mut |renderable| {
            stats.visited += 1;
            let Some(object) = Self::create_render_object(renderable, camera) else {
                stats.hidden += 1;
                return;
            };
            if enable_frustum_culling
                && !camera.frustum().intersects_sphere(object.bounds_center, object.bounds_radius)
            {
                stats.culled += 1;
                return;
            }
            manager.add_object(object);
            stats.queued += 1;
        });
        stats
    }

    /// Render object for one renderable, or None when it is hidden
    ///
    /// Bounds are moved to world space and the distance is the signed view
    /// depth of the bounds center.
    pub fn create_render_object(renderable: &Renderable, camera: &Camera) -> Option<RenderObject> {
        if !renderable.visible {
            return None;
        }
        let (bounds_center, bounds_radius) = renderable.world_bounds();
        Some(RenderObject {
            name: renderable.name.clone(),
            world_matrix: renderable.world_matrix,
            bounds_center,
            bounds_radius,
            material: renderable.material,
            geometry: renderable.geometry,
            sub_mesh_index: renderable.sub_mesh_index,
            queue_id: renderable.queue_id,
            depth_state: renderable.depth_state,
            stencil_state: renderable.stencil_state,
            distance_to_camera: camera.view_depth(bounds_center),
            cast_shadows: renderable.cast_shadows,
        })
    }
}

#[cfg(test)]
#[path = "render_queue_builder_tests.rs"]
mod tests;
