/// Scene - slot-map backed collection of renderables plus scene lighting

use slotmap::SlotMap;
use crate::rendering::LightingData;
use super::renderable::{Renderable, RenderableKey};

/// What the renderer needs from a scene
pub trait RenderScene {
    /// Visit every renderable, visible or not, in a stable order
    fn for_each_renderable(&self, f: &mut dyn FnMut(&Renderable));

    /// Lights in scene order plus ambient terms
    fn lighting(&self) -> &LightingData;
}

/// Renderables are stored in a SlotMap: O(1) insert/remove, keys stay
/// valid when other entries are removed and fail once theirs is.
#[derive(Debug, Default)]
pub struct Scene {
    renderables: SlotMap<RenderableKey, Renderable>,
    lighting: LightingData,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, renderable: Renderable) -> RenderableKey {
        self.renderables.insert(renderable)
    }

    /// Returns the removed renderable, or None for a stale key
    pub fn remove(&mut self, key: RenderableKey) -> Option<Renderable> {
        self.renderables.remove(key)
    }

    pub fn get(&self, key: RenderableKey) -> Option<&Renderable> {
        self.renderables.get(key)
    }

    pub fn get_mut(&mut self, key: RenderableKey) -> Option<&mut Renderable> {
        self.renderables.get_mut(key)
    }

    pub fn len(&self) -> usize {
        self.renderables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.renderables.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (RenderableKey, &Renderable)> {
        self.renderables.iter()
    }

    pub fn clear(&mut self) {
        self.renderables.clear();
    }

    pub fn lighting_mut(&mut self) -> &mut LightingData {
        &mut self.lighting
    }

    pub fn set_lighting(&mut self, lighting: LightingData) {
        self.lighting = lighting;
    }
}

impl RenderScene for Scene {
    fn for_each_renderable(&self, f: &mut dyn FnMut(&Renderable)) {
        for renderable in self.renderables.values() {
            f(renderable);
        }
    }

    fn lighting(&self) -> &LightingData {
        &self.lighting
    }
}

#[cfg(test)]
#[path = "scene_tests.rs"]
mod tests;
