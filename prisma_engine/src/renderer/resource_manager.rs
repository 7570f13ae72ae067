/// Name registry for GPU resources shared by passes and features.
///
/// Pipelines and textures are built by the application (or an asset layer)
/// and registered here under a stable name. Passes and features look them
/// up at initialization; a missing name means the pass or feature cannot
/// run and is skipped or disabled.

use rustc_hash::FxHashMap;
use crate::error::Result;
use crate::graphics_device::{PipelineKey, TextureKey};
use crate::{engine_bail, engine_debug};

const SOURCE: &str = "prisma::ResourceManager";

pub struct ResourceManager {
    pipelines: FxHashMap<String, PipelineKey>,
    textures: FxHashMap<String, TextureKey>,
}

impl ResourceManager {
    /// Create a new empty resource manager
    pub fn new() -> Self {
        Self {
            pipelines: FxHashMap::default(),
            textures: FxHashMap::default(),
        }
    }

    // ===== PIPELINES =====

    /// Register a pipeline under `name`
    ///
    /// # Errors
    ///
    /// Returns an error if a pipeline with the same name already exists.
    pub fn register_pipeline(&mut self, name: &str, pipeline: PipelineKey) -> Result<()> {
        if self.pipelines.contains_key(name) {
            engine_bail!(SOURCE, "Pipeline '{}' already registered", name);
        }
        self.pipelines.insert(name.to_string(), pipeline);
        engine_debug!(SOURCE, "Registered pipeline '{}'", name);
        Ok(())
    }

    pub fn pipeline(&self, name: &str) -> Option<PipelineKey> {
        self.pipelines.get(name).copied()
    }

    pub fn has_pipeline(&self, name: &str) -> bool {
        self.pipelines.contains_key(name)
    }

    /// Forget a pipeline; the GPU object itself belongs to whoever built it
    pub fn remove_pipeline(&mut self, name: &str) -> Option<PipelineKey> {
        self.pipelines.remove(name)
    }

    /// Registered pipeline names, sorted
    pub fn pipeline_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.pipelines.keys().cloned().collect();
        names.sort();
        names
    }

    // ===== TEXTURES =====

    /// Register a texture under `name`
    ///
    /// # Errors
    ///
    /// Returns an error if a texture with the same name already exists.
    pub fn register_texture(&mut self, name: &str, texture: TextureKey) -> Result<()> {
        if self.textures.contains_key(name) {
            engine_bail!(SOURCE, "Texture '{}' already registered", name);
        }
        self.textures.insert(name.to_string(), texture);
        engine_debug!(SOURCE, "Registered texture '{}'", name);
        Ok(())
    }

    pub fn texture(&self, name: &str) -> Option<TextureKey> {
        self.textures.get(name).copied()
    }

    pub fn remove_texture(&mut self, name: &str) -> Option<TextureKey> {
        self.textures.remove(name)
    }

    pub fn pipeline_count(&self) -> usize {
        self.pipelines.len()
    }

    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    pub fn clear(&mut self) {
        self.pipelines.clear();
        self.textures.clear();
    }
}

impl Default for ResourceManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "resource_manager_tests.rs"]
mod tests;
