/// RenderQueue - a named, id-tagged list of render objects with a sort mode.
///
/// Objects are appended during queue building, sorted once, then submitted.
/// Sorting uses a radix sort over composite keys that carry each object's
/// insertion sequence in the low bits, which makes the order total: ties are
/// deterministic and a second `sort()` reproduces the first bit for bit.

use glam::Mat4;
use rdst::{RadixKey, RadixSort};
use crate::error::{Error, Result};
use crate::graphics_device::{CommandList, DepthState, PipelineKey, StencilState, BufferKey};
use super::render_object::{calculate_sort_key, RenderObject};

// ===== QUEUE IDS =====

/// Predefined queue ids; each opens a band that runs up to the next one
pub struct RenderQueueId;

impl RenderQueueId {
    pub const BACKGROUND: u32 = 1000;
    pub const OPAQUE: u32 = 2000;
    pub const ALPHA_TEST: u32 = 2450;
    pub const TRANSPARENT: u32 = 3000;
    pub const OVERLAY: u32 = 4000;
}

/// The five classification bands, in render order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum QueueBand {
    Background,
    Opaque,
    AlphaTest,
    Transparent,
    Overlay,
}

impl QueueBand {
    pub const ALL: [QueueBand; 5] = [
        QueueBand::Background,
        QueueBand::Opaque,
        QueueBand::AlphaTest,
        QueueBand::Transparent,
        QueueBand::Overlay,
    ];

    /// Band of an arbitrary queue id
    pub fn classify(queue_id: u32) -> QueueBand {
        if queue_id < RenderQueueId::OPAQUE {
            QueueBand::Background
        } else if queue_id < RenderQueueId::ALPHA_TEST {
            QueueBand::Opaque
        } else if queue_id < RenderQueueId::TRANSPARENT {
            QueueBand::AlphaTest
        } else if queue_id < RenderQueueId::OVERLAY {
            QueueBand::Transparent
        } else {
            QueueBand::Overlay
        }
    }

    /// Id of the predefined queue of this band
    pub fn queue_id(&self) -> u32 {
        match self {
            QueueBand::Background => RenderQueueId::BACKGROUND,
            QueueBand::Opaque => RenderQueueId::OPAQUE,
            QueueBand::AlphaTest => RenderQueueId::ALPHA_TEST,
            QueueBand::Transparent => RenderQueueId::TRANSPARENT,
            QueueBand::Overlay => RenderQueueId::OVERLAY,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            QueueBand::Background => "Background",
            QueueBand::Opaque => "Opaque",
            QueueBand::AlphaTest => "AlphaTest",
            QueueBand::Transparent => "Transparent",
            QueueBand::Overlay => "Overlay",
        }
    }

    /// Default ordering policy of the band
    pub fn default_sort_mode(&self) -> SortMode {
        match self {
            QueueBand::Background | QueueBand::Overlay => SortMode::None,
            QueueBand::Opaque | QueueBand::AlphaTest => SortMode::FrontToBack,
            QueueBand::Transparent => SortMode::BackToFront,
        }
    }
}

// ===== SORTING =====

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortMode {
    /// Insertion order (author-controlled layers)
    None,
    /// Ascending camera distance (early depth rejection)
    FrontToBack,
    /// Descending camera distance (alpha blending)
    BackToFront,
    /// Grouped by material id (fewer state changes)
    ByMaterial,
    /// Material id first, distance second
    MaterialThenDistance,
}

/// Composite radix key: 64-bit sort key above a 32-bit tie breaker
#[derive(Debug, Clone, Copy)]
struct SortEntry {
    key: u64,
    tie: u32,
    position: u32,
}

impl RadixKey for SortEntry {
    const LEVELS: usize = 12;

    #[inline]
    fn get_level(&self, level: usize) -> u8 {
        if level < 4 {
            (self.tie >> (level * 8)) as u8
        } else {
            (self.key >> ((level - 4) * 8)) as u8
        }
    }
}

// ===== SUBMISSION =====

/// Per-submission camera data
#[derive(Debug, Clone, Copy)]
pub struct DrawParams {
    pub view_projection: Mat4,
    /// Emit depth/stencil state changes (backend supports dynamic depth state)
    pub dynamic_depth_state: bool,
    /// Replace every object's pipeline (e.g. shadow depth rendering)
    pub pipeline_override: Option<PipelineKey>,
    /// Skip objects with `cast_shadows == false`
    pub shadow_casters_only: bool,
}

impl DrawParams {
    pub fn new(view_projection: Mat4) -> Self {
        Self {
            view_projection,
            dynamic_depth_state: true,
            pipeline_override: None,
            shadow_casters_only: false,
        }
    }
}

/// What a submission emitted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SubmitStats {
    pub draw_calls: u32,
    pub pipeline_binds: u32,
    pub depth_state_changes: u32,
}

impl std::ops::AddAssign for SubmitStats {
    fn add_assign(&mut self, other: Self) {
        self.draw_calls += other.draw_calls;
        self.pipeline_binds += other.pipeline_binds;
        self.depth_state_changes += other.depth_state_changes;
    }
}

/// State last bound on the command list, shared across queue submissions
#[derive(Debug, Clone, Copy, Default)]
pub struct BoundState {
    pipeline: Option<PipelineKey>,
    depth: Option<(DepthState, StencilState)>,
    vertex_buffer: Option<BufferKey>,
    index_buffer: Option<BufferKey>,
}

impl BoundState {
    /// Forget everything (new render pass)
    pub fn invalidate(&mut self) {
        *self = Self::default();
    }
}

// ===== QUEUE =====

#[derive(Debug, Clone)]
pub struct RenderQueue {
    id: u32,
    name: String,
    sort_mode: SortMode,
    objects: Vec<RenderObject>,
    sequence: Vec<u32>,
    next_sequence: u32,
    sorted: bool,
}

impl RenderQueue {
    pub fn new(id: u32, name: &str, sort_mode: SortMode) -> Self {
        Self {
            id,
            name: name.to_string(),
            sort_mode,
            objects: Vec::new(),
            sequence: Vec::new(),
            next_sequence: 0,
            sorted: true,
        }
    }

    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sort_mode(&self) -> SortMode {
        self.sort_mode
    }

    /// Changing the mode invalidates the current order
    pub fn set_sort_mode(&mut self, mode: SortMode) {
        if mode != self.sort_mode {
            self.sort_mode = mode;
            self.sorted = self.objects.is_empty();
        }
    }

    pub fn objects(&self) -> &[RenderObject] {
        &self.objects
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn is_sorted(&self) -> bool {
        self.sorted || self.sort_mode == SortMode::None
    }

    pub fn add_object(&mut self, object: RenderObject) {
        self.objects.push(object);
        self.sequence.push(self.next_sequence);
        self.next_sequence = self.next_sequence.wrapping_add(1);
        self.sorted = false;
    }

    pub fn add_objects<I: IntoIterator<Item = RenderObject>>(&mut self, objects: I) {
        for object in objects {
            self.add_object(object);
        }
    }

    pub fn clear(&mut self) {
        self.objects.clear();
        self.sequence.clear();
        self.next_sequence = 0;
        self.sorted = true;
    }

    /// Order objects per the sort mode
    ///
    /// Ties keep insertion order, except under `BackToFront` where the whole
    /// order (ties included) is the exact reverse of `FrontToBack`.
    pub fn sort(&mut self) {
        if self.sort_mode == SortMode::None || self.objects.len() < 2 {
            self.sorted = true;
            return;
        }

        let reverse_ties = self.sort_mode == SortMode::BackToFront;
        let mut entries: Vec<SortEntry> = self
            .objects
            .iter()
            .zip(&self.sequence)
            .enumerate()
            .map(|(position, (object, &seq))| SortEntry {
                key: calculate_sort_key(object, self.sort_mode),
                tie: if reverse_ties { !seq } else { seq },
                position: position as u32,
            })
            .collect();
        entries.radix_sort_unstable();

        let mut objects = Vec::with_capacity(self.objects.len());
        let mut sequence = Vec::with_capacity(self.sequence.len());
        for entry in &entries {
            objects.push(self.objects[entry.position as usize].clone());
            sequence.push(self.sequence[entry.position as usize]);
        }
        self.objects = objects;
        self.sequence = sequence;
        self.sorted = true;
    }

    /// Record draws for every object, in queue order
    ///
    /// Pipelines, depth state and buffers are only rebound when they change
    /// from what `bound` says is current.
    ///
    /// # Errors
    ///
    /// `InvalidState` if the queue has a sort mode and was not sorted since
    /// its last modification; command-list errors are propagated.
    pub fn submit(
        &self,
        cmd: &mut dyn CommandList,
        params: &DrawParams,
        bound: &mut BoundState,
    ) -> Result<SubmitStats> {
        if !self.is_sorted() {
            return Err(Error::InvalidState(format!(
                "render queue '{}' submitted before sort()",
                self.name
            )));
        }

        let mut stats = SubmitStats::default();
        for object in &self.objects {
            if params.shadow_casters_only && !object.cast_shadows {
                continue;
            }
            let pipeline = params.pipeline_override.unwrap_or(object.material.pipeline);
            if bound.pipeline != Some(pipeline) {
                cmd.bind_pipeline(pipeline)?;
                bound.pipeline = Some(pipeline);
                stats.pipeline_binds += 1;
            }

            if params.dynamic_depth_state {
                let depth = (object.depth_state, object.stencil_state);
                if bound.depth != Some(depth) {
                    cmd.set_depth_state(depth.0, depth.1)?;
                    bound.depth = Some(depth);
                    stats.depth_state_changes += 1;
                }
            }

            let mvp = params.view_projection * object.world_matrix;
            cmd.push_constants(0, bytemuck::bytes_of(&mvp))?;
            cmd.push_constants(64, bytemuck::bytes_of(&object.world_matrix))?;

            let geometry = &object.geometry;
            if bound.vertex_buffer != Some(geometry.vertex_buffer) {
                cmd.bind_vertex_buffer(geometry.vertex_buffer, 0)?;
                bound.vertex_buffer = Some(geometry.vertex_buffer);
            }
            match geometry.index_buffer {
                Some((buffer, index_type)) => {
                    if bound.index_buffer != Some(buffer) {
                        cmd.bind_index_buffer(buffer, 0, index_type)?;
                        bound.index_buffer = Some(buffer);
                    }
                    cmd.draw_indexed(geometry.element_count, geometry.first_element, geometry.vertex_offset)?;
                }
                None => cmd.draw(geometry.element_count, geometry.first_element)?,
            }
            stats.draw_calls += 1;
        }

        Ok(stats)
    }
}

#[cfg(test)]
#[path = "render_queue_tests.rs"]
mod tests;
