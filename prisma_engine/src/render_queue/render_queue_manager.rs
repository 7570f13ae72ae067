/// RenderQueueManager - owns the five band queues plus any custom queues
///
/// Objects are routed by queue id: an exact custom-queue id wins, otherwise
/// the id is classified into its band. Dispatch order is fixed: the five
/// bands in ascending order, then custom queues by ascending id.

use std::collections::BTreeMap;
use crate::error::{Error, Result};
use crate::graphics_device::CommandList;
use crate::engine_debug;
use super::render_object::RenderObject;
use super::render_queue::{BoundState, DrawParams, QueueBand, RenderQueue, RenderQueueId, SubmitStats};

const SOURCE: &str = "prisma::RenderQueueManager";

/// Inclusive range of queue ids, as consumed by one pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueRange {
    pub first: u32,
    pub last: u32,
}

impl QueueRange {
    /// Background, opaque and alpha-tested geometry
    pub const OPAQUES: Self = Self { first: 0, last: RenderQueueId::TRANSPARENT - 1 };
    pub const TRANSPARENTS: Self = Self { first: RenderQueueId::TRANSPARENT, last: RenderQueueId::OVERLAY - 1 };
    pub const OVERLAYS: Self = Self { first: RenderQueueId::OVERLAY, last: u32::MAX };
    pub const ALL: Self = Self { first: 0, last: u32::MAX };

    /// `[start, end)`; an empty range when `end <= start`
    pub fn half_open(start: u32, end: u32) -> Self {
        if end <= start {
            return Self { first: 1, last: 0 };
        }
        Self { first: start, last: end - 1 }
    }

    pub fn contains(&self, id: u32) -> bool {
        id >= self.first && id <= self.last
    }
}

/// Objects routed since the last `reset_stats`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueStats {
    pub total: u32,
    pub background: u32,
    pub opaque: u32,
    pub alpha_test: u32,
    pub transparent: u32,
    pub overlay: u32,
    pub custom: u32,
}

pub struct RenderQueueManager {
    bands: [RenderQueue; 5],
    custom: BTreeMap<u32, RenderQueue>,
    stats: QueueStats,
}

impl RenderQueueManager {
    pub fn new() -> Self {
        let band = |b: QueueBand| RenderQueue::new(b.queue_id(), b.name(), b.default_sort_mode());
        Self {
            bands: QueueBand::ALL.map(band),
            custom: BTreeMap::new(),
            stats: QueueStats::default(),
        }
    }

    /// Route an object to its queue
    pub fn add_object(&mut self, object: RenderObject) {
        self.stats.total += 1;
        if let Some(queue) = self.custom.get_mut(&object.queue_id) {
            self.stats.custom += 1;
            queue.add_object(object);
            return;
        }

        let band = QueueBand::classify(object.queue_id);
        match band {
            QueueBand::Background => self.stats.background += 1,
            QueueBand::Opaque => self.stats.opaque += 1,
            QueueBand::AlphaTest => self.stats.alpha_test += 1,
            QueueBand::Transparent => self.stats.transparent += 1,
            QueueBand::Overlay => self.stats.overlay += 1,
        }
        self.bands[band as usize].add_object(object);
    }

    /// Create a custom queue
    ///
    /// The sort mode defaults to that of the band the id falls into.
    ///
    /// # Errors
    ///
    /// `InvalidResource` if `id` is a predefined band id or already taken.
    pub fn create_queue(&mut self, id: u32, name: &str) -> Result<&mut RenderQueue> {
        if QueueBand::ALL.iter().any(|b| b.queue_id() == id) || self.custom.contains_key(&id) {
            return Err(Error::InvalidResource(format!("render queue id {} already exists", id)));
        }
        let mode = QueueBand::classify(id).default_sort_mode();
        engine_debug!(SOURCE, "Created custom queue '{}' (id {}, {:?})", name, id, mode);
        Ok(self.custom.entry(id).or_insert_with(|| RenderQueue::new(id, name, mode)))
    }

    /// Queue with exactly this id (predefined or custom)
    pub fn queue(&self, id: u32) -> Option<&RenderQueue> {
        self.bands.iter().find(|q| q.id() == id).or_else(|| self.custom.get(&id))
    }

    pub fn queue_mut(&mut self, id: u32) -> Option<&mut RenderQueue> {
        if let Some(queue) = self.bands.iter_mut().find(|q| q.id() == id) {
            return Some(queue);
        }
        self.custom.get_mut(&id)
    }

    pub fn band(&self, band: QueueBand) -> &RenderQueue {
        &self.bands[band as usize]
    }

    pub fn band_mut(&mut self, band: QueueBand) -> &mut RenderQueue {
        &mut self.bands[band as usize]
    }

    /// Empty every queue; custom queues stay registered
    pub fn clear(&mut self) {
        for queue in self.bands.iter_mut().chain(self.custom.values_mut()) {
            queue.clear();
        }
    }

    pub fn sort_all(&mut self) {
        for queue in self.bands.iter_mut().chain(self.custom.values_mut()) {
            queue.sort();
        }
    }

    /// Every queue in dispatch order
    pub fn dispatch_order(&self) -> impl Iterator<Item = &RenderQueue> {
        self.bands.iter().chain(self.custom.values())
    }

    /// Submit every queue in dispatch order, empty ones included
    pub fn submit_all(
        &self,
        cmd: &mut dyn CommandList,
        params: &DrawParams,
        bound: &mut BoundState,
    ) -> Result<SubmitStats> {
        let mut stats = SubmitStats::default();
        for queue in self.dispatch_order() {
            stats += queue.submit(cmd, params, bound)?;
        }
        Ok(stats)
    }

    /// Submit the queues whose id lies in `range`
    ///
    /// Band queues come first in band order, then the custom queues of the
    /// range by id.
    pub fn submit_range(
        &self,
        range: QueueRange,
        cmd: &mut dyn CommandList,
        params: &DrawParams,
        bound: &mut BoundState,
    ) -> Result<SubmitStats> {
        let mut stats = SubmitStats::default();
        for queue in self.queues_in_range(range) {
            stats += queue.submit(cmd, params, bound)?;
        }
        Ok(stats)
    }

    /// Queues whose id lies in `range`, in dispatch order
    pub fn queues_in_range(&self, range: QueueRange) -> impl Iterator<Item = &RenderQueue> {
        self.dispatch_order().filter(move |q| range.contains(q.id()))
    }

    /// Number of queues, predefined included
    pub fn queue_count(&self) -> usize {
        self.bands.len() + self.custom.len()
    }

    /// Objects across all queues
    pub fn object_count(&self) -> usize {
        self.dispatch_order().map(|q| q.len()).sum()
    }

    pub fn stats(&self) -> &QueueStats {
        &self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = QueueStats::default();
    }
}

impl Default for RenderQueueManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "render_queue_manager_tests.rs"]
mod tests;
