/// RenderFeatureManager - owns features and runs them at their events
///
/// Features run in `(order, registration index)` order within an event. A
/// feature whose `initialize` returned false stays disabled until it is
/// removed; a feature whose `execute` fails is logged and the frame continues.

use std::any::Any;
use crate::error::Result;
use crate::frame::FrameContext;
use crate::graphics_device::GraphicsDevice;
use crate::renderer::{RenderContext, SetupContext};
use crate::rendering::RenderingData;
use super::render_feature::{RenderFeature, RenderPassEvent};
use crate::{engine_bail, engine_debug, engine_info, engine_warn};

const SOURCE: &str = "prisma::RenderFeatureManager";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureState {
    /// Not initialized yet (or cleaned up)
    Pending,
    Ready,
    /// `initialize` failed; skipped for the session
    Disabled,
}

/// Outcome of one `execute_event` call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventStats {
    pub executed: u32,
    /// Inactive, not ready or toggled off for the frame
    pub skipped: u32,
    /// Names of the features whose `execute` returned an error
    pub failed: Vec<String>,
}

impl EventStats {
    pub fn merge(&mut self, other: EventStats) {
        self.executed += other.executed;
        self.skipped += other.skipped;
        self.failed.extend(other.failed);
    }
}

struct FeatureEntry {
    feature: Box<dyn RenderFeature>,
    pass_event: RenderPassEvent,
    order: i32,
    active: bool,
    state: FeatureState,
}

#[derive(Default)]
pub struct RenderFeatureManager {
    entries: Vec<FeatureEntry>,
}

impl RenderFeatureManager {
    pub fn new() -> Self {
        Self::default()
    }

    // ===== REGISTRATION =====

    /// Take ownership of `feature`; names must be unique
    pub fn add_feature(&mut self, feature: Box<dyn RenderFeature>) -> Result<()> {
        if self.index_of(feature.name()).is_some() {
            engine_bail!(SOURCE, "Feature '{}' already registered", feature.name());
        }
        engine_debug!(
            SOURCE,
            "Feature '{}' added at {:?} (order {})",
            feature.name(), feature.pass_event(), feature.order()
        );
        self.entries.push(FeatureEntry {
            pass_event: feature.pass_event(),
            order: feature.order(),
            feature,
            active: true,
            state: FeatureState::Pending,
        });
        Ok(())
    }

    /// Add every feature of a set, skipping names already present
    pub fn add_features(&mut self, features: Vec<Box<dyn RenderFeature>>) -> usize {
        let mut added = 0;
        for feature in features {
            if self.add_feature(feature).is_ok() {
                added += 1;
            }
        }
        added
    }

    /// Remove a feature, cleaning it up first if it was initialized
    pub fn remove_feature(&mut self, name: &str, device: &mut dyn GraphicsDevice) -> Option<Box<dyn RenderFeature>> {
        let index = self.index_of(name)?;
        let mut entry = self.entries.remove(index);
        if entry.state == FeatureState::Ready {
            entry.feature.cleanup(device);
        }
        Some(entry.feature)
    }

    pub fn feature(&self, name: &str) -> Option<&dyn RenderFeature> {
        self.index_of(name).map(|i| self.entries[i].feature.as_ref())
    }

    pub fn feature_mut(&mut self, name: &str) -> Option<&mut dyn RenderFeature> {
        let index = self.index_of(name)?;
        Some(self.entries[index].feature.as_mut())
    }

    /// Concrete access for configuration, e.g. `feature_as::<BloomFeature>("Bloom")`
    pub fn feature_as<T: Any>(&mut self, name: &str) -> Option<&mut T> {
        self.feature_mut(name)?.as_any_mut().downcast_mut::<T>()
    }

    // ===== CONFIGURATION =====

    /// Returns false for an unknown name
    pub fn set_active(&mut self, name: &str, active: bool) -> bool {
        match self.index_of(name) {
            Some(i) => {
                self.entries[i].active = active;
                true
            }
            None => false,
        }
    }

    pub fn is_active(&self, name: &str) -> bool {
        self.index_of(name).map(|i| self.entries[i].active).unwrap_or(false)
    }

    pub fn state(&self, name: &str) -> Option<FeatureState> {
        self.index_of(name).map(|i| self.entries[i].state)
    }

    pub fn set_pass_event(&mut self, name: &str, event: RenderPassEvent) -> bool {
        match self.index_of(name) {
            Some(i) => {
                self.entries[i].pass_event = event;
                true
            }
            None => false,
        }
    }

    pub fn set_order(&mut self, name: &str, order: i32) -> bool {
        match self.index_of(name) {
            Some(i) => {
                self.entries[i].order = order;
                true
            }
            None => false,
        }
    }

    // ===== LIFECYCLE =====

    /// Initialize every pending feature; returns how many are ready afterwards
    pub fn initialize_all(&mut self, setup: &mut SetupContext) -> usize {
        for entry in self.entries.iter_mut().filter(|e| e.state == FeatureState::Pending) {
            if entry.feature.initialize(setup) {
                entry.state = FeatureState::Ready;
            } else {
                entry.state = FeatureState::Disabled;
                engine_warn!(SOURCE, "Feature '{}' failed to initialize, disabled", entry.feature.name());
            }
        }
        let ready = self.entries.iter().filter(|e| e.state == FeatureState::Ready).count();
        engine_info!(SOURCE, "{}/{} render feature(s) ready", ready, self.entries.len());
        ready
    }

    /// Clean up initialized features and return them to pending.
    /// Disabled features stay disabled.
    pub fn cleanup_all(&mut self, device: &mut dyn GraphicsDevice) {
        for entry in self.entries.iter_mut().filter(|e| e.state == FeatureState::Ready) {
            entry.feature.cleanup(device);
            entry.state = FeatureState::Pending;
        }
    }

    pub fn begin_frame(&mut self, frame: &FrameContext) {
        for entry in self.entries.iter_mut().filter(|e| e.active && e.state == FeatureState::Ready) {
            entry.feature.on_frame_begin(frame);
        }
    }

    pub fn end_frame(&mut self) {
        for entry in self.entries.iter_mut().filter(|e| e.active && e.state == FeatureState::Ready) {
            entry.feature.on_frame_end();
        }
    }

    // ===== EXECUTION =====

    fn ordered_indices(&self, event: RenderPassEvent) -> Vec<usize> {
        let mut indices: Vec<usize> = (0..self.entries.len())
            .filter(|&i| self.entries[i].pass_event == event)
            .collect();
        // Stable: equal orders keep registration order
        indices.sort_by_key(|&i| self.entries[i].order);
        indices
    }

    /// Names of the features registered at `event`, in execution order
    pub fn execution_order(&self, event: RenderPassEvent) -> Vec<&str> {
        self.ordered_indices(event)
            .into_iter()
            .map(|i| self.entries[i].feature.name())
            .collect()
    }

    /// Run the features of `event`, each inside a scope named after it
    pub fn execute_event(
        &mut self,
        event: RenderPassEvent,
        ctx: &mut dyn RenderContext,
        data: &RenderingData,
    ) -> EventStats {
        let toggles = *data.toggles();
        let mut stats = EventStats::default();

        for index in self.ordered_indices(event) {
            let entry = &mut self.entries[index];
            let toggled_off = (entry.feature.is_post_processing() && !toggles.enable_post_processing)
                || (entry.feature.is_debug() && !toggles.debug_view);
            if !entry.active || entry.state != FeatureState::Ready || toggled_off {
                stats.skipped += 1;
                continue;
            }

            let name = entry.feature.name().to_string();
            if let Err(e) = ctx.push_scope(&name) {
                engine_warn!(SOURCE, "Feature '{}' skipped: {}", name, e);
                stats.failed.push(name);
                continue;
            }
            let result = entry.feature.execute(ctx, data);
            let popped = ctx.pop_scope();
            match result.and(popped) {
                Ok(()) => stats.executed += 1,
                Err(e) => {
                    engine_warn!(SOURCE, "Feature '{}' failed at {:?}: {}", name, event, e);
                    stats.failed.push(name);
                }
            }
        }
        stats
    }

    // ===== QUERIES =====

    pub fn count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Names in registration order
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.feature.name()).collect()
    }

    fn index_of(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.feature.name() == name)
    }
}

#[cfg(test)]
#[path = "render_feature_manager_tests.rs"]
mod tests;
