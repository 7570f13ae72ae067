/// Frame-scoped pool of temporary textures and buffers.
///
/// Features borrow render targets and scratch buffers for the duration of a
/// frame. A request reuses a free entry whose key matches exactly
/// (`width, height, format, usage` for textures, `size, usage` for buffers)
/// and allocates a new one otherwise. Nothing is ever handed out twice:
/// an entry is either free or owned by exactly one caller until released.
///
/// Entries still owned when the frame ends are leaks. They are reported by
/// `end_frame` and reclaimed by the next `begin_frame`, so a leaking feature
/// makes the pool grow instead of corrupting another feature's target. Pool
/// growth past `warn_threshold` is logged once until `trim` brings it back.

use rustc_hash::FxHashMap;
use slotmap::{new_key_type, SlotMap};
use crate::error::{Error, Result};
use crate::graphics_device::{
    BufferDesc, BufferKey, BufferUsage, GraphicsDevice, TextureDesc, TextureFormat,
    TextureKey, TextureUsage, TextureViewDesc, TextureViewKey,
};
use crate::{engine_debug, engine_trace, engine_warn};

const SOURCE: &str = "prisma::TemporaryPool";

new_key_type! {
    struct TextureEntryKey;
    struct BufferEntryKey;
}

/// A pooled texture with a whole-image view
#[derive(Debug, Clone, PartialEq)]
pub struct TemporaryTexture {
    pub texture: TextureKey,
    pub view: TextureViewKey,
    pub desc: TextureDesc,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TemporaryBuffer {
    pub buffer: BufferKey,
    pub desc: BufferDesc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct TextureSlot {
    width: u32,
    height: u32,
    format: TextureFormat,
    usage: TextureUsage,
}

impl TextureSlot {
    fn of(desc: &TextureDesc) -> Self {
        Self { width: desc.width, height: desc.height, format: desc.format, usage: desc.usage }
    }
}

type BufferSlot = (u64, BufferUsage);

#[derive(Debug)]
struct PoolEntry<T> {
    resource: T,
    in_use: bool,
    owner: String,
    last_used_frame: u64,
}

impl<T> PoolEntry<T> {
    fn new(resource: T, owner: &str, frame: u64) -> Self {
        Self { resource, in_use: true, owner: owner.to_string(), last_used_frame: frame }
    }

    fn claim(&mut self, owner: &str, frame: u64) {
        self.in_use = true;
        self.owner.clear();
        self.owner.push_str(owner);
        self.last_used_frame = frame;
    }
}

/// Pool counters for diagnostics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    pub allocated_textures: usize,
    pub allocated_buffers: usize,
    /// Entries currently owned by a caller
    pub in_use: usize,
    /// Highest `in_use` seen since creation
    pub peak_in_use: usize,
    /// Entries still owned at the last `end_frame`
    pub leaked_last_frame: usize,
    pub total_leaks: u64,
}

pub struct TemporaryResourcePool {
    textures: SlotMap<TextureEntryKey, PoolEntry<TemporaryTexture>>,
    free_textures: FxHashMap<TextureSlot, Vec<TextureEntryKey>>,
    texture_lookup: FxHashMap<TextureKey, TextureEntryKey>,

    buffers: SlotMap<BufferEntryKey, PoolEntry<TemporaryBuffer>>,
    free_buffers: FxHashMap<BufferSlot, Vec<BufferEntryKey>>,
    buffer_lookup: FxHashMap<BufferKey, BufferEntryKey>,

    frame_index: u64,
    warn_threshold: usize,
    growth_reported: bool,
    peak_in_use: usize,
    leaked_last_frame: usize,
    total_leaks: u64,
}

impl TemporaryResourcePool {
    pub fn new(warn_threshold: usize) -> Self {
        Self {
            textures: SlotMap::with_key(),
            free_textures: FxHashMap::default(),
            texture_lookup: FxHashMap::default(),
            buffers: SlotMap::with_key(),
            free_buffers: FxHashMap::default(),
            buffer_lookup: FxHashMap::default(),
            frame_index: 0,
            warn_threshold,
            growth_reported: false,
            peak_in_use: 0,
            leaked_last_frame: 0,
            total_leaks: 0,
        }
    }

    // ===== TEXTURES =====

    /// Borrow a texture matching `desc` exactly
    ///
    /// Only single-layer, single-mip textures are pooled.
    pub fn acquire_texture(
        &mut self,
        device: &mut dyn GraphicsDevice,
        desc: &TextureDesc,
        owner: &str,
    ) -> Result<TemporaryTexture> {
        if desc.array_layers != 1 || desc.mip_levels != 1 {
            return Err(Error::InvalidResource(format!(
                "temporary textures must have one layer and one mip (got {} layers, {} mips)",
                desc.array_layers, desc.mip_levels
            )));
        }

        let slot = TextureSlot::of(desc);
        if let Some(key) = self.free_textures.get_mut(&slot).and_then(|free| free.pop()) {
            if let Some(entry) = self.textures.get_mut(key) {
                entry.claim(owner, self.frame_index);
                engine_trace!(SOURCE, "Reused {}x{} {:?} for '{}'", desc.width, desc.height, desc.format, owner);
                let resource = entry.resource.clone();
                self.note_in_use();
                return Ok(resource);
            }
        }

        let texture = device.create_texture(desc)?;
        let view = match device.create_texture_view(texture, &TextureViewDesc::whole()) {
            Ok(view) => view,
            Err(e) => {
                device.destroy_texture(texture);
                return Err(e);
            }
        };
        let resource = TemporaryTexture { texture, view, desc: desc.clone() };
        let key = self.textures.insert(PoolEntry::new(resource.clone(), owner, self.frame_index));
        self.texture_lookup.insert(texture, key);
        engine_debug!(
            SOURCE,
            "Allocated temporary texture {}x{} {:?} for '{}' (pool: {})",
            desc.width, desc.height, desc.format, owner, self.allocated()
        );
        self.note_in_use();
        self.check_growth();
        Ok(resource)
    }

    /// Return a texture to the pool
    ///
    /// # Errors
    ///
    /// `InvalidResource` if the texture does not come from this pool,
    /// `InvalidState` if it was already released.
    pub fn release_texture(&mut self, texture: TextureKey) -> Result<()> {
        let key = self.texture_lookup.get(&texture).copied()
            .ok_or_else(|| Error::InvalidResource("texture is not a pooled temporary".to_string()))?;
        let entry = self.textures.get_mut(key)
            .ok_or_else(|| Error::InvalidResource("stale temporary texture".to_string()))?;
        if !entry.in_use {
            return Err(Error::InvalidState("temporary texture released twice".to_string()));
        }
        entry.in_use = false;
        let slot = TextureSlot::of(&entry.resource.desc);
        self.free_textures.entry(slot).or_default().push(key);
        Ok(())
    }

    // ===== BUFFERS =====

    /// Borrow a buffer of exactly `desc.size` bytes and `desc.usage`
    pub fn acquire_buffer(
        &mut self,
        device: &mut dyn GraphicsDevice,
        desc: &BufferDesc,
        owner: &str,
    ) -> Result<TemporaryBuffer> {
        let slot = (desc.size, desc.usage);
        if let Some(key) = self.free_buffers.get_mut(&slot).and_then(|free| free.pop()) {
            if let Some(entry) = self.buffers.get_mut(key) {
                entry.claim(owner, self.frame_index);
                let resource = entry.resource.clone();
                self.note_in_use();
                return Ok(resource);
            }
        }

        let buffer = device.create_buffer(desc)?;
        let resource = TemporaryBuffer { buffer, desc: desc.clone() };
        let key = self.buffers.insert(PoolEntry::new(resource.clone(), owner, self.frame_index));
        self.buffer_lookup.insert(buffer, key);
        engine_debug!(
            SOURCE,
            "Allocated temporary buffer of {} bytes ({:?}) for '{}'",
            desc.size, desc.usage, owner
        );
        self.note_in_use();
        self.check_growth();
        Ok(resource)
    }

    pub fn release_buffer(&mut self, buffer: BufferKey) -> Result<()> {
        let key = self.buffer_lookup.get(&buffer).copied()
            .ok_or_else(|| Error::InvalidResource("buffer is not a pooled temporary".to_string()))?;
        let entry = self.buffers.get_mut(key)
            .ok_or_else(|| Error::InvalidResource("stale temporary buffer".to_string()))?;
        if !entry.in_use {
            return Err(Error::InvalidState("temporary buffer released twice".to_string()));
        }
        entry.in_use = false;
        self.free_buffers.entry((entry.resource.desc.size, entry.resource.desc.usage))
            .or_default()
            .push(key);
        Ok(())
    }

    // ===== FRAME BOUNDARIES =====

    /// Start a frame: entries leaked by earlier frames become free again
    pub fn begin_frame(&mut self, frame_index: u64) {
        self.frame_index = frame_index;

        let mut reclaimed = 0;
        for (key, entry) in self.textures.iter_mut().filter(|(_, e)| e.in_use) {
            entry.in_use = false;
            self.free_textures.entry(TextureSlot::of(&entry.resource.desc)).or_default().push(key);
            reclaimed += 1;
        }
        for (key, entry) in self.buffers.iter_mut().filter(|(_, e)| e.in_use) {
            entry.in_use = false;
            self.free_buffers.entry((entry.resource.desc.size, entry.resource.desc.usage))
                .or_default()
                .push(key);
            reclaimed += 1;
        }
        if reclaimed > 0 {
            engine_debug!(SOURCE, "Reclaimed {} leaked temporaries at frame {}", reclaimed, frame_index);
        }
    }

    /// End a frame: report every entry still owned
    ///
    /// Returns the number of leaked entries.
    pub fn end_frame(&mut self) -> usize {
        let leaked_textures = self.textures.values().filter(|e| e.in_use);
        let leaked_buffers = self.buffers.values().filter(|e| e.in_use);

        let mut owners: Vec<&str> = leaked_textures.map(|e| e.owner.as_str())
            .chain(leaked_buffers.map(|e| e.owner.as_str()))
            .collect();
        let leaked = owners.len();
        if leaked > 0 {
            owners.sort_unstable();
            owners.dedup();
            engine_warn!(
                SOURCE,
                "{} temporary resource(s) not released by frame {} end (owners: {})",
                leaked, self.frame_index, owners.join(", ")
            );
        }

        self.leaked_last_frame = leaked;
        self.total_leaks += leaked as u64;
        leaked
    }

    /// Destroy free entries not used during the last `max_idle_frames` frames
    ///
    /// Returns the number of entries destroyed.
    pub fn trim(&mut self, device: &mut dyn GraphicsDevice, max_idle_frames: u64) -> usize {
        let now = self.frame_index;
        let idle = |in_use: bool, last: u64| !in_use && now.saturating_sub(last) > max_idle_frames;

        let stale_textures: Vec<TextureEntryKey> = self.textures.iter()
            .filter(|(_, e)| idle(e.in_use, e.last_used_frame))
            .map(|(k, _)| k)
            .collect();
        let stale_buffers: Vec<BufferEntryKey> = self.buffers.iter()
            .filter(|(_, e)| idle(e.in_use, e.last_used_frame))
            .map(|(k, _)| k)
            .collect();

        for key in &stale_textures {
            if let Some(entry) = self.textures.remove(*key) {
                self.texture_lookup.remove(&entry.resource.texture);
                device.destroy_texture_view(entry.resource.view);
                device.destroy_texture(entry.resource.texture);
            }
        }
        for key in &stale_buffers {
            if let Some(entry) = self.buffers.remove(*key) {
                self.buffer_lookup.remove(&entry.resource.buffer);
                device.destroy_buffer(entry.resource.buffer);
            }
        }
        for free in self.free_textures.values_mut() {
            free.retain(|k| !stale_textures.contains(k));
        }
        for free in self.free_buffers.values_mut() {
            free.retain(|k| !stale_buffers.contains(k));
        }

        let destroyed = stale_textures.len() + stale_buffers.len();
        if destroyed > 0 {
            engine_debug!(SOURCE, "Trimmed {} idle temporaries (pool: {})", destroyed, self.allocated());
        }
        if self.allocated() <= self.warn_threshold {
            self.growth_reported = false;
        }
        destroyed
    }

    /// Destroy every entry, owned or not
    pub fn destroy_all(&mut self, device: &mut dyn GraphicsDevice) {
        for (_, entry) in self.textures.drain() {
            device.destroy_texture_view(entry.resource.view);
            device.destroy_texture(entry.resource.texture);
        }
        for (_, entry) in self.buffers.drain() {
            device.destroy_buffer(entry.resource.buffer);
        }
        self.free_textures.clear();
        self.texture_lookup.clear();
        self.free_buffers.clear();
        self.buffer_lookup.clear();
        self.growth_reported = false;
    }

    // ===== DIAGNOSTICS =====

    /// Entries owned by a caller right now
    pub fn in_use(&self) -> usize {
        self.textures.values().filter(|e| e.in_use).count()
            + self.buffers.values().filter(|e| e.in_use).count()
    }

    /// Entries allocated, free or not
    pub fn allocated(&self) -> usize {
        self.textures.len() + self.buffers.len()
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            allocated_textures: self.textures.len(),
            allocated_buffers: self.buffers.len(),
            in_use: self.in_use(),
            peak_in_use: self.peak_in_use,
            leaked_last_frame: self.leaked_last_frame,
            total_leaks: self.total_leaks,
        }
    }

    fn note_in_use(&mut self) {
        self.peak_in_use = self.peak_in_use.max(self.in_use());
    }

    fn check_growth(&mut self) {
        let allocated = self.allocated();
        if allocated > self.warn_threshold && !self.growth_reported {
            self.growth_reported = true;
            engine_warn!(
                SOURCE,
                "Temporary pool grew to {} entries (threshold {}), check for unreleased temporaries",
                allocated, self.warn_threshold
            );
        }
    }
}

#[cfg(test)]
#[path = "temporary_pool_tests.rs"]
mod tests;
