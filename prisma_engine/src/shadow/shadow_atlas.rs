/// ShadowAtlas - shelf allocator packing per-light shadow maps into one texture

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtlasRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, Copy)]
struct Shelf {
    y: u32,
    height: u32,
    cursor_x: u32,
}

#[derive(Debug, Clone)]
pub struct ShadowAtlas {
    width: u32,
    height: u32,
    shelves: Vec<Shelf>,
    allocated: Vec<AtlasRect>,
}

impl ShadowAtlas {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height, shelves: Vec::new(), allocated: Vec::new() }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Reserve a `width` x `height` region, or None when the atlas is full
    ///
    /// Uses the first shelf tall enough with room left, else opens a new
    /// shelf below the last one.
    pub fn allocate(&mut self, width: u32, height: u32) -> Option<AtlasRect> {
        if width == 0 || height == 0 || width > self.width || height > self.height {
            return None;
        }

        let atlas_width = self.width;
        let rect = match self
            .shelves
            .iter_mut()
            .find(|s| s.height >= height && atlas_width - s.cursor_x >= width)
        {
            Some(shelf) => {
                let rect = AtlasRect { x: shelf.cursor_x, y: shelf.y, width, height };
                shelf.cursor_x += width;
                rect
            }
            None => {
                let y = self.shelves.last().map_or(0, |s| s.y + s.height);
                if self.height - y < height {
                    return None;
                }
                self.shelves.push(Shelf { y, height, cursor_x: width });
                AtlasRect { x: 0, y, width, height }
            }
        };

        self.allocated.push(rect);
        Some(rect)
    }

    /// Release everything (start of a frame)
    pub fn reset(&mut self) {
        self.shelves.clear();
        self.allocated.clear();
    }

    pub fn allocated(&self) -> &[AtlasRect] {
        &self.allocated
    }

    /// Fraction of the atlas area in use
    pub fn occupancy(&self) -> f32 {
        let used: u64 = self.allocated.iter().map(|r| r.width as u64 * r.height as u64).sum();
        used as f32 / (self.width as u64 * self.height as u64).max(1) as f32
    }
}

impl Default for ShadowAtlas {
    fn default() -> Self {
        Self::new(2048, 2048)
    }
}

#[cfg(test)]
#[path = "shadow_atlas_tests.rs"]
mod tests;
