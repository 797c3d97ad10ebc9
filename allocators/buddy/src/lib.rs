use tracing::debug;

/// Smallest block the allocator hands out; smaller requests are rounded up.
pub const MIN_BLOCK_BYTES: usize = 64;
/// Arena capacity used by [`BuddyAllocator::new`].
pub const DEFAULT_ARENA_BYTES: usize = 1 << 30;

/// Handle to a live block inside the arena.
///
/// Stays valid until the block is freed or moved by
/// [`BuddyAllocator::realloc`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Allocation {
    offset: usize,
    size: usize,
}

impl Allocation {
    /// Usable size of the block, which may exceed the requested size
    pub fn size(&self) -> usize {
        self.size
    }
}

#[derive(Debug, Clone, Copy)]
struct Block {
    offset: usize,
    size: usize,
    allocated: bool,
}

/// Buddy allocator over one contiguous arena.
///
/// Blocks split by halving until the next halving could no longer fit the
/// request, and freed blocks merge with free neighbours on both sides, so an
/// empty arena always collapses back to a single block.
pub struct BuddyAllocator {
    arena: Vec<u8>,
    // ordered by offset, covering the arena without gaps
    blocks: Vec<Block>,
    total_allocated: usize,
}

impl BuddyAllocator {
    /// Allocator over a [`DEFAULT_ARENA_BYTES`] arena.
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_ARENA_BYTES)
    }

    /// Allocator over an arena of at least `bytes`, rounded up to the next
    /// power of two and to [`MIN_BLOCK_BYTES`].
    pub fn with_capacity(bytes: usize) -> Self {
        let capacity = bytes.max(MIN_BLOCK_BYTES).next_power_of_two();
        debug!("buddy arena: {capacity} bytes");
        Self {
            arena: vec![0; capacity],
            blocks: vec![Block {
                offset: 0,
                size: capacity,
                allocated: false,
            }],
            total_allocated: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.arena.len()
    }

    /// Bytes currently handed out, counted in block sizes
    pub fn total_allocated(&self) -> usize {
        self.total_allocated
    }

    /// Claims a block of at least `bytes`, or `None` when no free block fits.
    pub fn alloc(&mut self, bytes: usize) -> Option<Allocation> {
        let wanted = bytes.max(MIN_BLOCK_BYTES);
        let idx = self
            .blocks
            .iter()
            .position(|block| !block.allocated && block.size >= wanted)?;
        // halve until the next split would be too small for the request
        while self.blocks[idx].size / 2 >= wanted {
            let half = self.blocks[idx].size / 2;
            self.blocks[idx].size = half;
            let offset = self.blocks[idx].offset + half;
            self.blocks.insert(
                idx + 1,
                Block {
                    offset,
                    size: half,
                    allocated: false,
                },
            );
        }
        let block = &mut self.blocks[idx];
        block.allocated = true;
        self.total_allocated += block.size;
        Some(Allocation {
            offset: block.offset,
            size: block.size,
        })
    }

    /// Releases a block and merges it with free neighbours.
    ///
    /// Handles that no longer refer to a live block are ignored.
    pub fn free(&mut self, alloc: Allocation) {
        let Some(mut idx) = self.live_index(alloc) else {
            return;
        };
        self.blocks[idx].allocated = false;
        self.total_allocated -= self.blocks[idx].size;
        // absorb free neighbours to the right
        while idx + 1 < self.blocks.len() && !self.blocks[idx + 1].allocated {
            let right = self.blocks.remove(idx + 1);
            self.blocks[idx].size += right.size;
        }
        // then fold into free neighbours on the left
        while idx > 0 && !self.blocks[idx - 1].allocated {
            let merged = self.blocks.remove(idx);
            self.blocks[idx - 1].size += merged.size;
            idx -= 1;
        }
    }

    /// Resizes a block, moving it when it has to grow.
    ///
    /// Shrinking keeps the existing block. Growing claims a new block, copies
    /// the old contents over and frees the old block; on exhaustion `None` is
    /// returned and the old block stays live. `bytes == 0` frees the block.
    pub fn realloc(&mut self, alloc: Allocation, bytes: usize) -> Option<Allocation> {
        if bytes == 0 {
            self.free(alloc);
            return None;
        }
        if alloc.size >= bytes {
            return Some(alloc);
        }
        let grown = self.alloc(bytes)?;
        self.arena
            .copy_within(alloc.offset..alloc.offset + alloc.size, grown.offset);
        self.free(alloc);
        Some(grown)
    }

    /// Block size behind a handle, or 0 when the handle is stale
    pub fn alloc_size(&self, alloc: Allocation) -> usize {
        self.live_index(alloc)
            .map(|idx| self.blocks[idx].size)
            .unwrap_or(0)
    }

    /// Whether the handle still refers to a live block
    pub fn is_allocated(&self, alloc: Allocation) -> bool {
        self.live_index(alloc).is_some()
    }

    /// Payload bytes of a live block.
    ///
    /// `alloc` must refer to a live block of this arena.
    pub fn bytes_mut(&mut self, alloc: Allocation) -> &mut [u8] {
        &mut self.arena[alloc.offset..alloc.offset + alloc.size]
    }

    fn live_index(&self, alloc: Allocation) -> Option<usize> {
        self.blocks
            .binary_search_by(|block| block.offset.cmp(&alloc.offset))
            .ok()
            .filter(|&idx| self.blocks[idx].allocated && self.blocks[idx].size == alloc.size)
    }
}

impl Default for BuddyAllocator {
    fn default() -> Self {
        Self::new()
    }
}
