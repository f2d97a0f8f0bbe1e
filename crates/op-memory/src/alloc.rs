//! User-partition block allocator
//!
//! First-fit allocator over the user memory partition. Blocks carry a
//! diagnostic tag so memory maps in logs can attribute every reservation
//! (e.g. `UtilityModule/302_av_atrac3plus`).

use crate::constants::{USER_MEM_ALIGN, USER_MEM_BASE, USER_MEM_SIZE};

/// One live reservation in the user partition
#[derive(Debug, Clone)]
pub struct AllocatedBlock {
    pub addr: u32,
    pub size: u32,
    pub tag: String,
}

/// First-fit allocator for the user partition
pub struct UserMemoryAllocator {
    base: u32,
    size: u32,
    blocks: Vec<AllocatedBlock>,
}

impl UserMemoryAllocator {
    pub fn new() -> Self {
        Self::with_range(USER_MEM_BASE, USER_MEM_SIZE)
    }

    pub fn with_range(base: u32, size: u32) -> Self {
        Self {
            base,
            size,
            blocks: Vec::new(),
        }
    }

    fn round_up(size: u32) -> u32 {
        size.div_ceil(USER_MEM_ALIGN) * USER_MEM_ALIGN
    }

    /// Reserve `size` bytes, returning the base address on success.
    ///
    /// Zero-size requests are rejected; callers model footprint-free
    /// reservations as address 0 themselves.
    pub fn alloc(&mut self, size: u32, tag: &str) -> Option<u32> {
        if size == 0 {
            return None;
        }
        let size = Self::round_up(size);

        // Blocks are kept sorted by address; scan the gaps
        let mut cursor = self.base;
        let mut insert_at = 0;
        for (idx, block) in self.blocks.iter().enumerate() {
            if block.addr - cursor >= size {
                break;
            }
            cursor = block.addr + block.size;
            insert_at = idx + 1;
        }
        if cursor + size > self.base + self.size {
            tracing::warn!("User memory exhausted allocating 0x{:x} bytes for '{}'", size, tag);
            return None;
        }

        self.blocks.insert(
            insert_at,
            AllocatedBlock {
                addr: cursor,
                size,
                tag: tag.to_string(),
            },
        );
        tracing::debug!("Allocated 0x{:x} bytes at 0x{:08x} for '{}'", size, cursor, tag);
        Some(cursor)
    }

    /// Release the block starting at `addr`. Returns false if no such block.
    pub fn free(&mut self, addr: u32) -> bool {
        if let Some(idx) = self.blocks.iter().position(|b| b.addr == addr) {
            let block = self.blocks.remove(idx);
            tracing::debug!("Freed 0x{:x} bytes at 0x{:08x} ('{}')", block.size, block.addr, block.tag);
            true
        } else {
            tracing::warn!("Free of unknown block 0x{:08x}", addr);
            false
        }
    }

    pub fn get(&self, addr: u32) -> Option<&AllocatedBlock> {
        self.blocks.iter().find(|b| b.addr == addr)
    }

    pub fn allocated_bytes(&self) -> u32 {
        self.blocks.iter().map(|b| b.size).sum()
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }
}

impl Default for UserMemoryAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alloc_free_round_trip() {
        let mut alloc = UserMemoryAllocator::new();
        let a = alloc.alloc(0x1000, "test/a").unwrap();
        assert_eq!(a, USER_MEM_BASE);
        assert_eq!(alloc.allocated_bytes(), 0x1000);
        assert_eq!(alloc.get(a).unwrap().tag, "test/a");

        assert!(alloc.free(a));
        assert_eq!(alloc.allocated_bytes(), 0);
        assert!(!alloc.free(a));
    }

    #[test]
    fn test_first_fit_reuses_gaps() {
        let mut alloc = UserMemoryAllocator::new();
        let a = alloc.alloc(0x1000, "a").unwrap();
        let b = alloc.alloc(0x1000, "b").unwrap();
        let c = alloc.alloc(0x1000, "c").unwrap();
        assert!(a < b && b < c);

        alloc.free(b);
        // The freed gap is exactly big enough
        let d = alloc.alloc(0x800, "d").unwrap();
        assert_eq!(d, b);
    }

    #[test]
    fn test_alignment() {
        let mut alloc = UserMemoryAllocator::new();
        let a = alloc.alloc(1, "tiny").unwrap();
        let b = alloc.alloc(1, "tiny2").unwrap();
        assert_eq!(b - a, USER_MEM_ALIGN);
    }

    #[test]
    fn test_zero_size_rejected() {
        let mut alloc = UserMemoryAllocator::new();
        assert!(alloc.alloc(0, "empty").is_none());
    }

    #[test]
    fn test_exhaustion() {
        let mut alloc = UserMemoryAllocator::with_range(USER_MEM_BASE, 0x1000);
        assert!(alloc.alloc(0x800, "a").is_some());
        assert!(alloc.alloc(0x800, "b").is_some());
        assert!(alloc.alloc(0x100, "c").is_none());
    }
}
