//! Guest memory implementation
//!
//! Backs each mapped region with host heap storage. All multi-byte accesses
//! are little-endian, matching the PSP's MIPS core. Every HLE write into
//! guest memory must go through the validated accessors here; a bad guest
//! pointer fails the access instead of corrupting host state.

use crate::constants::*;
use op_core::error::MemoryError;

struct Region {
    base: u32,
    data: Vec<u8>,
    name: &'static str,
}

/// The PSP guest address space
pub struct GuestMemory {
    regions: Vec<Region>,
}

impl GuestMemory {
    pub fn new() -> Self {
        let regions = vec![
            Region {
                base: SCRATCHPAD_BASE,
                data: vec![0; SCRATCHPAD_SIZE as usize],
                name: "Scratchpad",
            },
            Region {
                base: VRAM_BASE,
                data: vec![0; VRAM_SIZE as usize],
                name: "VRAM",
            },
            Region {
                base: MAIN_RAM_BASE,
                data: vec![0; MAIN_RAM_SIZE as usize],
                name: "Main RAM",
            },
        ];
        Self { regions }
    }

    fn region_for(&self, addr: u32, size: u32) -> Option<(usize, usize)> {
        if size == 0 {
            return None;
        }
        for (idx, region) in self.regions.iter().enumerate() {
            let end = region.base as u64 + region.data.len() as u64;
            if (addr as u64) >= region.base as u64 && (addr as u64 + size as u64) <= end {
                return Some((idx, (addr - region.base) as usize));
            }
        }
        None
    }

    /// True if the whole range lies inside one mapped region
    pub fn is_valid_range(&self, addr: u32, size: u32) -> bool {
        self.region_for(addr, size).is_some()
    }

    pub fn region_name(&self, addr: u32) -> Option<&'static str> {
        self.region_for(addr, 1).map(|(idx, _)| self.regions[idx].name)
    }

    fn slice(&self, addr: u32, size: u32) -> Result<&[u8], MemoryError> {
        let (idx, off) = self
            .region_for(addr, size)
            .ok_or(MemoryError::InvalidRange { addr, size })?;
        Ok(&self.regions[idx].data[off..off + size as usize])
    }

    fn slice_mut(&mut self, addr: u32, size: u32) -> Result<&mut [u8], MemoryError> {
        let (idx, off) = self
            .region_for(addr, size)
            .ok_or(MemoryError::InvalidRange { addr, size })?;
        Ok(&mut self.regions[idx].data[off..off + size as usize])
    }

    pub fn read_u8(&self, addr: u32) -> Result<u8, MemoryError> {
        Ok(self.slice(addr, 1)?[0])
    }

    pub fn read_u16(&self, addr: u32) -> Result<u16, MemoryError> {
        let b = self.slice(addr, 2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    pub fn read_u32(&self, addr: u32) -> Result<u32, MemoryError> {
        let b = self.slice(addr, 4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn write_u8(&mut self, addr: u32, value: u8) -> Result<(), MemoryError> {
        self.slice_mut(addr, 1)?[0] = value;
        Ok(())
    }

    pub fn write_u16(&mut self, addr: u32, value: u16) -> Result<(), MemoryError> {
        self.slice_mut(addr, 2)?.copy_from_slice(&value.to_le_bytes());
        Ok(())
    }

    pub fn write_u32(&mut self, addr: u32, value: u32) -> Result<(), MemoryError> {
        self.slice_mut(addr, 4)?.copy_from_slice(&value.to_le_bytes());
        Ok(())
    }

    pub fn read_bytes(&self, addr: u32, size: u32) -> Result<Vec<u8>, MemoryError> {
        Ok(self.slice(addr, size)?.to_vec())
    }

    pub fn write_bytes(&mut self, addr: u32, data: &[u8]) -> Result<(), MemoryError> {
        self.slice_mut(addr, data.len() as u32)?.copy_from_slice(data);
        Ok(())
    }

    /// Read a NUL-terminated string, scanning at most `max_len` bytes
    pub fn read_cstring(&self, addr: u32, max_len: u32) -> Result<String, MemoryError> {
        let bytes = self.slice(addr, max_len)?;
        let len = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        Ok(String::from_utf8_lossy(&bytes[..len]).into_owned())
    }

    /// Write a string into a fixed-width field, NUL-padding the remainder.
    ///
    /// Writes exactly `field_len` bytes; the string is truncated if needed.
    pub fn write_fixed_str(&mut self, addr: u32, s: &str, field_len: u32) -> Result<(), MemoryError> {
        let dst = self.slice_mut(addr, field_len)?;
        dst.fill(0);
        let src = s.as_bytes();
        let n = src.len().min(dst.len());
        dst[..n].copy_from_slice(&src[..n]);
        Ok(())
    }
}

impl Default for GuestMemory {
    fn default() -> Self {
        Self::new()
    }
}
