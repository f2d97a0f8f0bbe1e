//! PSP address space constants

/// Scratchpad RAM
pub const SCRATCHPAD_BASE: u32 = 0x0001_0000;
pub const SCRATCHPAD_SIZE: u32 = 0x0000_4000; // 16 KiB

/// Video RAM
pub const VRAM_BASE: u32 = 0x0400_0000;
pub const VRAM_SIZE: u32 = 0x0020_0000; // 2 MiB

/// Main RAM (kernel + user)
pub const MAIN_RAM_BASE: u32 = 0x0800_0000;
pub const MAIN_RAM_SIZE: u32 = 0x0200_0000; // 32 MiB

/// User partition within main RAM, managed by [`crate::UserMemoryAllocator`]
pub const USER_MEM_BASE: u32 = 0x0880_0000;
pub const USER_MEM_SIZE: u32 = 0x0180_0000; // 24 MiB

/// Allocation granularity of the user partition
pub const USER_MEM_ALIGN: u32 = 0x100;
