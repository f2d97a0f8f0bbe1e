//! Memory management for oxidized-psp
//!
//! This crate provides the guest address space (the PSP's little-endian
//! 32-bit layout) and the named-block allocator used for firmware module
//! footprints and other HLE reservations.

pub mod alloc;
pub mod constants;
pub mod memory;

pub use alloc::{AllocatedBlock, UserMemoryAllocator};
pub use constants::*;
pub use memory::GuestMemory;
