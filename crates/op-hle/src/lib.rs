//! High-level emulation of the PSP firmware's sceUtility library
//!
//! The real library presents system dialogs (save data, message boxes,
//! the on-screen keyboard), loads optional firmware modules, and exposes
//! system settings to games. Nothing here executes guest code; observable
//! behavior (status machines, error codes, timing) is reproduced over
//! the emulator's own state.

pub mod errors;
pub mod helper;
pub mod kernel;
pub mod media;
pub mod module;
pub mod netparam;
pub mod nids;
pub mod savestate;
pub mod sysparam;
pub mod utility;

pub use errors::*;
pub use helper::{AccessTask, AccessTaskKind, TaskStep};
pub use kernel::KernelState;
pub use media::MediaEngineState;
pub use module::{module_info, LoadedModules, ModuleInfo};
pub use netparam::NetParamState;
pub use nids::{dispatch, find_export, UtilityFunction, UTILITY_EXPORTS};
pub use savestate::{load_json, save_json, UtilitySnapshot, SAVESTATE_VERSION};
pub use utility::UtilityContext;

/// Outcome of a syscall as a dispatcher needs to see it: the value for
/// the guest plus how long the firmware would have blocked delivering it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HleResult {
    pub value: i32,
    pub delay_us: u64,
}

impl HleResult {
    pub fn new(value: i32) -> Self {
        Self { value, delay_us: 0 }
    }

    pub fn delayed(value: i32, delay_us: u64) -> Self {
        Self { value, delay_us }
    }

    /// An SCE status code, returned without delay
    pub fn code(status: u32) -> Self {
        Self::new(status as i32)
    }

    pub fn is_error(&self) -> bool {
        self.value < 0
    }
}
