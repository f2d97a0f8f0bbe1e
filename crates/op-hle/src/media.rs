//! Media engine side effects of utility module loads
//!
//! A few AV modules do more than reserve memory: loading av_avcodec wakes
//! the JPEG decoder, and av_atrac3plus registers a pretend prx with the
//! ATRAC subsystem so version queries answer sensibly.

use serde::{Deserialize, Serialize};
use tracing::{debug, error};

/// Module version av_atrac3plus reports; matches a late firmware prx
const ATRAC_MODULE_VERSION: u32 = 0x105;
/// Size of the bss carved out of the module allocation for ATRAC state
const ATRAC_BSS_SIZE: u32 = 0x67C;

/// The pretend prx registered when av_atrac3plus is loaded
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AtracModule {
    pub version: u32,
    pub load_addr: u32,
    pub bss_size: u32,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct MediaEngineState {
    pub(crate) avcodec_loaded: bool,
    pub(crate) atrac: Option<AtracModule>,
    /// Mirrors the compat switch that turns off ATRAC high-level emulation
    pub audio_hle_disabled: bool,
}

impl MediaEngineState {
    pub fn avcodec_loaded(&self) -> bool {
        self.avcodec_loaded
    }

    pub fn atrac_module(&self) -> Option<&AtracModule> {
        self.atrac.as_ref()
    }

    pub fn notify_avcodec(state: &mut Self, load: i32, _load_addr: u32, _total_size: u32) {
        state.avcodec_loaded = load == 1;
        debug!("av_avcodec {}", if load == 1 { "loaded" } else { "unloaded" });
    }

    pub fn notify_atrac(state: &mut Self, load: i32, load_addr: u32, total_size: u32) {
        if load == 1 {
            if state.audio_hle_disabled {
                // The game wants the firmware decoder we are not running
                error!("ATRAC HLE is disabled and the game loads av_atrac3plus - audio will break");
                debug_assert!(false);
            }
            debug_assert!(ATRAC_BSS_SIZE <= total_size);
            state.atrac = Some(AtracModule {
                version: ATRAC_MODULE_VERSION,
                load_addr,
                bss_size: ATRAC_BSS_SIZE,
            });
        } else if load == -1 {
            state.atrac = None;
        }
    }

    pub fn reset(&mut self) {
        self.avcodec_loaded = false;
        self.atrac = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_avcodec_toggles() {
        let mut state = MediaEngineState::default();
        MediaEngineState::notify_avcodec(&mut state, 1, 0, 0);
        assert!(state.avcodec_loaded());
        MediaEngineState::notify_avcodec(&mut state, -1, 0, 0);
        assert!(!state.avcodec_loaded());
    }

    #[test]
    fn test_atrac_registers_module() {
        let mut state = MediaEngineState::default();
        MediaEngineState::notify_atrac(&mut state, 1, 0x0880_0000, 0x8000);
        let module = state.atrac_module().unwrap();
        assert_eq!(module.version, 0x105);
        assert_eq!(module.load_addr, 0x0880_0000);
        MediaEngineState::notify_atrac(&mut state, -1, 0, 0);
        assert!(state.atrac_module().is_none());
    }
}
