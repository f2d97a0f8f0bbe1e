//! Screenshot utility dialog
//!
//! The only dialog with a two-stage start: after the normal init the game
//! calls ContStart to begin the actual capture.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::base::{DialogBase, DialogEnv, COMMON_PARAMS_SIZE};
use crate::{
    DialogStatus, DialogType, UtilityDialog, DIALOG_RESULT_OK, SCE_ERROR_UTILITY_INVALID_STATUS,
};

const MODE_OFFSET: u32 = COMMON_PARAMS_SIZE;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScreenshotDialog {
    base: DialogBase,
    mode: u32,
    cont_started: bool,
}

impl UtilityDialog for ScreenshotDialog {
    fn dialog_type(&self) -> DialogType {
        DialogType::Screenshot
    }

    fn base(&self) -> &DialogBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut DialogBase {
        &mut self.base
    }

    fn init(&mut self, env: &mut DialogEnv, param_addr: u32) -> i32 {
        let ret = self.base.start_init(env, param_addr, "screenshot");
        if ret < 0 {
            return ret;
        }
        self.mode = env.mem.read_u32(param_addr + MODE_OFFSET).unwrap_or(0);
        self.cont_started = false;
        debug!("screenshot: mode {}", self.mode);
        0
    }

    fn cont_start(&mut self, env: &mut DialogEnv, param_addr: u32) -> i32 {
        let _ = env;
        if !self.base.is_running() {
            return SCE_ERROR_UTILITY_INVALID_STATUS as i32;
        }
        debug!("screenshot: capture started (params at 0x{:08x})", param_addr);
        self.cont_started = true;
        0
    }

    fn update(&mut self, env: &mut DialogEnv, _anim_speed: i32) -> i32 {
        if !self.base.is_running() || !self.cont_started {
            return 0;
        }
        self.base.update_count += 1;
        if self.base.update_count >= 2 && self.base.pending_status != DialogStatus::Finished {
            self.base.write_result(env, DIALOG_RESULT_OK);
            self.base.change_status(env, DialogStatus::Finished, 500);
        }
        0
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use op_memory::{GuestMemory, USER_MEM_BASE};

    fn setup() -> (GuestMemory, u32) {
        let mut mem = GuestMemory::new();
        let addr = USER_MEM_BASE;
        mem.write_u32(addr, MODE_OFFSET + 4).unwrap();
        (mem, addr)
    }

    #[test]
    fn test_cont_start_required_before_finish() {
        let (mut mem, addr) = setup();
        let mut dialog = ScreenshotDialog::default();
        let mut env = DialogEnv { mem: &mut mem, now_us: 0 };
        dialog.init(&mut env, addr);
        dialog.finish_init();

        // Updates without ContStart never progress
        for _ in 0..10 {
            dialog.update(&mut env, 1);
        }
        assert_eq!(dialog.base().pending_status, DialogStatus::Running);

        assert_eq!(dialog.cont_start(&mut env, addr), 0);
        dialog.update(&mut env, 1);
        dialog.update(&mut env, 1);
        assert_eq!(dialog.base().pending_status, DialogStatus::Finished);
    }

    #[test]
    fn test_cont_start_rejected_when_not_running() {
        let (mut mem, addr) = setup();
        let mut dialog = ScreenshotDialog::default();
        let mut env = DialogEnv { mem: &mut mem, now_us: 0 };
        assert_eq!(
            dialog.cont_start(&mut env, addr),
            SCE_ERROR_UTILITY_INVALID_STATUS as i32
        );
    }
}
