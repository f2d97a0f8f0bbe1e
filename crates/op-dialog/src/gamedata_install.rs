//! Game data install dialog
//!
//! Simulates copying bundled game data to the memory stick, reporting
//! progress back through the param block as it goes.

use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::base::{DialogBase, DialogEnv, COMMON_PARAMS_SIZE};
use crate::{DialogStatus, DialogType, UtilityDialog, DIALOG_RESULT_OK};

/// Progress percentage, written after the common header
const PROGRESS_OFFSET: u32 = COMMON_PARAMS_SIZE;

/// Percent of the simulated copy completed per update
const PROGRESS_STEP: u32 = 25;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GamedataInstallDialog {
    base: DialogBase,
    progress: u32,
}

impl GamedataInstallDialog {
    pub fn progress(&self) -> u32 {
        self.progress
    }
}

impl UtilityDialog for GamedataInstallDialog {
    fn dialog_type(&self) -> DialogType {
        DialogType::GamedataInstall
    }

    fn base(&self) -> &DialogBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut DialogBase {
        &mut self.base
    }

    fn init(&mut self, env: &mut DialogEnv, param_addr: u32) -> i32 {
        let ret = self.base.start_init(env, param_addr, "gamedata install");
        if ret < 0 {
            return ret;
        }
        self.progress = 0;
        0
    }

    fn update(&mut self, env: &mut DialogEnv, _anim_speed: i32) -> i32 {
        if !self.base.is_running() {
            return 0;
        }
        if self.progress < 100 {
            self.progress = (self.progress + PROGRESS_STEP).min(100);
            if let Err(e) = env.mem.write_u32(self.base.param_addr + PROGRESS_OFFSET, self.progress) {
                error!("gamedata install: progress writeback failed: {}", e);
            }
            debug!("gamedata install: {}%", self.progress);
        }
        if self.progress >= 100 && self.base.pending_status != DialogStatus::Finished {
            self.base.write_result(env, DIALOG_RESULT_OK);
            self.base.change_status(env, DialogStatus::Finished, 500);
        }
        0
    }

    fn abort(&mut self, env: &mut DialogEnv) -> i32 {
        let _ = env;
        self.base.change_status_now(DialogStatus::Finished);
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

    #[test]
    fn test_progress_reaches_completion() {
        let mut mem = GuestMemory::new();
        let addr = USER_MEM_BASE;
        mem.write_u32(addr, PROGRESS_OFFSET + 4).unwrap();

        let mut dialog = GamedataInstallDialog::default();
        let mut env = DialogEnv { mem: &mut mem, now_us: 0 };
        assert_eq!(dialog.init(&mut env, addr), 0);
        dialog.finish_init();

        let mut updates = 0;
        while dialog.base().pending_status != DialogStatus::Finished {
            dialog.update(&mut env, 1);
            updates += 1;
            assert!(updates <= 10, "install never finished");
        }
        assert_eq!(dialog.progress(), 100);
        assert_eq!(mem.read_u32(addr + PROGRESS_OFFSET).unwrap(), 100);
    }
}
