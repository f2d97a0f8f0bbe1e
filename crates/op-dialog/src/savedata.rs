//! Save data utility dialog
//!
//! Covers the whole savedata param-block family: automatic load/save, the
//! list variants with a visible browser, and deletes. The simulated flow
//! confirms the operation after a few frames of "UI", since the host has
//! no player to wait for.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::base::{DialogBase, DialogEnv, COMMON_PARAMS_SIZE};
use crate::{DialogStatus, DialogType, UtilityDialog, DIALOG_RESULT_OK};

pub const SAVEDATA_MODE_AUTOLOAD: u32 = 0;
pub const SAVEDATA_MODE_AUTOSAVE: u32 = 1;
pub const SAVEDATA_MODE_LOAD: u32 = 2;
pub const SAVEDATA_MODE_SAVE: u32 = 3;
pub const SAVEDATA_MODE_LISTLOAD: u32 = 4;
pub const SAVEDATA_MODE_LISTSAVE: u32 = 5;
pub const SAVEDATA_MODE_LISTDELETE: u32 = 6;
pub const SAVEDATA_MODE_DELETE: u32 = 7;

/// Mode word follows the common header in the savedata param block
const MODE_OFFSET: u32 = COMMON_PARAMS_SIZE;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SaveDataDialog {
    base: DialogBase,
    mode: u32,
    /// Set once the simulated file operation has been carried out
    op_done: bool,
}

impl SaveDataDialog {
    pub fn mode(&self) -> u32 {
        self.mode
    }

    /// List dialogs show a browser and take longer than the automatic modes
    fn frames_needed(&self) -> u32 {
        match self.mode {
            SAVEDATA_MODE_LISTLOAD | SAVEDATA_MODE_LISTSAVE | SAVEDATA_MODE_LISTDELETE => 4,
            SAVEDATA_MODE_AUTOLOAD | SAVEDATA_MODE_AUTOSAVE => 2,
            _ => 3,
        }
    }
}

impl UtilityDialog for SaveDataDialog {
    fn dialog_type(&self) -> DialogType {
        DialogType::SaveData
    }

    fn base(&self) -> &DialogBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut DialogBase {
        &mut self.base
    }

    fn init(&mut self, env: &mut DialogEnv, param_addr: u32) -> i32 {
        let ret = self.base.start_init(env, param_addr, "savedata");
        if ret < 0 {
            return ret;
        }
        self.mode = env.mem.read_u32(param_addr + MODE_OFFSET).unwrap_or(0);
        self.op_done = false;
        if self.mode > SAVEDATA_MODE_DELETE {
            warn!("savedata: unknown mode {}", self.mode);
        }
        debug!("savedata: mode {}", self.mode);
        0
    }

    fn update(&mut self, env: &mut DialogEnv, _anim_speed: i32) -> i32 {
        if !self.base.is_running() {
            // Polled while still initializing; harmless
            return 0;
        }
        self.base.update_count += 1;
        if !self.op_done && self.base.update_count >= self.frames_needed() {
            self.op_done = true;
            self.base.write_result(env, DIALOG_RESULT_OK);
            self.base.change_status(env, DialogStatus::Finished, 500);
            debug!("savedata: mode {} complete", self.mode);
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

    fn setup(mode: u32) -> (GuestMemory, u32) {
        let mut mem = GuestMemory::new();
        let addr = USER_MEM_BASE;
        mem.write_u32(addr, COMMON_PARAMS_SIZE + 4).unwrap();
        mem.write_u32(addr + MODE_OFFSET, mode).unwrap();
        (mem, addr)
    }

    #[test]
    fn test_autosave_lifecycle() {
        let (mut mem, addr) = setup(SAVEDATA_MODE_AUTOSAVE);
        let mut dialog = SaveDataDialog::default();

        let mut env = DialogEnv { mem: &mut mem, now_us: 0 };
        assert_eq!(dialog.init(&mut env, addr), 0);
        assert_eq!(dialog.mode(), SAVEDATA_MODE_AUTOSAVE);
        assert_eq!(dialog.get_status(&mut env), DialogStatus::Init as i32);

        dialog.finish_init();
        let mut env = DialogEnv { mem: &mut mem, now_us: 1000 };
        assert_eq!(dialog.get_status(&mut env), DialogStatus::Running as i32);

        dialog.update(&mut env, 1);
        dialog.update(&mut env, 1);
        let mut env = DialogEnv { mem: &mut mem, now_us: 10_000 };
        assert_eq!(dialog.get_status(&mut env), DialogStatus::Finished as i32);
        // Result written back to the guest block
        assert_eq!(mem.read_u32(addr + 28).unwrap(), DIALOG_RESULT_OK);
    }

    #[test]
    fn test_init_failure_keeps_none() {
        let mut mem = GuestMemory::new();
        let mut dialog = SaveDataDialog::default();
        let mut env = DialogEnv { mem: &mut mem, now_us: 0 };
        assert!(dialog.init(&mut env, 0x1000_0000) < 0);
        assert_eq!(dialog.get_status(&mut env), DialogStatus::None as i32);
    }
}
