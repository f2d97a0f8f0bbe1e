//! Network configuration dialog
//!
//! Walks the guest through "connecting" to an access point. With no real
//! radio the connection succeeds after a fixed number of frames.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::base::{DialogBase, DialogEnv, COMMON_PARAMS_SIZE};
use crate::{DialogStatus, DialogType, UtilityDialog, DIALOG_RESULT_OK};

pub const NETCONF_ACTION_CONNECTAP: u32 = 0;
pub const NETCONF_ACTION_DISPLAYSTATUS: u32 = 1;
pub const NETCONF_ACTION_CONNECT_ADHOC: u32 = 2;
pub const NETCONF_ACTION_CONNECTAP_LASTUSED: u32 = 3;

const ACTION_OFFSET: u32 = COMMON_PARAMS_SIZE;

/// Frames of simulated association before the connection reports up
const CONNECT_FRAMES: u32 = 4;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NetconfDialog {
    base: DialogBase,
    action: u32,
}

impl NetconfDialog {
    pub fn action(&self) -> u32 {
        self.action
    }
}

impl UtilityDialog for NetconfDialog {
    fn dialog_type(&self) -> DialogType {
        DialogType::Net
    }

    fn base(&self) -> &DialogBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut DialogBase {
        &mut self.base
    }

    fn init(&mut self, env: &mut DialogEnv, param_addr: u32) -> i32 {
        let ret = self.base.start_init(env, param_addr, "netconf");
        if ret < 0 {
            return ret;
        }
        self.action = env.mem.read_u32(param_addr + ACTION_OFFSET).unwrap_or(0);
        debug!("netconf: action {}", self.action);
        0
    }

    fn update(&mut self, env: &mut DialogEnv, _anim_speed: i32) -> i32 {
        if !self.base.is_running() {
            return 0;
        }
        self.base.update_count += 1;
        // Status display closes immediately; connections take a few frames
        let frames = if self.action == NETCONF_ACTION_DISPLAYSTATUS {
            1
        } else {
            CONNECT_FRAMES
        };
        if self.base.update_count >= frames && self.base.pending_status != DialogStatus::Finished {
            self.base.write_result(env, DIALOG_RESULT_OK);
            self.base.change_status(env, DialogStatus::Finished, 500);
            debug!("netconf: action {} finished", self.action);
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

    #[test]
    fn test_connect_takes_several_frames() {
        let mut mem = GuestMemory::new();
        let addr = USER_MEM_BASE;
        mem.write_u32(addr, ACTION_OFFSET + 4).unwrap();
        mem.write_u32(addr + ACTION_OFFSET, NETCONF_ACTION_CONNECTAP).unwrap();

        let mut dialog = NetconfDialog::default();
        let mut env = DialogEnv { mem: &mut mem, now_us: 0 };
        assert_eq!(dialog.init(&mut env, addr), 0);
        dialog.finish_init();

        for _ in 0..CONNECT_FRAMES - 1 {
            dialog.update(&mut env, 1);
            assert_eq!(dialog.base().pending_status, DialogStatus::Running);
        }
        dialog.update(&mut env, 1);
        assert_eq!(dialog.base().pending_status, DialogStatus::Finished);
    }
}
