//! Message dialog
//!
//! Text or error-code message box with optional yes/no buttons. The only
//! dialog the firmware lets a game abort mid-flight.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::base::{DialogBase, DialogEnv, COMMON_PARAMS_SIZE};
use crate::{
    DialogStatus, DialogType, UtilityDialog, DIALOG_RESULT_CANCEL, DIALOG_RESULT_OK,
    SCE_ERROR_UTILITY_INVALID_STATUS,
};

pub const MSG_DIALOG_TYPE_ERROR: u32 = 0;
pub const MSG_DIALOG_TYPE_TEXT: u32 = 1;

/// Option bit: dialog presents yes/no instead of a bare OK
pub const MSG_DIALOG_OPTION_YESNO: u32 = 0x10;

/// Variant-specific fields follow the common header:
/// result word, dialog kind, error code, then 512 bytes of message text.
const KIND_OFFSET: u32 = COMMON_PARAMS_SIZE + 4;
const MESSAGE_OFFSET: u32 = COMMON_PARAMS_SIZE + 12;
const OPTIONS_OFFSET: u32 = MESSAGE_OFFSET + 512;
const MESSAGE_MAX: u32 = 512;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MsgDialog {
    base: DialogBase,
    kind: u32,
    options: u32,
    message: String,
}

impl MsgDialog {
    pub fn options(&self) -> u32 {
        self.options
    }

    fn yes_no(&self) -> bool {
        self.options & MSG_DIALOG_OPTION_YESNO != 0
    }
}

impl UtilityDialog for MsgDialog {
    fn dialog_type(&self) -> DialogType {
        DialogType::Msg
    }

    fn base(&self) -> &DialogBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut DialogBase {
        &mut self.base
    }

    fn init(&mut self, env: &mut DialogEnv, param_addr: u32) -> i32 {
        let ret = self.base.start_init(env, param_addr, "msg");
        if ret < 0 {
            return ret;
        }
        self.kind = env.mem.read_u32(param_addr + KIND_OFFSET).unwrap_or(0);
        self.options = env.mem.read_u32(param_addr + OPTIONS_OFFSET).unwrap_or(0);
        self.message = if self.kind == MSG_DIALOG_TYPE_TEXT {
            env.mem
                .read_cstring(param_addr + MESSAGE_OFFSET, MESSAGE_MAX)
                .unwrap_or_default()
        } else {
            String::new()
        };
        info!(
            "msg dialog: kind={} yesno={} \"{}\"",
            self.kind,
            self.yes_no(),
            self.message
        );
        0
    }

    fn update(&mut self, env: &mut DialogEnv, _anim_speed: i32) -> i32 {
        if !self.base.is_running() {
            return 0;
        }
        self.base.update_count += 1;
        // Message boxes dismiss themselves after a couple of frames; a
        // yes/no prompt answers "yes" (result OK).
        if self.base.update_count >= 2 && self.base.pending_status != DialogStatus::Finished {
            self.base.write_result(env, DIALOG_RESULT_OK);
            self.base.change_status(env, DialogStatus::Finished, 500);
        }
        0
    }

    fn abort(&mut self, env: &mut DialogEnv) -> i32 {
        if !self.base.is_running() {
            return SCE_ERROR_UTILITY_INVALID_STATUS as i32;
        }
        debug!("msg dialog aborted by guest");
        self.base.write_result(env, DIALOG_RESULT_CANCEL);
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

    fn setup_text(text: &str, options: u32) -> (GuestMemory, u32) {
        let mut mem = GuestMemory::new();
        let addr = USER_MEM_BASE;
        mem.write_u32(addr, OPTIONS_OFFSET + 4).unwrap();
        mem.write_u32(addr + KIND_OFFSET, MSG_DIALOG_TYPE_TEXT).unwrap();
        mem.write_bytes(addr + MESSAGE_OFFSET, text.as_bytes()).unwrap();
        mem.write_u8(addr + MESSAGE_OFFSET + text.len() as u32, 0).unwrap();
        mem.write_u32(addr + OPTIONS_OFFSET, options).unwrap();
        (mem, addr)
    }

    #[test]
    fn test_reads_message_text() {
        let (mut mem, addr) = setup_text("Continue without saving?", MSG_DIALOG_OPTION_YESNO);
        let mut dialog = MsgDialog::default();
        let mut env = DialogEnv { mem: &mut mem, now_us: 0 };
        assert_eq!(dialog.init(&mut env, addr), 0);
        assert_eq!(dialog.message, "Continue without saving?");
        assert!(dialog.yes_no());
    }

    #[test]
    fn test_abort_while_running_cancels() {
        let (mut mem, addr) = setup_text("hello", 0);
        let mut dialog = MsgDialog::default();
        let mut env = DialogEnv { mem: &mut mem, now_us: 0 };
        dialog.init(&mut env, addr);
        dialog.finish_init();

        let mut env = DialogEnv { mem: &mut mem, now_us: 100 };
        assert_eq!(dialog.abort(&mut env), 0);
        assert_eq!(dialog.get_status(&mut env), DialogStatus::Finished as i32);
        assert_eq!(mem.read_u32(addr + 28).unwrap(), DIALOG_RESULT_CANCEL);
    }

    #[test]
    fn test_abort_before_running_rejected() {
        let (mut mem, addr) = setup_text("hello", 0);
        let mut dialog = MsgDialog::default();
        let mut env = DialogEnv { mem: &mut mem, now_us: 0 };
        dialog.init(&mut env, addr);
        // Still Init, not yet Running
        assert_eq!(dialog.abort(&mut env), SCE_ERROR_UTILITY_INVALID_STATUS as i32);
    }
}
