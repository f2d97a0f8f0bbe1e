//! PlayStation Network sign-in dialog
//!
//! No real network backend exists, so the sign-in "succeeds" after a
//! short delay; games only care that the status machine completes.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::base::{DialogBase, DialogEnv};
use crate::{DialogStatus, DialogType, UtilityDialog, DIALOG_RESULT_OK};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NpSigninDialog {
    base: DialogBase,
    signed_in: bool,
}

impl NpSigninDialog {
    pub fn signed_in(&self) -> bool {
        self.signed_in
    }
}

impl UtilityDialog for NpSigninDialog {
    fn dialog_type(&self) -> DialogType {
        DialogType::NpSignin
    }

    fn base(&self) -> &DialogBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut DialogBase {
        &mut self.base
    }

    fn init(&mut self, env: &mut DialogEnv, param_addr: u32) -> i32 {
        let ret = self.base.start_init(env, param_addr, "np signin");
        if ret < 0 {
            return ret;
        }
        self.signed_in = false;
        0
    }

    fn update(&mut self, env: &mut DialogEnv, _anim_speed: i32) -> i32 {
        if !self.base.is_running() {
            return 0;
        }
        self.base.update_count += 1;
        if self.base.update_count >= 3 && !self.signed_in {
            self.signed_in = true;
            debug!("np signin: sign-in complete");
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

    #[test]
    fn test_sign_in_completes() {
        let mut mem = GuestMemory::new();
        let addr = USER_MEM_BASE;
        mem.write_u32(addr, 48).unwrap();

        let mut dialog = NpSigninDialog::default();
        let mut env = DialogEnv { mem: &mut mem, now_us: 0 };
        assert_eq!(dialog.init(&mut env, addr), 0);
        assert!(!dialog.signed_in());
        dialog.finish_init();

        for _ in 0..3 {
            dialog.update(&mut env, 1);
        }
        assert!(dialog.signed_in());
        assert_eq!(dialog.base().pending_status, DialogStatus::Finished);
    }
}
