//! On-screen keyboard dialog
//!
//! The guest hands over an output buffer; when the simulated entry
//! finishes, the "typed" text is written back as UCS-2 with a NUL
//! terminator, clamped to the buffer size.

use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::base::{DialogBase, DialogEnv, COMMON_PARAMS_SIZE};
use crate::{DialogStatus, DialogType, UtilityDialog, DIALOG_RESULT_OK};

/// Variant fields after the common header: output buffer pointer and its
/// capacity in UCS-2 characters (terminator included).
const OUT_TEXT_ADDR_OFFSET: u32 = COMMON_PARAMS_SIZE;
const OUT_TEXT_MAX_OFFSET: u32 = COMMON_PARAMS_SIZE + 4;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OskDialog {
    base: DialogBase,
    out_text_addr: u32,
    out_text_max: u32,
    /// What the simulated player types; empty entry is a valid outcome
    entered: String,
}

impl OskDialog {
    /// Queue text to be "typed" into the next keyboard session. Useful for
    /// frontends that map host keyboard input onto the dialog.
    pub fn set_entered_text(&mut self, text: &str) {
        self.entered = text.to_string();
    }

    fn write_entered(&self, env: &mut DialogEnv) {
        if self.out_text_addr == 0 || self.out_text_max == 0 {
            return;
        }
        // Room for the terminator is carved out of the capacity
        let cap = (self.out_text_max as usize).saturating_sub(1);
        let mut addr = self.out_text_addr;
        for unit in self.entered.encode_utf16().take(cap) {
            if let Err(e) = env.mem.write_u16(addr, unit) {
                error!("osk: output buffer writeback failed: {}", e);
                return;
            }
            addr += 2;
        }
        let _ = env.mem.write_u16(addr, 0);
    }
}

impl UtilityDialog for OskDialog {
    fn dialog_type(&self) -> DialogType {
        DialogType::Osk
    }

    fn base(&self) -> &DialogBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut DialogBase {
        &mut self.base
    }

    fn init(&mut self, env: &mut DialogEnv, param_addr: u32) -> i32 {
        let ret = self.base.start_init(env, param_addr, "osk");
        if ret < 0 {
            return ret;
        }
        self.out_text_addr = env.mem.read_u32(param_addr + OUT_TEXT_ADDR_OFFSET).unwrap_or(0);
        self.out_text_max = env.mem.read_u32(param_addr + OUT_TEXT_MAX_OFFSET).unwrap_or(0);
        debug!(
            "osk: output buffer 0x{:08x} ({} chars)",
            self.out_text_addr, self.out_text_max
        );
        0
    }

    fn update(&mut self, env: &mut DialogEnv, _anim_speed: i32) -> i32 {
        if !self.base.is_running() {
            return 0;
        }
        self.base.update_count += 1;
        if self.base.update_count >= 2 && self.base.pending_status != DialogStatus::Finished {
            self.write_entered(env);
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

    fn setup(out_addr: u32, out_max: u32) -> (GuestMemory, u32) {
        let mut mem = GuestMemory::new();
        let addr = USER_MEM_BASE;
        mem.write_u32(addr, OUT_TEXT_MAX_OFFSET + 4).unwrap();
        mem.write_u32(addr + OUT_TEXT_ADDR_OFFSET, out_addr).unwrap();
        mem.write_u32(addr + OUT_TEXT_MAX_OFFSET, out_max).unwrap();
        (mem, addr)
    }

    fn read_ucs2(mem: &GuestMemory, mut addr: u32) -> String {
        let mut units = Vec::new();
        loop {
            let unit = mem.read_u16(addr).unwrap();
            if unit == 0 {
                break;
            }
            units.push(unit);
            addr += 2;
        }
        String::from_utf16(&units).unwrap()
    }

    #[test]
    fn test_entered_text_written_as_ucs2() {
        let out = USER_MEM_BASE + 0x1000;
        let (mut mem, addr) = setup(out, 32);
        let mut dialog = OskDialog::default();
        dialog.set_entered_text("HERO");

        let mut env = DialogEnv { mem: &mut mem, now_us: 0 };
        assert_eq!(dialog.init(&mut env, addr), 0);
        dialog.finish_init();
        dialog.update(&mut env, 1);
        dialog.update(&mut env, 1);

        assert_eq!(read_ucs2(&mem, out), "HERO");
    }

    #[test]
    fn test_output_clamped_to_capacity() {
        let out = USER_MEM_BASE + 0x1000;
        // Capacity 4 means 3 characters plus the terminator
        let (mut mem, addr) = setup(out, 4);
        let mut dialog = OskDialog::default();
        dialog.set_entered_text("LONGNAME");

        let mut env = DialogEnv { mem: &mut mem, now_us: 0 };
        dialog.init(&mut env, addr);
        dialog.finish_init();
        dialog.update(&mut env, 1);
        dialog.update(&mut env, 1);

        assert_eq!(read_ucs2(&mem, out), "LON");
    }
}
