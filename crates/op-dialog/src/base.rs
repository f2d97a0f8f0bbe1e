//! Shared dialog plumbing: the common param-block header and the status
//! machinery every variant embeds.

use op_memory::GuestMemory;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::DialogStatus;

/// Size of the param header shared by every utility dialog
pub const COMMON_PARAMS_SIZE: u32 = 48;

/// Offset of the result field within the common header
const RESULT_OFFSET: u32 = 28;

/// Access the world a dialog is allowed to touch: guest memory plus the
/// virtual clock. Handed in per call so dialogs stay plain data.
pub struct DialogEnv<'a> {
    pub mem: &'a mut GuestMemory,
    pub now_us: u64,
}

/// The header every dialog param block begins with
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct CommonParams {
    pub size: u32,
    pub language: u32,
    pub button_swap: u32,
    pub graphics_thread: u32,
    pub access_thread: u32,
    pub font_thread: u32,
    pub sound_thread: u32,
}

impl CommonParams {
    pub fn read(mem: &GuestMemory, addr: u32) -> Option<Self> {
        if !mem.is_valid_range(addr, COMMON_PARAMS_SIZE) {
            return None;
        }
        // Infallible after the range check
        let word = |off| mem.read_u32(addr + off).unwrap_or(0);
        Some(Self {
            size: word(0),
            language: word(4),
            button_swap: word(8),
            graphics_thread: word(12),
            access_thread: word(16),
            font_thread: word(20),
            sound_thread: word(24),
        })
    }
}

/// Status machine and param bookkeeping embedded in every dialog
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DialogBase {
    pub status: DialogStatus,
    pub pending_status: DialogStatus,
    pub pending_at_us: u64,
    pub param_addr: u32,
    pub common: Option<CommonParams>,
    pub update_count: u32,
}

impl DialogBase {
    /// Parse the common header and enter Init. Returns a negative status
    /// code if the param block address is unusable.
    pub fn start_init(&mut self, env: &mut DialogEnv, param_addr: u32, name: &str) -> i32 {
        let Some(common) = CommonParams::read(env.mem, param_addr) else {
            error!("{}: unreadable param block at 0x{:08x}", name, param_addr);
            return -1;
        };
        debug!(
            "{}: init, params at 0x{:08x} (size=0x{:x}, lang={})",
            name, param_addr, common.size, common.language
        );
        self.param_addr = param_addr;
        self.common = Some(common);
        self.update_count = 0;
        self.change_status_now(DialogStatus::Init);
        0
    }

    /// Switch status immediately
    pub fn change_status_now(&mut self, status: DialogStatus) {
        self.status = status;
        self.pending_status = status;
    }

    /// Switch status after `delay_us` of virtual time; the change becomes
    /// visible on the next status poll past the deadline.
    pub fn change_status(&mut self, env: &DialogEnv, status: DialogStatus, delay_us: u64) {
        if delay_us == 0 {
            self.change_status_now(status);
        } else {
            self.pending_status = status;
            self.pending_at_us = env.now_us + delay_us;
        }
    }

    fn apply_pending(&mut self, now_us: u64) {
        if self.pending_status != self.status && now_us >= self.pending_at_us {
            self.status = self.pending_status;
        }
    }

    /// Current status as the guest sees it
    pub fn status_code(&mut self, now_us: u64) -> i32 {
        self.apply_pending(now_us);
        self.status as i32
    }

    pub fn is_running(&self) -> bool {
        self.status == DialogStatus::Running
    }

    /// Write the completion result into the guest param block
    pub fn write_result(&self, env: &mut DialogEnv, result: u32) {
        if self.common.is_some() {
            if let Err(e) = env.mem.write_u32(self.param_addr + RESULT_OFFSET, result) {
                error!("dialog result writeback failed: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use op_memory::USER_MEM_BASE;

    fn write_common(mem: &mut GuestMemory, addr: u32) {
        mem.write_u32(addr, COMMON_PARAMS_SIZE).unwrap();
        mem.write_u32(addr + 4, 1).unwrap(); // language
        mem.write_u32(addr + 16, 0x22).unwrap(); // access thread priority
    }

    #[test]
    fn test_start_init_reads_header() {
        let mut mem = GuestMemory::new();
        let addr = USER_MEM_BASE;
        write_common(&mut mem, addr);

        let mut base = DialogBase::default();
        let mut env = DialogEnv { mem: &mut mem, now_us: 0 };
        assert_eq!(base.start_init(&mut env, addr, "test"), 0);
        assert_eq!(base.status, DialogStatus::Init);
        let common = base.common.unwrap();
        assert_eq!(common.language, 1);
        assert_eq!(common.access_thread, 0x22);
    }

    #[test]
    fn test_start_init_rejects_bad_address() {
        let mut mem = GuestMemory::new();
        let mut base = DialogBase::default();
        let mut env = DialogEnv { mem: &mut mem, now_us: 0 };
        assert!(base.start_init(&mut env, 0xDEAD_0000, "test") < 0);
        assert_eq!(base.status, DialogStatus::None);
    }

    #[test]
    fn test_delayed_status_change() {
        let mut mem = GuestMemory::new();
        let mut base = DialogBase::default();
        base.change_status_now(DialogStatus::Running);

        let env = DialogEnv { mem: &mut mem, now_us: 100 };
        base.change_status(&env, DialogStatus::Finished, 500);
        assert_eq!(base.status_code(200), DialogStatus::Running as i32);
        assert_eq!(base.status_code(600), DialogStatus::Finished as i32);
    }

    #[test]
    fn test_result_writeback() {
        let mut mem = GuestMemory::new();
        let addr = USER_MEM_BASE;
        write_common(&mut mem, addr);

        let mut base = DialogBase::default();
        let mut env = DialogEnv { mem: &mut mem, now_us: 0 };
        base.start_init(&mut env, addr, "test");
        base.write_result(&mut env, 0);
        assert_eq!(mem.read_u32(addr + RESULT_OFFSET).unwrap(), 0);
    }
}
