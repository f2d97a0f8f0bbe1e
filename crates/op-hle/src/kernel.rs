//! Slice of kernel state the utility subsystem touches: the global
//! interrupt enable and the volatile memory lock.
//!
//! Dialogs borrow the 4MB volatile region while they are on screen and
//! hand it back once shut down; shutdown handshakes run with interrupts
//! masked, exactly like the firmware's thread spawn does.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Debug, Serialize, Deserialize)]
pub struct KernelState {
    interrupts_enabled: bool,
    volatile_locked: bool,
}

impl Default for KernelState {
    fn default() -> Self {
        Self { interrupts_enabled: true, volatile_locked: false }
    }
}

impl KernelState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn interrupts_enabled(&self) -> bool {
        self.interrupts_enabled
    }

    /// Mask interrupts, returning the previous state for the caller to
    /// restore with [`restore_interrupts`](Self::restore_interrupts).
    pub fn suspend_interrupts(&mut self) -> bool {
        let was = self.interrupts_enabled;
        self.interrupts_enabled = false;
        was
    }

    pub fn restore_interrupts(&mut self, enabled: bool) {
        self.interrupts_enabled = enabled;
    }

    pub fn volatile_locked(&self) -> bool {
        self.volatile_locked
    }

    pub fn lock_volatile(&mut self) {
        if self.volatile_locked {
            warn!("volatile memory already locked");
        }
        self.volatile_locked = true;
        debug!("volatile memory locked by utility");
    }

    /// Hand the volatile region back to the game. Safe to call when not
    /// held; cleanup paths do so unconditionally.
    pub fn unlock_volatile(&mut self) -> bool {
        let was = self.volatile_locked;
        self.volatile_locked = false;
        if was {
            debug!("volatile memory returned to the game");
        }
        was
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interrupt_mask_nesting() {
        let mut kernel = KernelState::new();
        assert!(kernel.interrupts_enabled());
        let prev = kernel.suspend_interrupts();
        assert!(prev);
        assert!(!kernel.interrupts_enabled());
        // A nested suspend sees them already off
        let inner = kernel.suspend_interrupts();
        assert!(!inner);
        kernel.restore_interrupts(inner);
        assert!(!kernel.interrupts_enabled());
        kernel.restore_interrupts(prev);
        assert!(kernel.interrupts_enabled());
    }

    #[test]
    fn test_volatile_unlock_idempotent() {
        let mut kernel = KernelState::new();
        kernel.lock_volatile();
        assert!(kernel.unlock_volatile());
        assert!(!kernel.unlock_volatile());
    }
}
