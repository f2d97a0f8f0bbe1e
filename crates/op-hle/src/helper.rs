//! Simulated utility helper thread
//!
//! The firmware spins up a short-lived "ScePafJob" worker to animate a
//! dialog in or out. We never run guest code for it; an [`AccessTask`]
//! walks the same timeline on the event queue: the handshake delay split
//! into four equal work slices, each yielding at most 1ms at a time so
//! better-priority guest threads would get scheduled in between, then a
//! completion notification back to the dialog.

use op_dialog::DialogType;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// The helper's work is split into this many equal slices
const WORK_SLICES: u32 = 4;
/// A slice yields back to the scheduler at least this often
const WORK_SLICE_MAX_US: u64 = 1000;
/// Stack the real worker thread is created with
pub const ACCESS_TASK_STACK_SIZE: u32 = 0x200;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccessTaskKind {
    Init,
    Shutdown,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
enum Phase {
    Work { step: u32, remaining_us: u64 },
    Done,
}

/// What the scheduler should do after a task tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStep {
    /// Re-arm the task event after this much virtual time
    Sleep(u64),
    /// All slices consumed; deliver the completion to the dialog
    Finished,
}

/// One in-flight init or shutdown handshake
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessTask {
    pub kind: AccessTaskKind,
    pub dialog_type: DialogType,
    pub priority: i32,
    pub stack_size: u32,
    part_delay_us: u64,
    phase: Phase,
}

impl AccessTask {
    pub fn new(kind: AccessTaskKind, dialog_type: DialogType, delay_us: u64, priority: i32) -> Self {
        let part_delay_us = delay_us / u64::from(WORK_SLICES);
        debug!(
            "access task {:?} for {:?}: {} slices of {}us at priority {}",
            kind, dialog_type, WORK_SLICES, part_delay_us, priority
        );
        Self {
            kind,
            dialog_type,
            priority,
            stack_size: ACCESS_TASK_STACK_SIZE,
            part_delay_us,
            phase: Phase::Work { step: 0, remaining_us: part_delay_us },
        }
    }

    /// Advance past the slice that just elapsed and report what comes
    /// next. The first call returns the initial sleep.
    pub fn advance(&mut self) -> TaskStep {
        loop {
            match &mut self.phase {
                Phase::Done => return TaskStep::Finished,
                Phase::Work { step, remaining_us } => {
                    if *remaining_us == 0 {
                        if *step + 1 >= WORK_SLICES {
                            self.phase = Phase::Done;
                            continue;
                        }
                        *step += 1;
                        *remaining_us = self.part_delay_us;
                        continue;
                    }
                    let sleep = (*remaining_us).min(WORK_SLICE_MAX_US);
                    *remaining_us -= sleep;
                    return TaskStep::Sleep(sleep);
                }
            }
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self.phase, Phase::Done)
    }
}
