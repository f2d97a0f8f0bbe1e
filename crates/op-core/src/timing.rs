//! Virtual-time event scheduler
//!
//! The emulator runs on a single logical thread; everything asynchronous is
//! expressed as timer events on this queue. Guest-visible delays are virtual
//! microseconds, never wall-clock time, so replays are deterministic.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

/// Approximate PSP CPU clock, used to convert cycle charges to microseconds
pub const CPU_HZ: u64 = 222_000_000;

/// Handle to a registered event kind
pub type EventType = usize;

/// An event that came due during `advance`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FiredEvent {
    pub event_type: EventType,
    pub userdata: u64,
    /// How far past the deadline virtual time had moved when it fired
    pub late_us: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ScheduledEvent {
    deadline_us: u64,
    /// FIFO tie-break for events sharing a deadline
    seq: u64,
    event_type: EventType,
    userdata: u64,
}

impl Ord for ScheduledEvent {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.deadline_us
            .cmp(&other.deadline_us)
            .then_with(|| self.seq.cmp(&other.seq))
    }
}

impl PartialOrd for ScheduledEvent {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Deterministic timer queue driving HLE callbacks
pub struct CoreTiming {
    now_us: u64,
    /// Guest CPU time charged by syscalls outside the event queue
    consumed_us: u64,
    event_names: Vec<&'static str>,
    queue: BinaryHeap<Reverse<ScheduledEvent>>,
    next_seq: u64,
}

impl CoreTiming {
    pub fn new() -> Self {
        Self {
            now_us: 0,
            consumed_us: 0,
            event_names: Vec::new(),
            queue: BinaryHeap::new(),
            next_seq: 0,
        }
    }

    /// Current virtual time in microseconds
    pub fn now_us(&self) -> u64 {
        self.now_us
    }

    /// Register a named event kind and return its handle.
    ///
    /// Re-registering the same name returns the existing handle.
    pub fn register_event(&mut self, name: &'static str) -> EventType {
        if let Some(idx) = self.event_names.iter().position(|&n| n == name) {
            return idx;
        }
        self.event_names.push(name);
        tracing::debug!("Registered timing event '{}' ({})", name, self.event_names.len() - 1);
        self.event_names.len() - 1
    }

    /// Re-associate an event handle restored from a save state with its name.
    ///
    /// Handles from older snapshots may be stale; an out-of-range or mismatched
    /// handle falls back to a fresh registration.
    pub fn restore_register_event(&mut self, ty: Option<EventType>, name: &'static str) -> EventType {
        match ty {
            Some(idx) if self.event_names.get(idx) == Some(&name) => idx,
            _ => self.register_event(name),
        }
    }

    pub fn event_name(&self, ty: EventType) -> Option<&'static str> {
        self.event_names.get(ty).copied()
    }

    /// Schedule an event `delay_us` from now
    pub fn schedule_event(&mut self, delay_us: u64, event_type: EventType, userdata: u64) {
        let ev = ScheduledEvent {
            deadline_us: self.now_us + delay_us,
            seq: self.next_seq,
            event_type,
            userdata,
        };
        self.next_seq += 1;
        self.queue.push(Reverse(ev));
        tracing::trace!(
            "Scheduled '{}' at +{}us",
            self.event_name(event_type).unwrap_or("?"),
            delay_us
        );
    }

    /// Drop every pending instance of an event kind
    pub fn unschedule_all(&mut self, event_type: EventType) {
        let kept: Vec<_> = self
            .queue
            .drain()
            .filter(|Reverse(ev)| ev.event_type != event_type)
            .collect();
        self.queue = kept.into_iter().collect();
    }

    /// Whether any instance of an event kind is pending
    pub fn is_scheduled(&self, event_type: EventType) -> bool {
        self.queue.iter().any(|Reverse(ev)| ev.event_type == event_type)
    }

    /// Charge guest CPU time without touching the event queue
    pub fn eat_us(&mut self, us: u64) {
        self.consumed_us += us;
    }

    /// Charge guest CPU cycles (converted at the nominal clock)
    pub fn eat_cycles(&mut self, cycles: u64) {
        self.eat_us(cycles * 1_000_000 / CPU_HZ);
    }

    /// Guest CPU time charged so far via `eat_us`/`eat_cycles`
    pub fn consumed_us(&self) -> u64 {
        self.consumed_us
    }

    /// Advance virtual time, returning the events that came due in order
    pub fn advance(&mut self, us: u64) -> Vec<FiredEvent> {
        let target = self.now_us + us;
        let mut fired = Vec::new();
        while let Some(Reverse(ev)) = self.queue.peek().copied() {
            if ev.deadline_us > target {
                break;
            }
            self.queue.pop();
            // Time jumps to each deadline so handlers observe consistent clocks
            self.now_us = ev.deadline_us.max(self.now_us);
            fired.push(FiredEvent {
                event_type: ev.event_type,
                userdata: ev.userdata,
                late_us: target - ev.deadline_us,
            });
        }
        self.now_us = target;
        fired
    }

    /// Deadline of the nearest pending event, if any
    pub fn next_deadline_us(&self) -> Option<u64> {
        self.queue.peek().map(|Reverse(ev)| ev.deadline_us)
    }

    pub fn pending_event_count(&self) -> usize {
        self.queue.len()
    }
}

impl Default for CoreTiming {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_event_dedup() {
        let mut timing = CoreTiming::new();
        let a = timing.register_event("volatile_unlock");
        let b = timing.register_event("volatile_unlock");
        assert_eq!(a, b);
        let c = timing.register_event("helper_tick");
        assert_ne!(a, c);
    }

    #[test]
    fn test_events_fire_in_order() {
        let mut timing = CoreTiming::new();
        let ev = timing.register_event("test");
        timing.schedule_event(300, ev, 3);
        timing.schedule_event(100, ev, 1);
        timing.schedule_event(200, ev, 2);

        let fired = timing.advance(250);
        assert_eq!(fired.len(), 2);
        assert_eq!(fired[0].userdata, 1);
        assert_eq!(fired[1].userdata, 2);
        assert_eq!(timing.now_us(), 250);

        let fired = timing.advance(100);
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].userdata, 3);
    }

    #[test]
    fn test_same_deadline_is_fifo() {
        let mut timing = CoreTiming::new();
        let ev = timing.register_event("test");
        timing.schedule_event(100, ev, 1);
        timing.schedule_event(100, ev, 2);

        let fired = timing.advance(100);
        assert_eq!(fired[0].userdata, 1);
        assert_eq!(fired[1].userdata, 2);
    }

    #[test]
    fn test_unschedule_all() {
        let mut timing = CoreTiming::new();
        let a = timing.register_event("a");
        let b = timing.register_event("b");
        timing.schedule_event(100, a, 0);
        timing.schedule_event(100, b, 0);
        timing.unschedule_all(a);

        assert!(!timing.is_scheduled(a));
        assert!(timing.is_scheduled(b));
        let fired = timing.advance(200);
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].event_type, b);
    }

    #[test]
    fn test_restore_register_event() {
        let mut timing = CoreTiming::new();
        let a = timing.register_event("a");
        // Matching handle survives restore
        assert_eq!(timing.restore_register_event(Some(a), "a"), a);
        // Stale or missing handles get re-registered
        let b = timing.restore_register_event(Some(99), "b");
        assert_eq!(timing.event_name(b), Some("b"));
        let c = timing.restore_register_event(None, "c");
        assert_eq!(timing.event_name(c), Some("c"));
    }

    #[test]
    fn test_eat_cycles() {
        let mut timing = CoreTiming::new();
        timing.eat_cycles(CPU_HZ); // one full second of cycles
        assert_eq!(timing.consumed_us(), 1_000_000);
    }
}
