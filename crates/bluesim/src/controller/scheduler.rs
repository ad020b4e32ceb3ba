//! Deferred-task scheduling
//!
//! The controller never blocks: every delayed step is recorded as a [`Task`]
//! value and handed to a [`TaskScheduler`]. The owning context pops due
//! tasks and feeds them back through `LinkLayerController::run_task`, so a
//! scheduled task carries the data it needs instead of a closure over the
//! controller.

use crate::address::Address;
use crate::controller::security::PairingType;
use crate::hci::types::{ErrorCode, Handle};
use crate::link::LinkLayerPacket;
use crate::hci::Phy;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Identifier of a scheduled task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TaskId(pub u64);

impl TaskId {
    /// Reserved id returned when no scheduler is registered
    pub const INVALID: TaskId = TaskId(0);
}

/// A deferred controller action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Task {
    /// Put a link-layer packet on the radio
    Transmit { packet: LinkLayerPacket, phy: Phy },
    /// Report a forwarded ACL packet as completed to the host
    NotifyCompletedPackets { handle: Handle },
    /// Finish a disconnect by reporting completion to the host
    DisconnectCleanup { handle: Handle, reason: ErrorCode },
    /// Start authentication for a freshly created connection
    AuthenticationRequest { peer: Address, handle: Handle },
    /// Begin the IO-capability exchange with a peer
    StartSimplePairing { peer: Address },
    /// Ask the host for the user interaction matching the pairing type
    PairingStage1 { peer: Address, pairing_type: PairingType },
    /// Report authentication completion for the active pairing
    PairingStage2 { peer: Address },
    /// Report the simple-pairing outcome to the host
    SimplePairingComplete { peer: Address, status: ErrorCode },
    /// Deliver the negotiated link key to the host
    LinkKeyNotification { peer: Address, key: [u8; 16] },
    /// Send the encryption request for a BR/EDR connection
    SetConnectionEncryption { peer: Address, handle: Handle, encryption_enable: u8 },
    /// Send the encryption request for an LE connection
    LeEnableEncryption { handle: Handle, rand: [u8; 8], ediv: u16, ltk: [u8; 16] },
    /// Answer an accepted page with a response and a new connection
    CompletePageAccept { peer: Address, try_role_switch: bool },
    /// Answer a rejected page
    CompletePageReject { peer: Address, reason: ErrorCode },
    /// End a running inquiry
    InquiryTimeout,
    /// Report a packet-type change as completed
    PacketTypeChanged { handle: Handle, packet_types: u16 },
    /// Report an LE connection-update result
    LeConnectionUpdateComplete {
        handle: Handle,
        interval_min: u16,
        interval_max: u16,
        latency: u16,
        supervision_timeout: u16,
    },
}

/// Scheduler contract used by the controller
pub trait TaskScheduler {
    /// Run `task` once after `delay`
    fn schedule(&mut self, delay: Duration, task: Task) -> TaskId;

    /// Run `task` after `initial`, then every `period`
    fn schedule_periodic(&mut self, initial: Duration, period: Duration, task: Task) -> TaskId;

    /// Cancel a scheduled task; unknown ids are ignored
    fn cancel(&mut self, id: TaskId);
}

struct Entry {
    due: Duration,
    seq: u64,
    id: TaskId,
    task: Task,
    period: Option<Duration>,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl Eq for Entry {}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap; invert so the earliest (due, seq) pops first
        (other.due, other.seq).cmp(&(self.due, self.seq))
    }
}

/// Deterministic virtual-time scheduler
///
/// Tasks pop in (due, insertion) order. Time only moves when the owner
/// calls [`TaskQueue::advance_to`], which makes test runs reproducible.
pub struct TaskQueue {
    now: Duration,
    next_seq: u64,
    next_id: u64,
    cancelled: Vec<TaskId>,
    heap: BinaryHeap<Entry>,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            next_seq: 0,
            next_id: 1,
            cancelled: Vec::new(),
            heap: BinaryHeap::new(),
        }
    }

    pub fn now(&self) -> Duration {
        self.now
    }

    /// Move the virtual clock forward; time never goes backwards
    pub fn advance_to(&mut self, now: Duration) {
        if now > self.now {
            self.now = now;
        }
    }

    /// Pop the next task due at or before the current time
    pub fn pop_due(&mut self) -> Option<Task> {
        while let Some(entry) = self.heap.peek() {
            if entry.due > self.now {
                return None;
            }
            let entry = self.heap.pop().unwrap();
            if let Some(pos) = self.cancelled.iter().position(|id| *id == entry.id) {
                self.cancelled.swap_remove(pos);
                continue;
            }
            if let Some(period) = entry.period {
                self.push(entry.due + period, entry.id, entry.task.clone(), Some(period));
            }
            return Some(entry.task);
        }
        None
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    fn push(&mut self, due: Duration, id: TaskId, task: Task, period: Option<Duration>) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Entry { due, seq, id, task, period });
    }

    fn allocate_id(&mut self) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        id
    }
}

impl Default for TaskQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskScheduler for Arc<Mutex<TaskQueue>> {
    fn schedule(&mut self, delay: Duration, task: Task) -> TaskId {
        let mut queue = self.lock().unwrap();
        let id = queue.allocate_id();
        let due = queue.now + delay;
        queue.push(due, id, task, None);
        id
    }

    fn schedule_periodic(&mut self, initial: Duration, period: Duration, task: Task) -> TaskId {
        let mut queue = self.lock().unwrap();
        let id = queue.allocate_id();
        let due = queue.now + initial;
        queue.push(due, id, task, Some(period));
        id
    }

    fn cancel(&mut self, id: TaskId) {
        if id == TaskId::INVALID {
            return;
        }
        self.lock().unwrap().cancelled.push(id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn queue() -> Arc<Mutex<TaskQueue>> {
        Arc::new(Mutex::new(TaskQueue::new()))
    }

    #[test]
    fn test_tasks_pop_in_due_order() {
        let mut q = queue();
        q.schedule(Duration::from_millis(20), Task::InquiryTimeout);
        q.schedule(
            Duration::from_millis(5),
            Task::DisconnectCleanup {
                handle: 1,
                reason: ErrorCode::ConnectionTerminatedByLocalHost,
            },
        );

        let mut inner = q.lock().unwrap();
        inner.advance_to(Duration::from_millis(25));
        assert_eq!(
            inner.pop_due(),
            Some(Task::DisconnectCleanup {
                handle: 1,
                reason: ErrorCode::ConnectionTerminatedByLocalHost,
            })
        );
        assert_eq!(inner.pop_due(), Some(Task::InquiryTimeout));
        assert_eq!(inner.pop_due(), None);
    }

    #[test]
    fn test_ties_break_by_insertion_order() {
        let mut q = queue();
        q.schedule(Duration::from_millis(5), Task::NotifyCompletedPackets { handle: 1 });
        q.schedule(Duration::from_millis(5), Task::NotifyCompletedPackets { handle: 2 });

        let mut inner = q.lock().unwrap();
        inner.advance_to(Duration::from_millis(5));
        assert_eq!(inner.pop_due(), Some(Task::NotifyCompletedPackets { handle: 1 }));
        assert_eq!(inner.pop_due(), Some(Task::NotifyCompletedPackets { handle: 2 }));
    }

    #[test]
    fn test_nothing_due_before_delay() {
        let mut q = queue();
        q.schedule(Duration::from_millis(10), Task::InquiryTimeout);

        let mut inner = q.lock().unwrap();
        inner.advance_to(Duration::from_millis(9));
        assert_eq!(inner.pop_due(), None);
    }

    #[test]
    fn test_cancel() {
        let mut q = queue();
        let id = q.schedule(Duration::from_millis(10), Task::InquiryTimeout);
        q.cancel(id);
        // Unknown and reserved ids are ignored
        q.cancel(TaskId(999));
        q.cancel(TaskId::INVALID);

        let mut inner = q.lock().unwrap();
        inner.advance_to(Duration::from_millis(20));
        assert_eq!(inner.pop_due(), None);
    }

    #[test]
    fn test_periodic_rearms() {
        let mut q = queue();
        let id = q.schedule_periodic(
            Duration::from_millis(10),
            Duration::from_millis(10),
            Task::InquiryTimeout,
        );

        {
            let mut inner = q.lock().unwrap();
            inner.advance_to(Duration::from_millis(30));
            assert_eq!(inner.pop_due(), Some(Task::InquiryTimeout));
            assert_eq!(inner.pop_due(), Some(Task::InquiryTimeout));
            assert_eq!(inner.pop_due(), Some(Task::InquiryTimeout));
            assert_eq!(inner.pop_due(), None);
        }

        q.cancel(id);
        let mut inner = q.lock().unwrap();
        inner.advance_to(Duration::from_millis(60));
        assert_eq!(inner.pop_due(), None);
    }
}
