//! Operator trigger queue.
//!
//! The operator surface calls [`TriggerQueue::trigger`], which only records
//! that one more test iteration is wanted and returns at once. The context
//! owning the tester drains the queue one run at a time, so runs never
//! overlap no matter how often the trigger fires.

use super::primitives::CriticalSectionCell;

#[derive(Debug, Default)]
struct QueueState {
    pending: u32,
    closed: bool,
}

/// Counter of requested test iterations shared with the operator surface
#[derive(Default)]
pub struct TriggerQueue {
    state: CriticalSectionCell<QueueState>,
}

impl TriggerQueue {
    /// Create an open, empty queue (const, suitable for statics).
    pub const fn new() -> Self {
        Self {
            state: CriticalSectionCell::new(QueueState {
                pending: 0,
                closed: false,
            }),
        }
    }

    /// Request one more test iteration.
    ///
    /// Returns `false` when the queue has been closed for detach. The result
    /// of the run itself is only reported on the log.
    pub fn trigger(&self) -> bool {
        let accepted = self.state.with(|s| {
            if s.closed {
                false
            } else {
                s.pending = s.pending.saturating_add(1);
                true
            }
        });

        if accepted {
            log::debug!("test iteration queued");
        } else {
            log::warn!("trigger refused: detach in progress");
        }
        accepted
    }

    /// Dequeue one requested iteration, if any.
    pub fn take(&self) -> bool {
        self.state.with(|s| {
            if s.pending == 0 {
                false
            } else {
                s.pending -= 1;
                true
            }
        })
    }

    /// Refuse further triggers. Already queued iterations stay queued.
    pub fn close(&self) {
        self.state.with(|s| s.closed = true);
    }

    /// Whether [`close`](Self::close) has been called
    pub fn is_closed(&self) -> bool {
        self.state.with_ref(|s| s.closed)
    }

    /// Number of queued iterations
    pub fn pending(&self) -> u32 {
        self.state.with_ref(|s| s.pending)
    }
}

impl core::fmt::Debug for TriggerQueue {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let (pending, closed) = self.state.with_ref(|s| (s.pending, s.closed));
        f.debug_struct("TriggerQueue")
            .field("pending", &pending)
            .field("closed", &closed)
            .finish()
    }
}
