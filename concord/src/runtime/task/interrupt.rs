use crate::error::Interrupt;
use crate::runtime::context::current_interrupt;

use std::sync::atomic::{AtomicU8, Ordering};

/// No interrupt is pending.
const NONE: u8 = 0;

/// A cancellation is pending.
const CANCELLED: u8 = 1;

/// A timeout is pending.
const TIMED_OUT: u8 = 2;

/// Per-task slot holding the interrupt waiting to be delivered.
///
/// Interrupts are only observed at suspension points: a wait queue or a
/// completion cell takes the pending interrupt when the task is about to
/// suspend, or when it is polled again while still suspended. A
/// cancellation outranks a timeout; posting a timeout never overwrites a
/// pending cancellation.
pub(crate) struct InterruptCell {
    pending: AtomicU8,
}

impl InterruptCell {
    pub(crate) fn new() -> Self {
        Self {
            pending: AtomicU8::new(NONE),
        }
    }

    /// Records `interrupt` for delivery at the next suspension point.
    pub(crate) fn post(&self, interrupt: Interrupt) {
        match interrupt {
            Interrupt::Cancelled => self.pending.store(CANCELLED, Ordering::Release),
            Interrupt::TimedOut => {
                let _ = self.pending.compare_exchange(
                    NONE,
                    TIMED_OUT,
                    Ordering::AcqRel,
                    Ordering::Acquire,
                );
            }
        }
    }

    /// Takes the pending interrupt, leaving the cell empty.
    pub(crate) fn take(&self) -> Option<Interrupt> {
        decode(self.pending.swap(NONE, Ordering::AcqRel))
    }

    /// Returns the pending interrupt without consuming it.
    pub(crate) fn peek(&self) -> Option<Interrupt> {
        decode(self.pending.load(Ordering::Acquire))
    }

    /// Clears the cell if `interrupt` is still the pending one.
    pub(crate) fn clear(&self, interrupt: Interrupt) -> bool {
        self.pending
            .compare_exchange(encode(interrupt), NONE, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

fn encode(interrupt: Interrupt) -> u8 {
    match interrupt {
        Interrupt::Cancelled => CANCELLED,
        Interrupt::TimedOut => TIMED_OUT,
    }
}

fn decode(raw: u8) -> Option<Interrupt> {
    match raw {
        CANCELLED => Some(Interrupt::Cancelled),
        TIMED_OUT => Some(Interrupt::TimedOut),
        _ => None,
    }
}

/// Takes the interrupt pending on the current task.
///
/// Returns `None` outside of a task.
pub(crate) fn take() -> Option<Interrupt> {
    current_interrupt().and_then(|cell| cell.take())
}

/// Puts `interrupt` back on the current task, to be delivered at the next
/// suspension point.
pub(crate) fn restore(interrupt: Interrupt) {
    if let Some(cell) = current_interrupt() {
        cell.post(interrupt);
    }
}

/// Returns `true` if an interrupt is waiting to be delivered to the
/// current task.
///
/// Always `false` when called outside of a task.
pub fn is_interrupt_pending() -> bool {
    current_interrupt().is_some_and(|cell| cell.peek().is_some())
}
