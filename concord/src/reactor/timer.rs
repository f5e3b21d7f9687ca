use std::cmp::Ordering;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::task::Waker;
use std::time::Instant;

/// An entry in the reactor timer queue.
///
/// Entries live in a `BinaryHeap` ordered by deadline. The entry may be
/// cancelled by its sleep future before it fires.
pub(crate) struct TimerEntry {
    pub(crate) deadline: Instant,
    pub(crate) waker: Waker,
    pub(crate) cancelled: Arc<AtomicBool>,
}

impl Eq for TimerEntry {}

impl PartialEq for TimerEntry {
    fn eq(&self, other: &Self) -> bool {
        self.deadline.eq(&other.deadline)
    }
}

impl Ord for TimerEntry {
    /// Reversed so that the heap pops the earliest deadline first.
    fn cmp(&self, other: &Self) -> Ordering {
        other.deadline.cmp(&self.deadline)
    }
}

impl PartialOrd for TimerEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
