//! Time utilities integrated with the runtime's timer reactor.
//!
//! - [`sleep`] suspends the task until a deadline,
//! - [`timeout`] drops a future that runs past its deadline,
//! - [`timeout_after`] interrupts it instead, so that it can unwind.

mod sleep;
mod timeout;
mod timeout_after;

#[doc(inline)]
pub use sleep::{Sleep, sleep};

#[doc(inline)]
pub use timeout::{Elapsed, Timeout, timeout};

#[doc(inline)]
pub use timeout_after::{TimeoutAfter, timeout_after};
