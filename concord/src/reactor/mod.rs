//! Timer reactor.
//!
//! The reactor runs on its own thread and wakes sleeping tasks when
//! their deadline is reached. The executor talks to it through
//! [`command::Command`]s sent over a [`ReactorHandle`].

mod core;
mod timer;

pub(crate) mod command;

pub(crate) use self::core::{Reactor, ReactorHandle};
