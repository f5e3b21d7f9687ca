use super::command::Command;
use super::timer::TimerEntry;

use std::collections::BinaryHeap;
use std::io;
use std::sync::atomic::Ordering;
use std::sync::mpsc::{Receiver, RecvTimeoutError, SendError, Sender, channel};
use std::thread::{self, JoinHandle};
use std::time::Instant;

/// Cloneable sending side of the reactor's command channel.
#[derive(Clone)]
pub(crate) struct ReactorHandle {
    sender: Sender<Command>,
}

impl ReactorHandle {
    pub(crate) fn send(&self, command: Command) -> Result<(), SendError<Command>> {
        self.sender.send(command)
    }
}

/// Timer driver.
///
/// The reactor owns a min-heap of timers and sleeps on its command
/// channel until either a new command arrives or the earliest deadline
/// is reached, at which point every expired timer is fired.
pub(crate) struct Reactor {
    receiver: Receiver<Command>,
    timers: BinaryHeap<TimerEntry>,
}

impl Reactor {
    pub(crate) fn new() -> (Self, ReactorHandle) {
        let (sender, receiver) = channel();

        (
            Self {
                receiver,
                timers: BinaryHeap::new(),
            },
            ReactorHandle { sender },
        )
    }

    /// Starts the reactor on a dedicated thread named `{prefix}-reactor`.
    pub(crate) fn start(prefix: &str) -> io::Result<(ReactorHandle, JoinHandle<()>)> {
        let (mut reactor, handle) = Self::new();

        let thread = thread::Builder::new()
            .name(format!("{prefix}-reactor"))
            .spawn(move || reactor.run())?;

        Ok((handle, thread))
    }

    /// Runs the reactor loop until [`Command::Shutdown`] is received or
    /// every handle has been dropped.
    pub(crate) fn run(&mut self) {
        loop {
            let command = match self.timers.peek() {
                Some(timer) => {
                    let timeout = timer.deadline.saturating_duration_since(Instant::now());

                    match self.receiver.recv_timeout(timeout) {
                        Ok(command) => Some(command),
                        Err(RecvTimeoutError::Timeout) => None,
                        Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                None => match self.receiver.recv() {
                    Ok(command) => Some(command),
                    Err(_) => break,
                },
            };

            match command {
                Some(Command::SetTimer {
                    deadline,
                    waker,
                    cancelled,
                }) => self.timers.push(TimerEntry {
                    deadline,
                    waker,
                    cancelled,
                }),
                Some(Command::Shutdown) => break,
                None => {}
            }

            self.fire_expired();
        }

        tracing::trace!(pending = self.timers.len(), "reactor stopped");
    }

    fn fire_expired(&mut self) {
        let now = Instant::now();

        while let Some(timer) = self.timers.peek() {
            if timer.deadline > now {
                break;
            }

            let Some(timer) = self.timers.pop() else {
                break;
            };

            if timer.cancelled.load(Ordering::Acquire) {
                continue;
            }

            timer.waker.wake();
        }
    }
}
