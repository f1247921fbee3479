use crate::error::{Error, Result};

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::Arc;
use std::sync::atomic::{self, AtomicBool};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::task::Waker;
use std::thread::{self, JoinHandle};
use std::time::Instant;

/// Requests accepted by the timer thread.
pub(crate) enum Command {
    SetTimer {
        deadline: Instant,
        waker: Waker,
        cancelled: Arc<AtomicBool>,
    },
    Shutdown,
}

/// An entry in the timer heap.
///
/// Ordered by deadline, reversed so that `BinaryHeap` pops the earliest
/// deadline first.
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
    fn cmp(&self, other: &Self) -> Ordering {
        other.deadline.cmp(&self.deadline)
    }
}

impl PartialOrd for TimerEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Cloneable sender side of the timer thread.
#[derive(Clone)]
pub(crate) struct TimerHandle {
    sender: Sender<Command>,
}

impl TimerHandle {
    pub(crate) fn send(&self, command: Command) -> Result<()> {
        self.sender.send(command).map_err(|_| Error::Shutdown)
    }
}

/// Dedicated thread that fires wakers when their deadline passes.
pub(crate) struct Timer {
    handle: TimerHandle,
    thread: Option<JoinHandle<()>>,
}

impl Timer {
    /// Starts the timer thread.
    pub(crate) fn start(thread_prefix: &str) -> Result<Self> {
        let (sender, receiver) = mpsc::channel();

        let thread = thread::Builder::new()
            .name(format!("{thread_prefix}-timer"))
            .spawn(move || run(receiver))
            .map_err(|err| Error::Config(format!("cannot spawn timer thread: {err}")))?;

        Ok(Self {
            handle: TimerHandle { sender },
            thread: Some(thread),
        })
    }

    pub(crate) fn handle(&self) -> TimerHandle {
        self.handle.clone()
    }

    /// Stops the timer thread. Pending timers never fire.
    pub(crate) fn shutdown(&mut self) {
        let _ = self.handle.send(Command::Shutdown);

        if let Some(thread) = self.thread.take() {
            if thread.thread().id() != thread::current().id() {
                let _ = thread.join();
            }
        }
    }
}

fn run(receiver: Receiver<Command>) {
    let mut timers = BinaryHeap::new();

    loop {
        let now = Instant::now();

        while timers
            .peek()
            .is_some_and(|entry: &TimerEntry| entry.deadline <= now)
        {
            if let Some(entry) = timers.pop()
                && !entry.cancelled.load(atomic::Ordering::Acquire)
            {
                entry.waker.wake();
            }
        }

        let command = match timers.peek() {
            Some(next) => match receiver.recv_timeout(next.deadline.saturating_duration_since(now)) {
                Ok(command) => command,
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => break,
            },
            None => match receiver.recv() {
                Ok(command) => command,
                Err(_) => break,
            },
        };

        match command {
            Command::SetTimer {
                deadline,
                waker,
                cancelled,
            } => timers.push(TimerEntry {
                deadline,
                waker,
                cancelled,
            }),
            Command::Shutdown => break,
        }
    }

    log::debug!("timer thread exiting with {} pending timers", timers.len());
}
