//! Trailing-edge debounce timers, one pending slot per effect channel.
//!
//! A burst of `schedule` calls for the same channel collapses into a single
//! firing, one quiet period after the last call. Each pending timer is a
//! short-lived thread waiting on its own channel, so a firing never runs on
//! the caller's thread. The slot map's lock serializes schedule, cancel, and
//! the fire decision: a canceled timer never fires, a fired timer never
//! double-executes, and a reset arriving during the fire window pushes the
//! deadline out instead of getting lost.

use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

type Action = Box<dyn FnOnce() + Send + 'static>;

enum TimerMsg {
    /// Replace the pending action and restart the quiet period.
    Reset(Action),
    Cancel,
}

struct Slot {
    tx: Sender<TimerMsg>,
    generation: u64,
}

struct Inner {
    slots: HashMap<String, Slot>,
    next_generation: u64,
}

pub struct DebounceScheduler {
    inner: Arc<Mutex<Inner>>,
    quiet: Duration,
}

impl DebounceScheduler {
    pub fn new(quiet: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                slots: HashMap::new(),
                next_generation: 0,
            })),
            quiet,
        }
    }

    pub fn quiet_period(&self) -> Duration {
        self.quiet
    }

    /// Arm (or re-arm) the channel's timer to run `action` after the quiet
    /// period. If a timer is already pending its deadline resets and `action`
    /// replaces the one it carried.
    pub fn schedule<F>(&self, channel: &str, action: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let Ok(mut inner) = self.inner.lock() else {
            return;
        };

        let mut action: Action = Box::new(action);
        if let Some(slot) = inner.slots.get(channel) {
            match slot.tx.send(TimerMsg::Reset(action)) {
                Ok(()) => return,
                // Timer thread already exited after firing; fall through and
                // start a fresh one with the action handed back to us.
                Err(mpsc::SendError(msg)) => match msg {
                    TimerMsg::Reset(recovered) => action = recovered,
                    TimerMsg::Cancel => return,
                },
            }
        }

        let generation = inner.next_generation;
        inner.next_generation += 1;
        let (tx, rx) = mpsc::channel();
        inner.slots.insert(channel.to_string(), Slot { tx, generation });

        let map = Arc::clone(&self.inner);
        let name = channel.to_string();
        let quiet = self.quiet;
        thread::spawn(move || run_timer(map, name, generation, quiet, rx, action));
    }

    /// Dispose the channel's pending timer without firing it.
    pub fn cancel(&self, channel: &str) {
        if let Ok(mut inner) = self.inner.lock() {
            if let Some(slot) = inner.slots.remove(channel) {
                let _ = slot.tx.send(TimerMsg::Cancel);
            }
        }
    }

    /// Dispose every pending timer without firing. Used at shutdown.
    pub fn cancel_all(&self) {
        if let Ok(mut inner) = self.inner.lock() {
            for (_, slot) in inner.slots.drain() {
                let _ = slot.tx.send(TimerMsg::Cancel);
            }
        }
    }
}

impl Drop for DebounceScheduler {
    fn drop(&mut self) {
        self.cancel_all();
    }
}

fn run_timer(
    inner: Arc<Mutex<Inner>>,
    channel: String,
    generation: u64,
    quiet: Duration,
    rx: Receiver<TimerMsg>,
    mut action: Action,
) {
    loop {
        match rx.recv_timeout(quiet) {
            Ok(TimerMsg::Reset(next)) => action = next,
            Ok(TimerMsg::Cancel) | Err(RecvTimeoutError::Disconnected) => return,
            Err(RecvTimeoutError::Timeout) => {
                // Claim the slot under the map lock. A concurrent schedule()
                // either already landed as a Reset (drained here) or blocks
                // on the lock and finds the slot released.
                let Ok(mut guard) = inner.lock() else {
                    return;
                };
                match rx.try_recv() {
                    Ok(TimerMsg::Reset(next)) => {
                        action = next;
                        drop(guard);
                    }
                    Ok(TimerMsg::Cancel) | Err(TryRecvError::Disconnected) => {
                        release_if_owner(&mut guard, &channel, generation);
                        return;
                    }
                    Err(TryRecvError::Empty) => {
                        release_if_owner(&mut guard, &channel, generation);
                        drop(guard);
                        action();
                        return;
                    }
                }
            }
        }
    }
}

fn release_if_owner(inner: &mut Inner, channel: &str, generation: u64) {
    if inner.slots.get(channel).map(|s| s.generation) == Some(generation) {
        inner.slots.remove(channel);
    }
}
