// src/crawl/deadline.rs
// =============================================================================
// DeadlineTimer: the wall-clock crawl budget.
//
// State machine:  Running --(counter hits zero)--> Expired --stop()--> Stopped
//                 Running --------------stop()----------------------> Stopped
//
// A background tokio task ticks once per second (first tick immediately).
// When the remaining-seconds counter is already zero on a tick, the timer
// expires: registered observers are called in registration order and the
// shared CancelSignal is fired. Expiry happens at most once.
//
// Usage:
//   let mut timer = DeadlineTimer::new(secs, cancel);
//   timer.register(|event| ...);   // before arm(), so nothing is missed
//   timer.arm();
//
// Rust concepts:
// - Arc<Shared>: the ticker task and the handle own the same state
// - AtomicU8 + compare_exchange: the Running -> Expired step can only win once
// - Mutex<Vec<..>>: observers can be added while the ticker runs
// - JoinHandle::abort: stop() and Drop kill the background task
// =============================================================================

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{info, trace};

use super::CancelSignal;

const TICK: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    Running,
    Expired,
    Stopped,
}

impl TimerState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => TimerState::Running,
            1 => TimerState::Expired,
            _ => TimerState::Stopped,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            TimerState::Running => 0,
            TimerState::Expired => 1,
            TimerState::Stopped => 2,
        }
    }
}

/// What observers receive when the crawl budget runs out
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeadlineEvent {
    pub crawl_time: Duration,
    pub info: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

type Observer = Arc<dyn Fn(&DeadlineEvent) + Send + Sync>;

struct Shared {
    state: AtomicU8,
    remaining: AtomicU64,
    crawl_time: Duration,
    observers: Mutex<Vec<(ObserverId, Observer)>>,
    next_observer: AtomicU64,
    cancel: CancelSignal,
}

impl Shared {
    fn state(&self) -> TimerState {
        TimerState::from_u8(self.state.load(Ordering::SeqCst))
    }

    fn observers(&self) -> std::sync::MutexGuard<'_, Vec<(ObserverId, Observer)>> {
        self.observers.lock().unwrap_or_else(|e| e.into_inner())
    }

    // Calls every observer with `event`, in registration order
    fn broadcast(&self, event: &DeadlineEvent) {
        // Snapshot so observers may (un)register without deadlocking
        let observers: Vec<Observer> = self.observers().iter().map(|(_, o)| o.clone()).collect();
        for observer in observers {
            observer(event);
        }
    }

    // Running -> Expired, exactly once
    fn expire(&self) {
        // Only the caller that flips Running to Expired goes on; a stop()
        // that got there first wins instead
        let won = self
            .state
            .compare_exchange(
                TimerState::Running.as_u8(),
                TimerState::Expired.as_u8(),
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_ok();
        if !won {
            return;
        }

        info!(crawl_time_secs = self.crawl_time.as_secs(), "crawl time elapsed");

        // Observers first, then the signal: by the time the crawl sees the
        // flag, everyone has been told
        self.broadcast(&DeadlineEvent {
            crawl_time: self.crawl_time,
            info: "Download Finished".to_string(),
        });
        self.cancel.cancel();
    }

    // One second passed. Returns false when the ticker should stop.
    fn tick(&self) -> bool {
        // stop() may have raced with this tick
        if self.state() != TimerState::Running {
            return false;
        }

        // The counter reaching zero is not enough: expiry happens on the
        // tick that finds it already at zero
        let remaining = self.remaining.load(Ordering::SeqCst);
        if remaining == 0 {
            self.expire();
            return false;
        }
        trace!(remaining_secs = remaining, "remaining crawl time");
        self.remaining.fetch_sub(1, Ordering::SeqCst);
        true
    }
}

pub struct DeadlineTimer {
    shared: Arc<Shared>,
    // None until arm() spawns the ticker
    task: Option<JoinHandle<()>>,
}

impl DeadlineTimer {
    // Builds a timer that is not ticking yet. Register observers, then call
    // arm(); an observer registered this way can never miss the expiry.
    pub fn new(crawl_time_secs: u64, cancel: CancelSignal) -> Self {
        let shared = Arc::new(Shared {
            state: AtomicU8::new(TimerState::Running.as_u8()),
            remaining: AtomicU64::new(crawl_time_secs),
            crawl_time: Duration::from_secs(crawl_time_secs),
            observers: Mutex::new(Vec::new()),
            next_observer: AtomicU64::new(0),
            cancel,
        });

        Self { shared, task: None }
    }

    // new() + arm() in one step. Must be called from inside a tokio runtime.
    pub fn start(crawl_time_secs: u64, cancel: CancelSignal) -> Self {
        let mut timer = Self::new(crawl_time_secs, cancel);
        timer.arm();
        timer
    }

    // Spawns the ticker task. Arming twice, or after stop(), does nothing.
    pub fn arm(&mut self) {
        if self.task.is_some() || self.state() != TimerState::Running {
            return;
        }

        // The task gets its own Arc so it can outlive this borrow of self
        let shared = Arc::clone(&self.shared);
        self.task = Some(tokio::spawn(async move {
            // interval() completes its first tick immediately, so a zero
            // budget expires right away
            let mut ticker = tokio::time::interval(TICK);
            loop {
                ticker.tick().await;
                // tick() returns false once the timer expired or was stopped
                if !shared.tick() {
                    break;
                }
            }
        }));
    }

    pub fn state(&self) -> TimerState {
        self.shared.state()
    }

    pub fn remaining_secs(&self) -> u64 {
        self.shared.remaining.load(Ordering::SeqCst)
    }

    /// Adds an observer called (synchronously) when the deadline expires
    pub fn register<F>(&self, observer: F) -> ObserverId
    where
        F: Fn(&DeadlineEvent) + Send + Sync + 'static,
    {
        let id = ObserverId(self.shared.next_observer.fetch_add(1, Ordering::SeqCst));
        self.shared.observers().push((id, Arc::new(observer)));
        id
    }

    /// Removes an observer; unknown ids are ignored
    pub fn unregister(&self, id: ObserverId) -> bool {
        let mut observers = self.shared.observers();
        // Compare lengths to tell whether the id was known
        let before = observers.len();
        observers.retain(|(oid, _)| *oid != id);
        observers.len() != before
    }

    /// Calls every registered observer with `event`, in registration order
    pub fn broadcast(&self, event: &DeadlineEvent) {
        self.shared.broadcast(event);
    }

    // Suppresses any further ticks or broadcasts. Safe to call repeatedly and
    // after expiry; returns the state the timer was in before.
    pub fn stop(&self) -> TimerState {
        // swap() both sets Stopped and tells us what it replaced
        let previous = self
            .shared
            .state
            .swap(TimerState::Stopped.as_u8(), Ordering::SeqCst);
        self.abort_task();
        TimerState::from_u8(previous)
    }

    fn abort_task(&self) {
        if let Some(task) = &self.task {
            task.abort();
        }
    }
}

impl Drop for DeadlineTimer {
    fn drop(&mut self) {
        self.abort_task();
    }
}
