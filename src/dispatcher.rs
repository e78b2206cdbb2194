//! Cooperative run-to-completion event dispatcher.
//!
//! A fixed-capacity FIFO of pending tasks plus a small timer table. Tasks
//! are plain values (usually an enum); the owner pops them one at a time
//! and runs each to completion before the next. Nothing here blocks and
//! nothing is preempted.
//!
//! ```text
//!   post()          ──────────────────────────────▶ ┌───────────┐
//!   post_after()    ──▶ ┌────────┐  release_due()   │ run queue │ ──▶ pop()
//!   post_periodic() ──▶ │ timers │ ───────────────▶ │  (FIFO)   │
//!                       └────────┘                  └───────────┘
//! ```
//!
//! The last `reserve` ring slots only take tasks posted with
//! [`post_reserved`](Dispatcher::post_reserved). Ordinary posts and timer
//! releases stop short of them, so a burst of ordinary work can never
//! crowd out a reserved event.
//!
//! Time is injected as milliseconds since boot, so the same code runs on
//! target (fed from `embassy_time::Instant`) and in host tests (fed from a
//! simulated clock).

use crate::error::Error;
use heapless::{Deque, Vec};

/// Handle of an armed timer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimerId(u16);

/// Posting side of a dispatcher.
///
/// Task handlers receive one of these so they can schedule follow-up work
/// without owning the dispatcher itself.
pub trait Scheduler<T>: CancelTimer {
    /// Enqueue `task` behind everything already queued.
    fn post(&mut self, task: T) -> Result<(), Error>;

    /// Enqueue `task` once, after `delay_ms`.
    fn post_after(&mut self, delay_ms: u32, task: T) -> Result<TimerId, Error>;

    /// Enqueue a copy of `task` every `interval_ms`, first after one interval.
    fn post_periodic(&mut self, interval_ms: u32, task: T) -> Result<TimerId, Error>;
}

/// Timer removal, independent of the task type.
pub trait CancelTimer {
    /// Disarm a timer. Copies already moved into the run queue still run.
    fn cancel(&mut self, id: TimerId);
}

struct Timer<T> {
    id: TimerId,
    due: u64,
    period: Option<u32>,
    task: T,
}

/// Run queue with `N` task slots and `M` timer slots.
pub struct Dispatcher<T, const N: usize, const M: usize> {
    queue: Deque<T, N>,
    timers: Vec<Timer<T>, M>,
    now: u64,
    next_id: u16,
    reserve: usize,
}

impl<T: Clone, const N: usize, const M: usize> Dispatcher<T, N, M> {
    /// Create an empty dispatcher at time zero.
    pub const fn new() -> Self {
        Self::with_reserve(0)
    }

    /// Like [`new`](Self::new), holding `reserve` ring slots back for
    /// [`post_reserved`](Self::post_reserved).
    pub const fn with_reserve(reserve: usize) -> Self {
        Self {
            queue: Deque::new(),
            timers: Vec::new(),
            now: 0,
            next_id: 0,
            reserve,
        }
    }

    /// Enqueue `task`, allowed to use the reserved slots.
    pub fn post_reserved(&mut self, task: T) -> Result<(), Error> {
        self.queue.push_back(task).map_err(|_| Error::QueueFull)
    }

    /// Latest time seen by [`release_due`](Self::release_due) (ms).
    pub fn now(&self) -> u64 {
        self.now
    }

    /// Number of tasks waiting in the run queue.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Number of armed timers.
    pub fn armed_timers(&self) -> usize {
        self.timers.len()
    }

    /// Earliest deadline among armed timers.
    pub fn next_deadline(&self) -> Option<u64> {
        self.timers.iter().map(|t| t.due).min()
    }

    /// Pop the oldest queued task.
    pub fn pop(&mut self) -> Option<T> {
        self.queue.pop_front()
    }

    /// Advance the clock to `now_ms` and move every expired timer into the
    /// run queue, earliest deadline first.
    ///
    /// Periodic timers are re-armed one period later; if the dispatcher fell
    /// more than a period behind, the missed ticks collapse into this one.
    /// Returns the number of tasks released.
    pub fn release_due(&mut self, now_ms: u64) -> usize {
        self.now = self.now.max(now_ms);
        let mut released = 0;

        while let Some(index) = self.earliest_expired() {
            let task = match self.timers[index].period {
                Some(period) => {
                    let period = u64::from(period.max(1));
                    let timer = &mut self.timers[index];
                    timer.due = if timer.due + period > self.now {
                        timer.due + period
                    } else {
                        self.now + period
                    };
                    timer.task.clone()
                }
                None => self.timers.swap_remove(index).task,
            };

            if self.push_ordinary(task).is_err() {
                warn!("run queue full - timer task dropped");
            } else {
                released += 1;
            }
        }

        released
    }

    /// Release due timers, then run queued tasks until the queue is empty.
    ///
    /// `handler` gets each task together with the dispatcher so it can
    /// post follow-ups; those run in this same pass, after whatever was
    /// queued before them. Returns the number of tasks executed.
    pub fn run_until_idle<F>(&mut self, now_ms: u64, mut handler: F) -> usize
    where
        F: FnMut(T, &mut Self),
    {
        self.release_due(now_ms);
        let mut executed = 0;
        while let Some(task) = self.pop() {
            handler(task, self);
            executed += 1;
        }
        executed
    }

    fn push_ordinary(&mut self, task: T) -> Result<(), Error> {
        if self.queue.len() + self.reserve >= N {
            return Err(Error::QueueFull);
        }
        self.post_reserved(task)
    }

    fn earliest_expired(&self) -> Option<usize> {
        self.timers
            .iter()
            .enumerate()
            .filter(|(_, t)| t.due <= self.now)
            .min_by_key(|(_, t)| (t.due, t.id.0))
            .map(|(index, _)| index)
    }

    fn arm(&mut self, delay_ms: u32, period: Option<u32>, task: T) -> Result<TimerId, Error> {
        let id = TimerId(self.next_id);
        let timer = Timer {
            id,
            due: self.now + u64::from(delay_ms),
            period,
            task,
        };
        self.timers
            .push(timer)
            .map_err(|_| Error::TimerSlotsFull)?;
        self.next_id = self.next_id.wrapping_add(1);
        Ok(id)
    }
}

impl<T: Clone, const N: usize, const M: usize> Default for Dispatcher<T, N, M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone, const N: usize, const M: usize> Scheduler<T> for Dispatcher<T, N, M> {
    fn post(&mut self, task: T) -> Result<(), Error> {
        self.push_ordinary(task)
    }

    fn post_after(&mut self, delay_ms: u32, task: T) -> Result<TimerId, Error> {
        self.arm(delay_ms, None, task)
    }

    fn post_periodic(&mut self, interval_ms: u32, task: T) -> Result<TimerId, Error> {
        self.arm(interval_ms, Some(interval_ms), task)
    }
}

impl<T: Clone, const N: usize, const M: usize> CancelTimer for Dispatcher<T, N, M> {
    fn cancel(&mut self, id: TimerId) {
        if let Some(index) = self.timers.iter().position(|t| t.id == id) {
            self.timers.swap_remove(index);
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Unit Tests (run on host, not embedded)
// ═══════════════════════════════════════════════════════════════════════════
