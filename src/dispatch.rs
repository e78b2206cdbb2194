//! The firmware's single run queue and the loop that drains it.
//!
//! BLE tasks and the controller share one [`TaskQueue`] behind a
//! critical-section mutex. Posting wakes the drain loop; while idle it
//! sleeps until the next timer deadline or the next post, whichever
//! comes first.

use core::cell::RefCell;

use airstream::{
    new_task_queue, AirSensor, CancelTimer, Controller, Error, Hardware, Indicator, Scheduler,
    Task, TaskQueue, TimerId, Transport,
};
use defmt::warn;
use embassy_futures::select::select;
use embassy_futures::yield_now;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::signal::Signal;
use embassy_time::{Instant, Timer};

static QUEUE: Mutex<CriticalSectionRawMutex, RefCell<TaskQueue>> =
    Mutex::new(RefCell::new(new_task_queue()));

static WAKE: Signal<CriticalSectionRawMutex, ()> = Signal::new();

/// Post from outside the controller (BLE event handlers).
pub fn post(task: Task) {
    if let Err(e) = SharedQueue.post(task) {
        warn!("event dropped: {}", e);
    }
}

/// Post a link event (Connected / Disconnected) into the reserved slots.
///
/// Never dropped: if even the reserve is taken, wait for the drain loop
/// to make room.
pub async fn post_link_event(task: Task) {
    while let Err(e) = SharedQueue::with(|q| q.post_reserved(task.clone())) {
        warn!("link event waiting for queue space: {}", e);
        yield_now().await;
    }
}

/// Bring the queue clock up to real time, so timers armed next are
/// measured from now rather than from boot.
pub fn sync_clock() {
    let now = Instant::now().as_millis();
    QUEUE.lock(|q| q.borrow_mut().release_due(now));
}

/// Handle onto the shared queue; every call locks for its own duration.
pub struct SharedQueue;

impl SharedQueue {
    fn with<R>(f: impl FnOnce(&mut TaskQueue) -> R) -> R {
        let r = QUEUE.lock(|q| f(&mut q.borrow_mut()));
        WAKE.signal(());
        r
    }
}

impl CancelTimer for SharedQueue {
    fn cancel(&mut self, id: TimerId) {
        QUEUE.lock(|q| q.borrow_mut().cancel(id));
    }
}

impl Scheduler<Task> for SharedQueue {
    fn post(&mut self, task: Task) -> Result<(), Error> {
        Self::with(|q| q.post(task))
    }

    fn post_after(&mut self, delay_ms: u32, task: Task) -> Result<TimerId, Error> {
        Self::with(|q| q.post_after(delay_ms, task))
    }

    fn post_periodic(&mut self, interval_ms: u32, task: Task) -> Result<TimerId, Error> {
        Self::with(|q| q.post_periodic(interval_ms, task))
    }
}

/// Drain the queue forever, one task at a time.
pub async fn run_forever<S, T, I>(controller: &mut Controller, hw: &mut Hardware<S, T, I>) -> !
where
    S: AirSensor,
    T: Transport,
    I: Indicator,
{
    let mut queue = SharedQueue;

    loop {
        let now = Instant::now().as_millis();
        let next = QUEUE.lock(|q| {
            let mut q = q.borrow_mut();
            q.release_due(now);
            q.pop()
        });

        if let Some(task) = next {
            controller.handle(task, now, &mut queue, hw);
            // Let the SoftDevice and BLE tasks run between tasks.
            yield_now().await;
            continue;
        }

        match QUEUE.lock(|q| q.borrow().next_deadline()) {
            Some(at) => {
                select(Timer::at(Instant::from_millis(at)), WAKE.wait()).await;
            }
            None => WAKE.wait().await,
        }
    }
}
