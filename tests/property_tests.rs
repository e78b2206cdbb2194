//! Property tests for the dispatcher, the connection lifecycle and the
//! telemetry encoding. Host only.

use airstream::command::InboundFrame;
use airstream::error::{SensorError, TransportError};
use airstream::sensor::SensorStatus;
use airstream::telemetry::{chunk_text, encode_decimal};
use airstream::{
    new_task_queue, AirSensor, Chunk, ConnectionState, Controller, Dispatcher, Hardware,
    Indicator, Measurement, Scheduler, Task, Transport,
};
use proptest::prelude::*;

// ── Dispatcher ordering ─────────────────────────────────────────────

proptest! {
    /// Whatever fits in the ring comes back out in posting order.
    #[test]
    fn posted_tasks_keep_fifo_order(tasks in proptest::collection::vec(any::<u16>(), 0..=16)) {
        let mut q: Dispatcher<u16, 16, 4> = Dispatcher::new();
        for t in &tasks {
            prop_assert!(q.post(*t).is_ok());
        }

        let mut seen = Vec::new();
        q.run_until_idle(0, |t, _| seen.push(t));
        prop_assert_eq!(seen, tasks);
    }

    /// One-shot timers are released in deadline order, never early.
    #[test]
    fn delayed_tasks_release_by_deadline(delays in proptest::collection::vec(0u32..5000, 1..=8)) {
        let mut q: Dispatcher<u32, 16, 8> = Dispatcher::new();
        for d in &delays {
            prop_assert!(q.post_after(*d, *d).is_ok());
        }

        let mut seen = Vec::new();
        let mut now = 0;
        while let Some(at) = q.next_deadline() {
            prop_assert!(at >= now);
            now = at;
            q.run_until_idle(now, |d, _| seen.push((d, now)));
        }

        for (delay, released_at) in &seen {
            prop_assert_eq!(u64::from(*delay), *released_at);
        }
        let mut sorted = delays.clone();
        sorted.sort_unstable();
        let order: Vec<u32> = seen.iter().map(|(d, _)| *d).collect();
        prop_assert_eq!(order, sorted);
    }
}

// ── Connection lifecycle ────────────────────────────────────────────

struct IdleSensor;

impl AirSensor for IdleSensor {
    fn init(&mut self) -> Result<(), SensorError> {
        Ok(())
    }

    fn status(&mut self) -> Result<SensorStatus, SensorError> {
        Ok(SensorStatus(0x98))
    }

    fn read(&mut self) -> Result<Measurement, SensorError> {
        Ok(Measurement::new(400, 0))
    }
}

#[derive(Default)]
struct Radio {
    advertise_requests: u32,
}

impl Transport for Radio {
    fn write_chunk(&mut self, _chunk: &Chunk) -> Result<(), TransportError> {
        Ok(())
    }

    fn start_advertising(&mut self) {
        self.advertise_requests += 1;
    }
}

#[derive(Default)]
struct Led {
    on: bool,
}

impl Indicator for Led {
    fn set(&mut self, on: bool) {
        self.on = on;
    }

    fn toggle(&mut self) {
        self.on = !self.on;
    }
}

#[derive(Debug, Clone)]
enum LinkOp {
    Connect,
    Disconnect,
    Start,
    Pause,
    Wait(u16),
}

fn arb_link_op() -> impl Strategy<Value = LinkOp> {
    prop_oneof![
        Just(LinkOp::Connect),
        Just(LinkOp::Disconnect),
        Just(LinkOp::Start),
        Just(LinkOp::Pause),
        (1u16..=3000).prop_map(LinkOp::Wait),
    ]
}

proptest! {
    /// State follows the last link event, every disconnect re-advertises
    /// exactly once, and the streaming flag only follows commands.
    #[test]
    fn link_events_drive_state(ops in proptest::collection::vec(arb_link_op(), 1..40)) {
        const RX: u16 = 0x0C;
        let mut q = new_task_queue();
        let mut ctl = Controller::new(RX);
        let mut hw = Hardware { sensor: IdleSensor, transport: Radio::default(), indicator: Led::default() };
        ctl.start(&mut q).unwrap();

        let mut now = 0u64;
        let mut expect_state = ConnectionState::Disconnected;
        let mut expect_streaming = false;
        let mut disconnects = 0;

        for op in ops {
            match op {
                LinkOp::Connect => {
                    q.post_reserved(Task::Connected).unwrap();
                    expect_state = ConnectionState::Connected;
                }
                LinkOp::Disconnect => {
                    q.post_reserved(Task::Disconnected).unwrap();
                    expect_state = ConnectionState::Disconnected;
                    disconnects += 1;
                }
                LinkOp::Start => {
                    q.post(Task::DataWritten(InboundFrame::new(RX, b"s"))).unwrap();
                    expect_streaming = true;
                }
                LinkOp::Pause => {
                    q.post(Task::DataWritten(InboundFrame::new(RX, b"p"))).unwrap();
                    expect_streaming = false;
                }
                LinkOp::Wait(ms) => now += u64::from(ms),
            }
            q.run_until_idle(now, |task, q| ctl.handle(task, now, q, &mut hw));

            prop_assert_eq!(ctl.connection_state(), expect_state);
            prop_assert_eq!(ctl.is_streaming(), expect_streaming);
            prop_assert_eq!(hw.transport.advertise_requests, disconnects);
            if expect_state == ConnectionState::Disconnected && disconnects > 0 {
                prop_assert!(hw.indicator.on);
            }
        }
    }
}

// ── Telemetry encoding ──────────────────────────────────────────────

proptest! {
    #[test]
    fn chunk_text_is_the_decimal_value(value in any::<u16>()) {
        let chunk = encode_decimal(value);
        let text = chunk_text(&chunk);
        prop_assert_eq!(text.parse::<u16>().unwrap(), value);
        prop_assert!(chunk[text.len()..].iter().all(|&b| b == 0));
    }
}
