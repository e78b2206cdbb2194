//! Application controller - owns all core state and runs one task at a time.
//!
//! Every piece of deferred work is a [`Task`] value posted to the
//! dispatcher. The [`Controller`] is the only owner of the connection
//! state and the streaming flag; lower layers (BLE callbacks, timers) only
//! post tasks.
//!
//! ```text
//!  GateCheck ──(streaming && connected)──▶ Sample ──┬─ not ready ─▶ Sample (+10 ms)
//!   (1 s)                                           ├─ ready ─────▶ Transmit (+1 s) ─▶ 2 chunks
//!                                                   └─ timeout / error ─▶ log
//! ```
//!
//! Cycles are independent: a tick that arrives while an earlier cycle is
//! still polling or settling starts its own.

use crate::command::{Command, CommandInterpreter, InboundFrame};
use crate::config::{SAMPLE_PERIOD_MS, SENSOR_POLL_INTERVAL_MS, SENSOR_POLL_TIMEOUT_MS, SETTLE_DELAY_MS};
use crate::connection::{ConnectionState, Indicator, Link};
use crate::dispatcher::Scheduler;
use crate::error::Error;
use crate::sensor::{poll_step, AirSensor, Measurement, SampleOutcome};
use crate::telemetry::{encode_measurement, Transport};

/// Deferred unit of work.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Task {
    /// Periodic: decide whether a sampling cycle should start.
    GateCheck,
    /// One step of a sampling cycle; gives up once `deadline_ms` passes.
    Sample { deadline_ms: u64 },
    /// Send a reading after the settle delay.
    Transmit(Measurement),
    /// Periodic while connected: toggle the indicator.
    BlinkIndicator,
    /// A central connected.
    Connected,
    /// The central disconnected.
    Disconnected,
    /// A GATT write arrived.
    DataWritten(InboundFrame),
}

/// The external collaborators the controller drives.
pub struct Hardware<S, T, I> {
    pub sensor: S,
    pub transport: T,
    pub indicator: I,
}

/// Core state plus the task handlers.
pub struct Controller {
    link: Link,
    streaming: bool,
    commands: CommandInterpreter,
}

impl Controller {
    /// `rx_handle` is the value handle of the command characteristic.
    pub const fn new(rx_handle: u16) -> Self {
        Self {
            link: Link::new(),
            streaming: false,
            commands: CommandInterpreter::new(rx_handle),
        }
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.link.state()
    }

    pub fn is_streaming(&self) -> bool {
        self.streaming
    }

    /// Arm the periodic gate-check. Call once before dispatching.
    pub fn start<Q: Scheduler<Task>>(&mut self, queue: &mut Q) -> Result<(), Error> {
        queue.post_periodic(SAMPLE_PERIOD_MS, Task::GateCheck)?;
        Ok(())
    }

    /// Run one task to completion.
    pub fn handle<Q, S, T, I>(&mut self, task: Task, now_ms: u64, queue: &mut Q, hw: &mut Hardware<S, T, I>)
    where
        Q: Scheduler<Task>,
        S: AirSensor,
        T: Transport,
        I: Indicator,
    {
        let result = match task {
            Task::GateCheck => self.gate_check(now_ms, queue),
            Task::Sample { deadline_ms } => self.sample(now_ms, deadline_ms, queue, &mut hw.sensor),
            Task::Transmit(m) => {
                transmit(&m, &mut hw.transport);
                Ok(())
            }
            Task::BlinkIndicator => {
                self.link.on_blink(&mut hw.indicator);
                Ok(())
            }
            Task::Connected => self.link.on_connected(queue, Task::BlinkIndicator),
            Task::Disconnected => {
                self.link.on_disconnected(queue, &mut hw.indicator, &mut hw.transport);
                Ok(())
            }
            Task::DataWritten(frame) => {
                self.on_data_written(&frame);
                Ok(())
            }
        };

        if let Err(e) = result {
            warn!("task dropped: {}", e);
        }
    }

    fn gate_check<Q: Scheduler<Task>>(&mut self, now_ms: u64, queue: &mut Q) -> Result<(), Error> {
        if !self.streaming || !self.link.is_connected() {
            return Ok(());
        }
        queue.post(Task::Sample {
            deadline_ms: now_ms + u64::from(SENSOR_POLL_TIMEOUT_MS),
        })
    }

    fn sample<Q, S>(&mut self, now_ms: u64, deadline_ms: u64, queue: &mut Q, sensor: &mut S) -> Result<(), Error>
    where
        Q: Scheduler<Task>,
        S: AirSensor,
    {
        // Paused between the gate-check and this step.
        if !self.streaming {
            return Ok(());
        }

        match poll_step(sensor, now_ms, deadline_ms) {
            None => queue
                .post_after(SENSOR_POLL_INTERVAL_MS, Task::Sample { deadline_ms })
                .map(drop),
            Some(SampleOutcome::Ready(m)) => {
                info!(
                    "eCO2 reading: {=u16} ppm, TVOC reading: {=u16} ppb",
                    m.eco2_ppm,
                    m.tvoc_ppb
                );
                queue.post_after(SETTLE_DELAY_MS, Task::Transmit(m)).map(drop)
            }
            Some(SampleOutcome::TimedOut) => {
                warn!("sensor not ready before deadline - cycle skipped");
                Ok(())
            }
            Some(SampleOutcome::DeviceError(e)) => {
                warn!("sensor read failed: {}", e);
                Ok(())
            }
        }
    }

    fn on_data_written(&mut self, frame: &InboundFrame) {
        match self.commands.interpret(frame) {
            Some(Command::StartStreaming) => {
                debug!("command: start streaming");
                self.streaming = true;
            }
            Some(Command::PauseStreaming) => {
                debug!("command: pause streaming");
                self.streaming = false;
            }
            None => {}
        }
    }
}

/// Write both chunks of a reading. Fire-and-forget: failures are logged.
fn transmit<T: Transport>(m: &Measurement, transport: &mut T) {
    for chunk in encode_measurement(m).iter() {
        if let Err(e) = transport.write_chunk(chunk) {
            warn!("telemetry write failed: {}", e);
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Unit Tests (run on host, not embedded)
// ═══════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::Dispatcher;
    use crate::error::{SensorError, TransportError};
    use crate::sensor::SensorStatus;
    use crate::telemetry::{chunk_text, Chunk};

    const RX: u16 = 0x0010;

    type Queue = Dispatcher<Task, 16, 8>;

    struct FakeSensor {
        ready: bool,
        value: Measurement,
    }

    impl AirSensor for FakeSensor {
        fn init(&mut self) -> Result<(), SensorError> {
            Ok(())
        }

        fn status(&mut self) -> Result<SensorStatus, SensorError> {
            Ok(SensorStatus(if self.ready { 0x98 } else { 0x90 }))
        }

        fn read(&mut self) -> Result<Measurement, SensorError> {
            Ok(self.value)
        }
    }

    #[derive(Default)]
    struct FakeRadio {
        sent: std::vec::Vec<Chunk>,
        advertise_requests: u32,
        fail_writes: bool,
    }

    impl Transport for FakeRadio {
        fn write_chunk(&mut self, chunk: &Chunk) -> Result<(), TransportError> {
            if self.fail_writes {
                return Err(TransportError::NotConnected);
            }
            self.sent.push(*chunk);
            Ok(())
        }

        fn start_advertising(&mut self) {
            self.advertise_requests += 1;
        }
    }

    #[derive(Default)]
    struct FakeLed {
        on: bool,
    }

    impl Indicator for FakeLed {
        fn set(&mut self, on: bool) {
            self.on = on;
        }

        fn toggle(&mut self) {
            self.on = !self.on;
        }
    }

    fn hardware(ready: bool) -> Hardware<FakeSensor, FakeRadio, FakeLed> {
        Hardware {
            sensor: FakeSensor {
                ready,
                value: Measurement::new(450, 12),
            },
            transport: FakeRadio::default(),
            indicator: FakeLed::default(),
        }
    }

    fn write(data: &[u8]) -> Task {
        Task::DataWritten(InboundFrame::new(RX, data))
    }

    #[test]
    fn commands_toggle_streaming_flag() {
        let mut ctl = Controller::new(RX);
        let mut q = Queue::new();
        let mut hw = hardware(true);

        ctl.handle(write(b"s"), 0, &mut q, &mut hw);
        assert!(ctl.is_streaming());
        ctl.handle(write(b"s"), 0, &mut q, &mut hw);
        assert!(ctl.is_streaming());
        ctl.handle(write(b"x"), 0, &mut q, &mut hw);
        assert!(ctl.is_streaming());
        ctl.handle(write(b"p"), 0, &mut q, &mut hw);
        assert!(!ctl.is_streaming());
    }

    #[test]
    fn writes_to_other_handles_are_ignored() {
        let mut ctl = Controller::new(RX);
        let mut q = Queue::new();
        let mut hw = hardware(true);

        ctl.handle(Task::DataWritten(InboundFrame::new(RX + 1, b"s")), 0, &mut q, &mut hw);
        assert!(!ctl.is_streaming());
    }

    #[test]
    fn gate_check_posts_nothing_unless_connected_and_streaming() {
        let mut ctl = Controller::new(RX);
        let mut q = Queue::new();
        let mut hw = hardware(true);

        // Streaming but disconnected.
        ctl.handle(write(b"s"), 0, &mut q, &mut hw);
        ctl.handle(Task::GateCheck, 0, &mut q, &mut hw);
        assert_eq!(q.pending(), 0);

        // Connected but paused.
        ctl.handle(Task::Connected, 0, &mut q, &mut hw);
        ctl.handle(write(b"p"), 0, &mut q, &mut hw);
        ctl.handle(Task::GateCheck, 0, &mut q, &mut hw);
        assert_eq!(q.pending(), 0);
    }

    #[test]
    fn gate_check_posts_one_sample_when_active() {
        let mut ctl = Controller::new(RX);
        let mut q = Queue::new();
        let mut hw = hardware(true);

        ctl.handle(Task::Connected, 0, &mut q, &mut hw);
        ctl.handle(write(b"s"), 0, &mut q, &mut hw);
        ctl.handle(Task::GateCheck, 100, &mut q, &mut hw);

        assert_eq!(q.pending(), 1);
        assert_eq!(
            q.pop(),
            Some(Task::Sample {
                deadline_ms: 100 + u64::from(SENSOR_POLL_TIMEOUT_MS)
            })
        );
    }

    #[test]
    fn ready_sample_schedules_transmit_after_settle_delay() {
        let mut ctl = Controller::new(RX);
        let mut q = Queue::new();
        let mut hw = hardware(true);

        ctl.handle(write(b"s"), 0, &mut q, &mut hw);
        ctl.handle(Task::Sample { deadline_ms: 2000 }, 0, &mut q, &mut hw);

        assert_eq!(q.next_deadline(), Some(u64::from(SETTLE_DELAY_MS)));
        q.release_due(u64::from(SETTLE_DELAY_MS));
        assert_eq!(q.pop(), Some(Task::Transmit(Measurement::new(450, 12))));
    }

    #[test]
    fn unready_sample_retries_then_times_out() {
        let mut ctl = Controller::new(RX);
        let mut q = Queue::new();
        let mut hw = hardware(false);

        ctl.handle(write(b"s"), 0, &mut q, &mut hw);
        ctl.handle(Task::Sample { deadline_ms: 20 }, 0, &mut q, &mut hw);
        assert_eq!(q.next_deadline(), Some(u64::from(SENSOR_POLL_INTERVAL_MS)));

        q.release_due(10);
        let retry = q.pop().unwrap();
        ctl.handle(retry, 10, &mut q, &mut hw);
        assert_eq!(q.armed_timers(), 1);

        // At the deadline: the cycle ends without another retry.
        q.release_due(20);
        let last = q.pop().unwrap();
        ctl.handle(last, 20, &mut q, &mut hw);
        assert_eq!(q.armed_timers(), 0);
        assert!(hw.transport.sent.is_empty());
    }

    #[test]
    fn sample_after_pause_does_nothing() {
        let mut ctl = Controller::new(RX);
        let mut q = Queue::new();
        let mut hw = hardware(true);

        ctl.handle(Task::Sample { deadline_ms: 2000 }, 0, &mut q, &mut hw);
        assert_eq!(q.armed_timers(), 0);
    }

    #[test]
    fn transmit_writes_eco2_then_tvoc() {
        let mut ctl = Controller::new(RX);
        let mut q = Queue::new();
        let mut hw = hardware(true);

        ctl.handle(Task::Transmit(Measurement::new(450, 12)), 0, &mut q, &mut hw);
        let sent: std::vec::Vec<&str> = hw.transport.sent.iter().map(chunk_text).collect();
        assert_eq!(sent, ["450", "12"]);
    }

    #[test]
    fn transmit_failures_are_swallowed() {
        let mut ctl = Controller::new(RX);
        let mut q = Queue::new();
        let mut hw = hardware(true);
        hw.transport.fail_writes = true;

        ctl.handle(Task::Transmit(Measurement::new(450, 12)), 0, &mut q, &mut hw);
        assert!(hw.transport.sent.is_empty());
    }

    #[test]
    fn start_arms_gate_check() {
        let mut ctl = Controller::new(RX);
        let mut q = Queue::new();
        ctl.start(&mut q).unwrap();
        assert_eq!(q.next_deadline(), Some(u64::from(SAMPLE_PERIOD_MS)));
    }

    #[test]
    fn gate_check_is_one_period_after_a_late_start() {
        let mut ctl = Controller::new(RX);
        let mut q = Queue::new();

        // Start-up ran for 1.5 s before the controller was started.
        q.release_due(1500);
        ctl.start(&mut q).unwrap();
        assert_eq!(q.next_deadline(), Some(1500 + u64::from(SAMPLE_PERIOD_MS)));
        assert_eq!(q.release_due(1500), 0);
    }
}
