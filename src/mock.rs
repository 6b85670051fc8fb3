//! Recording doubles for unit tests

use alloc::collections::VecDeque;
use alloc::sync::Arc;
use alloc::vec::Vec;
use std::sync::Mutex;

use embedded_hal::delay::DelayNs;

use crate::command::{Command, DATA_HEADER, REG_DATA, REG_HEADER};
use crate::error::IoError;
use crate::hal::{Clock, PwmOutput, TemperatureSensor};
use crate::interface::{OutputLine, PanelInterface, Segment};

/// Observable side effect, in issue order
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    Command(u8, Vec<u8>),
    LineData(Vec<u8>),
    Set(OutputLine, bool),
    Delay(u32),
    PwmConfigure { duty_ns: u32, period_ns: u32 },
    PwmEnable,
    PwmDisable,
}

#[derive(Default)]
struct State {
    events: Vec<Event>,
    segments: Vec<(Vec<u8>, bool)>,
    pending_line: Option<Vec<u8>>,
    calls: usize,
    frames: usize,
    fail_frame: Option<usize>,
    fail_line: Option<OutputLine>,
    busy_script: VecDeque<bool>,
    stuck_busy: bool,
    busy_polls: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockError;

impl embedded_hal::pwm::Error for MockError {
    fn kind(&self) -> embedded_hal::pwm::ErrorKind {
        embedded_hal::pwm::ErrorKind::Other
    }
}

/// Panel interface that decodes frames back into commands and line data
#[derive(Clone, Default)]
pub struct MockInterface {
    state: Arc<Mutex<State>>,
}

impl MockInterface {
    pub fn new() -> Self {
        Self::default()
    }

    fn with<R>(&self, f: impl FnOnce(&mut State) -> R) -> R {
        f(&mut self.state.lock().unwrap())
    }

    pub fn pwm(&self) -> MockPwm {
        MockPwm {
            log: self.clone(),
            fail_configure: false,
            fail_enable: false,
        }
    }

    pub fn delay(&self) -> MockDelay {
        MockDelay { log: self.clone() }
    }

    pub fn events(&self) -> Vec<Event> {
        self.with(|state| state.events.clone())
    }

    pub fn clear(&self) {
        self.with(|state| state.events.clear());
    }

    pub fn segments(&self) -> Vec<(Vec<u8>, bool)> {
        self.with(|state| state.segments.clone())
    }

    pub fn commands(&self) -> Vec<(u8, Vec<u8>)> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Event::Command(register, payload) => Some((register, payload)),
                _ => None,
            })
            .collect()
    }

    pub fn lines(&self) -> Vec<Vec<u8>> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Event::LineData(bytes) => Some(bytes),
                _ => None,
            })
            .collect()
    }

    pub fn busy_polls(&self) -> usize {
        self.with(|state| state.busy_polls)
    }

    pub fn frame_count(&self) -> usize {
        self.with(|state| state.frames)
    }

    /// Fail the `call`-th frame (1-based)
    pub fn fail_frame(&self, call: usize) {
        self.with(|state| state.fail_frame = Some(call));
    }

    pub fn fail_line(&self, line: OutputLine) {
        self.with(|state| state.fail_line = Some(line));
    }

    pub fn script_busy(&self, levels: &[bool]) {
        self.with(|state| state.busy_script.extend(levels.iter().copied()));
    }

    pub fn stick_busy(&self) {
        self.with(|state| state.stuck_busy = true);
    }

    fn push(&self, event: Event) {
        self.with(|state| state.events.push(event));
    }
}

impl PanelInterface for MockInterface {
    fn send_frame(&mut self, segments: &[Segment<'_>]) -> Result<(), IoError> {
        self.with(|state| {
            state.calls += 1;
            if state.fail_frame == Some(state.calls) {
                return Err(IoError::Bus(embedded_hal::spi::ErrorKind::Other));
            }
            state.frames += 1;
            state.segments.extend(
                segments
                    .iter()
                    .map(|segment| (segment.bytes.to_vec(), segment.cs_change)),
            );

            match segments {
                [header, register, data, payload]
                    if header.bytes == [REG_HEADER] && data.bytes == [DATA_HEADER] =>
                {
                    let register = register.bytes.first().copied().unwrap_or_default();
                    state
                        .events
                        .push(Event::Command(register, payload.bytes.to_vec()));
                }
                [header, register, data]
                    if header.bytes == [REG_HEADER]
                        && register.bytes == [REG_DATA]
                        && data.bytes == [DATA_HEADER] =>
                {
                    state.pending_line = Some(Vec::new());
                }
                [byte] => {
                    if let Some(line) = state.pending_line.as_mut() {
                        line.extend_from_slice(byte.bytes);
                        if !byte.cs_change {
                            let line = state.pending_line.take().unwrap_or_default();
                            state.events.push(Event::LineData(line));
                        }
                    }
                }
                _ => {}
            }
            Ok(())
        })
    }

    fn is_busy(&mut self) -> Result<bool, IoError> {
        Ok(self.with(|state| {
            state.busy_polls += 1;
            state.stuck_busy || state.busy_script.pop_front().unwrap_or(false)
        }))
    }

    fn set_line(&mut self, line: OutputLine, high: bool) -> Result<(), IoError> {
        if self.with(|state| state.fail_line == Some(line)) {
            return Err(IoError::Pin(embedded_hal::digital::ErrorKind::Other));
        }
        self.push(Event::Set(line, high));
        Ok(())
    }
}

/// Register and payload of each command, for comparing against [`MockInterface::commands`]
pub fn wire(commands: &[Command]) -> Vec<(u8, Vec<u8>)> {
    commands
        .iter()
        .map(|command| (command.register(), command.payload().to_vec()))
        .collect()
}

pub struct MockPwm {
    log: MockInterface,
    pub fail_configure: bool,
    pub fail_enable: bool,
}

impl PwmOutput for MockPwm {
    type Error = MockError;

    fn configure(&mut self, duty_ns: u32, period_ns: u32) -> Result<(), Self::Error> {
        if self.fail_configure {
            return Err(MockError);
        }
        self.log.push(Event::PwmConfigure { duty_ns, period_ns });
        Ok(())
    }

    fn enable(&mut self) -> Result<(), Self::Error> {
        if self.fail_enable {
            return Err(MockError);
        }
        self.log.push(Event::PwmEnable);
        Ok(())
    }

    fn disable(&mut self) {
        self.log.push(Event::PwmDisable);
    }
}

pub struct MockDelay {
    log: MockInterface,
}

impl DelayNs for MockDelay {
    fn delay_ns(&mut self, _ns: u32) {}

    fn delay_ms(&mut self, ms: u32) {
        self.log.push(Event::Delay(ms));
    }
}

/// Clock advancing by `step` milliseconds on every read
pub struct StepClock {
    pub now: u64,
    pub step: u64,
}

impl StepClock {
    pub fn new(step: u64) -> Self {
        Self { now: 0, step }
    }
}

impl Clock for StepClock {
    fn now_ms(&mut self) -> u64 {
        let now = self.now;
        self.now += self.step;
        now
    }
}

pub struct FailingSensor;

impl TemperatureSensor for FailingSensor {
    type Error = ();

    fn read_millicelsius(&mut self) -> Result<i32, Self::Error> {
        Err(())
    }
}
