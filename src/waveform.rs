//! Refresh state machine
//!
//! A refresh powers the panel, configures the controller, runs the four drawing
//! stages for a temperature dependent time each and discharges the panel:
//!
//! ```text
//! Idle -> PowerOn -> Init -> Compensate -> White -> Inverse -> Normal -> PowerOff -> Idle
//! ```
//!
//! Compensate and White read the displayed frame, Inverse and Normal the staged
//! one. A stage repeats whole passes over every line until its time has elapsed,
//! so at least one pass always runs. The first failing operation aborts the
//! refresh; nothing is retried and the sequencer stays in the failing state.

use alloc::vec::Vec;

use embedded_hal::delay::DelayNs;
use log::{debug, trace, warn};

use crate::command::Command;
use crate::config::PanelModel;
use crate::encoder::{LineEncoder, LineSelect, SCAN_PER_BYTE, Stage};
use crate::error::{Error, IoError};
use crate::frame::{Frame, FramePair};
use crate::hal::{Clock, PwmOutput, TemperatureSensor};
use crate::interface::{OutputLine, PanelInterface};
use crate::timing::stage_time_ms;
use crate::transport::Transport;

/// Refresh sequence states
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum State {
    /// No refresh running
    #[default]
    Idle,
    /// Powering the panel and pulsing reset
    PowerOn,
    /// Configuring the controller and charge pumps
    Init,
    /// Driving the inverse of the displayed image
    Compensate,
    /// Driving every dot white
    White,
    /// Driving the inverse of the staged image
    Inverse,
    /// Driving the staged image
    Normal,
    /// Flushing neutral lines and discharging
    PowerOff,
}

impl From<Stage> for State {
    fn from(stage: Stage) -> Self {
        match stage {
            Stage::Compensate => Self::Compensate,
            Stage::White => Self::White,
            Stage::Inverse => Self::Inverse,
            Stage::Normal => Self::Normal,
            Stage::PowerOff => Self::PowerOff,
        }
    }
}

/// Drives complete refreshes of one panel
pub struct Sequencer<I, P, T, C, D> {
    transport: Transport<I>,
    pwm: P,
    thermal: T,
    clock: C,
    delay: D,
    model: PanelModel,
    encoder: LineEncoder,
    scratch: Vec<u8>,
    state: State,
    stage_time_ms: u32,
}

impl<I, P, T, C, D> Sequencer<I, P, T, C, D>
where
    I: PanelInterface,
    P: PwmOutput,
    T: TemperatureSensor,
    C: Clock,
    D: DelayNs,
{
    /// Create a sequencer for `model`
    ///
    /// # Errors
    ///
    /// Returns `Error::OutOfMemory` if the line buffer cannot be allocated.
    pub fn new(
        transport: Transport<I>,
        pwm: P,
        thermal: T,
        clock: C,
        delay: D,
        model: PanelModel,
    ) -> Result<Self, Error> {
        let encoder = LineEncoder::new(model);
        let line_len =
            2 * model.bytes_per_line() + model.lines() / SCAN_PER_BYTE + encoder.filler();
        let mut scratch = Vec::new();
        scratch
            .try_reserve_exact(line_len)
            .map_err(|_| Error::OutOfMemory)?;
        scratch.resize(line_len, 0);

        Ok(Self {
            transport,
            pwm,
            thermal,
            clock,
            delay,
            model,
            encoder,
            scratch,
            state: State::Idle,
            stage_time_ms: 0,
        })
    }

    /// Current state; the failing state after an aborted refresh
    pub fn state(&self) -> State {
        self.state
    }

    /// Stage time computed for the last refresh
    pub fn stage_time_ms(&self) -> u32 {
        self.stage_time_ms
    }

    /// Panel model
    pub fn model(&self) -> PanelModel {
        self.model
    }

    /// Run one complete refresh
    ///
    /// On success the staged image becomes the displayed one and the sequencer
    /// returns to [`State::Idle`].
    pub fn draw(&mut self, frames: &mut FramePair) -> Result<(), Error> {
        match self.run(frames) {
            Ok(()) => {
                frames.commit();
                self.enter(State::Idle);
                Ok(())
            }
            Err(err) => {
                warn!("refresh aborted in {:?}: {}", self.state, err);
                Err(err)
            }
        }
    }

    /// Release the owned peripherals
    pub fn release(self) -> (Transport<I>, P, T, C, D) {
        (
            self.transport,
            self.pwm,
            self.thermal,
            self.clock,
            self.delay,
        )
    }

    fn enter(&mut self, state: State) {
        debug!("{:?} -> {:?}", self.state, state);
        self.state = state;
    }

    fn run(&mut self, frames: &FramePair) -> Result<(), Error> {
        self.enter(State::PowerOn);
        self.power_on()?;

        self.enter(State::Init);
        self.init()?;

        let millicelsius = self.thermal.read_millicelsius().map_err(|err| {
            warn!("temperature read failed: {:?}", err);
            Error::Io(IoError::Sensor)
        })?;
        self.stage_time_ms = stage_time_ms(self.model, millicelsius);
        debug!(
            "stage time {} ms at {} mC",
            self.stage_time_ms, millicelsius
        );

        for stage in Stage::DRAWING {
            self.enter(stage.into());
            let frame = if stage.reads_displayed() {
                &frames.displayed
            } else {
                &frames.staged
            };
            self.repeat_stage(frame, stage)?;
        }

        self.enter(State::PowerOff);
        self.power_off(&frames.staged)
    }

    fn power_on(&mut self) -> Result<(), Error> {
        self.pwm
            .enable()
            .map_err(|err| Error::Io(IoError::pwm(err)))?;
        self.transport.set_line(OutputLine::PanelOn, true)?;
        self.delay.delay_ms(10);

        self.transport.set_line(OutputLine::Border, true)?;
        self.transport.set_line(OutputLine::Reset, true)?;
        self.delay.delay_ms(5);
        self.transport.set_line(OutputLine::Reset, false)?;
        self.delay.delay_ms(5);
        self.transport.set_line(OutputLine::Reset, true)?;
        self.delay.delay_ms(5);
        Ok(())
    }

    fn init(&mut self) -> Result<(), Error> {
        self.transport.wait_ready()?;

        for command in [
            self.model.channel_select(),
            Command::DcFrequency,
            Command::OscillatorOn,
            Command::AdcDisable,
            Command::VcomLevel,
            self.model.gate_source_level(),
        ] {
            self.transport.send_command(command)?;
        }
        self.delay.delay_ms(5);

        self.transport.send_command(Command::LatchOn)?;
        self.transport.send_command(Command::LatchOff)?;

        self.transport.send_command(Command::ChargePumpPositiveOn)?;
        self.delay.delay_ms(30);
        // The panel sustains its own boost once the positive pump runs
        self.pwm.disable();

        self.transport.send_command(Command::ChargePumpNegativeOn)?;
        self.delay.delay_ms(30);
        self.transport.send_command(Command::ChargePumpVcomOn)?;
        self.delay.delay_ms(30);

        self.transport.send_command(Command::OutputDisable)
    }

    fn repeat_stage(&mut self, frame: &Frame, stage: Stage) -> Result<(), Error> {
        let start = self.clock.now_ms();
        let budget = u64::from(self.stage_time_ms);
        let mut passes = 0u32;
        loop {
            self.draw_pass(frame, stage)?;
            passes += 1;
            if self.clock.now_ms().saturating_sub(start) >= budget {
                break;
            }
        }
        trace!("{:?} done after {} passes", stage, passes);
        Ok(())
    }

    fn draw_pass(&mut self, frame: &Frame, stage: Stage) -> Result<(), Error> {
        for line in 0..frame.lines() {
            self.draw_line(frame, stage, LineSelect::Line(line))?;
        }
        Ok(())
    }

    fn draw_line(&mut self, frame: &Frame, stage: Stage, line: LineSelect) -> Result<(), Error> {
        self.transport
            .send_command(self.model.gate_source_level())?;
        let len = self.encoder.encode(frame, stage, line, &mut self.scratch)?;
        self.transport.send_line_data(&self.scratch[..len])?;
        self.transport.send_command(Command::OutputEnable)
    }

    // A failure here leaves the control lines wherever the teardown stopped
    fn power_off(&mut self, frame: &Frame) -> Result<(), Error> {
        self.draw_pass(frame, Stage::PowerOff)?;
        self.draw_line(frame, Stage::PowerOff, LineSelect::Dummy)?;

        self.delay.delay_ms(25);
        self.transport.set_line(OutputLine::Border, false)?;
        self.delay.delay_ms(250);
        self.transport.set_line(OutputLine::Border, true)?;

        self.transport.send_command(Command::LatchOn)?;
        self.transport.send_command(Command::OutputOff)?;
        self.transport.send_command(Command::ChargePumpVcomOff)?;
        self.transport.send_command(Command::ChargePumpNegativeOff)?;
        self.transport.send_command(Command::GateDischarge1)?;
        self.delay.delay_ms(120);

        self.transport.send_command(Command::ChargePumpPositiveOff)?;
        self.transport.send_command(Command::OscillatorOff)?;
        self.transport.send_command(Command::GateDischarge2)?;
        self.delay.delay_ms(40);
        self.transport.send_command(Command::GateDischarge3)?;
        self.delay.delay_ms(40);
        self.transport.send_command(Command::GateDischarge0)?;

        self.transport.set_line(OutputLine::Border, false)?;
        self.transport.set_line(OutputLine::Reset, false)?;
        self.transport.set_line(OutputLine::PanelOn, false)?;
        self.transport.set_line(OutputLine::Discharge, true)?;
        self.delay.delay_ms(150);
        self.transport.set_line(OutputLine::Discharge, false)
    }
}
