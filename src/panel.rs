//! Live panel device
//!
//! A [`Panel`] owns the frame pair and the refresh sequencer of one attached
//! COG G1 panel behind a single blocking mutex. The mutex is held for a whole
//! refresh and for each framebuffer copy, so refreshes of one panel never
//! overlap and a framebuffer access never observes a half-copied buffer.
//!
//! A framebuffer access from another context waits until the refresh in
//! progress has finished. There is no copy-on-write staging: a write that lands
//! between two refreshes shows up in the next one, and tearing across refreshes
//! is accepted.
//!
//! The endpoints reach a panel through the object-safe [`EpdDevice`] trait so
//! the [`Registry`](crate::registry::Registry) can hold panels of any board type.
//! Devices must be `Sync`, so a panel is shared between contexts only with a raw
//! mutex that is itself `Sync`, such as
//! [`CriticalSectionRawMutex`](embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex).

use core::cell::RefCell;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::RawMutex;
use embedded_hal::delay::DelayNs;
use log::{error, info};

use crate::color::Color;
use crate::config::{Config, PanelModel};
use crate::error::Error;
use crate::frame::{Frame, FramePair};
use crate::hal::{Clock, PwmOutput, TemperatureSensor};
use crate::interface::{OutputLine, PanelInterface};
use crate::mux::ControlCommand;
use crate::transport::Transport;
use crate::waveform::{Sequencer, State};

/// Id of the single supported panel
pub const DEFAULT_PANEL_ID: u32 = 0;

/// Operations the endpoints need from a panel
pub trait EpdDevice: Sync {
    /// Panel id used by the control endpoint
    fn id(&self) -> u32;

    /// Panel variant
    fn model(&self) -> PanelModel;

    /// Framebuffer size in bytes
    fn framebuffer_len(&self) -> usize {
        self.model().framebuffer_size()
    }

    /// Apply a control command and refresh
    fn control(&self, command: ControlCommand) -> Result<(), Error>;

    /// Copy staged framebuffer bytes starting at `offset` into `buf`
    ///
    /// Returns the number of bytes copied, zero at or past the end.
    fn read_framebuffer(&self, offset: usize, buf: &mut [u8]) -> Result<usize, Error>;

    /// Copy `data` into the staged framebuffer starting at `offset`
    ///
    /// Either all of `data` is written or nothing is.
    fn write_framebuffer(&self, offset: usize, data: &[u8]) -> Result<usize, Error>;
}

struct PanelState<I, P, T, C, D> {
    sequencer: Sequencer<I, P, T, C, D>,
    frames: FramePair,
}

/// An attached panel
///
/// ## Type Parameters
///
/// * `M` - Raw mutex guarding the frames and refreshes
/// * `I` - Panel interface implementing [`PanelInterface`]
/// * `P` - PWM channel implementing [`PwmOutput`]
/// * `T` - Temperature source implementing [`TemperatureSensor`]
/// * `C` - Monotonic clock implementing [`Clock`]
/// * `D` - Delay implementing [`DelayNs`]
pub struct Panel<M: RawMutex, I, P, T, C, D> {
    id: u32,
    model: PanelModel,
    state: Mutex<M, RefCell<PanelState<I, P, T, C, D>>>,
}

impl<M, I, P, T, C, D> Panel<M, I, P, T, C, D>
where
    M: RawMutex,
    I: PanelInterface,
    P: PwmOutput,
    T: TemperatureSensor,
    C: Clock,
    D: DelayNs,
{
    /// Attach a panel
    ///
    /// Configures the PWM channel, drives every control line low and allocates
    /// both frames. The displayed frame starts black and the staged frame white.
    ///
    /// # Errors
    ///
    /// Returns `Error::ResourceUnavailable` if the PWM channel or a control line
    /// cannot be set up and `Error::OutOfMemory` if a buffer cannot be allocated.
    /// Everything passed in is dropped on failure.
    pub fn attach(
        config: &Config,
        interface: I,
        mut pwm: P,
        thermal: T,
        clock: C,
        delay: D,
    ) -> Result<Self, Error> {
        pwm.configure(config.pwm_duty_ns(), config.pwm_period_ns)
            .map_err(|err| {
                error!("cannot configure pwm: {:?}", err);
                Error::ResourceUnavailable
            })?;

        let mut transport = Transport::new(interface, config.busy_wait);
        for line in OutputLine::ALL {
            transport.set_line(line, false).map_err(|err| {
                error!("cannot drive {:?} low: {}", line, err);
                Error::ResourceUnavailable
            })?;
        }

        let frames = FramePair::for_model(config.model)?;
        let sequencer = Sequencer::new(transport, pwm, thermal, clock, delay, config.model)?;

        info!(
            "attached {:?} panel, {}x{}",
            config.model,
            config.model.dots(),
            config.model.lines()
        );
        Ok(Self {
            id: DEFAULT_PANEL_ID,
            model: config.model,
            state: Mutex::new(RefCell::new(PanelState { sequencer, frames })),
        })
    }

    /// Use a different panel id
    pub fn with_id(mut self, id: u32) -> Self {
        self.id = id;
        self
    }

    /// Run `f` on the staged frame under the panel lock
    ///
    /// # Errors
    ///
    /// Returns `Error::ResourceUnavailable` if called from inside another
    /// panel operation.
    pub fn with_staged_frame<R>(&self, f: impl FnOnce(&mut Frame) -> R) -> Result<R, Error> {
        self.with_state(|state| Ok(f(&mut state.frames.staged)))
    }

    /// Run `f` on the displayed frame under the panel lock
    pub fn with_displayed_frame<R>(&self, f: impl FnOnce(&Frame) -> R) -> Result<R, Error> {
        self.with_state(|state| Ok(f(&state.frames.displayed)))
    }

    /// State of the refresh sequencer
    pub fn refresh_state(&self) -> Result<State, Error> {
        self.with_state(|state| Ok(state.sequencer.state()))
    }

    /// Stage time of the last refresh in milliseconds
    pub fn stage_time_ms(&self) -> Result<u32, Error> {
        self.with_state(|state| Ok(state.sequencer.stage_time_ms()))
    }

    /// Detach the panel and return its peripherals
    ///
    /// The PWM output is stopped. Unregister the panel first.
    pub fn release(self) -> (I, P, T, C, D) {
        let state = self.state.into_inner().into_inner();
        let (transport, mut pwm, thermal, clock, delay) = state.sequencer.release();
        pwm.disable();
        info!("released panel {}", self.id);
        (transport.release(), pwm, thermal, clock, delay)
    }

    fn with_state<R>(
        &self,
        f: impl FnOnce(&mut PanelState<I, P, T, C, D>) -> Result<R, Error>,
    ) -> Result<R, Error> {
        self.state.lock(|cell| {
            let mut state = cell
                .try_borrow_mut()
                .map_err(|_| Error::ResourceUnavailable)?;
            f(&mut state)
        })
    }
}

impl<M, I, P, T, C, D> EpdDevice for Panel<M, I, P, T, C, D>
where
    M: RawMutex + Sync,
    I: PanelInterface + Send,
    P: PwmOutput + Send,
    T: TemperatureSensor + Send,
    C: Clock + Send,
    D: DelayNs + Send,
{
    fn id(&self) -> u32 {
        self.id
    }

    fn model(&self) -> PanelModel {
        self.model
    }

    fn control(&self, command: ControlCommand) -> Result<(), Error> {
        self.with_state(|state| {
            match command {
                ControlCommand::Clear => state.frames.staged.fill(Color::White),
                ControlCommand::Black => state.frames.staged.fill(Color::Black),
                ControlCommand::Write => {}
            }
            state.sequencer.draw(&mut state.frames)
        })
    }

    fn read_framebuffer(&self, offset: usize, buf: &mut [u8]) -> Result<usize, Error> {
        self.with_state(|state| {
            let bytes = state.frames.staged.as_bytes();
            let Some(available) = bytes.len().checked_sub(offset) else {
                return Ok(0);
            };
            let count = buf.len().min(available);
            buf[..count].copy_from_slice(&bytes[offset..offset + count]);
            Ok(count)
        })
    }

    fn write_framebuffer(&self, offset: usize, data: &[u8]) -> Result<usize, Error> {
        let capacity = self.model.framebuffer_size();
        let end = offset.saturating_add(data.len());
        if end > capacity {
            return Err(Error::MessageTooLarge { end, capacity });
        }
        self.with_state(|state| {
            state.frames.staged.as_bytes_mut()[offset..end].copy_from_slice(data);
            Ok(data.len())
        })
    }
}
