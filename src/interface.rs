//! Hardware interface abstraction
//!
//! This module provides the [`PanelInterface`] trait and the [`Interface`] struct
//! for talking to the COG G1 controller over SPI.
//!
//! ## Hardware Requirements
//!
//! The COG G1 requires:
//! - SPI bus (MOSI + SCK), driven as a raw [`SpiBus`] because chip select must
//!   stay asserted across several transfers during line data
//! - 6 GPIO pins:
//!   - **CS**: Chip select (output, active low)
//!   - **PANEL_ON**: Panel power (output)
//!   - **RESET**: Reset (output, active low)
//!   - **BORDER**: Border control (output)
//!   - **DISCHARGE**: Discharge switch (output)
//!   - **BUSY**: Busy status (input, active high)
//!
//! A PWM channel and a temperature sensor complete the board; see [`crate::hal`].
//!
//! ## Example
//!
//! ```rust,no_run
//! use embedded_hal::digital::{InputPin, OutputPin};
//! use embedded_hal::spi::SpiBus;
//! use epd_g1::{Interface, OutputLine, PanelInterface, Segment};
//! # use core::convert::Infallible;
//! # struct MockSpi;
//! # impl embedded_hal::spi::ErrorType for MockSpi { type Error = Infallible; }
//! # impl SpiBus for MockSpi {
//! #     fn read(&mut self, _words: &mut [u8]) -> Result<(), Self::Error> { Ok(()) }
//! #     fn write(&mut self, _words: &[u8]) -> Result<(), Self::Error> { Ok(()) }
//! #     fn transfer(&mut self, _read: &mut [u8], _write: &[u8]) -> Result<(), Self::Error> { Ok(()) }
//! #     fn transfer_in_place(&mut self, _words: &mut [u8]) -> Result<(), Self::Error> { Ok(()) }
//! #     fn flush(&mut self) -> Result<(), Self::Error> { Ok(()) }
//! # }
//! # struct MockPin;
//! # impl embedded_hal::digital::ErrorType for MockPin { type Error = Infallible; }
//! # impl OutputPin for MockPin {
//! #     fn set_low(&mut self) -> Result<(), Self::Error> { Ok(()) }
//! #     fn set_high(&mut self) -> Result<(), Self::Error> { Ok(()) }
//! # }
//! # impl InputPin for MockPin {
//! #     fn is_high(&mut self) -> Result<bool, Self::Error> { Ok(false) }
//! #     fn is_low(&mut self) -> Result<bool, Self::Error> { Ok(true) }
//! # }
//! let mut interface = Interface::new(
//!     MockSpi, MockPin, MockPin, MockPin, MockPin, MockPin, MockPin,
//! );
//!
//! // Power the panel
//! let _ = interface.set_line(OutputLine::PanelOn, true);
//!
//! // Oscillator on: register header and index, then data header and payload
//! let _ = interface.send_frame(&[
//!     Segment::new(&[0x70]),
//!     Segment::toggle(&[0x07]),
//!     Segment::new(&[0x72]),
//!     Segment::new(&[0x9d]),
//! ]);
//! ```

use embedded_hal::digital::{InputPin, OutputPin};
use embedded_hal::spi::SpiBus;

use crate::error::IoError;

/// One transfer of a bus frame
///
/// `cs_change` deasserts and reasserts chip select after this transfer. On the
/// last transfer of a frame it instead keeps chip select asserted after the frame
/// ends, so the next frame continues the same selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Segment<'a> {
    /// Bytes to send
    pub bytes: &'a [u8],
    /// Toggle (or, on the last segment, hold) chip select
    pub cs_change: bool,
}

impl<'a> Segment<'a> {
    /// Transfer without a chip select change
    pub const fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            cs_change: false,
        }
    }

    /// Transfer followed by a chip select change
    pub const fn toggle(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            cs_change: true,
        }
    }
}

/// Control output lines of the panel
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputLine {
    /// Panel power switch
    PanelOn,
    /// Controller reset, active low
    Reset,
    /// Border control
    Border,
    /// Discharge switch
    Discharge,
}

impl OutputLine {
    /// Every control output
    pub const ALL: [Self; 4] = [Self::PanelOn, Self::Reset, Self::Border, Self::Discharge];
}

/// Trait for the hardware interface to a COG G1 controller
///
/// This trait abstracts over different hardware implementations, allowing the
/// [`Transport`](crate::transport::Transport) to work with any bus and GPIO
/// implementation.
///
/// ## Implementing
///
/// For most cases, use the provided [`Interface`] struct. If the bus controller
/// handles chip select itself, implement this trait on your own type.
pub trait PanelInterface {
    /// Send one bus frame
    ///
    /// The transfers are sent in order as a single selection of the controller,
    /// honoring each segment's `cs_change`.
    ///
    /// # Errors
    ///
    /// Returns an error if the bus or chip select fails. Chip select is
    /// released on error.
    fn send_frame(&mut self, segments: &[Segment<'_>]) -> Result<(), IoError>;

    /// Whether the controller is asserting BUSY
    fn is_busy(&mut self) -> Result<bool, IoError>;

    /// Drive a control output high (`true`) or low
    fn set_line(&mut self, line: OutputLine, high: bool) -> Result<(), IoError>;
}

/// Hardware interface implementation for the COG G1
///
/// Implements [`PanelInterface`] for an embedded-hal v1.0 [`SpiBus`] with a
/// software chip select and the panel's GPIO lines.
///
/// ## Type Parameters
///
/// * `SPI` - SPI bus implementing [`SpiBus`]
/// * `CS` - Chip select pin implementing [`OutputPin`]
/// * `PWR` - Panel power pin implementing [`OutputPin`]
/// * `RST` - Reset pin implementing [`OutputPin`]
/// * `BDR` - Border pin implementing [`OutputPin`]
/// * `DIS` - Discharge pin implementing [`OutputPin`]
/// * `BUSY` - Busy pin implementing [`InputPin`]
pub struct Interface<SPI, CS, PWR, RST, BDR, DIS, BUSY> {
    /// SPI bus for communication
    spi: SPI,
    /// Chip select pin (active low)
    cs: CS,
    /// Panel power pin
    panel_on: PWR,
    /// Reset pin (active low)
    reset: RST,
    /// Border pin
    border: BDR,
    /// Discharge pin
    discharge: DIS,
    /// Busy pin (active high)
    busy: BUSY,
    /// Busy pin polarity (true = active high, false = active low)
    busy_active_high: bool,
    /// Chip select still asserted from the previous frame
    cs_held: bool,
}

impl<SPI, CS, PWR, RST, BDR, DIS, BUSY> Interface<SPI, CS, PWR, RST, BDR, DIS, BUSY>
where
    SPI: SpiBus,
    CS: OutputPin,
    PWR: OutputPin,
    RST: OutputPin,
    BDR: OutputPin,
    DIS: OutputPin,
    BUSY: InputPin,
{
    /// Create a new Interface
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        spi: SPI,
        cs: CS,
        panel_on: PWR,
        reset: RST,
        border: BDR,
        discharge: DIS,
        busy: BUSY,
    ) -> Self {
        Self {
            spi,
            cs,
            panel_on,
            reset,
            border,
            discharge,
            busy,
            busy_active_high: true,
            cs_held: false,
        }
    }

    /// Set busy pin polarity
    ///
    /// Default is active-high. Set to false for active-low boards.
    pub fn set_busy_active_high(&mut self, active_high: bool) -> &mut Self {
        self.busy_active_high = active_high;
        self
    }

    /// Get busy pin polarity (true = active high)
    pub fn busy_active_high(&self) -> bool {
        self.busy_active_high
    }

    /// Release the bus and pins
    #[allow(clippy::type_complexity)]
    pub fn release(self) -> (SPI, CS, PWR, RST, BDR, DIS, BUSY) {
        (
            self.spi,
            self.cs,
            self.panel_on,
            self.reset,
            self.border,
            self.discharge,
            self.busy,
        )
    }

    fn select(&mut self) -> Result<(), IoError> {
        self.cs.set_low().map_err(IoError::pin)
    }

    fn deselect(&mut self) -> Result<(), IoError> {
        self.cs_held = false;
        self.cs.set_high().map_err(IoError::pin)
    }

    fn transfer(&mut self, segments: &[Segment<'_>]) -> Result<(), IoError> {
        if !self.cs_held {
            self.select()?;
        }

        let last = segments.len().saturating_sub(1);
        for (index, segment) in segments.iter().enumerate() {
            self.spi.write(segment.bytes).map_err(IoError::bus)?;
            if segment.cs_change && index != last {
                self.spi.flush().map_err(IoError::bus)?;
                self.cs.set_high().map_err(IoError::pin)?;
                self.select()?;
            }
        }
        self.spi.flush().map_err(IoError::bus)?;

        if segments.last().is_some_and(|segment| segment.cs_change) {
            self.cs_held = true;
            Ok(())
        } else {
            self.deselect()
        }
    }
}

impl<SPI, CS, PWR, RST, BDR, DIS, BUSY> PanelInterface
    for Interface<SPI, CS, PWR, RST, BDR, DIS, BUSY>
where
    SPI: SpiBus,
    CS: OutputPin,
    PWR: OutputPin,
    RST: OutputPin,
    BDR: OutputPin,
    DIS: OutputPin,
    BUSY: InputPin,
{
    fn send_frame(&mut self, segments: &[Segment<'_>]) -> Result<(), IoError> {
        let result = self.transfer(segments);
        if result.is_err() {
            // Leave the controller deselected; the original error wins
            let _ = self.deselect();
        }
        result
    }

    fn is_busy(&mut self) -> Result<bool, IoError> {
        if self.busy_active_high {
            self.busy.is_high().map_err(IoError::pin)
        } else {
            self.busy.is_low().map_err(IoError::pin)
        }
    }

    fn set_line(&mut self, line: OutputLine, high: bool) -> Result<(), IoError> {
        match (line, high) {
            (OutputLine::PanelOn, true) => self.panel_on.set_high().map_err(IoError::pin),
            (OutputLine::PanelOn, false) => self.panel_on.set_low().map_err(IoError::pin),
            (OutputLine::Reset, true) => self.reset.set_high().map_err(IoError::pin),
            (OutputLine::Reset, false) => self.reset.set_low().map_err(IoError::pin),
            (OutputLine::Border, true) => self.border.set_high().map_err(IoError::pin),
            (OutputLine::Border, false) => self.border.set_low().map_err(IoError::pin),
            (OutputLine::Discharge, true) => self.discharge.set_high().map_err(IoError::pin),
            (OutputLine::Discharge, false) => self.discharge.set_low().map_err(IoError::pin),
        }
    }
}
