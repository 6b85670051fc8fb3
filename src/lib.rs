//! Pervasive Displays COG G1 E-Paper Driver
//!
//! A driver for the first generation chip-on-glass (COG G1) e-paper panels from
//! Pervasive Displays: 1.44" (128x96), 2.0" (200x96) and 2.7" (264x176).
//!
//! ## Features
//!
//! - `no_std` compatible (needs `alloc` for frame buffers)
//! - `embedded-hal` v1.0 support
//! - `embedded-graphics` integration (with `graphics` feature)
//! - Temperature compensated four stage waveform refresh
//! - LM75 temperature sensor support
//! - Control and framebuffer endpoints with `embedded-io` handles
//!
//! ## Usage
//!
//! ```rust,no_run
//! use core::convert::Infallible;
//! use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
//! use embedded_hal::delay::DelayNs;
//! use embedded_hal::digital::{InputPin, OutputPin};
//! use embedded_hal::spi::SpiBus;
//! use epd_g1::{
//!     Builder, Clock, DeviceMux, DutyCyclePwm, FixedTemperature, Interface, Panel, PanelModel,
//!     Registry,
//! };
//!
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
//! # struct MockPwm;
//! # impl embedded_hal::pwm::ErrorType for MockPwm { type Error = Infallible; }
//! # impl embedded_hal::pwm::SetDutyCycle for MockPwm {
//! #     fn max_duty_cycle(&self) -> u16 { 100 }
//! #     fn set_duty_cycle(&mut self, _duty: u16) -> Result<(), Self::Error> { Ok(()) }
//! # }
//! # struct MockDelay;
//! # impl DelayNs for MockDelay { fn delay_ns(&mut self, _ns: u32) {} }
//! # struct Ticks(u64);
//! # impl Clock for Ticks {
//! #     fn now_ms(&mut self) -> u64 { self.0 += 100; self.0 }
//! # }
//! let interface = Interface::new(
//!     MockSpi, MockPin, MockPin, MockPin, MockPin, MockPin, MockPin,
//! );
//! let config = match Builder::new().model(PanelModel::Epd2in7).build() {
//!     Ok(config) => config,
//!     Err(_) => return,
//! };
//!
//! let panel: Panel<CriticalSectionRawMutex, _, _, _, _, _> = match Panel::attach(
//!     &config,
//!     interface,
//!     DutyCyclePwm::new(MockPwm),
//!     FixedTemperature(22_000),
//!     Ticks(0),
//!     MockDelay,
//! ) {
//!     Ok(panel) => panel,
//!     Err(_) => return,
//! };
//!
//! let registry: Registry<'_, CriticalSectionRawMutex> = Registry::new();
//! if registry.register(&panel).is_err() {
//!     return;
//! }
//!
//! // Clear panel 0 to white
//! let mux = DeviceMux::new(&registry);
//! let _ = mux.control_write(b"C0");
//! ```

#![no_std]

extern crate alloc;

#[cfg(any(test, feature = "std"))]
extern crate std;

/// Color types for monochrome e-paper panels
pub mod color;
/// COG G1 command definitions
pub mod command;
/// Panel configuration types and builder
pub mod config;
/// Line encoding into the controller's dot and scan format
pub mod encoder;
/// Error types for the driver
pub mod error;
/// Bit-packed frames
pub mod frame;
/// Board capabilities outside embedded-hal
pub mod hal;
/// Hardware interface abstraction
pub mod interface;
/// Control and framebuffer endpoints
pub mod mux;
/// Attached panel devices
pub mod panel;
/// Panel registry
pub mod registry;
/// Temperature sensors
pub mod thermal;
/// Temperature compensated stage timing
pub mod timing;
/// Command framing and line data transfer
pub mod transport;
/// Refresh state machine
pub mod waveform;

/// Graphics support via embedded-graphics (requires `graphics` feature)
#[cfg(feature = "graphics")]
pub mod graphics;

#[cfg(test)]
mod mock;

pub use color::Color;
pub use command::Command;
pub use config::{
    Builder, BusyWait, Config, DEFAULT_PWM_DUTY_PERCENT, DEFAULT_PWM_PERIOD_NS, PanelModel,
};
pub use encoder::{LineEncoder, LineSelect, Parity, Stage};
pub use error::{BuilderError, Error, IoError};
pub use frame::{Frame, FramePair};
#[cfg(feature = "std")]
pub use hal::StdClock;
pub use hal::{Clock, DutyCyclePwm, PwmOutput, TemperatureSensor};
pub use interface::{Interface, OutputLine, PanelInterface, Segment};
pub use mux::{ControlCommand, ControlHandle, DeviceMux, Endpoint, FramebufferHandle};
pub use panel::{EpdDevice, Panel};
pub use registry::Registry;
pub use thermal::{FixedTemperature, Lm75};
pub use transport::Transport;
pub use waveform::{Sequencer, State};
