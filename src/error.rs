//! Error types for the driver
//!
//! This module defines error types for configuration building ([`BuilderError`])
//! and panel operations ([`Error`]).
//!
//! ## Error Types
//!
//! - [`BuilderError`] - Errors during configuration construction
//! - [`Error`] - Runtime errors from the encoder, refresh sequence and endpoints
//! - [`IoError`] - Low-level hardware communication errors, carried by [`Error::Io`]
//!
//! Hardware errors keep the `embedded-hal` error *kind* of the failing peripheral
//! rather than the concrete error type, so [`Error`] stays `Copy` and does not need
//! to be generic over every bus and pin in the system.
//!
//! ## Example
//!
//! ```
//! use epd_g1::{Builder, BuilderError};
//!
//! // Duty cycle above 100%
//! let result = Builder::new().pwm_duty_percent(150).build();
//! assert!(matches!(result, Err(BuilderError::InvalidPwm { .. })));
//! ```

use embedded_hal::{digital, i2c, pwm, spi};

/// Hardware-level failure captured as an `embedded-hal` error kind
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IoError {
    /// Bus transfer failed
    Bus(spi::ErrorKind),
    /// GPIO line read or write failed
    Pin(digital::ErrorKind),
    /// PWM channel failed to enable or configure
    Pwm(pwm::ErrorKind),
    /// I2C transfer to the temperature sensor failed
    I2c(i2c::ErrorKind),
    /// Temperature sensor returned an error
    Sensor,
    /// BUSY line did not clear within the configured poll bound
    BusyTimeout,
}

impl IoError {
    /// Capture a bus error
    pub fn bus<E: spi::Error>(err: E) -> Self {
        Self::Bus(err.kind())
    }

    /// Capture a GPIO error
    pub fn pin<E: digital::Error>(err: E) -> Self {
        Self::Pin(err.kind())
    }

    /// Capture a PWM error
    pub fn pwm<E: pwm::Error>(err: E) -> Self {
        Self::Pwm(err.kind())
    }

    /// Capture an I2C error
    pub fn i2c<E: i2c::Error>(err: E) -> Self {
        Self::I2c(err.kind())
    }
}

impl core::fmt::Display for IoError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Bus(kind) => write!(f, "bus error: {kind}"),
            Self::Pin(kind) => write!(f, "pin error: {kind:?}"),
            Self::Pwm(kind) => write!(f, "pwm error: {kind:?}"),
            Self::I2c(kind) => write!(f, "i2c error: {kind}"),
            Self::Sensor => write!(f, "temperature sensor error"),
            Self::BusyTimeout => write!(f, "timeout waiting for busy line"),
        }
    }
}

impl core::error::Error for IoError {}

/// Errors that can occur when driving the panel or serving its endpoints
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Error {
    /// Malformed control command, unknown command character or bad geometry
    InvalidArgument,
    /// Destination buffer or frame layout does not fit the encoded line
    ///
    /// For a short destination buffer, `required` is the encoded line length.
    /// For an inconsistent frame, `required` is the dot count implied by the
    /// per-line byte count and `provided` is the declared dot count.
    InvalidLength {
        /// Expected length
        required: usize,
        /// Provided length
        provided: usize,
    },
    /// Numeric controller command id outside the command table
    InvalidCommand(u8),
    /// No panel registered under the requested id
    NoSuchDevice,
    /// A panel is already registered (or the registry is full)
    AlreadyRegistered,
    /// A peripheral could not be acquired or configured at attach time,
    /// or the panel state is already borrowed
    ResourceUnavailable,
    /// Hardware transfer failed
    Io(IoError),
    /// Framebuffer write extends past the end of the frame
    MessageTooLarge {
        /// End offset of the rejected write
        end: usize,
        /// Framebuffer size in bytes
        capacity: usize,
    },
    /// Frame buffer allocation failed
    OutOfMemory,
}

impl From<IoError> for Error {
    fn from(err: IoError) -> Self {
        Self::Io(err)
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::InvalidArgument => write!(f, "Invalid argument"),
            Self::InvalidLength { required, provided } => {
                write!(f, "Invalid length: required {required}, provided {provided}")
            }
            Self::InvalidCommand(id) => write!(f, "Invalid controller command id {id}"),
            Self::NoSuchDevice => write!(f, "No such device"),
            Self::AlreadyRegistered => write!(f, "Panel already registered"),
            Self::ResourceUnavailable => write!(f, "Resource unavailable"),
            Self::Io(err) => write!(f, "I/O error: {err}"),
            Self::MessageTooLarge { end, capacity } => {
                write!(
                    f,
                    "Write too large: ends at byte {end}, framebuffer holds {capacity}"
                )
            }
            Self::OutOfMemory => write!(f, "Out of memory"),
        }
    }
}

impl core::error::Error for Error {}

impl embedded_io::Error for Error {
    fn kind(&self) -> embedded_io::ErrorKind {
        use embedded_io::ErrorKind;

        match self {
            Self::InvalidArgument | Self::InvalidCommand(_) | Self::MessageTooLarge { .. } => {
                ErrorKind::InvalidInput
            }
            Self::InvalidLength { .. } => ErrorKind::InvalidData,
            Self::NoSuchDevice => ErrorKind::NotFound,
            Self::AlreadyRegistered => ErrorKind::AlreadyExists,
            Self::OutOfMemory => ErrorKind::OutOfMemory,
            Self::Io(IoError::BusyTimeout) => ErrorKind::TimedOut,
            Self::ResourceUnavailable | Self::Io(_) => ErrorKind::Other,
        }
    }
}

/// Errors that can occur when building configuration
///
/// These errors occur during the builder pattern before the panel is attached.
#[derive(Debug, PartialEq, Eq)]
pub enum BuilderError {
    /// PWM period is zero or duty cycle exceeds 100%
    InvalidPwm {
        /// Requested period in nanoseconds
        period_ns: u32,
        /// Requested duty cycle in percent
        duty_percent: u8,
    },
    /// Busy-wait poll bound of zero would fail every wait
    ZeroBusyPolls,
}

impl core::fmt::Display for BuilderError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::InvalidPwm {
                period_ns,
                duty_percent,
            } => write!(
                f,
                "Invalid PWM setting: period {period_ns}ns, duty {duty_percent}% (period must be non-zero, duty at most 100%)"
            ),
            Self::ZeroBusyPolls => write!(f, "Busy-wait poll bound must be non-zero"),
        }
    }
}

impl core::error::Error for BuilderError {}
