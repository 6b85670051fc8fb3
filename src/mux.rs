//! Control and framebuffer endpoints
//!
//! The driver exposes one control endpoint shared by all panels and one
//! framebuffer endpoint per registered panel. Endpoints are addressed by an
//! ordinal: `0` is the control endpoint and `n` the framebuffer of panel `n - 1`.
//!
//! The control endpoint accepts one ASCII command per write, `<cmd><id>`:
//!
//! | cmd | effect                                  |
//! |-----|-----------------------------------------|
//! | `C` | fill the staged image white and refresh |
//! | `B` | fill the staged image black and refresh |
//! | `W` | refresh with the staged image as is     |
//!
//! Framebuffer writes only touch the staged image; nothing reaches the glass
//! until a control command refreshes the panel.
//!
//! ## Example
//!
//! ```
//! use epd_g1::mux::{ControlCommand, parse_control};
//!
//! assert_eq!(parse_control(b"W0\n"), Ok((b'W', 0)));
//! assert_eq!(ControlCommand::try_from(b'C'), Ok(ControlCommand::Clear));
//! ```

use embassy_sync::blocking_mutex::raw::RawMutex;
use embedded_io::{ErrorType, Read, Seek, SeekFrom, Write};
use log::debug;

use crate::error::Error;
use crate::panel::EpdDevice;
use crate::registry::Registry;

/// Ordinal of the control endpoint
pub const CONTROL_MINOR: u32 = 0;

/// Command accepted by the control endpoint
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControlCommand {
    /// Fill white, then refresh
    Clear,
    /// Fill black, then refresh
    Black,
    /// Refresh only
    Write,
}

impl TryFrom<u8> for ControlCommand {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            b'C' => Ok(Self::Clear),
            b'B' => Ok(Self::Black),
            b'W' => Ok(Self::Write),
            _ => Err(Error::InvalidArgument),
        }
    }
}

/// Split control text into its command byte and panel id
///
/// The first byte is the command, followed by optional ASCII whitespace and at
/// least one decimal digit. Input after the digits is ignored.
///
/// # Errors
///
/// Returns `Error::InvalidArgument` for input shorter than two bytes, a missing
/// id or an id that does not fit `u32`.
pub fn parse_control(input: &[u8]) -> Result<(u8, u32), Error> {
    let [command, rest @ ..] = input else {
        return Err(Error::InvalidArgument);
    };
    if rest.is_empty() {
        return Err(Error::InvalidArgument);
    }

    let start = rest
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(rest.len());
    let digits = &rest[start..];
    let count = digits.iter().take_while(|b| b.is_ascii_digit()).count();
    if count == 0 {
        return Err(Error::InvalidArgument);
    }

    let id = digits[..count].iter().try_fold(0u32, |id, &digit| {
        id.checked_mul(10)
            .and_then(|id| id.checked_add(u32::from(digit - b'0')))
            .ok_or(Error::InvalidArgument)
    })?;
    Ok((*command, id))
}

/// Endpoint dispatcher over a [`Registry`]
pub struct DeviceMux<'r, 'a, M: RawMutex, const N: usize = 1> {
    registry: &'r Registry<'a, M, N>,
}

/// An open endpoint
pub enum Endpoint<'r, 'a, M: RawMutex, const N: usize = 1> {
    /// The control endpoint
    Control(ControlHandle<'r, 'a, M, N>),
    /// A panel framebuffer
    Framebuffer(FramebufferHandle<'a>),
}

impl<'r, 'a, M: RawMutex, const N: usize> DeviceMux<'r, 'a, M, N> {
    /// Dispatcher over `registry`
    pub const fn new(registry: &'r Registry<'a, M, N>) -> Self {
        Self { registry }
    }

    /// Handle one control command
    ///
    /// Returns the number of bytes consumed, always `input.len()`. The panel is
    /// locked for the whole refresh.
    ///
    /// # Errors
    ///
    /// * `Error::InvalidArgument` - malformed text or unknown command
    /// * `Error::NoSuchDevice` - no panel with that id
    /// * any error of the refresh itself
    pub fn control_write(&self, input: &[u8]) -> Result<usize, Error> {
        let (command, id) = parse_control(input)?;
        let device = self.registry.lookup(id)?;
        let command = ControlCommand::try_from(command)?;
        debug!("control {:?} on panel {}", command, id);
        device.control(command)?;
        Ok(input.len())
    }

    /// Open the endpoint with ordinal `minor`
    ///
    /// # Errors
    ///
    /// Returns `Error::NoSuchDevice` if `minor` names an unregistered panel.
    pub fn open(&self, minor: u32) -> Result<Endpoint<'r, 'a, M, N>, Error> {
        match minor.checked_sub(1) {
            None => Ok(Endpoint::Control(self.open_control())),
            Some(id) => self.open_framebuffer(id).map(Endpoint::Framebuffer),
        }
    }

    /// Open the control endpoint
    pub fn open_control(&self) -> ControlHandle<'r, 'a, M, N> {
        ControlHandle { mux: Self::new(self.registry) }
    }

    /// Open the framebuffer of panel `id`
    ///
    /// # Errors
    ///
    /// Returns `Error::NoSuchDevice` if no panel has that id.
    pub fn open_framebuffer(&self, id: u32) -> Result<FramebufferHandle<'a>, Error> {
        let device = self.registry.lookup(id)?;
        Ok(FramebufferHandle::new(device))
    }
}

/// Write half of the control endpoint
///
/// Each [`Write::write`] call is one complete command.
pub struct ControlHandle<'r, 'a, M: RawMutex, const N: usize = 1> {
    mux: DeviceMux<'r, 'a, M, N>,
}

impl<M: RawMutex, const N: usize> ErrorType for ControlHandle<'_, '_, M, N> {
    type Error = Error;
}

impl<M: RawMutex, const N: usize> Write for ControlHandle<'_, '_, M, N> {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        if buf.is_empty() {
            return Ok(0);
        }
        self.mux.control_write(buf)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Open framebuffer of one panel
///
/// Reads and writes go to the panel's staged image at the handle's offset and
/// advance it.
pub struct FramebufferHandle<'a> {
    device: &'a dyn EpdDevice,
    offset: u64,
}

impl<'a> FramebufferHandle<'a> {
    /// Handle positioned at the start of `device`'s framebuffer
    pub fn new(device: &'a dyn EpdDevice) -> Self {
        Self { device, offset: 0 }
    }

    /// Id of the panel behind this handle
    pub fn id(&self) -> u32 {
        self.device.id()
    }

    /// Framebuffer size in bytes
    pub fn len(&self) -> usize {
        self.device.framebuffer_len()
    }

    /// `true` for a zero sized framebuffer
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Current offset
    pub fn position(&self) -> u64 {
        self.offset
    }

    fn advance(&mut self, count: usize) {
        self.offset = self.offset.saturating_add(count as u64);
    }
}

impl ErrorType for FramebufferHandle<'_> {
    type Error = Error;
}

impl Read for FramebufferHandle<'_> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let Ok(offset) = usize::try_from(self.offset) else {
            return Ok(0);
        };
        let count = self.device.read_framebuffer(offset, buf)?;
        self.advance(count);
        Ok(count)
    }
}

impl Write for FramebufferHandle<'_> {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        let capacity = self.device.framebuffer_len();
        let Ok(offset) = usize::try_from(self.offset) else {
            return Err(Error::MessageTooLarge {
                end: usize::MAX,
                capacity,
            });
        };
        let count = self.device.write_framebuffer(offset, buf)?;
        self.advance(count);
        Ok(count)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl Seek for FramebufferHandle<'_> {
    fn seek(&mut self, pos: SeekFrom) -> Result<u64, Self::Error> {
        let offset = match pos {
            SeekFrom::Start(offset) => Some(offset),
            SeekFrom::End(delta) => (self.len() as u64).checked_add_signed(delta),
            SeekFrom::Current(delta) => self.offset.checked_add_signed(delta),
        }
        .ok_or(Error::InvalidArgument)?;
        self.offset = offset;
        Ok(offset)
    }
}
