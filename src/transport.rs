//! Command and line data framing
//!
//! [`Transport`] turns [`Command`]s and encoded lines into bus frames on a
//! [`PanelInterface`] and runs the BUSY handshake between line data bytes.

use log::{error, trace};

use crate::command::{Command, DATA_HEADER, REG_DATA, REG_HEADER};
use crate::config::BusyWait;
use crate::error::{Error, IoError};
use crate::interface::{OutputLine, PanelInterface, Segment};

/// Command and data framing over a panel interface
pub struct Transport<I> {
    interface: I,
    busy_wait: BusyWait,
}

impl<I> Transport<I>
where
    I: PanelInterface,
{
    /// Create a transport
    pub fn new(interface: I, busy_wait: BusyWait) -> Self {
        Self {
            interface,
            busy_wait,
        }
    }

    /// Send one controller command
    ///
    /// Register header and index, chip select toggle, data header and payload,
    /// as a single frame.
    pub fn send_command(&mut self, command: Command) -> Result<(), Error> {
        trace!("cmd {:?} reg {:#04x}", command, command.register());
        self.interface
            .send_frame(&[
                Segment::new(&[REG_HEADER]),
                Segment::toggle(&[command.register()]),
                Segment::new(&[DATA_HEADER]),
                Segment::new(command.payload()),
            ])
            .map_err(Error::Io)
    }

    /// Send a command by numeric id
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidCommand` for an id outside the command table.
    pub fn send_command_id(&mut self, id: u8) -> Result<(), Error> {
        self.send_command(Command::try_from(id)?)
    }

    /// Send one encoded line to the data register
    ///
    /// Each byte is its own transfer with chip select held until the last one,
    /// and the controller must release BUSY before the next byte goes out.
    pub fn send_line_data(&mut self, data: &[u8]) -> Result<(), Error> {
        self.interface
            .send_frame(&[
                Segment::new(&[REG_HEADER]),
                Segment::toggle(&[REG_DATA]),
                Segment::toggle(&[DATA_HEADER]),
            ])
            .map_err(Error::Io)?;

        let last = data.len().saturating_sub(1);
        for (index, byte) in data.iter().enumerate() {
            let segment = Segment {
                bytes: core::slice::from_ref(byte),
                cs_change: index != last,
            };
            self.interface.send_frame(&[segment]).map_err(Error::Io)?;
            self.wait_ready()?;
        }
        Ok(())
    }

    /// Spin until the controller releases BUSY
    ///
    /// # Errors
    ///
    /// Returns `IoError::BusyTimeout` when a poll bound is configured and
    /// BUSY is still asserted after that many polls.
    pub fn wait_ready(&mut self) -> Result<(), Error> {
        let mut polls = 0u32;
        while self.interface.is_busy()? {
            polls = polls.saturating_add(1);
            if matches!(self.busy_wait, BusyWait::Polls(limit) if polls >= limit) {
                error!("busy line stuck after {} polls", polls);
                return Err(IoError::BusyTimeout.into());
            }
            core::hint::spin_loop();
        }
        Ok(())
    }

    /// Drive a control output
    pub fn set_line(&mut self, line: OutputLine, high: bool) -> Result<(), Error> {
        self.interface.set_line(line, high).map_err(Error::Io)
    }

    /// Release the interface
    pub fn release(self) -> I {
        self.interface
    }
}
