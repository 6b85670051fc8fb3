//! COG G1 command definitions
//!
//! This module defines the register indexes, frame headers and the fixed table of
//! controller commands used to drive the COG G1 panel controller.
//!
//! ## Command Structure
//!
//! Every command is sent as one bus frame:
//! 1. Assert CS
//! 2. Send the register header ([`REG_HEADER`]) and the register index
//! 3. Toggle CS
//! 4. Send the data header ([`DATA_HEADER`]) and the payload bytes
//! 5. Deassert CS
//!
//! Line data goes to [`REG_DATA`] the same way, except that each payload byte is
//! its own transfer, gated by the BUSY handshake (see [`crate::transport`]).
//!
//! ## Example
//!
//! ```
//! use epd_g1::command::{Command, REG_OSCILLATOR};
//!
//! let cmd = Command::OscillatorOn;
//! assert_eq!(cmd.register(), REG_OSCILLATOR);
//! assert_eq!(cmd.payload(), &[0x9d]);
//!
//! // Numeric ids follow table order
//! assert_eq!(Command::try_from(22), Ok(Command::OscillatorOn));
//! ```

use crate::error::Error;

/// Header byte preceding a register index
pub const REG_HEADER: u8 = 0x70;

/// Header byte preceding register data
pub const DATA_HEADER: u8 = 0x72;

// Register indexes

/// Channel select register (0x01)
///
/// Selects the active source/gate channels for the panel geometry.
/// Requires 8 bytes.
pub const REG_CHANNEL_SELECT: u8 = 0x01;

/// Output control register (0x02)
pub const REG_OUTPUT: u8 = 0x02;

/// Latch register (0x03)
pub const REG_LATCH: u8 = 0x03;

/// Gate and source voltage level register (0x04)
///
/// Also used to step the gate discharge levels during power off.
pub const REG_GATE_SOURCE_LEVEL: u8 = 0x04;

/// Charge pump control register (0x05)
pub const REG_CHARGE_PUMP: u8 = 0x05;

/// DC/DC frequency register (0x06)
pub const REG_DC_FREQUENCY: u8 = 0x06;

/// Oscillator register (0x07)
pub const REG_OSCILLATOR: u8 = 0x07;

/// ADC register (0x08)
pub const REG_ADC: u8 = 0x08;

/// VCOM level register (0x09)
///
/// Requires 2 bytes.
pub const REG_VCOM_LEVEL: u8 = 0x09;

/// Line data register (0x0A)
///
/// Receives one encoded line: odd dots, scan select, even dots, filler.
pub const REG_DATA: u8 = 0x0a;

/// Number of entries in the command table
pub const COMMAND_COUNT: usize = 26;

/// Controller commands
///
/// Each command is a register index with a constant payload. The discriminant is
/// the numeric command id accepted by [`Command::try_from`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Command {
    /// Channel select for the 1.44" panel
    ChannelSelect1in44 = 0,
    /// Channel select for the 2" panel
    ChannelSelect2in0,
    /// Channel select for the 2.7" panel
    ChannelSelect2in7,
    /// Output off
    OutputOff,
    /// Output disable
    OutputDisable,
    /// Output enable, latches one line onto the panel
    OutputEnable,
    /// Latch off
    LatchOff,
    /// Latch on
    LatchOn,
    /// Gate/source level for the 1.44" panel
    GateSourceLevel1in44,
    /// Gate/source level for the 2" panel
    GateSourceLevel2in0,
    /// Gate/source level for the 2.7" panel
    GateSourceLevel2in7,
    /// Gate discharge level 0
    GateDischarge0,
    /// Gate discharge level 1
    GateDischarge1,
    /// Gate discharge level 2
    GateDischarge2,
    /// Gate discharge level 3
    GateDischarge3,
    /// Positive charge pump on
    ChargePumpPositiveOn,
    /// Positive charge pump off
    ChargePumpPositiveOff,
    /// Negative charge pump on
    ChargePumpNegativeOn,
    /// Negative charge pump off
    ChargePumpNegativeOff,
    /// VCOM driver on
    ChargePumpVcomOn,
    /// VCOM driver off
    ChargePumpVcomOff,
    /// DC/DC frequency setting
    DcFrequency,
    /// Oscillator on
    OscillatorOn,
    /// Oscillator off
    OscillatorOff,
    /// ADC disable
    AdcDisable,
    /// VCOM level setting
    VcomLevel,
}

impl Command {
    /// Every command in numeric id order
    pub const ALL: [Self; COMMAND_COUNT] = [
        Self::ChannelSelect1in44,
        Self::ChannelSelect2in0,
        Self::ChannelSelect2in7,
        Self::OutputOff,
        Self::OutputDisable,
        Self::OutputEnable,
        Self::LatchOff,
        Self::LatchOn,
        Self::GateSourceLevel1in44,
        Self::GateSourceLevel2in0,
        Self::GateSourceLevel2in7,
        Self::GateDischarge0,
        Self::GateDischarge1,
        Self::GateDischarge2,
        Self::GateDischarge3,
        Self::ChargePumpPositiveOn,
        Self::ChargePumpPositiveOff,
        Self::ChargePumpNegativeOn,
        Self::ChargePumpNegativeOff,
        Self::ChargePumpVcomOn,
        Self::ChargePumpVcomOff,
        Self::DcFrequency,
        Self::OscillatorOn,
        Self::OscillatorOff,
        Self::AdcDisable,
        Self::VcomLevel,
    ];

    /// Numeric command id
    pub const fn id(self) -> u8 {
        self as u8
    }

    /// Register index this command writes
    pub const fn register(self) -> u8 {
        match self {
            Self::ChannelSelect1in44 | Self::ChannelSelect2in0 | Self::ChannelSelect2in7 => {
                REG_CHANNEL_SELECT
            }
            Self::OutputOff | Self::OutputDisable | Self::OutputEnable => REG_OUTPUT,
            Self::LatchOff | Self::LatchOn => REG_LATCH,
            Self::GateSourceLevel1in44
            | Self::GateSourceLevel2in0
            | Self::GateSourceLevel2in7
            | Self::GateDischarge0
            | Self::GateDischarge1
            | Self::GateDischarge2
            | Self::GateDischarge3 => REG_GATE_SOURCE_LEVEL,
            Self::ChargePumpPositiveOn
            | Self::ChargePumpPositiveOff
            | Self::ChargePumpNegativeOn
            | Self::ChargePumpNegativeOff
            | Self::ChargePumpVcomOn
            | Self::ChargePumpVcomOff => REG_CHARGE_PUMP,
            Self::DcFrequency => REG_DC_FREQUENCY,
            Self::OscillatorOn | Self::OscillatorOff => REG_OSCILLATOR,
            Self::AdcDisable => REG_ADC,
            Self::VcomLevel => REG_VCOM_LEVEL,
        }
    }

    /// Constant payload written after the data header
    pub const fn payload(self) -> &'static [u8] {
        match self {
            Self::ChannelSelect1in44 => &[0x00, 0x00, 0x00, 0x00, 0x00, 0x0f, 0xff, 0x00],
            Self::ChannelSelect2in0 => &[0x00, 0x00, 0x00, 0x00, 0x01, 0xff, 0xe0, 0x00],
            Self::ChannelSelect2in7 => &[0x00, 0x00, 0x00, 0x7f, 0xff, 0xfe, 0x00, 0x00],
            Self::OutputOff => &[0x05],
            Self::OutputDisable => &[0x24],
            Self::OutputEnable => &[0x2f],
            Self::LatchOff => &[0x00],
            Self::LatchOn => &[0x01],
            Self::GateSourceLevel1in44 | Self::GateSourceLevel2in0 => &[0x03],
            Self::GateSourceLevel2in7 | Self::GateDischarge0 => &[0x00],
            Self::GateDischarge1 => &[0x0c],
            Self::GateDischarge2 => &[0x50],
            Self::GateDischarge3 => &[0xa0],
            Self::ChargePumpPositiveOn => &[0x01],
            Self::ChargePumpPositiveOff => &[0x00],
            Self::ChargePumpNegativeOn => &[0x03],
            Self::ChargePumpNegativeOff => &[0x02],
            Self::ChargePumpVcomOn => &[0x0f],
            Self::ChargePumpVcomOff => &[0x0e],
            Self::DcFrequency => &[0xff],
            Self::OscillatorOn => &[0x9d],
            Self::OscillatorOff => &[0x0d],
            Self::AdcDisable => &[0x00],
            Self::VcomLevel => &[0xd0, 0x00],
        }
    }
}

impl TryFrom<u8> for Command {
    type Error = Error;

    fn try_from(id: u8) -> Result<Self, Self::Error> {
        Self::ALL
            .get(usize::from(id))
            .copied()
            .ok_or(Error::InvalidCommand(id))
    }
}
