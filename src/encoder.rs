//! Line encoding into the COG G1 wire format
//!
//! Every dot is driven with a 2-bit code. One encoded line is laid out as:
//!
//! | Segment | Bytes              | Content                                        |
//! |---------|--------------------|------------------------------------------------|
//! | odd     | `bytes_per_line`   | odd dots, last line byte first                 |
//! | scan    | `lines / 4`        | `0b11` in the 2-bit field of the selected line |
//! | even    | `bytes_per_line`   | even dots, first line byte first               |
//! | filler  | model dependent    | zero                                           |
//!
//! Frame bytes carry dot 0 in bit 0, so a dot's parity is the parity of its bit.
//! Within an odd byte the four fields (most significant first) come from bits
//! 7, 5, 3 and 1 of the source byte. Within an even byte they come from bits
//! 0, 2, 4 and 6.
//!
//! ## Example
//!
//! ```
//! use epd_g1::{Frame, LineEncoder, LineSelect, PanelModel, Stage};
//!
//! let model = PanelModel::Epd1in44;
//! let frame = match Frame::for_model(model) {
//!     Ok(frame) => frame,
//!     Err(_) => return,
//! };
//! let encoder = LineEncoder::new(model);
//! let mut out = [0u8; 64];
//!
//! let len = encoder.encode(&frame, Stage::Normal, LineSelect::Line(0), &mut out);
//! assert_eq!(len, Ok(encoder.encoded_len(&frame)));
//! // White dots drive 0b10 under the normal stage
//! assert_eq!(out[0], 0xAA);
//! ```

use crate::config::PanelModel;
use crate::error::Error;
use crate::frame::Frame;

/// Drive the dot black
pub const DOT_BLACK: u8 = 0b11;
/// Drive the dot white
pub const DOT_WHITE: u8 = 0b10;
/// Leave the dot undriven
pub const DOT_NOTHING: u8 = 0b01;
/// Neither black nor white drive
pub const DOT_OFF: u8 = 0b00;

/// Scan field selecting a line
pub const SCAN_ON: u8 = 0b11;
/// Scan byte selecting no line
pub const SCAN_OFF: u8 = 0x00;

/// Lines addressed by one scan byte
pub const SCAN_PER_BYTE: usize = 4;

/// Waveform stage a line is encoded for
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Stage {
    /// Drive the inverse of the displayed image
    Compensate,
    /// Drive every dot towards white
    White,
    /// Drive the inverse of the new image
    Inverse,
    /// Drive the new image
    Normal,
    /// Neutral pattern flushed through the shift registers at shutdown
    PowerOff,
}

/// Position of a dot within its line
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Parity {
    /// Odd dot index
    Odd,
    /// Even dot index
    Even,
}

impl Stage {
    /// Drawing stages in the order a refresh runs them
    pub const DRAWING: [Self; 4] = [Self::Compensate, Self::White, Self::Inverse, Self::Normal];

    /// 2-bit drive code for one dot
    ///
    /// `black` is the frame bit of the dot in the frame this stage reads.
    pub const fn dot_code(self, parity: Parity, black: bool) -> u8 {
        match (self, black) {
            (Self::Compensate, true) => DOT_WHITE,
            (Self::Compensate, false) => DOT_BLACK,
            (Self::White, true) => DOT_OFF,
            (Self::White, false) => DOT_WHITE,
            (Self::Inverse, true) => match parity {
                Parity::Odd => DOT_NOTHING,
                Parity::Even => DOT_OFF,
            },
            (Self::Inverse, false) => DOT_BLACK,
            (Self::Normal, true) => DOT_BLACK,
            (Self::Normal, false) => DOT_WHITE,
            (Self::PowerOff, _) => DOT_NOTHING,
        }
    }

    /// Whether the stage reads the displayed frame rather than the staged one
    pub const fn reads_displayed(self) -> bool {
        matches!(self, Self::Compensate | Self::White)
    }
}

/// Line to encode
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LineSelect {
    /// A frame line
    Line(usize),
    /// No line selected, all dots white
    Dummy,
}

/// Encodes frame lines for one panel model
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LineEncoder {
    filler: usize,
}

impl LineEncoder {
    /// Encoder with the filler byte count of `model`
    pub const fn new(model: PanelModel) -> Self {
        Self::with_filler(model.filler_bytes())
    }

    /// Encoder with an explicit filler byte count
    pub const fn with_filler(filler: usize) -> Self {
        Self { filler }
    }

    /// Trailing filler byte count
    pub const fn filler(&self) -> usize {
        self.filler
    }

    /// Encoded length of one line of `frame`
    pub fn encoded_len(&self, frame: &Frame) -> usize {
        2 * frame.bytes_per_line() + frame.lines() / SCAN_PER_BYTE + self.filler
    }

    /// Encode one line of `frame` into `out`
    ///
    /// Returns the number of bytes written.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidLength` if the frame geometry is inconsistent or
    /// `out` is shorter than [`encoded_len`](Self::encoded_len), and
    /// `Error::InvalidArgument` if the line is outside the frame.
    pub fn encode(
        &self,
        frame: &Frame,
        stage: Stage,
        line: LineSelect,
        out: &mut [u8],
    ) -> Result<usize, Error> {
        let lbyte = frame.bytes_per_line();
        if frame.dots() / 4 != 2 * lbyte {
            return Err(Error::InvalidLength {
                required: 8 * lbyte,
                provided: frame.dots(),
            });
        }

        let len = self.encoded_len(frame);
        if out.len() < len {
            return Err(Error::InvalidLength {
                required: len,
                provided: out.len(),
            });
        }

        let data = match line {
            LineSelect::Line(index) => Some(frame.line(index).ok_or(Error::InvalidArgument)?),
            LineSelect::Dummy => None,
        };
        let source = |i: usize| data.map_or(0, |bytes| bytes[i]);

        let (odd, rest) = out[..len].split_at_mut(lbyte);
        let (scan, rest) = rest.split_at_mut(frame.lines() / SCAN_PER_BYTE);
        let (even, filler) = rest.split_at_mut(lbyte);

        for (slot, i) in odd.iter_mut().zip((0..lbyte).rev()) {
            *slot = pack(stage, Parity::Odd, source(i));
        }

        for (i, slot) in scan.iter_mut().enumerate() {
            *slot = match line {
                LineSelect::Line(index) if i == index / SCAN_PER_BYTE => {
                    SCAN_ON << (6 - 2 * (index % SCAN_PER_BYTE))
                }
                _ => SCAN_OFF,
            };
        }

        for (i, slot) in even.iter_mut().enumerate() {
            *slot = pack(stage, Parity::Even, source(i));
        }

        filler.fill(0);

        Ok(len)
    }
}

/// Pack the four dots of one parity from `byte` into a wire byte
fn pack(stage: Stage, parity: Parity, byte: u8) -> u8 {
    (0..4).fold(0, |acc, field| {
        let bit = match parity {
            Parity::Odd => 7 - 2 * field,
            Parity::Even => 2 * field,
        };
        let black = byte & (1 << bit) != 0;
        acc | (stage.dot_code(parity, black) << (6 - 2 * field))
    })
}
