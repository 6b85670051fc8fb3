//! Bit-packed monochrome frames
//!
//! A [`Frame`] holds one bit per dot, row-major, `bytes_per_line` bytes per line.
//! Within a byte the least significant bit is the lowest numbered dot, so dot 0
//! is bit 0 of the first byte. A set bit is black.
//!
//! A panel owns a [`FramePair`]: the `displayed` frame mirrors what the glass
//! currently shows and the `staged` frame receives the next image.

use alloc::vec::Vec;

use crate::color::Color;
use crate::config::PanelModel;
use crate::error::Error;

/// Monochrome raster with fixed geometry
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    lines: usize,
    dots: usize,
    bytes_per_line: usize,
    data: Vec<u8>,
}

impl Frame {
    /// Allocate a white frame
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidArgument` for zero geometry and
    /// `Error::OutOfMemory` if the buffer cannot be allocated.
    pub fn new(lines: usize, dots: usize) -> Result<Self, Error> {
        if lines == 0 || dots == 0 {
            return Err(Error::InvalidArgument);
        }
        let bytes_per_line = dots.div_ceil(8);
        let size = lines
            .checked_mul(bytes_per_line)
            .ok_or(Error::OutOfMemory)?;

        let mut data = Vec::new();
        data.try_reserve_exact(size)
            .map_err(|_| Error::OutOfMemory)?;
        data.resize(size, Color::White.fill_byte());

        Ok(Self {
            lines,
            dots,
            bytes_per_line,
            data,
        })
    }

    /// Allocate a white frame sized for a panel model
    pub fn for_model(model: PanelModel) -> Result<Self, Error> {
        Self::new(model.lines(), model.dots())
    }

    /// Number of lines
    pub fn lines(&self) -> usize {
        self.lines
    }

    /// Dots per line
    pub fn dots(&self) -> usize {
        self.dots
    }

    /// Bytes per line
    pub fn bytes_per_line(&self) -> usize {
        self.bytes_per_line
    }

    /// Buffer size in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Always false, frames have non-zero geometry
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Bytes of one line, or `None` past the last line
    pub fn line(&self, index: usize) -> Option<&[u8]> {
        let start = index.checked_mul(self.bytes_per_line)?;
        let end = start.checked_add(self.bytes_per_line)?;
        self.data.get(start..end)
    }

    /// Paint every dot
    pub fn fill(&mut self, color: Color) {
        self.data.fill(color.fill_byte());
    }

    /// Set one dot, ignoring coordinates outside the frame
    pub fn set_pixel(&mut self, line: usize, dot: usize, color: Color) {
        if line >= self.lines || dot >= self.dots {
            return;
        }
        let index = line * self.bytes_per_line + dot / 8;
        let mask = 1 << (dot % 8);
        if color.is_set() {
            self.data[index] |= mask;
        } else {
            self.data[index] &= !mask;
        }
    }

    /// Read one dot
    pub fn pixel(&self, line: usize, dot: usize) -> Option<Color> {
        if line >= self.lines || dot >= self.dots {
            return None;
        }
        let byte = self.data[line * self.bytes_per_line + dot / 8];
        if byte & (1 << (dot % 8)) != 0 {
            Some(Color::Black)
        } else {
            Some(Color::White)
        }
    }

    /// Raw buffer
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Raw buffer, mutable
    pub fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }
}

/// Displayed and staged frames of one panel
///
/// Exactly one slot is displayed and one is staged at all times. A successful
/// refresh [`commit`](Self::commit)s the staged image.
#[derive(Clone, Debug)]
pub struct FramePair {
    /// Image currently on the glass
    pub displayed: Frame,
    /// Image the next refresh will show
    pub staged: Frame,
}

impl FramePair {
    /// Allocate both frames: displayed starts black, staged starts white
    pub fn for_model(model: PanelModel) -> Result<Self, Error> {
        let mut displayed = Frame::for_model(model)?;
        displayed.fill(Color::Black);
        let staged = Frame::for_model(model)?;
        Ok(Self { displayed, staged })
    }

    /// Exchange the contents of the two slots
    pub fn swap(&mut self) {
        core::mem::swap(&mut self.displayed, &mut self.staged);
    }

    /// Make the staged image the displayed one
    ///
    /// The staged slot is then refilled from the displayed image so readers of
    /// the staged frame keep seeing what the glass shows.
    pub fn commit(&mut self) {
        self.swap();
        self.staged.data.copy_from_slice(&self.displayed.data);
    }
}
