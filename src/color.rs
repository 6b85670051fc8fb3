//! Color types for monochrome e-paper panels
//!
//! This module defines the [`Color`] enum for the two dot states of a COG G1 panel.
//!
//! ## Color Representation
//!
//! Frames are bit-packed with one bit per dot. A set bit is a black dot:
//!
//! | Color | Frame bit | Fill byte |
//! |-------|-----------|-----------|
//! | Black | 1         | 0xFF      |
//! | White | 0         | 0x00      |
//!
//! ## Example
//!
//! ```
//! use epd_g1::Color;
//!
//! assert_eq!(Color::Black.fill_byte(), 0xFF);
//! assert_eq!(Color::White.fill_byte(), 0x00);
//! ```

/// Dot colors supported by the panel
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Color {
    /// Black dot (bit set)
    Black,
    /// White dot (bit clear)
    White,
}

#[cfg(feature = "graphics")]
impl From<embedded_graphics_core::pixelcolor::BinaryColor> for Color {
    /// `On` draws black
    fn from(color: embedded_graphics_core::pixelcolor::BinaryColor) -> Self {
        if color.is_on() {
            Self::Black
        } else {
            Self::White
        }
    }
}

impl Color {
    /// Byte value that paints eight dots of this color
    pub const fn fill_byte(self) -> u8 {
        match self {
            Self::Black => 0xFF,
            Self::White => 0x00,
        }
    }

    /// Frame bit for one dot of this color
    pub const fn is_set(self) -> bool {
        matches!(self, Self::Black)
    }
}
