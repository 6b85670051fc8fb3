//! Graphics support via embedded-graphics
//!
//! [`Frame`] implements [`DrawTarget`] with [`BinaryColor`], so any
//! embedded-graphics primitive, font or image can be drawn straight into a
//! panel's staged frame. `BinaryColor::On` paints a black dot.
//!
//! The x axis runs along a line (dots) and the y axis across lines.
//!
//! ## Example
//!
//! ```
//! use embedded_graphics::{
//!     pixelcolor::BinaryColor,
//!     prelude::*,
//!     primitives::{PrimitiveStyle, Rectangle},
//! };
//! use epd_g1::{Color, Frame, PanelModel};
//!
//! let mut frame = match Frame::for_model(PanelModel::Epd1in44) {
//!     Ok(frame) => frame,
//!     Err(_) => return,
//! };
//!
//! let _ = Rectangle::new(Point::new(10, 10), Size::new(20, 8))
//!     .into_styled(PrimitiveStyle::with_fill(BinaryColor::On))
//!     .draw(&mut frame);
//!
//! assert_eq!(frame.pixel(10, 10), Some(Color::Black));
//! assert_eq!(frame.pixel(9, 10), Some(Color::White));
//! ```

use core::convert::Infallible;

use embedded_graphics_core::{
    Pixel,
    draw_target::DrawTarget,
    geometry::{OriginDimensions, Point, Size},
    pixelcolor::BinaryColor,
};

use crate::color::Color;
use crate::frame::Frame;

impl DrawTarget for Frame {
    type Color = BinaryColor;
    type Error = Infallible;

    fn draw_iter<Iter>(&mut self, pixels: Iter) -> Result<(), Self::Error>
    where
        Iter: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(Point { x, y }, color) in pixels {
            if x < 0 || y < 0 {
                continue;
            }
            self.set_pixel(y as usize, x as usize, Color::from(color));
        }

        Ok(())
    }

    fn clear(&mut self, color: Self::Color) -> Result<(), Self::Error> {
        self.fill(Color::from(color));
        Ok(())
    }
}

impl OriginDimensions for Frame {
    fn size(&self) -> Size {
        Size::new(self.dots() as u32, self.lines() as u32)
    }
}
