//! Temperature sources
//!
//! COG G1 boards carry an LM75-class sensor next to the glass. Stage timing
//! depends on it, see [`crate::timing`].

use embedded_hal::i2c::I2c;

use crate::hal::TemperatureSensor;

/// Default LM75 address on the panel board
pub const LM75_DEFAULT_ADDRESS: u8 = 0x49;

/// Temperature register
const LM75_REG_TEMP: u8 = 0x00;

/// LM75 temperature sensor on an I2C bus
pub struct Lm75<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C: I2c> Lm75<I2C> {
    /// Sensor at the default address
    pub fn new(i2c: I2C) -> Self {
        Self::with_address(i2c, LM75_DEFAULT_ADDRESS)
    }

    /// Sensor at a custom address
    pub fn with_address(i2c: I2C, address: u8) -> Self {
        Self { i2c, address }
    }

    /// Release the bus
    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C: I2c> TemperatureSensor for Lm75<I2C> {
    type Error = I2C::Error;

    /// Two's complement, 11 significant bits, 0.125 °C per step
    fn read_millicelsius(&mut self) -> Result<i32, Self::Error> {
        let mut buf = [0u8; 2];
        self.i2c
            .write_read(self.address, &[LM75_REG_TEMP], &mut buf)?;
        let raw = i16::from_be_bytes(buf) >> 5;
        Ok(i32::from(raw) * 125)
    }
}

/// Constant temperature, for boards without a sensor
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixedTemperature(pub i32);

impl TemperatureSensor for FixedTemperature {
    type Error = core::convert::Infallible;

    fn read_millicelsius(&mut self) -> Result<i32, Self::Error> {
        Ok(self.0)
    }
}
