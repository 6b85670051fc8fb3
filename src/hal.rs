//! Board capabilities outside `embedded-hal`
//!
//! The bus, GPIO lines and delays come from `embedded-hal` traits. The panel
//! also needs a PWM channel that can be configured in nanoseconds and switched
//! on and off, a temperature reading and a monotonic millisecond clock. These
//! are expressed here as small traits that board support code implements.

use embedded_hal::pwm::{self, SetDutyCycle};

/// PWM channel driving the charge pump during power on
pub trait PwmOutput {
    /// Error type of the channel
    type Error: pwm::Error;

    /// Set period and high time
    fn configure(&mut self, duty_ns: u32, period_ns: u32) -> Result<(), Self::Error>;

    /// Start the output
    fn enable(&mut self) -> Result<(), Self::Error>;

    /// Stop the output
    fn disable(&mut self);
}

/// Panel temperature source
pub trait TemperatureSensor {
    /// Error type of a failed reading
    type Error: core::fmt::Debug;

    /// Read the current temperature in millidegrees Celsius
    fn read_millicelsius(&mut self) -> Result<i32, Self::Error>;
}

/// Monotonic millisecond clock used to time waveform stages
pub trait Clock {
    /// Milliseconds since an arbitrary fixed origin
    fn now_ms(&mut self) -> u64;
}

impl<T: TemperatureSensor + ?Sized> TemperatureSensor for &mut T {
    type Error = T::Error;

    fn read_millicelsius(&mut self) -> Result<i32, Self::Error> {
        T::read_millicelsius(self)
    }
}

impl<T: Clock + ?Sized> Clock for &mut T {
    fn now_ms(&mut self) -> u64 {
        T::now_ms(self)
    }
}

/// [`PwmOutput`] over an `embedded-hal` [`SetDutyCycle`] channel
///
/// The channel period is fixed by the timer; `configure` only records the
/// requested duty ratio, which `enable` applies and `disable` clears.
pub struct DutyCyclePwm<P> {
    pwm: P,
    duty_ns: u32,
    period_ns: u32,
}

impl<P: SetDutyCycle> DutyCyclePwm<P> {
    /// Wrap a channel, initially off
    pub fn new(pwm: P) -> Self {
        Self {
            pwm,
            duty_ns: 0,
            period_ns: 1,
        }
    }

    /// Release the channel
    pub fn release(self) -> P {
        self.pwm
    }
}

impl<P: SetDutyCycle> PwmOutput for DutyCyclePwm<P> {
    type Error = P::Error;

    fn configure(&mut self, duty_ns: u32, period_ns: u32) -> Result<(), Self::Error> {
        self.duty_ns = duty_ns.min(period_ns);
        self.period_ns = period_ns.max(1);
        self.pwm.set_duty_cycle_fully_off()
    }

    fn enable(&mut self) -> Result<(), Self::Error> {
        let max = u64::from(self.pwm.max_duty_cycle());
        let duty = max * u64::from(self.duty_ns) / u64::from(self.period_ns);
        self.pwm.set_duty_cycle(duty as u16)
    }

    fn disable(&mut self) {
        let _ = self.pwm.set_duty_cycle_fully_off();
    }
}

/// [`Clock`] over `std::time::Instant`
#[cfg(feature = "std")]
pub struct StdClock {
    origin: std::time::Instant,
}

#[cfg(feature = "std")]
impl StdClock {
    /// Clock starting at zero now
    pub fn new() -> Self {
        Self {
            origin: std::time::Instant::now(),
        }
    }
}

#[cfg(feature = "std")]
impl Default for StdClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "std")]
impl Clock for StdClock {
    fn now_ms(&mut self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }
}
