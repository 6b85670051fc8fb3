//! Panel configuration types and builder

pub use crate::error::BuilderError;

use crate::command::Command;
use crate::error::Error;

/// Default PWM period in nanoseconds (200 kHz)
pub const DEFAULT_PWM_PERIOD_NS: u32 = 5_000;

/// Default PWM duty cycle in percent
pub const DEFAULT_PWM_DUTY_PERCENT: u8 = 50;

/// Supported COG G1 panel variants
///
/// Each variant fixes the panel geometry, the base duration of one waveform
/// stage and whether the controller expects a trailing filler byte per line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PanelModel {
    /// 1.44" panel, 96 lines of 128 dots
    Epd1in44,
    /// 2" panel, 96 lines of 200 dots
    Epd2in0,
    /// 2.7" panel, 176 lines of 264 dots
    #[default]
    Epd2in7,
}

impl PanelModel {
    /// Number of lines (gate outputs)
    pub const fn lines(self) -> usize {
        match self {
            Self::Epd1in44 | Self::Epd2in0 => 96,
            Self::Epd2in7 => 176,
        }
    }

    /// Number of dots per line (source outputs)
    pub const fn dots(self) -> usize {
        match self {
            Self::Epd1in44 => 128,
            Self::Epd2in0 => 200,
            Self::Epd2in7 => 264,
        }
    }

    /// Bytes per raster line, one bit per dot
    pub const fn bytes_per_line(self) -> usize {
        self.dots().div_ceil(8)
    }

    /// Size of one frame buffer in bytes
    pub const fn framebuffer_size(self) -> usize {
        self.lines() * self.bytes_per_line()
    }

    /// Base stage duration in milliseconds at room temperature
    pub const fn base_stage_time_ms(self) -> u32 {
        match self {
            Self::Epd1in44 | Self::Epd2in0 => 480,
            Self::Epd2in7 => 630,
        }
    }

    /// Trailing zero bytes sent after the even dots of every line
    pub const fn filler_bytes(self) -> usize {
        match self {
            Self::Epd1in44 => 0,
            Self::Epd2in0 | Self::Epd2in7 => 1,
        }
    }

    /// Channel select command for this geometry
    pub const fn channel_select(self) -> Command {
        match self {
            Self::Epd1in44 => Command::ChannelSelect1in44,
            Self::Epd2in0 => Command::ChannelSelect2in0,
            Self::Epd2in7 => Command::ChannelSelect2in7,
        }
    }

    /// Gate/source level command for this geometry
    pub const fn gate_source_level(self) -> Command {
        match self {
            Self::Epd1in44 => Command::GateSourceLevel1in44,
            Self::Epd2in0 => Command::GateSourceLevel2in0,
            Self::Epd2in7 => Command::GateSourceLevel2in7,
        }
    }
}

impl TryFrom<u8> for PanelModel {
    type Error = Error;

    /// Map a board-level model selector (0 = 1.44", 1 = 2", 2 = 2.7")
    fn try_from(selector: u8) -> Result<Self, Self::Error> {
        match selector {
            0 => Ok(Self::Epd1in44),
            1 => Ok(Self::Epd2in0),
            2 => Ok(Self::Epd2in7),
            _ => Err(Error::InvalidArgument),
        }
    }
}

/// Bound on the BUSY line handshake
///
/// The controller is line-buffer limited and holds BUSY while it shifts data.
/// Real hardware spins without a bound; a bound turns a stuck line into
/// [`IoError::BusyTimeout`](crate::error::IoError::BusyTimeout).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BusyWait {
    /// Spin until the line clears
    #[default]
    Unbounded,
    /// Give up after this many polls
    Polls(u32),
}

/// Panel configuration
///
/// Use [`Builder`] to create a Config.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    /// Panel variant
    pub model: PanelModel,
    /// PWM period in nanoseconds
    pub pwm_period_ns: u32,
    /// PWM duty cycle in percent
    pub pwm_duty_percent: u8,
    /// BUSY handshake bound
    pub busy_wait: BusyWait,
}

impl Config {
    /// PWM high time in nanoseconds
    pub fn pwm_duty_ns(&self) -> u32 {
        let duty = u64::from(self.pwm_period_ns) * u64::from(self.pwm_duty_percent) / 100;
        duty as u32
    }
}

/// Builder for constructing panel configuration
///
/// # Example
///
/// ```rust,no_run
/// use epd_g1::{BusyWait, Builder, PanelModel};
///
/// let config = match Builder::new()
///     .model(PanelModel::Epd1in44)
///     .busy_wait(BusyWait::Polls(100_000))
///     .build()
/// {
///     Ok(config) => config,
///     Err(_) => return,
/// };
/// let _ = config;
/// ```
#[must_use]
pub struct Builder {
    /// Panel variant
    model: PanelModel,
    /// PWM period in nanoseconds
    pwm_period_ns: u32,
    /// PWM duty cycle in percent
    pwm_duty_percent: u8,
    /// BUSY handshake bound
    busy_wait: BusyWait,
}

impl Default for Builder {
    fn default() -> Self {
        Self {
            model: PanelModel::default(),
            pwm_period_ns: DEFAULT_PWM_PERIOD_NS,
            pwm_duty_percent: DEFAULT_PWM_DUTY_PERCENT,
            busy_wait: BusyWait::Unbounded,
        }
    }
}

impl Builder {
    /// Create a new Builder with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the panel variant
    pub fn model(mut self, model: PanelModel) -> Self {
        self.model = model;
        self
    }

    /// Set the PWM period in nanoseconds
    pub fn pwm_period_ns(mut self, period_ns: u32) -> Self {
        self.pwm_period_ns = period_ns;
        self
    }

    /// Set the PWM duty cycle in percent
    pub fn pwm_duty_percent(mut self, duty_percent: u8) -> Self {
        self.pwm_duty_percent = duty_percent;
        self
    }

    /// Set the BUSY handshake bound
    pub fn busy_wait(mut self, busy_wait: BusyWait) -> Self {
        self.busy_wait = busy_wait;
        self
    }

    /// Build the configuration
    ///
    /// # Errors
    ///
    /// Returns `BuilderError::InvalidPwm` if the period is zero or the duty
    /// cycle exceeds 100%, and `BuilderError::ZeroBusyPolls` for a zero poll bound
    pub fn build(self) -> Result<Config, BuilderError> {
        if self.pwm_period_ns == 0 || self.pwm_duty_percent > 100 {
            return Err(BuilderError::InvalidPwm {
                period_ns: self.pwm_period_ns,
                duty_percent: self.pwm_duty_percent,
            });
        }
        if self.busy_wait == BusyWait::Polls(0) {
            return Err(BuilderError::ZeroBusyPolls);
        }
        Ok(Config {
            model: self.model,
            pwm_period_ns: self.pwm_period_ns,
            pwm_duty_percent: self.pwm_duty_percent,
            busy_wait: self.busy_wait,
        })
    }
}
