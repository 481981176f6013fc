pub mod clock;

pub use clock::{Clock, ManualClock, MonotonicClock};

/// Analog multiplexer channel of the sampling front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Bus-voltage sense input.
    Voltage,
    /// Load-current sense input.
    Current,
}

impl Channel {
    /// The channel the multiplexer is switched to after this one.
    /// Channels alternate strictly: voltage, current, voltage, ...
    #[inline]
    pub fn other(self) -> Self {
        match self {
            Channel::Voltage => Channel::Current,
            Channel::Current => Channel::Voltage,
        }
    }
}

/// Debounced operator-input event reported by the front panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    /// Decrease setpoint by one fine step.
    FineDown,
    /// Increase setpoint by one fine step.
    FineUp,
    /// Decrease setpoint by one coarse step.
    CoarseDown,
    /// Increase setpoint by one coarse step.
    CoarseUp,
}

/// Numeric field on the character display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Voltage,
    Current,
    Power,
    Setpoint,
}

/// Analog front end producing raw conversion results for a selected channel.
pub trait AnalogSource {
    fn convert(&mut self, channel: Channel)
    -> Result<u16, Box<dyn std::error::Error + Send + Sync>>;
}

/// PWM duty-cycle register of the actuation stage. Pure sink.
pub trait DutySink {
    fn set_duty(&mut self, ticks: u16) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Character display driver. Consumes formatted digit values only; the digit
/// layout (fixed width, implicit decimal point) is owned by the implementation.
pub trait Display {
    fn write_field(
        &mut self,
        field: Field,
        digits: &[u8],
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>>;
}

/// Front-panel input. `poll` returns at most one already-debounced event;
/// the core performs no raw electrical debouncing itself.
pub trait InputPanel {
    fn poll(&mut self) -> Result<Option<InputEvent>, Box<dyn std::error::Error + Send + Sync>>;
}

// Boxed trait objects are first-class peripherals so the core can be built
// with either static or dynamic dispatch.
impl<T: AnalogSource + ?Sized> AnalogSource for Box<T> {
    fn convert(
        &mut self,
        channel: Channel,
    ) -> Result<u16, Box<dyn std::error::Error + Send + Sync>> {
        (**self).convert(channel)
    }
}

impl<T: DutySink + ?Sized> DutySink for Box<T> {
    fn set_duty(&mut self, ticks: u16) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).set_duty(ticks)
    }
}

impl<T: Display + ?Sized> Display for Box<T> {
    fn write_field(
        &mut self,
        field: Field,
        digits: &[u8],
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        (**self).write_field(field, digits)
    }
}

impl<T: InputPanel + ?Sized> InputPanel for Box<T> {
    fn poll(&mut self) -> Result<Option<InputEvent>, Box<dyn std::error::Error + Send + Sync>> {
        (**self).poll()
    }
}
