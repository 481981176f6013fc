pub mod error;
#[cfg(all(feature = "hardware", target_os = "linux"))]
pub mod mcp3008;

use std::sync::Arc;
use std::sync::atomic::{AtomicU16, Ordering};

use eload_traits::{AnalogSource, Channel, Display, DutySink, Field, InputEvent, InputPanel};

/// Shared duty state linking `SimulatedDuty` to `SimulatedFrontEnd`, closing
/// the loop without real hardware.
#[derive(Debug, Default, Clone)]
pub struct SimulatedBus {
    duty: Arc<AtomicU16>,
}

impl SimulatedBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn duty(&self) -> u16 {
        self.duty.load(Ordering::Relaxed)
    }
}

/// Simulated analog front end: a resistive load whose current tracks the
/// commanded duty, sensed through the same 10-bit converter model the real
/// front end uses.
pub struct SimulatedFrontEnd {
    bus: SimulatedBus,
    /// Raw counts on the voltage channel (10-bit, supply-dependent).
    pub voltage_counts: u16,
    /// Raw current counts per duty tick, in tenths (9 ~= full scale at top duty).
    pub counts_per_tick_tenths: u16,
}

impl SimulatedFrontEnd {
    pub fn new(bus: SimulatedBus) -> Self {
        SimulatedFrontEnd {
            bus,
            voltage_counts: 930,
            counts_per_tick_tenths: 9,
        }
    }
}

impl AnalogSource for SimulatedFrontEnd {
    fn convert(
        &mut self,
        channel: Channel,
    ) -> Result<u16, Box<dyn std::error::Error + Send + Sync>> {
        let raw = match channel {
            Channel::Voltage => self.voltage_counts,
            Channel::Current => {
                let duty = u32::from(self.bus.duty());
                let counts = duty * u32::from(self.counts_per_tick_tenths) / 10;
                counts.min(1023) as u16
            }
        };
        Ok(raw)
    }
}

/// Simulated PWM sink; publishes the commanded duty on the shared bus.
pub struct SimulatedDuty {
    bus: SimulatedBus,
}

impl SimulatedDuty {
    pub fn new(bus: SimulatedBus) -> Self {
        SimulatedDuty { bus }
    }
}

impl DutySink for SimulatedDuty {
    fn set_duty(&mut self, ticks: u16) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        self.bus.duty.store(ticks, Ordering::Relaxed);
        Ok(())
    }
}

/// Display that renders field updates to the log instead of a panel.
pub struct ConsoleDisplay;

impl Display for ConsoleDisplay {
    fn write_field(
        &mut self,
        field: Field,
        digits: &[u8],
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let mut s = String::with_capacity(digits.len());
        for d in digits {
            s.push(char::from(b'0' + (d % 10)));
        }
        tracing::info!(?field, digits = %s, "display update");
        Ok(())
    }
}

/// Input panel with no keys; the simulated rig has no front panel.
pub struct NoopPanel;

impl InputPanel for NoopPanel {
    fn poll(&mut self) -> Result<Option<InputEvent>, Box<dyn std::error::Error + Send + Sync>> {
        Ok(None)
    }
}

#[cfg(all(feature = "hardware", target_os = "linux"))]
pub use hw::{ButtonPanel, HardwareDuty, HardwareFrontEnd};

#[cfg(all(feature = "hardware", target_os = "linux"))]
mod hw {
    use super::*;
    use crate::error::HwError;
    use crate::mcp3008::Mcp3008;

    /// Real analog front end: MCP3008 channels for voltage and current sense.
    pub struct HardwareFrontEnd {
        adc: Mcp3008,
        voltage_ch: u8,
        current_ch: u8,
    }

    impl HardwareFrontEnd {
        pub fn new(adc: Mcp3008, voltage_ch: u8, current_ch: u8) -> Self {
            HardwareFrontEnd {
                adc,
                voltage_ch,
                current_ch,
            }
        }

        /// Open the SPI bus and wrap the converter behind it.
        pub fn open(
            spi_bus: u8,
            spi_cs: u8,
            voltage_ch: u8,
            current_ch: u8,
        ) -> Result<Self, HwError> {
            let bus = match spi_bus {
                0 => rppal::spi::Bus::Spi0,
                1 => rppal::spi::Bus::Spi1,
                _ => rppal::spi::Bus::Spi2,
            };
            let cs = match spi_cs {
                0 => rppal::spi::SlaveSelect::Ss0,
                1 => rppal::spi::SlaveSelect::Ss1,
                _ => rppal::spi::SlaveSelect::Ss2,
            };
            let spi = rppal::spi::Spi::new(bus, cs, 1_000_000, rppal::spi::Mode::Mode0)
                .map_err(|e| HwError::Spi(e.to_string()))?;
            Ok(Self::new(Mcp3008::new(spi), voltage_ch, current_ch))
        }
    }

    impl AnalogSource for HardwareFrontEnd {
        fn convert(
            &mut self,
            channel: Channel,
        ) -> Result<u16, Box<dyn std::error::Error + Send + Sync>> {
            let ch = match channel {
                Channel::Voltage => self.voltage_ch,
                Channel::Current => self.current_ch,
            };
            Ok(self.adc.convert(ch)?)
        }
    }

    /// Real PWM duty output driving the load MOSFET gate.
    pub struct HardwareDuty {
        pwm: rppal::pwm::Pwm,
        top: u16,
    }

    impl HardwareDuty {
        /// `top` is the tick count corresponding to 100% duty.
        pub fn new(pwm: rppal::pwm::Pwm, top: u16) -> Self {
            HardwareDuty { pwm, top: top.max(1) }
        }

        /// Open a hardware PWM channel at `hz`, starting at zero duty.
        pub fn open(channel: u8, hz: f64, top: u16) -> Result<Self, HwError> {
            let channel = if channel == 0 {
                rppal::pwm::Channel::Pwm0
            } else {
                rppal::pwm::Channel::Pwm1
            };
            let pwm = rppal::pwm::Pwm::with_frequency(
                channel,
                hz,
                0.0,
                rppal::pwm::Polarity::Normal,
                true,
            )
            .map_err(|e| HwError::Pwm(e.to_string()))?;
            Ok(Self::new(pwm, top))
        }
    }

    impl DutySink for HardwareDuty {
        fn set_duty(
            &mut self,
            ticks: u16,
        ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
            let cycle = f64::from(ticks.min(self.top)) / f64::from(self.top);
            self.pwm
                .set_duty_cycle(cycle)
                .map_err(|e| Box::new(HwError::Pwm(e.to_string())) as _)
        }
    }

    /// Front-panel buttons on GPIO inputs, one per setpoint event.
    /// Hardware RC debouncing is assumed; polling reports falling edges.
    pub struct ButtonPanel {
        pins: [(rppal::gpio::InputPin, InputEvent); 4],
        last_low: [bool; 4],
    }

    impl ButtonPanel {
        pub fn new(
            fine_down: rppal::gpio::InputPin,
            fine_up: rppal::gpio::InputPin,
            coarse_down: rppal::gpio::InputPin,
            coarse_up: rppal::gpio::InputPin,
        ) -> Self {
            ButtonPanel {
                pins: [
                    (fine_down, InputEvent::FineDown),
                    (fine_up, InputEvent::FineUp),
                    (coarse_down, InputEvent::CoarseDown),
                    (coarse_up, InputEvent::CoarseUp),
                ],
                last_low: [false; 4],
            }
        }

        /// Claim the four button GPIOs as pull-up inputs, in the event order
        /// fine-down, fine-up, coarse-down, coarse-up.
        pub fn open(pins: [u8; 4]) -> Result<Self, HwError> {
            let gpio = rppal::gpio::Gpio::new().map_err(|e| HwError::Gpio(e.to_string()))?;
            let mut claim = |n: u8| -> Result<rppal::gpio::InputPin, HwError> {
                Ok(gpio
                    .get(n)
                    .map_err(|e| HwError::Gpio(format!("pin {n}: {e}")))?
                    .into_input_pullup())
            };
            Ok(Self::new(
                claim(pins[0])?,
                claim(pins[1])?,
                claim(pins[2])?,
                claim(pins[3])?,
            ))
        }
    }

    impl InputPanel for ButtonPanel {
        fn poll(
            &mut self,
        ) -> Result<Option<InputEvent>, Box<dyn std::error::Error + Send + Sync>> {
            for (i, (pin, event)) in self.pins.iter().enumerate() {
                let low = pin.is_low();
                let pressed = low && !self.last_low[i];
                self.last_low[i] = low;
                if pressed {
                    return Ok(Some(*event));
                }
            }
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simulated_current_tracks_duty() {
        let bus = SimulatedBus::new();
        let mut sink = SimulatedDuty::new(bus.clone());
        let mut fe = SimulatedFrontEnd::new(bus);

        sink.set_duty(0).unwrap();
        assert_eq!(fe.convert(Channel::Current).unwrap(), 0);

        sink.set_duty(833).unwrap();
        let counts = fe.convert(Channel::Current).unwrap();
        assert_eq!(counts, 749);
        // Voltage channel is unaffected by duty.
        assert_eq!(fe.convert(Channel::Voltage).unwrap(), 930);
    }

    #[test]
    fn simulated_current_saturates_at_full_scale() {
        let bus = SimulatedBus::new();
        let mut sink = SimulatedDuty::new(bus.clone());
        let mut fe = SimulatedFrontEnd::new(bus);
        sink.set_duty(u16::MAX).unwrap();
        assert_eq!(fe.convert(Channel::Current).unwrap(), 1023);
    }

    #[test]
    fn console_display_accepts_any_field() {
        let mut d = ConsoleDisplay;
        d.write_field(Field::Power, &[1, 2, 3, 4]).unwrap();
    }
}
