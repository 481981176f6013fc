#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Config schema for the electronic-load controller.
//!
//! `Config` and sub-structs are deserialized from TOML and validated.
//! The two channel scale transforms are fixed linear constants tuned to the
//! analog front end's attenuation/gain; there is no multi-point calibration.
use serde::Deserialize;

/// Largest accepted `sampling.window`. The sample counter backing the
/// averaging windows is a 16-bit field; the cap leaves headroom for samples
/// recorded while a drain is pending.
pub const MAX_SAMPLING_WINDOW: u32 = 16_384;

/// Fixed linear scale for one analog channel:
/// `scaled = average * num / den * calib_permille / 1000`.
#[derive(Debug, Deserialize, Clone, Copy)]
pub struct ChannelScale {
    pub num: u64,
    pub den: u64,
    /// Trim ratio in permille (1000 = unity). The reference front end uses
    /// 1000 for voltage and 750 for current.
    #[serde(default = "default_permille")]
    pub calib_permille: u32,
}

fn default_permille() -> u32 {
    1000
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct Scaling {
    pub voltage: ChannelScale,
    pub current: ChannelScale,
}

impl Default for Scaling {
    fn default() -> Self {
        Self {
            // Voltage divider: 10-bit counts to millivolts at full scale 5500.
            voltage: ChannelScale {
                num: 5500,
                den: 1024,
                calib_permille: 1000,
            },
            // Shunt amplifier: counts to milliamps, trimmed to 75%.
            current: ChannelScale {
                num: 100_000,
                den: 11_264,
                calib_permille: 750,
            },
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct Sampling {
    /// Samples accumulated per channel before one averaged reading is produced.
    pub window: u32,
    /// Free-running conversion rate in Hz (informational; paces the simulated
    /// front end and the sampler thread).
    pub rate_hz: u32,
}

impl Default for Sampling {
    fn default() -> Self {
        Self {
            window: 250,
            rate_hz: 5_000,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct Pid {
    pub kp: i64,
    pub ki: i64,
    pub kd: i64,
    /// Below this calibrated current (mA) the load is treated as disconnected:
    /// duty forced to zero and integral history cleared.
    pub min_load_ma: u32,
    /// Divisor from controller output to actuator ticks.
    pub output_scale: i64,
    /// Saturation bound for the integral accumulator (absolute value).
    pub integral_limit: i64,
    /// Actuator top value; duty is clamped here.
    pub duty_max: u16,
}

impl Default for Pid {
    fn default() -> Self {
        Self {
            kp: 1,
            ki: 1,
            kd: 1,
            min_load_ma: 200,
            output_scale: 10,
            integral_limit: 1_000_000,
            duty_max: 833,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct Setpoint {
    pub min_ma: u32,
    pub max_ma: u32,
    pub fine_step_ma: u32,
    pub coarse_step_ma: u32,
    /// Minimum interval between two accepted operator inputs.
    pub lockout_ms: u64,
    /// Setpoint at power-up.
    pub initial_ma: u32,
}

impl Default for Setpoint {
    fn default() -> Self {
        Self {
            min_ma: 1_000,
            max_ma: 5_000,
            fine_step_ma: 100,
            coarse_step_ma: 1_000,
            lockout_ms: 150,
            initial_ma: 1_000,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct DisplayCfg {
    /// Averaging windows per display refresh (decouples the control rate from
    /// the human-readable refresh rate).
    pub refresh_divider: u32,
}

impl Default for DisplayCfg {
    fn default() -> Self {
        Self { refresh_divider: 6 }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Logging {
    pub file: Option<String>,  // path to .log (JSON lines)
    pub level: Option<String>, // "info","debug"
    /// Log rotation policy: "never" | "daily" | "hourly" (default: never)
    pub rotation: Option<String>,
}

/// Raspberry Pi backend wiring; only read when built with the `hardware`
/// feature of `eload_hardware`.
#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct Hardware {
    /// SPI bus index for the MCP3008 front end.
    pub spi_bus: u8,
    /// SPI chip-select index.
    pub spi_cs: u8,
    /// Hardware PWM channel driving the load FET gate.
    pub pwm_channel: u8,
    /// PWM carrier frequency in Hz.
    pub pwm_hz: f64,
    /// GPIO pins for the four setpoint buttons.
    pub btn_fine_down: u8,
    pub btn_fine_up: u8,
    pub btn_coarse_down: u8,
    pub btn_coarse_up: u8,
}

impl Default for Hardware {
    fn default() -> Self {
        Self {
            spi_bus: 0,
            spi_cs: 0,
            pwm_channel: 0,
            pwm_hz: 19_200.0,
            btn_fine_down: 2,
            btn_fine_up: 3,
            btn_coarse_down: 4,
            btn_coarse_up: 5,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub sampling: Sampling,
    pub scaling: Scaling,
    pub pid: Pid,
    pub setpoint: Setpoint,
    pub display: DisplayCfg,
    pub logging: Logging,
    pub hardware: Hardware,
}

pub fn load_toml(s: &str) -> Result<Config, toml::de::Error> {
    toml::from_str::<Config>(s)
}

impl Config {
    pub fn validate(&self) -> eyre::Result<()> {
        // Sampling
        if self.sampling.window == 0 {
            eyre::bail!("sampling.window must be >= 1");
        }
        if self.sampling.window > MAX_SAMPLING_WINDOW {
            eyre::bail!("sampling.window must be <= {MAX_SAMPLING_WINDOW}");
        }
        if self.sampling.rate_hz == 0 {
            eyre::bail!("sampling.rate_hz must be > 0");
        }

        // Scaling
        for (name, s) in [
            ("voltage", &self.scaling.voltage),
            ("current", &self.scaling.current),
        ] {
            if s.den == 0 {
                eyre::bail!("scaling.{name}.den must be > 0");
            }
            if s.num == 0 {
                eyre::bail!("scaling.{name}.num must be > 0");
            }
            if s.calib_permille == 0 || s.calib_permille > 2_000 {
                eyre::bail!("scaling.{name}.calib_permille must be in (0, 2000]");
            }
        }

        // Pid
        if self.pid.kp < 0 || self.pid.ki < 0 || self.pid.kd < 0 {
            eyre::bail!("pid gains must be >= 0");
        }
        if self.pid.output_scale <= 0 {
            eyre::bail!("pid.output_scale must be > 0");
        }
        if self.pid.integral_limit <= 0 {
            eyre::bail!("pid.integral_limit must be > 0");
        }
        if self.pid.duty_max == 0 {
            eyre::bail!("pid.duty_max must be > 0");
        }

        // Setpoint
        if self.setpoint.min_ma >= self.setpoint.max_ma {
            eyre::bail!("setpoint.min_ma must be < setpoint.max_ma");
        }
        if self.setpoint.fine_step_ma == 0 || self.setpoint.coarse_step_ma == 0 {
            eyre::bail!("setpoint steps must be > 0");
        }
        if self.setpoint.fine_step_ma > self.setpoint.coarse_step_ma {
            eyre::bail!("setpoint.fine_step_ma must be <= setpoint.coarse_step_ma");
        }
        if !(self.setpoint.min_ma..=self.setpoint.max_ma).contains(&self.setpoint.initial_ma) {
            eyre::bail!("setpoint.initial_ma must be within [min_ma, max_ma]");
        }
        if self.setpoint.lockout_ms > 10_000 {
            eyre::bail!("setpoint.lockout_ms is unreasonably large (>10s)");
        }

        // Display
        if self.display.refresh_divider == 0 {
            eyre::bail!("display.refresh_divider must be >= 1");
        }

        // Hardware
        if self.hardware.pwm_hz <= 0.0 {
            eyre::bail!("hardware.pwm_hz must be > 0");
        }

        Ok(())
    }
}
