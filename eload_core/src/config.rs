//! Runtime configuration for the control core.
//!
//! These are the structs consumed by `LoadCore`; they are separate from the
//! TOML-deserialized schema in `eload_config` (see `conversions` for the
//! mapping).

/// Sampling window and pacing.
#[derive(Debug, Clone, Copy)]
pub struct SamplingCfg {
    /// Samples accumulated per channel before one averaged reading is produced.
    pub window: u32,
    /// Free-running conversion rate in Hz (paces the sampler thread).
    pub rate_hz: u32,
}

impl Default for SamplingCfg {
    fn default() -> Self {
        Self {
            window: 250,
            rate_hz: 5_000,
        }
    }
}

/// Fixed linear transform for one channel:
/// `scaled = average * num / den`, then trimmed by `calib_permille / 1000`.
#[derive(Debug, Clone, Copy)]
pub struct ChannelScale {
    pub num: u64,
    pub den: u64,
    pub calib_permille: u32,
}

/// The two channel transforms of the analog front end.
#[derive(Debug, Clone, Copy)]
pub struct ScalingCfg {
    pub voltage: ChannelScale,
    pub current: ChannelScale,
}

impl Default for ScalingCfg {
    fn default() -> Self {
        Self {
            voltage: ChannelScale {
                num: 5500,
                den: 1024,
                calib_permille: 1000,
            },
            current: ChannelScale {
                num: 100_000,
                den: 11_264,
                calib_permille: 750,
            },
        }
    }
}

/// Feedback controller gains and bounds.
#[derive(Debug, Clone, Copy)]
pub struct PidCfg {
    pub kp: i64,
    pub ki: i64,
    pub kd: i64,
    /// Below this current (mA) the load is treated as disconnected: duty is
    /// forced to zero and integral history cleared (anti-windup while idle).
    pub min_load_ma: u32,
    /// Divisor from controller output to actuator ticks.
    pub output_scale: i64,
    /// Saturation bound on the integral accumulator (absolute value).
    pub integral_limit: i64,
    /// Actuator top value; duty never exceeds this.
    pub duty_max: u16,
}

impl Default for PidCfg {
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

/// Setpoint range, step sizes, and input lockout.
#[derive(Debug, Clone, Copy)]
pub struct SetpointCfg {
    pub min_ma: u32,
    pub max_ma: u32,
    pub fine_step_ma: u32,
    pub coarse_step_ma: u32,
    /// Cooldown between two accepted operator inputs (monotonic ms).
    pub lockout_ms: u64,
    pub initial_ma: u32,
}

impl Default for SetpointCfg {
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

/// Display refresh pacing: averaging windows per display update.
#[derive(Debug, Clone, Copy)]
pub struct RefreshCfg {
    pub divider: u32,
}

impl Default for RefreshCfg {
    fn default() -> Self {
        Self { divider: 6 }
    }
}

/// Bundle of all runtime configuration consumed by the core.
#[derive(Debug, Clone, Copy, Default)]
pub struct CoreCfg {
    pub sampling: SamplingCfg,
    pub scaling: ScalingCfg,
    pub pid: PidCfg,
    pub setpoint: SetpointCfg,
    pub refresh: RefreshCfg,
}
