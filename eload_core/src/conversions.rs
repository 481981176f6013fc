//! `From` implementations bridging `eload_config` types to `eload_core` types.
//!
//! These eliminate manual field-by-field mapping in the CLI.

use crate::config::{ChannelScale, CoreCfg, PidCfg, RefreshCfg, SamplingCfg, ScalingCfg, SetpointCfg};

impl From<&eload_config::Sampling> for SamplingCfg {
    fn from(c: &eload_config::Sampling) -> Self {
        Self {
            window: c.window,
            rate_hz: c.rate_hz,
        }
    }
}

impl From<&eload_config::ChannelScale> for ChannelScale {
    fn from(c: &eload_config::ChannelScale) -> Self {
        Self {
            num: c.num,
            den: c.den,
            calib_permille: c.calib_permille,
        }
    }
}

impl From<&eload_config::Scaling> for ScalingCfg {
    fn from(c: &eload_config::Scaling) -> Self {
        Self {
            voltage: (&c.voltage).into(),
            current: (&c.current).into(),
        }
    }
}

impl From<&eload_config::Pid> for PidCfg {
    fn from(c: &eload_config::Pid) -> Self {
        Self {
            kp: c.kp,
            ki: c.ki,
            kd: c.kd,
            min_load_ma: c.min_load_ma,
            output_scale: c.output_scale,
            integral_limit: c.integral_limit,
            duty_max: c.duty_max,
        }
    }
}

impl From<&eload_config::Setpoint> for SetpointCfg {
    fn from(c: &eload_config::Setpoint) -> Self {
        Self {
            min_ma: c.min_ma,
            max_ma: c.max_ma,
            fine_step_ma: c.fine_step_ma,
            coarse_step_ma: c.coarse_step_ma,
            lockout_ms: c.lockout_ms,
            initial_ma: c.initial_ma,
        }
    }
}

impl From<&eload_config::DisplayCfg> for RefreshCfg {
    fn from(c: &eload_config::DisplayCfg) -> Self {
        Self {
            divider: c.refresh_divider,
        }
    }
}

impl From<&eload_config::Config> for CoreCfg {
    fn from(c: &eload_config::Config) -> Self {
        Self {
            sampling: (&c.sampling).into(),
            scaling: (&c.scaling).into(),
            pid: (&c.pid).into(),
            setpoint: (&c.setpoint).into(),
            refresh: (&c.display).into(),
        }
    }
}
