//! Integer PID controller driving the actuator duty cycle.
//!
//! Invoked exactly once per completed current-averaging window. All arithmetic
//! is signed 64-bit integer; gains are small positive integers (unity in the
//! reference tuning).

use crate::config::PidCfg;

#[derive(Debug)]
pub struct PidController {
    cfg: PidCfg,
    prev_error: i64,
    integral: i64,
    duty: u16,
}

impl PidController {
    pub fn new(cfg: PidCfg) -> Self {
        Self {
            cfg,
            prev_error: 0,
            integral: 0,
            duty: 0,
        }
    }

    /// One control step: calibrated current (mA) against the setpoint (mA).
    /// Returns the new duty command in actuator ticks.
    ///
    /// Safety floor: below `min_load_ma` the load is effectively disconnected;
    /// duty is forced to zero and error/integral history cleared so no windup
    /// accumulates while idle.
    pub fn update(&mut self, setpoint_ma: u32, current_ma: u32) -> u16 {
        if current_ma < self.cfg.min_load_ma {
            self.reset();
            self.duty = 0;
            return 0;
        }

        let error = i64::from(setpoint_ma) - i64::from(current_ma);
        let proportional = self.cfg.kp.saturating_mul(error);
        self.integral = self
            .integral
            .saturating_add(error)
            .clamp(-self.cfg.integral_limit, self.cfg.integral_limit);
        let integral = self.cfg.ki.saturating_mul(self.integral);
        let derivative = self.cfg.kd.saturating_mul(error - self.prev_error);
        self.prev_error = error;

        // No reverse actuation: output floors at zero. The upper clamp to the
        // actuator top is explicit; the register width is not relied upon.
        let output = proportional
            .saturating_add(integral)
            .saturating_add(derivative)
            .max(0);
        let ticks = (output / self.cfg.output_scale.max(1)).min(i64::from(self.cfg.duty_max));
        self.duty = ticks as u16;
        self.duty
    }

    /// Clear error and integral history.
    pub fn reset(&mut self) {
        self.prev_error = 0;
        self.integral = 0;
    }

    /// Last commanded duty in actuator ticks.
    pub fn duty(&self) -> u16 {
        self.duty
    }

    /// Integral accumulator (telemetry).
    pub fn integral(&self) -> i64 {
        self.integral
    }

    /// Previous cycle's error (telemetry).
    pub fn prev_error(&self) -> i64 {
        self.prev_error
    }
}
