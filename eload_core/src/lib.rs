#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]
//! Core electronic-load control logic (hardware-agnostic).
//!
//! This crate provides the hardware-independent control engine for a
//! constant-current bench load. All hardware interactions go through the
//! `eload_traits` peripheral traits (`AnalogSource`, `DutySink`, `Display`,
//! `InputPanel`).
//!
//! ## Architecture
//!
//! - **Acquisition**: background sampler thread alternating channels into
//!   lock-free accumulators (`sampler`, `accumulator` modules)
//! - **Averaging**: window drain + linear scaling + calibration trim
//!   (`averager` module)
//! - **Control**: integer PID with load-floor reset and explicit clamps
//!   (`pid` module)
//! - **Setpoint**: bounded stepper with snap-to-bound and cooldown lockout
//!   (`setpoint` module)
//! - **Display pacing**: refresh divider and digit formatting (`refresh`,
//!   `display` modules)
//!
//! ## Fixed-Point Arithmetic
//!
//! Internals operate in scaled integers (millivolts, milliamps, milliwatts,
//! PWM ticks) for deterministic behavior; there is no floating point in the
//! control path.

pub mod accumulator;
pub mod averager;
pub mod config;
pub mod conversions;
pub mod display;
pub mod error;
pub mod hw_error;
pub mod mocks;
pub mod pid;
pub mod refresh;
pub mod runner;
pub mod sampler;
pub mod setpoint;
pub mod status;
pub mod util;

use std::sync::Arc;

use eload_traits::clock::{Clock, MonotonicClock};
use eload_traits::{Channel, Display, DutySink, Field, InputPanel};
use eyre::WrapErr;
use std::time::Instant;

use crate::accumulator::AccumulatorBank;
use crate::averager::Averager;
use crate::config::CoreCfg;
use crate::error::{BuildError, Result};
use crate::hw_error::map_hw_error;
use crate::pid::PidController;
use crate::refresh::RefreshDivider;
use crate::setpoint::SetpointManager;
pub use crate::status::ServiceReport;

/// Latest calibrated readings, recomputed as windows complete. Power is
/// always derived from its inputs, never stored independently.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Readings {
    pub voltage_mv: u32,
    pub current_ma: u32,
    pub power_mw: u32,
}

impl Readings {
    /// mV * mA = uW; divide by 1000 for mW.
    #[inline]
    fn derive_power(voltage_mv: u32, current_ma: u32) -> u32 {
        let uw = u64::from(voltage_mv) * u64::from(current_ma);
        (uw / 1000).min(u64::from(u32::MAX)) as u32
    }
}

/// Unified core for both dynamic (boxed) and generic (static dispatch) variants.
pub struct LoadCore<A: DutySink, D: Display, P: InputPanel> {
    sink: A,
    display: D,
    panel: P,
    bank: Arc<AccumulatorBank>,
    averager: Averager,
    pid: PidController,
    setpoint: SetpointManager,
    refresh: RefreshDivider,
    // Unified clock for deterministic time in tests
    clock: Arc<dyn Clock + Send + Sync>,
    epoch: Instant,
    readings: Readings,
}

impl<A: DutySink, D: Display, P: InputPanel> core::fmt::Debug for LoadCore<A, D, P> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("LoadCore")
            .field("setpoint_ma", &self.setpoint.value_ma())
            .field("readings", &self.readings)
            .field("duty", &self.pid.duty())
            .finish()
    }
}

impl<A: DutySink, D: Display, P: InputPanel> LoadCore<A, D, P> {
    /// Latest calibrated readings.
    pub fn readings(&self) -> Readings {
        self.readings
    }

    /// Current target current in milliamps.
    pub fn setpoint_ma(&self) -> u32 {
        self.setpoint.value_ma()
    }

    /// Last commanded duty in actuator ticks.
    pub fn duty(&self) -> u16 {
        self.pid.duty()
    }

    /// One pass of the cooperative control loop.
    ///
    /// Polls the input panel, drains whichever averaging windows have
    /// completed, runs the PID step on a completed current window, and paces
    /// the paired display updates through the refresh divider.
    pub fn service(&mut self) -> Result<ServiceReport> {
        let mut report = ServiceReport::default();

        if let Some(event) = self
            .panel
            .poll()
            .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
            .wrap_err("polling input panel")?
        {
            let now_ms = self.clock.ms_since(self.epoch);
            if self.setpoint.apply(event, now_ms) {
                report.setpoint_accepted = true;
                self.write_field(Field::Setpoint, self.setpoint.value_ma())
                    .wrap_err("setpoint display update")?;
            }
        }

        if let Some(mv) = self
            .averager
            .try_drain(self.bank.channel(Channel::Voltage), Channel::Voltage)
        {
            self.readings.voltage_mv = mv;
            self.readings.power_mw = Readings::derive_power(mv, self.readings.current_ma);
            report.voltage_window = Some(mv);
            if self.refresh.tick() {
                report.display_refreshed = true;
                self.write_field(Field::Voltage, self.readings.voltage_mv)
                    .wrap_err("voltage display update")?;
                self.write_field(Field::Power, self.readings.power_mw)
                    .wrap_err("power display update")?;
            }
        }

        if let Some(ma) = self
            .averager
            .try_drain(self.bank.channel(Channel::Current), Channel::Current)
        {
            self.readings.current_ma = ma;
            self.readings.power_mw = Readings::derive_power(self.readings.voltage_mv, ma);
            report.current_window = Some(ma);

            let ticks = self.pid.update(self.setpoint.value_ma(), ma);
            self.sink
                .set_duty(ticks)
                .map_err(|e| eyre::Report::new(map_hw_error(&*e)))
                .wrap_err("writing duty command")?;
            report.duty = Some(ticks);

            if self.refresh.tick() {
                report.display_refreshed = true;
                self.write_field(Field::Current, self.readings.current_ma)
                    .wrap_err("current display update")?;
                self.write_field(Field::Power, self.readings.power_mw)
                    .wrap_err("power display update")?;
            }
        }

        Ok(report)
    }

    /// Drive the actuator to its safe state and clear controller history
    /// (best-effort; display and panel are left alone).
    pub fn fail_closed(&mut self) {
        if let Err(e) = self.sink.set_duty(0) {
            tracing::warn!(error = %e, "duty zero failed during fail-closed");
        }
        self.pid.reset();
    }

    fn write_field(&mut self, field: Field, value: u32) -> Result<()> {
        let digits = display::field_digits(field, value);
        self.display
            .write_field(field, digits.as_slice())
            .map_err(|e| eyre::Report::new(map_hw_error(&*e)))?;
        Ok(())
    }
}

/// Public dynamic (boxed) load core that hides the peripheral generics.
pub struct Load {
    inner: LoadCore<Box<dyn DutySink>, Box<dyn Display>, Box<dyn InputPanel>>,
}

impl core::fmt::Debug for Load {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Load")
            .field("setpoint_ma", &self.inner.setpoint.value_ma())
            .field("readings", &self.inner.readings)
            .finish()
    }
}

impl Load {
    /// Start building a Load.
    pub fn builder() -> LoadBuilder {
        LoadBuilder::default()
    }

    /// Latest calibrated readings.
    pub fn readings(&self) -> Readings {
        self.inner.readings()
    }

    /// Current target current in milliamps.
    pub fn setpoint_ma(&self) -> u32 {
        self.inner.setpoint_ma()
    }

    /// Last commanded duty in actuator ticks.
    pub fn duty(&self) -> u16 {
        self.inner.duty()
    }

    /// One pass of the cooperative control loop.
    pub fn service(&mut self) -> Result<ServiceReport> {
        self.inner.service()
    }

    /// Drive the actuator to its safe state (best-effort).
    pub fn fail_closed(&mut self) {
        self.inner.fail_closed();
    }
}

/// Builder for `Load`. All fields are validated on `try_build()`.
#[derive(Default)]
pub struct LoadBuilder {
    sink: Option<Box<dyn DutySink>>,
    display: Option<Box<dyn Display>>,
    panel: Option<Box<dyn InputPanel>>,
    bank: Option<Arc<AccumulatorBank>>,
    cfg: Option<CoreCfg>,
    // Optional clock for tests (accept Box here)
    clock: Option<Box<dyn Clock + Send + Sync>>,
}

impl LoadBuilder {
    pub fn with_duty_sink(mut self, sink: Box<dyn DutySink>) -> Self {
        self.sink = Some(sink);
        self
    }
    pub fn with_display(mut self, display: Box<dyn Display>) -> Self {
        self.display = Some(display);
        self
    }
    pub fn with_input_panel(mut self, panel: Box<dyn InputPanel>) -> Self {
        self.panel = Some(panel);
        self
    }
    pub fn with_accumulators(mut self, bank: Arc<AccumulatorBank>) -> Self {
        self.bank = Some(bank);
        self
    }
    pub fn with_config(mut self, cfg: CoreCfg) -> Self {
        self.cfg = Some(cfg);
        self
    }
    /// Provide a custom clock implementation; defaults to MonotonicClock when not provided.
    pub fn with_clock(mut self, clock: Box<dyn Clock + Send + Sync>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Fallible build; returns a detailed BuildError for missing pieces.
    pub fn try_build(self) -> Result<Load> {
        let sink = self
            .sink
            .ok_or_else(|| eyre::Report::new(BuildError::MissingDutySink))?;
        let display = self
            .display
            .ok_or_else(|| eyre::Report::new(BuildError::MissingDisplay))?;
        let panel = self
            .panel
            .ok_or_else(|| eyre::Report::new(BuildError::MissingInput))?;
        let bank = self
            .bank
            .ok_or_else(|| eyre::Report::new(BuildError::MissingAccumulators))?;
        let cfg = self.cfg.unwrap_or_default();
        let clock: Arc<dyn Clock + Send + Sync> = match self.clock {
            Some(b) => Arc::from(b),
            None => Arc::new(MonotonicClock::new()),
        };
        let inner = build_load_core(sink, display, panel, bank, cfg, clock)?;
        Ok(Load { inner })
    }
}

/// Build a statically dispatched core from peripherals and a runtime config.
pub fn build_load_core<A: DutySink, D: Display, P: InputPanel>(
    sink: A,
    display: D,
    panel: P,
    bank: Arc<AccumulatorBank>,
    cfg: CoreCfg,
    clock: Arc<dyn Clock + Send + Sync>,
) -> Result<LoadCore<A, D, P>> {
    // Validate configs (non-panicking; return typed errors)
    if cfg.sampling.window == 0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "sampling window must be >= 1",
        )));
    }
    if cfg.sampling.window > eload_config::MAX_SAMPLING_WINDOW {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "sampling window exceeds the accumulator's sample counter",
        )));
    }
    if cfg.scaling.voltage.den == 0 || cfg.scaling.current.den == 0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "scale denominator must be > 0",
        )));
    }
    if cfg.pid.output_scale <= 0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "output_scale must be > 0",
        )));
    }
    if cfg.pid.integral_limit <= 0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "integral_limit must be > 0",
        )));
    }
    if cfg.pid.duty_max == 0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "duty_max must be > 0",
        )));
    }
    if cfg.setpoint.min_ma >= cfg.setpoint.max_ma {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "setpoint range must be non-empty",
        )));
    }
    if cfg.setpoint.fine_step_ma == 0 || cfg.setpoint.coarse_step_ma == 0 {
        return Err(eyre::Report::new(BuildError::InvalidConfig(
            "setpoint steps must be > 0",
        )));
    }

    let epoch = clock.now();
    Ok(LoadCore {
        sink,
        display,
        panel,
        bank,
        averager: Averager::new(cfg.scaling, cfg.sampling.window),
        pid: PidController::new(cfg.pid),
        setpoint: SetpointManager::new(cfg.setpoint),
        refresh: RefreshDivider::new(cfg.refresh.divider),
        clock,
        epoch,
        readings: Readings::default(),
    })
}

#[cfg(test)]
mod build_tests {
    use super::*;
    use crate::mocks::{IdlePanel, NullDisplay, RecordingSink};

    #[test]
    fn builder_reports_missing_pieces() {
        let err = Load::builder().try_build().unwrap_err();
        assert!(err.downcast_ref::<BuildError>().is_some());
    }

    #[test]
    fn builder_rejects_empty_setpoint_range() {
        let mut cfg = CoreCfg::default();
        cfg.setpoint.min_ma = 5000;
        cfg.setpoint.max_ma = 5000;
        let err = Load::builder()
            .with_duty_sink(Box::new(RecordingSink::new()))
            .with_display(Box::new(NullDisplay))
            .with_input_panel(Box::new(IdlePanel))
            .with_accumulators(Arc::new(AccumulatorBank::new()))
            .with_config(cfg)
            .try_build()
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BuildError>(),
            Some(BuildError::InvalidConfig(_))
        ));
    }

    #[test]
    fn builder_rejects_window_beyond_accumulator_capacity() {
        let mut cfg = CoreCfg::default();
        cfg.sampling.window = 70_000;
        let err = Load::builder()
            .with_duty_sink(Box::new(RecordingSink::new()))
            .with_display(Box::new(NullDisplay))
            .with_input_panel(Box::new(IdlePanel))
            .with_accumulators(Arc::new(AccumulatorBank::new()))
            .with_config(cfg)
            .try_build()
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<BuildError>(),
            Some(BuildError::InvalidConfig(_))
        ));
    }

    #[test]
    fn builder_succeeds_with_defaults() {
        let load = Load::builder()
            .with_duty_sink(Box::new(RecordingSink::new()))
            .with_display(Box::new(NullDisplay))
            .with_input_panel(Box::new(IdlePanel))
            .with_accumulators(Arc::new(AccumulatorBank::new()))
            .try_build();
        assert!(load.is_ok());
    }
}
