//! Top-level control loop orchestration.
//!
//! Wires the background `Sampler` to a `LoadCore` and services the core until
//! shutdown is requested, a cycle budget is exhausted, or a fault forces the
//! actuator to its safe state.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use eload_traits::clock::MonotonicClock;
use eload_traits::{AnalogSource, Display, DutySink, InputPanel};

use crate::accumulator::AccumulatorBank;
use crate::config::CoreCfg;
use crate::error::{LoadError, Result};
use crate::sampler::Sampler;
use crate::{Readings, build_load_core};

/// No successful conversion for this long means the front end is hung rather
/// than merely erroring (explicit faults arrive on their own channel).
const STALL_TIMEOUT_MS: u64 = 500;

/// Run the control loop until `shutdown` is raised or `max_cycles` completed
/// control cycles have elapsed, returning the final readings.
///
/// A control cycle is one completed current-averaging window (one PID step
/// and duty write). Any converter fault or peripheral error drives the
/// actuator to zero duty before the error is returned.
pub fn run<S, A, D, P>(
    source: S,
    sink: A,
    display: D,
    panel: P,
    cfg: CoreCfg,
    shutdown: Arc<AtomicBool>,
    max_cycles: Option<u64>,
) -> Result<Readings>
where
    S: AnalogSource + Send + 'static,
    A: DutySink,
    D: Display,
    P: InputPanel,
{
    let bank = Arc::new(AccumulatorBank::new());
    let sampler = Sampler::spawn(
        source,
        bank.clone(),
        cfg.sampling.rate_hz,
        MonotonicClock::new(),
    );

    let clock = Arc::new(MonotonicClock::new());
    let mut core = build_load_core(sink, display, panel, bank, cfg, clock)?;

    // Idle sleep when a pass accomplished nothing, so the loop doesn't spin
    // between averaging windows.
    let idle = Duration::from_micros(crate::util::period_us(cfg.sampling.rate_hz));

    tracing::info!(
        setpoint_ma = core.setpoint_ma(),
        window = cfg.sampling.window,
        "load control start"
    );

    let mut cycles: u64 = 0;
    loop {
        if shutdown.load(Ordering::Relaxed) {
            tracing::info!("shutdown requested");
            core.fail_closed();
            return Ok(core.readings());
        }

        if let Some(fault) = sampler.take_fault() {
            core.fail_closed();
            tracing::error!(fault, "converter fault, actuator driven to safe state");
            return Err(crate::error::Report::new(LoadError::Sampler(fault)));
        }

        let stalled = sampler.stalled_for();
        if stalled > STALL_TIMEOUT_MS {
            core.fail_closed();
            tracing::error!(
                stalled_ms = stalled,
                "sampler stalled, actuator driven to safe state"
            );
            return Err(crate::error::Report::new(LoadError::Sampler(format!(
                "no conversion in {stalled} ms"
            ))));
        }

        let report = match core.service() {
            Ok(r) => r,
            Err(e) => {
                core.fail_closed();
                tracing::error!(error = %e, "service error, actuator driven to safe state");
                return Err(e);
            }
        };

        if report.duty.is_some() {
            cycles += 1;
            if let Some(max) = max_cycles
                && cycles >= max
            {
                tracing::info!(cycles, "cycle budget reached");
                core.fail_closed();
                return Ok(core.readings());
            }
        }

        if !report.is_active() {
            std::thread::sleep(idle);
        }
    }
}
