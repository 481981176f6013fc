//! Run orchestration: config mapping, peripheral assembly, and loop execution.

use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use crate::cli::{CliLimits, LAST_LIMITS, RtLock};
use crate::rt::setup_rt_once;
use eload_core::Readings;
use eload_core::config::CoreCfg;
use eload_core::error::Result as CoreResult;

pub struct RunArgs {
    pub setpoint_ma: Option<u32>,
    pub max_cycles: Option<u64>,
    pub rt: bool,
    pub rt_prio: Option<i32>,
    pub rt_lock: Option<RtLock>,
    pub rt_cpu: Option<usize>,
}

pub fn run_load(
    cfg: &eload_config::Config,
    args: &RunArgs,
    shutdown: Arc<AtomicBool>,
) -> CoreResult<Readings> {
    setup_rt_once(
        args.rt,
        args.rt_prio,
        args.rt_lock.unwrap_or(RtLock::os_default()),
        args.rt_cpu,
    );

    let mut core_cfg: CoreCfg = cfg.into();
    if let Some(ma) = args.setpoint_ma {
        core_cfg.setpoint.initial_ma = ma.clamp(core_cfg.setpoint.min_ma, core_cfg.setpoint.max_ma);
    }
    let _ = LAST_LIMITS.set(CliLimits {
        setpoint_ma: core_cfg.setpoint.initial_ma,
        duty_max: core_cfg.pid.duty_max,
        min_load_ma: core_cfg.pid.min_load_ma,
    });

    dispatch(cfg, core_cfg, shutdown, args.max_cycles)
}

#[cfg(all(feature = "hardware", target_os = "linux"))]
fn dispatch(
    cfg: &eload_config::Config,
    core_cfg: CoreCfg,
    shutdown: Arc<AtomicBool>,
    max_cycles: Option<u64>,
) -> CoreResult<Readings> {
    use eload_hardware::{ButtonPanel, HardwareDuty, HardwareFrontEnd};
    use eyre::WrapErr;

    let hw = &cfg.hardware;
    let source = HardwareFrontEnd::open(hw.spi_bus, hw.spi_cs, 0, 1)
        .wrap_err("open SPI for ADC front end")?;
    let sink = HardwareDuty::open(hw.pwm_channel, hw.pwm_hz, core_cfg.pid.duty_max)
        .wrap_err("open PWM duty output")?;
    let panel = ButtonPanel::open([
        hw.btn_fine_down,
        hw.btn_fine_up,
        hw.btn_coarse_down,
        hw.btn_coarse_up,
    ])
    .wrap_err("claim button GPIOs")?;

    eload_core::runner::run(
        source,
        sink,
        eload_hardware::ConsoleDisplay,
        panel,
        core_cfg,
        shutdown,
        max_cycles,
    )
}

#[cfg(not(all(feature = "hardware", target_os = "linux")))]
fn dispatch(
    _cfg: &eload_config::Config,
    core_cfg: CoreCfg,
    shutdown: Arc<AtomicBool>,
    max_cycles: Option<u64>,
) -> CoreResult<Readings> {
    use eload_hardware::{ConsoleDisplay, NoopPanel, SimulatedBus, SimulatedDuty, SimulatedFrontEnd};

    let bus = SimulatedBus::new();
    let sink = SimulatedDuty::new(bus.clone());
    let source = SimulatedFrontEnd::new(bus);
    tracing::info!("no hardware backend; using simulated front end");
    eload_core::runner::run(
        source,
        sink,
        ConsoleDisplay,
        NoopPanel,
        core_cfg,
        shutdown,
        max_cycles,
    )
}

/// Build and exercise the simulated stack once; used by `self-check`.
pub fn self_check() -> CoreResult<()> {
    use eload_core::config::SamplingCfg;
    use eload_hardware::{ConsoleDisplay, NoopPanel, SimulatedBus, SimulatedDuty, SimulatedFrontEnd};

    let core_cfg = CoreCfg {
        sampling: SamplingCfg {
            window: 8,
            rate_hz: 50_000,
        },
        ..CoreCfg::default()
    };
    let bus = SimulatedBus::new();
    let readings = eload_core::runner::run(
        SimulatedFrontEnd::new(bus.clone()),
        SimulatedDuty::new(bus),
        ConsoleDisplay,
        NoopPanel,
        core_cfg,
        Arc::new(AtomicBool::new(false)),
        Some(4),
    )?;
    tracing::info!(?readings, "self-check pass");
    Ok(())
}
