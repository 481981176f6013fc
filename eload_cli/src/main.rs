//! Binary entry point: config loading, logging setup, signal handling, and
//! command dispatch.

mod cli;
mod error_fmt;
mod rt;
mod run;

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use eyre::WrapErr;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

use crate::cli::{Cli, Commands, FILE_GUARD, JSON_MODE};
use crate::error_fmt::{exit_code_for_error, format_error_json, humanize};
use crate::run::RunArgs;

fn load_config(path: &Path) -> eyre::Result<eload_config::Config> {
    if !path.exists() {
        // Absent config is fine; every section has defaults.
        return Ok(eload_config::Config::default());
    }
    let text = std::fs::read_to_string(path)
        .wrap_err_with(|| format!("read config file {}", path.display()))?;
    let cfg = eload_config::load_toml(&text)
        .map_err(|e| eyre::eyre!("parse config {}: {e}", path.display()))?;
    cfg.validate()
        .wrap_err_with(|| format!("validate config {}", path.display()))?;
    Ok(cfg)
}

fn init_tracing(cli: &Cli, logging: &eload_config::Logging) {
    let level = logging.level.as_deref().unwrap_or(&cli.log_level);
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()));

    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = vec![filter.boxed()];
    if cli.json {
        layers.push(fmt::layer().json().with_target(false).boxed());
    } else {
        layers.push(fmt::layer().with_target(false).boxed());
    }

    if let Some(file) = logging.file.as_deref() {
        let path = Path::new(file);
        let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
        let name = path.file_name().unwrap_or_else(|| "eload.log".as_ref());
        let dir = dir.unwrap_or_else(|| Path::new("."));
        let appender = match logging.rotation.as_deref() {
            Some("daily") => tracing_appender::rolling::daily(dir, name),
            Some("hourly") => tracing_appender::rolling::hourly(dir, name),
            _ => tracing_appender::rolling::never(dir, name),
        };
        let (writer, guard) = tracing_appender::non_blocking(appender);
        let _ = FILE_GUARD.set(guard);
        // File output is always JSON lines for machine consumption.
        layers.push(
            fmt::layer()
                .json()
                .with_ansi(false)
                .with_writer(writer)
                .boxed(),
        );
    }

    tracing_subscriber::registry().with(layers).init();
}

fn main() {
    let _ = color_eyre::install();
    let cli = Cli::parse();
    let _ = JSON_MODE.set(cli.json);

    let cfg = match load_config(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            report_error(&e);
            std::process::exit(exit_code_for_error(&e));
        }
    };
    init_tracing(&cli, &cfg.logging);

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = shutdown.clone();
        if let Err(e) = ctrlc::set_handler(move || {
            shutdown.store(true, Ordering::Relaxed);
        }) {
            tracing::warn!(error = %e, "failed to install Ctrl-C handler");
        }
    }

    let result = match &cli.cmd {
        Commands::Run {
            setpoint_ma,
            max_cycles,
            rt,
            rt_prio,
            rt_lock,
            rt_cpu,
        } => {
            let args = RunArgs {
                setpoint_ma: *setpoint_ma,
                max_cycles: *max_cycles,
                rt: *rt,
                rt_prio: *rt_prio,
                rt_lock: *rt_lock,
                rt_cpu: *rt_cpu,
            };
            run::run_load(&cfg, &args, shutdown).map(|readings| {
                if cli.json {
                    println!(
                        "{}",
                        serde_json::json!({
                            "status": "complete",
                            "final": {
                                "voltage_mv": readings.voltage_mv,
                                "current_ma": readings.current_ma,
                                "power_mw": readings.power_mw,
                            },
                        })
                    );
                } else {
                    println!(
                        "run complete: {} mV, {} mA, {} mW",
                        readings.voltage_mv, readings.current_ma, readings.power_mw
                    );
                }
            })
        }
        Commands::SelfCheck => run::self_check().map(|()| {
            if cli.json {
                println!("{}", serde_json::json!({ "status": "ok" }));
            } else {
                println!("self-check ok");
            }
        }),
    };

    if let Err(e) = result {
        report_error(&e);
        std::process::exit(exit_code_for_error(&e));
    }
}

fn report_error(e: &eyre::Report) {
    if JSON_MODE.get().copied().unwrap_or(false) {
        eprintln!("{}", format_error_json(e));
    } else {
        eprintln!("{}", humanize(e));
    }
}
