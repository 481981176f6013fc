//! CLI argument definitions and shared statics.

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();
/// Effective control limits for the current run (for JSON details).
pub static LAST_LIMITS: OnceLock<CliLimits> = OnceLock::new();

#[derive(Copy, Clone, Debug)]
pub struct CliLimits {
    pub setpoint_ma: u32,
    pub duty_max: u16,
    pub min_load_ma: u32,
}

#[derive(Parser, Debug)]
#[command(name = "eload", version, about = "Electronic load CLI")]
pub struct Cli {
    /// Path to config TOML (typed)
    #[arg(long, value_name = "FILE", default_value = "etc/eload.toml")]
    pub config: PathBuf,

    /// Log as JSON lines instead of pretty
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace)
    #[arg(long = "log-level", value_name = "LEVEL", default_value = "info")]
    pub log_level: String,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

/// Memory locking mode for real-time operation.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum RtLock {
    /// Do not lock memory
    None,
    /// Lock currently resident pages
    Current,
    /// Lock current and future pages
    All,
}

impl RtLock {
    #[inline]
    pub fn os_default() -> Self {
        #[cfg(target_os = "linux")]
        {
            return RtLock::Current;
        }
        #[allow(unreachable_code)]
        RtLock::None
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the constant-current control loop
    Run {
        /// Initial target current in milliamps (overrides config)
        #[arg(long, value_name = "MA")]
        setpoint_ma: Option<u32>,
        /// Stop after this many completed control cycles (default: run until Ctrl-C)
        #[arg(long, value_name = "N")]
        max_cycles: Option<u64>,
        /// Enable real-time mode (SCHED_FIFO, affinity, mlockall)
        #[arg(
            long,
            action = ArgAction::SetTrue,
            long_help = "Enable real-time mode on Linux: attempts SCHED_FIFO priority, pins to one CPU, and calls mlockall to lock the process address space into RAM. Reduces control-loop jitter but may require elevated privileges or ulimits (e.g., memlock)."
        )]
        rt: bool,
        /// Real-time priority for SCHED_FIFO (1..=max)
        #[arg(long, value_name = "PRIO")]
        rt_prio: Option<i32>,
        /// Select memory locking mode for --rt: none, current, or all
        #[arg(long, value_enum, value_name = "MODE")]
        rt_lock: Option<RtLock>,
        /// CPU index to pin the process to when --rt is enabled
        #[arg(long, value_name = "CPU")]
        rt_cpu: Option<usize>,
    },
    /// Quick health check (hardware presence / sim ok)
    SelfCheck,
}
