//! Human-readable error descriptions and structured JSON error formatting.

use crate::cli::LAST_LIMITS;

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    use eload_core::error::{BuildError, LoadError};

    // Typed matches first
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::MissingDutySink => {
                "What happened: No duty output was provided to the control core.\nLikely causes: PWM initialization failed or the sink was not wired into the builder.\nHow to fix: Ensure the PWM channel opens successfully and is passed via with_duty_sink(...).".to_string()
            }
            BuildError::MissingDisplay => {
                "What happened: No display was provided to the control core.\nLikely causes: Display driver failed to initialize or was not wired into the builder.\nHow to fix: Pass a display via with_display(...); the console display works without hardware.".to_string()
            }
            BuildError::MissingInput => {
                "What happened: No input panel was provided to the control core.\nLikely causes: Button GPIO setup failed or the panel was not wired into the builder.\nHow to fix: Pass a panel via with_input_panel(...); the no-op panel works without hardware.".to_string()
            }
            BuildError::MissingAccumulators => {
                "What happened: No accumulator bank was provided to the control core.\nLikely causes: The sampler and core were not wired to the same bank.\nHow to fix: Create one AccumulatorBank, share it with the sampler, and pass it via with_accumulators(...).".to_string()
            }
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Missing or out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun. See README for a sample."
            ),
        };
    }

    if let Some(le) = err.downcast_ref::<LoadError>() {
        return match le {
            LoadError::Sampler(msg) => format!(
                "What happened: The analog converter faulted ({msg}); the load was driven to zero duty.\nLikely causes: SPI wiring or power issue on the ADC front end.\nHow to fix: Check the MCP3008 wiring and supply, then restart the run."
            ),
            LoadError::HardwareFault(msg) => format!(
                "What happened: A peripheral reported a fault ({msg}); the load was driven to zero duty.\nLikely causes: GPIO/SPI/PWM access failure or a disconnected peripheral.\nHow to fix: Verify wiring and permissions (SPI/PWM device access), then rerun."
            ),
            LoadError::Hardware(msg) => format!(
                "What happened: A peripheral operation failed ({msg}).\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
            LoadError::Config(msg) => format!(
                "What happened: Configuration problem ({msg}).\nLikely causes: Out-of-range values in the TOML.\nHow to fix: Edit the config file and rerun."
            ),
            LoadError::Io(msg) => format!(
                "What happened: I/O error ({msg}).\nLikely causes: Missing file or insufficient permissions.\nHow to fix: Check the path and permissions, then rerun."
            ),
        };
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    let msg = err.to_string();
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

/// Map typed errors to stable exit codes; generic errors return 1.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    use eload_core::error::{BuildError, LoadError};
    if err.downcast_ref::<BuildError>().is_some() {
        return 2;
    }
    if let Some(le) = err.downcast_ref::<LoadError>() {
        return match le {
            LoadError::Sampler(_) => 3,
            LoadError::HardwareFault(_) => 4,
            LoadError::Hardware(_) => 5,
            LoadError::Config(_) => 6,
            LoadError::Io(_) => 7,
        };
    }
    1
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    use eload_core::error::LoadError;
    use serde_json::json;

    let reason = if let Some(le) = err.downcast_ref::<LoadError>() {
        match le {
            LoadError::Sampler(_) => "SamplerFault",
            LoadError::HardwareFault(_) => "HardwareFault",
            LoadError::Hardware(_) => "Hardware",
            LoadError::Config(_) => "Config",
            LoadError::Io(_) => "Io",
        }
    } else {
        "Error"
    };

    let msg = humanize(err);
    if let Some(l) = LAST_LIMITS.get() {
        json!({
            "reason": reason,
            "message": msg,
            "details": {
                "setpoint_ma": l.setpoint_ma,
                "duty_max": l.duty_max,
                "min_load_ma": l.min_load_ma,
            },
        })
        .to_string()
    } else {
        json!({ "reason": reason, "message": msg }).to_string()
    }
}
