//! Maps `Box<dyn Error>` from trait boundaries to typed `LoadError`.
//!
//! The traits in `eload_traits` use `Box<dyn Error + Send + Sync>` for maximum
//! flexibility; this module converts those to our typed error enum, with an
//! optional feature-gated path for `eload_hardware::HwError` downcasting.

use crate::error::LoadError;

/// Map a trait-boundary error to a typed `LoadError`.
///
/// Attempts to downcast known hardware error types first, then falls back
/// to string-based heuristics.
pub fn map_hw_error(e: &(dyn std::error::Error + 'static)) -> LoadError {
    // Feature-gated: try to downcast to HwError for precise mapping
    #[cfg(feature = "hardware-errors")]
    {
        if let Some(hw) = e.downcast_ref::<eload_hardware::error::HwError>() {
            return LoadError::HardwareFault(hw.to_string());
        }
    }

    // Fallback: string-based detection
    let s = e.to_string();
    if s.to_lowercase().contains("fault") {
        LoadError::HardwareFault(s)
    } else {
        LoadError::Hardware(s)
    }
}
