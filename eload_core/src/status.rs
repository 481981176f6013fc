//! Per-cycle service telemetry.

/// What one `LoadCore::service` pass accomplished. Returned to the caller so
/// runners and tests can observe progress without reaching into internals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServiceReport {
    /// An operator event was accepted this pass.
    pub setpoint_accepted: bool,
    /// Calibrated voltage reading produced this pass (mV).
    pub voltage_window: Option<u32>,
    /// Calibrated current reading produced this pass (mA).
    pub current_window: Option<u32>,
    /// Duty command issued to the actuator this pass (ticks).
    pub duty: Option<u16>,
    /// Voltage/power display fields were redrawn this pass.
    pub display_refreshed: bool,
}

impl ServiceReport {
    /// True when the pass changed anything observable.
    pub fn is_active(&self) -> bool {
        self.setpoint_accepted
            || self.voltage_window.is_some()
            || self.current_window.is_some()
            || self.duty.is_some()
            || self.display_refreshed
    }
}
