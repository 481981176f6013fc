//! Display refresh pacing.
//!
//! A shared counter ticks once per completed averaging window (either
//! channel); when it exceeds the divider it resets and signals that the
//! paired display fields should be redrawn. This decouples the control rate
//! from the much slower human-readable refresh rate.

#[derive(Debug, Clone, Copy)]
pub struct RefreshDivider {
    counter: u32,
    threshold: u32,
}

impl RefreshDivider {
    pub fn new(threshold: u32) -> Self {
        Self {
            counter: 0,
            threshold,
        }
    }

    /// Count one completed averaging window; true when a display refresh
    /// is due (counter exceeded the threshold and reset).
    #[inline]
    pub fn tick(&mut self) -> bool {
        self.counter += 1;
        if self.counter > self.threshold {
            self.counter = 0;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::RefreshDivider;

    #[test]
    fn fires_every_threshold_plus_one_windows() {
        let mut d = RefreshDivider::new(6);
        let fired: Vec<bool> = (0..14).map(|_| d.tick()).collect();
        let hits = fired.iter().filter(|&&b| b).count();
        assert_eq!(hits, 2);
        assert!(fired[6] && fired[13]);
    }

    #[test]
    fn zero_threshold_fires_every_window() {
        let mut d = RefreshDivider::new(0);
        assert!(d.tick());
        assert!(d.tick());
    }
}
