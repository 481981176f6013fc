//! Window averaging and unit scaling for the two analog channels.
//!
//! Once a channel has accumulated a full window of raw conversions, the
//! averager drains the accumulator, averages, applies the channel's fixed
//! linear transform and calibration trim, and rounds half-up at the least
//! significant display digit. Voltage and current windows complete
//! independently; they are not synchronized to each other.

use crate::accumulator::PackedAccumulator;
use crate::config::{ChannelScale, ScalingCfg};
use eload_traits::Channel;

/// Round half-up at the final display digit: the units digit of the scaled
/// integer is dropped by the display layout, so a remainder of 5..=9 bumps
/// the displayed digit while 0..=4 leaves it unchanged.
#[inline]
pub fn round_display(value: u64) -> u64 {
    if value % 10 >= 5 { value + 5 } else { value }
}

#[derive(Debug, Clone, Copy)]
pub struct Averager {
    scaling: ScalingCfg,
    window: u32,
}

impl Averager {
    pub fn new(scaling: ScalingCfg, window: u32) -> Self {
        Self {
            scaling,
            window: window.max(1),
        }
    }

    #[inline]
    fn scale_for(&self, channel: Channel) -> &ChannelScale {
        match channel {
            Channel::Voltage => &self.scaling.voltage,
            Channel::Current => &self.scaling.current,
        }
    }

    /// Drain the accumulator if its window is full, producing one calibrated
    /// reading (mV or mA). Returns `None` while the window is still filling.
    pub fn try_drain(&self, acc: &PackedAccumulator, channel: Channel) -> Option<u32> {
        if acc.count() < self.window {
            return None;
        }
        let (sum, count) = acc.drain();
        if count == 0 {
            return None;
        }
        Some(self.calibrate(channel, sum, count))
    }

    /// Apply the channel's linear transform to a drained window.
    ///
    /// `value = round(((sum * num / den) / count) * calib / 1000)` with the
    /// final rounding at the display digit. All arithmetic is u64; with
    /// 12-bit samples and windows of a few hundred the intermediates stay
    /// far below overflow.
    pub fn calibrate(&self, channel: Channel, sum: u64, count: u32) -> u32 {
        let s = self.scale_for(channel);
        let avg_scaled = sum
            .saturating_mul(s.num)
            .checked_div(s.den)
            .unwrap_or(0)
            .checked_div(u64::from(count))
            .unwrap_or(0);
        let trimmed = avg_scaled.saturating_mul(u64::from(s.calib_permille)) / 1000;
        round_display(trimmed).min(u64::from(u32::MAX)) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScalingCfg;

    fn averager() -> Averager {
        Averager::new(ScalingCfg::default(), 250)
    }

    #[test]
    fn voltage_transform_matches_reference() {
        // sum 256000 over 250 samples: avg 1024 counts -> 5500 mV at unity trim
        let v = averager().calibrate(Channel::Voltage, 256_000, 250);
        assert_eq!(v, 5500);
    }

    #[test]
    fn current_transform_applies_trim() {
        // avg 1126.4 counts -> 10000 before trim -> 7500 mA at 750 permille
        let a = averager().calibrate(Channel::Current, 281_600, 250);
        assert_eq!(a, 7500);
    }

    #[test]
    fn round_display_half_up() {
        assert_eq!(round_display(5374), 5374); // remainder 4 does not round
        assert_eq!(round_display(5375), 5380); // remainder 5 bumps the tens digit
        assert_eq!(round_display(5379), 5384);
        assert_eq!(round_display(5370), 5370);
    }

    #[test]
    fn partial_window_is_not_drained() {
        let acc = PackedAccumulator::new();
        for _ in 0..249 {
            acc.record(512);
        }
        assert!(averager().try_drain(&acc, Channel::Voltage).is_none());
        acc.record(512);
        assert!(averager().try_drain(&acc, Channel::Voltage).is_some());
        // Drained: accumulator starts the next window empty.
        assert_eq!(acc.count(), 0);
    }
}
