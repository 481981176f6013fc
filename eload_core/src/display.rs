//! Digit formatting for the character-display collaborator.
//!
//! The core hands the display fixed-width, zero-padded decimal digits, most
//! significant first. The units digit of the scaled integer is dropped; the
//! display layout owns the implicit decimal point position.

use eload_traits::Field;

/// Widest field on the panel (voltage/power).
pub const MAX_DIGITS: usize = 4;

/// Formatted digits for one display field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDigits {
    buf: [u8; MAX_DIGITS],
    len: usize,
}

impl FieldDigits {
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.buf[..self.len]
    }
}

/// Extract the display digits for `field` from a scaled integer reading.
///
/// Voltage and power occupy four digits, current and setpoint three. Values
/// wider than the field are truncated to the low digits, as a fixed-layout
/// panel would show them.
pub fn field_digits(field: Field, value: u32) -> FieldDigits {
    let len = match field {
        Field::Voltage | Field::Power => 4,
        Field::Current | Field::Setpoint => 3,
    };
    let mut v = value / 10; // units digit dropped
    let mut buf = [0u8; MAX_DIGITS];
    for slot in buf[..len].iter_mut().rev() {
        *slot = (v % 10) as u8;
        v /= 10;
    }
    FieldDigits { buf, len }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn voltage_digits_are_wide_and_zero_padded() {
        let d = field_digits(Field::Voltage, 5371);
        assert_eq!(d.as_slice(), &[0, 5, 3, 7]);
    }

    #[test]
    fn setpoint_digits_are_narrow() {
        let d = field_digits(Field::Setpoint, 1000);
        assert_eq!(d.as_slice(), &[1, 0, 0]);
    }

    #[test]
    fn overwide_value_keeps_low_digits() {
        let d = field_digits(Field::Current, 54321);
        assert_eq!(d.as_slice(), &[4, 3, 2]);
    }
}
