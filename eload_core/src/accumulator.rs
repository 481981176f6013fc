//! Lock-free raw-sample accumulators shared between the sampling and control
//! contexts.
//!
//! Each channel keeps a running `{sum, count}` packed into a single `AtomicU64`
//! (`sum << 16 | count`). Recording a sample is one `fetch_add`; draining a
//! window is one `swap(0)`, so the "read count, read sum, reset both" sequence
//! is a single atomic operation. A sample either lands before the swap and is
//! included in the drained window, or after it and opens the next window —
//! nothing is lost, double-counted, or torn.
//!
//! Field sizing: conversion results are at most 12 bits and windows are
//! drained promptly once the averaging window (hundreds of samples) fills,
//! so `count` stays far below its 16-bit field and `sum` far below its
//! 48-bit field.

use std::sync::atomic::{AtomicU64, Ordering};

use eload_traits::Channel;

const COUNT_BITS: u32 = 16;
const COUNT_MASK: u64 = (1 << COUNT_BITS) - 1;

/// Single-writer/single-reader running sum with atomic snapshot-and-reset.
#[derive(Debug, Default)]
pub struct PackedAccumulator(AtomicU64);

impl PackedAccumulator {
    pub const fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    /// Add one conversion result. Called from the sampling context only;
    /// integer accumulation, never blocks.
    #[inline]
    pub fn record(&self, raw: u16) {
        self.0
            .fetch_add((u64::from(raw) << COUNT_BITS) | 1, Ordering::Relaxed);
    }

    /// Samples accumulated in the open window.
    #[inline]
    pub fn count(&self) -> u32 {
        (self.0.load(Ordering::Relaxed) & COUNT_MASK) as u32
    }

    /// Atomically take `(sum, count)` and reset both to zero.
    #[inline]
    pub fn drain(&self) -> (u64, u32) {
        let packed = self.0.swap(0, Ordering::AcqRel);
        (packed >> COUNT_BITS, (packed & COUNT_MASK) as u32)
    }
}

/// The accumulator pair for the two analog channels.
#[derive(Debug, Default)]
pub struct AccumulatorBank {
    pub voltage: PackedAccumulator,
    pub current: PackedAccumulator,
}

impl AccumulatorBank {
    pub const fn new() -> Self {
        Self {
            voltage: PackedAccumulator::new(),
            current: PackedAccumulator::new(),
        }
    }

    #[inline]
    pub fn channel(&self, channel: Channel) -> &PackedAccumulator {
        match channel {
            Channel::Voltage => &self.voltage,
            Channel::Current => &self.current,
        }
    }
}
