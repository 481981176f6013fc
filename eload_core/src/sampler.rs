//! Background acquisition thread.
//!
//! Spawns a thread that owns the `AnalogSource`, alternates between the
//! voltage and current channels at the configured rate, and records each raw
//! conversion into the shared accumulator bank. Converter faults are
//! forwarded over a bounded channel for the control loop to act on.
//!
//! Safety: each `Sampler` spawns exactly one thread that is shut down and
//! joined when the `Sampler` is dropped, preventing thread leaks.
use crossbeam_channel as xch;
use eload_traits::clock::Clock;
use eload_traits::{AnalogSource, Channel};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crate::accumulator::AccumulatorBank;

pub struct Sampler {
    faults: xch::Receiver<String>,
    last_ok: Arc<AtomicU64>,
    clock: Box<dyn Clock + Send + Sync>,
    epoch: Instant,
    /// Shutdown flag for immediate response (atomic for lock-free check)
    shutdown: Arc<AtomicBool>,
    /// Join handle for graceful thread cleanup
    join_handle: Option<std::thread::JoinHandle<()>>,
}

impl Sampler {
    /// Start sampling into `bank` at `rate_hz` conversions per second.
    ///
    /// Each iteration converts one channel and flips to the other, so a rate
    /// of 5000 Hz yields 2500 raw samples per second per channel.
    pub fn spawn<S, C>(mut source: S, bank: Arc<AccumulatorBank>, rate_hz: u32, clock: C) -> Self
    where
        S: AnalogSource + Send + 'static,
        C: Clock + Clone + Send + Sync + 'static,
    {
        let (fault_tx, faults) = xch::bounded(1);
        let shutdown = Arc::new(AtomicBool::new(false));
        let shutdown_clone = shutdown.clone();
        let last_ok = Arc::new(AtomicU64::new(0));
        let last_ok_clone = last_ok.clone();
        let period = Duration::from_micros(crate::util::period_us(rate_hz));
        let epoch = clock.now();
        let thread_clock = clock.clone();

        let join_handle = std::thread::spawn(move || {
            let mut channel = Channel::Voltage;
            loop {
                // Immediate shutdown check (lock-free atomic)
                if shutdown_clone.load(Ordering::Relaxed) {
                    tracing::debug!("sampler thread received shutdown signal");
                    break;
                }

                match source.convert(channel) {
                    Ok(raw) => {
                        bank.channel(channel).record(raw);
                        last_ok_clone.store(thread_clock.ms_since(epoch), Ordering::Relaxed);
                    }
                    Err(e) => {
                        // Bounded at one pending fault; later faults are
                        // dropped until the consumer drains the first.
                        let _ = fault_tx.try_send(e.to_string());
                    }
                }
                channel = channel.other();

                // Check shutdown before sleep to avoid unnecessary delay
                if shutdown_clone.load(Ordering::Relaxed) {
                    break;
                }
                thread_clock.sleep(period);
            }
            tracing::trace!("sampler thread exiting cleanly");
        });

        Self {
            faults,
            last_ok,
            clock: Box::new(clock),
            epoch,
            shutdown,
            join_handle: Some(join_handle),
        }
    }

    /// Drain the oldest pending converter fault, if any.
    pub fn take_fault(&self) -> Option<String> {
        self.faults.try_recv().ok()
    }

    /// Milliseconds since the last successful conversion (since spawn when
    /// none has succeeded yet). Feeds the runner's stall watchdog.
    pub fn stalled_for(&self) -> u64 {
        self.clock
            .ms_since(self.epoch)
            .saturating_sub(self.last_ok.load(Ordering::Relaxed))
    }
}

impl Drop for Sampler {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);

        if let Some(handle) = self.join_handle.take() {
            match handle.join() {
                Ok(()) => {
                    tracing::trace!("sampler thread joined successfully");
                }
                Err(e) => {
                    // Thread panicked; log but don't propagate (we're in Drop)
                    tracing::warn!(?e, "sampler thread panicked during shutdown");
                }
            }
        }
    }
}
