use criterion::{Criterion, black_box, criterion_group, criterion_main};

use eload_core::averager::Averager;
use eload_core::config::{PidCfg, ScalingCfg};
use eload_core::pid::PidController;
use eload_traits::Channel;

// Synthetic current trajectory in milliamps: ramp up, hold, dip below the
// load floor, recover.
fn synth_currents(n: usize) -> Vec<u32> {
    let mut v = Vec::with_capacity(n);
    for i in 0..n {
        let phase = i % 400;
        let ma = if phase < 100 {
            (phase as u32) * 10
        } else if phase < 300 {
            1000
        } else if phase < 320 {
            0
        } else {
            500 + (phase as u32 - 320) * 6
        };
        v.push(ma);
    }
    v
}

pub fn bench_pid_step(c: &mut Criterion) {
    let mut g = c.benchmark_group("pid_step");
    g.sample_size(50);

    let currents = synth_currents(10_000);
    g.bench_function("unity_gains", |b| {
        let mut pid = PidController::new(PidCfg::default());
        b.iter(|| {
            let mut acc = 0u32;
            for &ma in &currents {
                acc = acc.wrapping_add(u32::from(pid.update(black_box(1000), black_box(ma))));
            }
            black_box(acc);
        })
    });
    g.finish();
}

pub fn bench_calibrate(c: &mut Criterion) {
    let mut g = c.benchmark_group("calibrate");
    g.sample_size(50);

    let averager = Averager::new(ScalingCfg::default(), 250);
    g.bench_function("current_window", |b| {
        b.iter(|| {
            let mut acc = 0u32;
            for sum in (200_000u64..300_000).step_by(1024) {
                acc = acc.wrapping_add(averager.calibrate(
                    black_box(Channel::Current),
                    black_box(sum),
                    black_box(250),
                ));
            }
            black_box(acc);
        })
    });
    g.finish();
}

criterion_group!(control, bench_pid_step, bench_calibrate);
criterion_main!(control);
