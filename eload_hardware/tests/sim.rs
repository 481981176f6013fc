use eload_hardware::{SimulatedBus, SimulatedDuty, SimulatedFrontEnd};
use eload_traits::{AnalogSource, Channel, DutySink};
use rstest::rstest;

#[rstest]
#[case(0, 0)]
#[case(100, 90)]
#[case(500, 450)]
#[case(833, 749)]
fn duty_maps_linearly_to_current_counts(#[case] duty: u16, #[case] expected: u16) {
    let bus = SimulatedBus::new();
    let mut sink = SimulatedDuty::new(bus.clone());
    let mut fe = SimulatedFrontEnd::new(bus);

    sink.set_duty(duty).unwrap();
    assert_eq!(fe.convert(Channel::Current).unwrap(), expected);
}

#[test]
fn closed_loop_settles_with_a_proportional_step() {
    let bus = SimulatedBus::new();
    let mut sink = SimulatedDuty::new(bus.clone());
    let mut fe = SimulatedFrontEnd::new(bus);

    // Crude external loop: step duty toward a current-count target the way
    // the controller would, and check the plant responds monotonically.
    let target_counts = 300u16;
    let mut duty = 0u16;
    for _ in 0..50 {
        let counts = fe.convert(Channel::Current).unwrap();
        if counts < target_counts {
            duty = duty.saturating_add(20);
        } else if counts > target_counts {
            duty = duty.saturating_sub(5);
        }
        sink.set_duty(duty).unwrap();
    }
    let settled = fe.convert(Channel::Current).unwrap();
    assert!((295..=320).contains(&settled), "settled at {settled}");
}
