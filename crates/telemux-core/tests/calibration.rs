use serde_json::json;
use telemux_core::calibration::{
    ect_celsius, gear_lookup, kelvin_to_celsius, Calibration, Cell, GEAR_REFERENCE_VOLTS,
};
use telemux_core::Channel;
use telemux_parser::SkipReason;

fn interval(i: usize) -> (f64, f64) {
    let r = GEAR_REFERENCE_VOLTS;
    ((r[i] + r[i + 1]) / 2.0, (r[i + 1] + r[i + 2]) / 2.0)
}

#[test]
fn gear_intervals_are_inclusive_low_exclusive_high() {
    for i in 0..6 {
        let (low, high) = interval(i);
        let gear = i as i64 + 1;
        assert_eq!(gear_lookup(low), gear, "low edge of gear {gear}");
        assert_eq!(gear_lookup(high - 1e-9), gear, "just below high edge of gear {gear}");
        assert_eq!(gear_lookup((low + high) / 2.0), gear);
    }
}

#[test]
fn adjacent_gear_intervals_are_contiguous() {
    for i in 0..5 {
        let (_, high) = interval(i);
        let (next_low, _) = interval(i + 1);
        assert_eq!(high, next_low);
        assert_eq!(gear_lookup(high), i as i64 + 2);
    }
}

#[test]
fn gear_outside_table_is_neutral() {
    let (lowest, _) = interval(0);
    let (_, highest) = interval(5);

    assert_eq!(gear_lookup(0.0), 0);
    assert_eq!(gear_lookup(lowest - 1e-9), 0);
    assert_eq!(gear_lookup(highest), 0);
    assert_eq!(gear_lookup(3.0), 0);
    assert_eq!(gear_lookup(-1.0), 0);
    assert_eq!(gear_lookup(f64::NAN), 0);
}

#[test]
fn gear_at_reference_points() {
    assert_eq!(gear_lookup(0.88), 1);
    assert_eq!(gear_lookup(1.10), 2);
    assert_eq!(gear_lookup(1.46), 3);
    assert_eq!(gear_lookup(1.77), 4);
    assert_eq!(gear_lookup(2.09), 5);
    assert_eq!(gear_lookup(2.38), 6);
}

#[test]
fn gear_is_non_decreasing_over_covered_range() {
    let (lowest, _) = interval(0);
    let (_, highest) = interval(5);
    let mut previous = 0;
    let mut v = lowest;
    while v < highest {
        let gear = gear_lookup(v);
        assert!(gear >= previous, "gear dropped at {v}");
        previous = gear;
        v += 0.001;
    }
    assert_eq!(previous, 6);
}

#[test]
fn ect_singular_point_and_supply_voltage() {
    assert_eq!(ect_celsius(0.0), 0.0);
    assert_eq!(ect_celsius(5.0), -26.8);
    assert!((ect_celsius(2.5) - (24.21 * 2.5 - 26.8)).abs() < 1e-12);
}

#[test]
fn kelvin_offset() {
    assert!((kelvin_to_celsius(300.0) - 26.85).abs() < 1e-9);
    assert!((kelvin_to_celsius(310.15) - 37.0).abs() < 1e-9);
}

#[test]
fn imu_divisors_scale_linearly() {
    let fields = Channel::Acc.fields();
    let divisor_of = |column: &str| {
        let spec = fields.iter().find(|f| f.column == column).unwrap();
        match spec.calibration {
            Calibration::Divide(d) => d,
            other => panic!("{column} is not a divided field: {other:?}"),
        }
    };

    for (column, expected) in [
        ("accel_x", 100.0),
        ("linear_accel_y", 100.0),
        ("gravity_z", 100.0),
        ("gyro_x", 16.0),
        ("mag_y", 16.0),
        ("euler_pitch", 16.0),
        ("quaternion_w", 16384.0),
    ] {
        assert_eq!(divisor_of(column), expected, "{column}");
    }

    let accel = fields.iter().find(|f| f.column == "accel_x").unwrap();
    let base = accel.calibration.apply(&json!(981)).unwrap().as_f64();
    for k in [2.0, -3.0, 10.0] {
        let scaled = accel.calibration.apply(&json!(981.0 * k)).unwrap().as_f64();
        assert!((scaled - base * k).abs() < 1e-9);
    }

    let quat = fields.iter().find(|f| f.column == "quaternion_y").unwrap();
    assert_eq!(quat.calibration.apply(&json!(-8192)).unwrap(), Cell::Float(-0.5));
}

#[test]
fn status_fields_pass_through_as_integers() {
    let status = Calibration::Status;
    assert_eq!(status.apply(&json!(3)).unwrap(), Cell::Int(3));
    assert_eq!(status.apply(&json!(2.0)).unwrap(), Cell::Int(2));
    assert_eq!(status.apply(&json!(2.5)), Err(SkipReason::NonNumericField));
    assert_eq!(status.apply(&json!("3")), Err(SkipReason::NonNumericField));
}

#[test]
fn numeric_calibrations_reject_text() {
    for calibration in [
        Calibration::PassThrough,
        Calibration::KelvinToCelsius,
        Calibration::Divide(16.0),
        Calibration::EctCelsius,
        Calibration::GearPosition,
    ] {
        assert_eq!(
            calibration.apply(&json!(null)),
            Err(SkipReason::NonNumericField)
        );
    }
}
