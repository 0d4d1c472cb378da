use serde_json::Value;
use telemux_parser::SkipReason;

/// Gear position sensor reference voltages, neutral first.
pub const GEAR_REFERENCE_VOLTS: [f64; 8] = [0.0, 0.88, 1.10, 1.46, 1.77, 2.09, 2.38, 3.0];

pub const KELVIN_OFFSET: f64 = 273.15;

pub const ACCEL_DIVISOR: f64 = 100.0;
pub const ANGULAR_DIVISOR: f64 = 16.0;
pub const QUATERNION_DIVISOR: f64 = 16384.0;

const ECT_GAIN: f64 = 24.21;
const ECT_OFFSET: f64 = 26.8;
const ECT_SUPPLY_VOLTS: f64 = 5.0;

/// Maps a gear position voltage to a gear number.
///
/// Gear `n` covers `[mid(R[n-1], R[n]), mid(R[n], R[n+1]))` for `n` in `1..=6`. Anything
/// outside those intervals (including NaN) is gear 0.
pub fn gear_lookup(volts: f64) -> i64 {
    let r = &GEAR_REFERENCE_VOLTS;
    for i in 0..6 {
        let low = (r[i] + r[i + 1]) / 2.0;
        let high = (r[i + 1] + r[i + 2]) / 2.0;
        if low <= volts && volts < high {
            return i as i64 + 1;
        }
    }
    0
}

/// Engine coolant temperature in degrees Celsius from the ECT sensor voltage.
///
/// A reading of exactly 0 V means the sensor was not sampled and maps to 0.0.
pub fn ect_celsius(volts: f64) -> f64 {
    if volts == 0.0 {
        return 0.0;
    }
    ECT_GAIN * (ECT_SUPPLY_VOLTS - volts) - ECT_OFFSET
}

pub fn kelvin_to_celsius(kelvin: f64) -> f64 {
    kelvin - KELVIN_OFFSET
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Int,
    Float,
}

/// A single calibrated output value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Cell {
    Int(i64),
    Float(f64),
}

impl Cell {
    pub fn kind(&self) -> ColumnKind {
        match self {
            Cell::Int(_) => ColumnKind::Int,
            Cell::Float(_) => ColumnKind::Float,
        }
    }

    pub fn as_f64(&self) -> f64 {
        match self {
            Cell::Int(v) => *v as f64,
            Cell::Float(v) => *v,
        }
    }
}

/// How a raw payload value becomes an engineering value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Calibration {
    PassThrough,
    KelvinToCelsius,
    Divide(f64),
    EctCelsius,
    GearPosition,
    /// Integer status code copied unscaled.
    Status,
}

impl Calibration {
    pub fn kind(&self) -> ColumnKind {
        match self {
            Calibration::GearPosition | Calibration::Status => ColumnKind::Int,
            Calibration::PassThrough
            | Calibration::KelvinToCelsius
            | Calibration::Divide(_)
            | Calibration::EctCelsius => ColumnKind::Float,
        }
    }

    pub fn apply(&self, raw: &Value) -> Result<Cell, SkipReason> {
        let number = || raw.as_f64().ok_or(SkipReason::NonNumericField);
        let cell = match self {
            Calibration::PassThrough => Cell::Float(number()?),
            Calibration::KelvinToCelsius => Cell::Float(kelvin_to_celsius(number()?)),
            Calibration::Divide(divisor) => Cell::Float(number()? / divisor),
            Calibration::EctCelsius => Cell::Float(ect_celsius(number()?)),
            Calibration::GearPosition => Cell::Int(gear_lookup(number()?)),
            Calibration::Status => {
                Cell::Int(integer_value(raw).ok_or(SkipReason::NonNumericField)?)
            }
        };
        Ok(cell)
    }
}

/// Accepts JSON integers and floats with no fractional part.
pub(crate) fn integer_value(raw: &Value) -> Option<i64> {
    if let Some(v) = raw.as_i64() {
        return Some(v);
    }
    let v = raw.as_f64()?;
    if v.fract() == 0.0 && v >= i64::MIN as f64 && v < i64::MAX as f64 {
        Some(v as i64)
    } else {
        None
    }
}
