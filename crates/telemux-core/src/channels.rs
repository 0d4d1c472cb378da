use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::calibration::{
    Calibration, ColumnKind, ACCEL_DIVISOR, ANGULAR_DIVISOR, QUATERNION_DIVISOR,
};

pub const SERVER_MS_COLUMN: &str = "server_ms";
pub const LOGGER_US_COLUMN: &str = "logger_us";

/// The sensor streams multiplexed in a raw log. The topic string is the discriminator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Channel {
    Ecu,
    Rpm,
    Water,
    StrokeFront,
    StrokeRear,
    Acc,
}

/// One output column: which raw payload key feeds it and how it is calibrated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldSpec {
    pub column: &'static str,
    pub raw: &'static str,
    pub calibration: Calibration,
}

impl FieldSpec {
    const fn new(column: &'static str, raw: &'static str, calibration: Calibration) -> Self {
        Self {
            column,
            raw,
            calibration,
        }
    }

    pub fn kind(&self) -> ColumnKind {
        self.calibration.kind()
    }
}

const ECU_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("ect", "ect", Calibration::EctCelsius),
    FieldSpec::new("tps", "tps", Calibration::PassThrough),
    FieldSpec::new("iap", "iap", Calibration::PassThrough),
    FieldSpec::new("gear", "gp", Calibration::GearPosition),
];

const RPM_FIELDS: &[FieldSpec] = &[FieldSpec::new("rpm", "rpm", Calibration::PassThrough)];

const WATER_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("inlet_temp", "inlet_temp", Calibration::KelvinToCelsius),
    FieldSpec::new("outlet_temp", "outlet_temp", Calibration::KelvinToCelsius),
];

const STROKE_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("left", "left", Calibration::PassThrough),
    FieldSpec::new("right", "right", Calibration::PassThrough),
];

const ACCEL: Calibration = Calibration::Divide(ACCEL_DIVISOR);
const ANGULAR: Calibration = Calibration::Divide(ANGULAR_DIVISOR);
const QUATERNION: Calibration = Calibration::Divide(QUATERNION_DIVISOR);

const ACC_FIELDS: &[FieldSpec] = &[
    FieldSpec::new("accel_x", "ax", ACCEL),
    FieldSpec::new("accel_y", "ay", ACCEL),
    FieldSpec::new("accel_z", "az", ACCEL),
    FieldSpec::new("gyro_x", "gx", ANGULAR),
    FieldSpec::new("gyro_y", "gy", ANGULAR),
    FieldSpec::new("gyro_z", "gz", ANGULAR),
    FieldSpec::new("mag_x", "mx", ANGULAR),
    FieldSpec::new("mag_y", "my", ANGULAR),
    FieldSpec::new("mag_z", "mz", ANGULAR),
    FieldSpec::new("euler_heading", "h", ANGULAR),
    FieldSpec::new("euler_roll", "r", ANGULAR),
    FieldSpec::new("euler_pitch", "p", ANGULAR),
    FieldSpec::new("quaternion_w", "qw", QUATERNION),
    FieldSpec::new("quaternion_x", "qx", QUATERNION),
    FieldSpec::new("quaternion_y", "qy", QUATERNION),
    FieldSpec::new("quaternion_z", "qz", QUATERNION),
    FieldSpec::new("linear_accel_x", "lx", ACCEL),
    FieldSpec::new("linear_accel_y", "ly", ACCEL),
    FieldSpec::new("linear_accel_z", "lz", ACCEL),
    FieldSpec::new("gravity_x", "x", ACCEL),
    FieldSpec::new("gravity_y", "y", ACCEL),
    FieldSpec::new("gravity_z", "z", ACCEL),
    FieldSpec::new("status_sys", "ss", Calibration::Status),
    FieldSpec::new("status_gyro", "sg", Calibration::Status),
    FieldSpec::new("status_accel", "sa", Calibration::Status),
    FieldSpec::new("status_mag", "sm", Calibration::Status),
];

impl Channel {
    pub const ALL: [Channel; 6] = [
        Channel::Ecu,
        Channel::Rpm,
        Channel::Water,
        Channel::StrokeFront,
        Channel::StrokeRear,
        Channel::Acc,
    ];

    /// Topic tag carried on raw rows of this channel.
    pub fn topic(&self) -> &'static str {
        match self {
            Channel::Ecu => "ecu",
            Channel::Rpm => "rpm",
            Channel::Water => "water",
            Channel::StrokeFront => "stroke/front",
            Channel::StrokeRear => "stroke/rear",
            Channel::Acc => "acc",
        }
    }

    /// Output subdirectory name.
    pub fn dir_name(&self) -> &'static str {
        match self {
            Channel::Ecu => "ecu",
            Channel::Rpm => "rpm",
            Channel::Water => "water",
            Channel::StrokeFront => "stroke_front",
            Channel::StrokeRear => "stroke_rear",
            Channel::Acc => "acc",
        }
    }

    pub fn fields(&self) -> &'static [FieldSpec] {
        match self {
            Channel::Ecu => ECU_FIELDS,
            Channel::Rpm => RPM_FIELDS,
            Channel::Water => WATER_FIELDS,
            Channel::StrokeFront | Channel::StrokeRear => STROKE_FIELDS,
            Channel::Acc => ACC_FIELDS,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Channel::Ecu => "Engine control unit: coolant temperature, throttle, intake pressure, gear",
            Channel::Rpm => "Engine speed",
            Channel::Water => "Cooling loop inlet/outlet temperature",
            Channel::StrokeFront => "Front suspension stroke, left and right",
            Channel::StrokeRear => "Rear suspension stroke, left and right",
            Channel::Acc => "Inertial measurement unit",
        }
    }

    /// Full output column list, clock columns first.
    pub fn columns(&self) -> &'static [&'static str] {
        descriptor(*self).columns.as_slice()
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown channel '{0}'")]
pub struct UnknownChannel(pub String);

impl FromStr for Channel {
    type Err = UnknownChannel;

    /// Accepts either the output directory name or the topic tag.
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        Channel::ALL
            .into_iter()
            .find(|channel| channel.dir_name() == trimmed || channel.topic() == trimmed)
            .ok_or_else(|| UnknownChannel(trimmed.to_string()))
    }
}

impl TryFrom<String> for Channel {
    type Error = UnknownChannel;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Channel> for String {
    fn from(value: Channel) -> Self {
        value.dir_name().to_string()
    }
}

#[derive(Debug, Clone)]
pub struct ChannelDescriptor {
    pub channel: Channel,
    pub topic: &'static str,
    pub dir_name: &'static str,
    pub columns: Vec<&'static str>,
    pub description: &'static str,
}

static CHANNEL_DESCRIPTORS: Lazy<Vec<ChannelDescriptor>> = Lazy::new(|| {
    Channel::ALL
        .into_iter()
        .map(|channel| {
            let mut columns = vec![SERVER_MS_COLUMN, LOGGER_US_COLUMN];
            columns.extend(channel.fields().iter().map(|field| field.column));
            ChannelDescriptor {
                channel,
                topic: channel.topic(),
                dir_name: channel.dir_name(),
                columns,
                description: channel.description(),
            }
        })
        .collect()
});

pub fn all_channel_descriptors() -> &'static [ChannelDescriptor] {
    CHANNEL_DESCRIPTORS.as_slice()
}

fn descriptor(channel: Channel) -> &'static ChannelDescriptor {
    // ALL and the registry share the same order
    &CHANNEL_DESCRIPTORS[channel as usize]
}
