use std::hash::{Hash, Hasher};
use std::str::FromStr;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::MobilityError;
use crate::models::location::Location;

/// Classifier version stamped onto sensor payloads built without an
/// explicit version.
pub const CLASSIFIER_VERSION: &str = "1.3.5";

/// Whether (and how) a location fix was obtained for a sample.
///
/// `Valid` and `Network` both denote a usable fix; `Unavailable` means no
/// fix existed and the point carries no location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationStatus {
    Valid,
    Network,
    Inaccurate,
    Stale,
    Unavailable,
}

impl LocationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LocationStatus::Valid => "valid",
            LocationStatus::Network => "network",
            LocationStatus::Inaccurate => "inaccurate",
            LocationStatus::Stale => "stale",
            LocationStatus::Unavailable => "unavailable",
        }
    }
}

impl FromStr for LocationStatus {
    type Err = MobilityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "valid" => Ok(LocationStatus::Valid),
            "network" => Ok(LocationStatus::Network),
            "inaccurate" => Ok(LocationStatus::Inaccurate),
            "stale" => Ok(LocationStatus::Stale),
            "unavailable" => Ok(LocationStatus::Unavailable),
            other => Err(MobilityError::InvalidData(format!(
                "unknown location status '{}'",
                other
            ))),
        }
    }
}

/// Activity mode detected by the on-phone classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Still,
    Walk,
    Run,
    Bike,
    Drive,
    /// The classifier ran but could not produce a mode.
    Error,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Still => "still",
            Mode::Walk => "walk",
            Mode::Run => "run",
            Mode::Bike => "bike",
            Mode::Drive => "drive",
            Mode::Error => "error",
        }
    }
}

impl FromStr for Mode {
    type Err = MobilityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "still" => Ok(Mode::Still),
            "walk" => Ok(Mode::Walk),
            "run" => Ok(Mode::Run),
            "bike" => Ok(Mode::Bike),
            "drive" => Ok(Mode::Drive),
            "error" => Ok(Mode::Error),
            other => Err(MobilityError::InvalidData(format!(
                "unknown mode '{}'",
                other
            ))),
        }
    }
}

/// Visibility of a point to principals other than its owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PrivacyState {
    Private,
    Shared,
}

impl PrivacyState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrivacyState::Private => "private",
            PrivacyState::Shared => "shared",
        }
    }
}

impl FromStr for PrivacyState {
    type Err = MobilityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "private" => Ok(PrivacyState::Private),
            "shared" => Ok(PrivacyState::Shared),
            other => Err(MobilityError::InvalidData(format!(
                "unknown privacy state '{}'",
                other
            ))),
        }
    }
}

/// Whether raw sensor/classifier output accompanies the point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubType {
    ModeOnly,
    SensorData,
}

/// Raw sensor readings and classifier features for a sensor-data point.
/// The payloads are opaque to the store and persisted as JSON text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorPayload {
    pub sensor_data: Value,
    pub features: Value,
    pub classifier_version: String,
}

impl SensorPayload {
    /// Builds a payload stamped with [`CLASSIFIER_VERSION`].
    pub fn new(sensor_data: Value, features: Value) -> Self {
        Self::with_version(sensor_data, features, CLASSIFIER_VERSION)
    }

    pub fn with_version(
        sensor_data: Value,
        features: Value,
        classifier_version: impl Into<String>,
    ) -> Self {
        Self {
            sensor_data,
            features,
            classifier_version: classifier_version.into(),
        }
    }
}

/// One timestamped observation of a user's detected activity mode and
/// optional location.
///
/// Immutable once constructed; the validating constructor is the only way
/// to build one. Equality and hashing use only the id.
#[derive(Debug, Clone, Serialize)]
pub struct MobilityPoint {
    id: Uuid,
    time: i64,
    timezone: Tz,
    location_status: LocationStatus,
    location: Option<Location>,
    mode: Mode,
    privacy_state: PrivacyState,
    sensor: Option<SensorPayload>,
}

impl MobilityPoint {
    /// Validates and builds a point.
    ///
    /// Fails when `timezone` is not a resolvable IANA identifier, when the
    /// location's presence disagrees with `location_status`, or when the
    /// sensor-data/features/classifier-version triple is partially present.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: Uuid,
        time: i64,
        timezone: &str,
        location_status: LocationStatus,
        location: Option<Location>,
        mode: Mode,
        privacy_state: PrivacyState,
        sensor_data: Option<Value>,
        features: Option<Value>,
        classifier_version: Option<String>,
    ) -> Result<Self, MobilityError> {
        let timezone: Tz = timezone.parse().map_err(|_| {
            MobilityError::InvalidData(format!("unresolvable timezone '{}'", timezone))
        })?;

        match (location_status, &location) {
            (LocationStatus::Unavailable, Some(_)) => {
                return Err(MobilityError::InvalidData(
                    "location present although its status is unavailable".to_string(),
                ));
            }
            (status, None) if status != LocationStatus::Unavailable => {
                return Err(MobilityError::InvalidData(format!(
                    "location missing although its status is '{}'",
                    status.as_str()
                )));
            }
            _ => {}
        }

        let sensor = match (sensor_data, features, classifier_version) {
            (Some(data), Some(features), Some(version)) => {
                Some(SensorPayload::with_version(data, features, version))
            }
            (None, None, None) => None,
            _ => {
                return Err(MobilityError::InvalidData(
                    "sensor data, features and classifier version must be all present or all absent"
                        .to_string(),
                ));
            }
        };

        Ok(Self {
            id,
            time,
            timezone,
            location_status,
            location,
            mode,
            privacy_state,
            sensor,
        })
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Sample time in epoch milliseconds.
    pub fn time(&self) -> i64 {
        self.time
    }

    /// Timezone in which the sample time should be read as local time.
    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn location_status(&self) -> LocationStatus {
        self.location_status
    }

    pub fn location(&self) -> Option<&Location> {
        self.location.as_ref()
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn privacy_state(&self) -> PrivacyState {
        self.privacy_state
    }

    pub fn sensor(&self) -> Option<&SensorPayload> {
        self.sensor.as_ref()
    }

    pub fn sub_type(&self) -> SubType {
        match self.sensor {
            Some(_) => SubType::SensorData,
            None => SubType::ModeOnly,
        }
    }
}

impl PartialEq for MobilityPoint {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for MobilityPoint {}

impl Hash for MobilityPoint {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
