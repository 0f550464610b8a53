pub mod location;
pub mod mobility_point;

pub use location::Location;
pub use mobility_point::{
    LocationStatus, MobilityPoint, Mode, PrivacyState, SensorPayload, SubType, CLASSIFIER_VERSION,
};
