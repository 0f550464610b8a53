use serde::{Deserialize, Serialize};

use crate::error::MobilityError;

/// A location fix attached to a mobility point. Stored as a JSON column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    /// Reported accuracy radius in meters.
    pub accuracy: f64,
    /// Subsystem that produced the fix, e.g. "gps" or "network".
    pub provider: String,
    /// Epoch milliseconds at which the fix was taken.
    pub time: i64,
}

impl Location {
    pub fn new(
        latitude: f64,
        longitude: f64,
        accuracy: f64,
        provider: impl Into<String>,
        time: i64,
    ) -> Result<Self, MobilityError> {
        if !latitude.is_finite() || !longitude.is_finite() {
            return Err(MobilityError::InvalidData(format!(
                "non-finite coordinates ({}, {})",
                latitude, longitude
            )));
        }
        if !accuracy.is_finite() {
            return Err(MobilityError::InvalidData(
                "non-finite location accuracy".to_string(),
            ));
        }
        Ok(Self {
            latitude,
            longitude,
            accuracy,
            provider: provider.into(),
            time,
        })
    }
}
