use chrono::{DateTime, Utc};

use crate::db::queries;
use crate::models::{LocationStatus, Mode, PrivacyState};

/// One conjunct of a point query. Present filters are ANDed; there is no
/// OR form. Each variant contributes a WHERE fragment plus its bind values,
/// so composed SQL never interpolates caller input.
#[derive(Debug, Clone)]
pub enum PointFilter {
    /// Uploading client application id.
    Client(String),
    /// Sample time at or after the given epoch milliseconds.
    CreatedOnOrAfter(i64),
    /// Sample time at or before the given epoch milliseconds.
    CreatedOnOrBefore(i64),
    /// Sample time within the inclusive range.
    CreatedBetween(i64, i64),
    /// Upload time at or after the given instant.
    UploadedOnOrAfter(DateTime<Utc>),
    /// Upload time at or before the given instant.
    UploadedOnOrBefore(DateTime<Utc>),
    PrivacyState(PrivacyState),
    LocationStatus(LocationStatus),
    Mode(Mode),
}

/// Value bound into a composed query, kept in placeholder order.
#[derive(Debug, Clone)]
pub(crate) enum BindValue {
    Text(String),
    Int(i64),
}

impl PointFilter {
    pub(crate) fn push_clause(&self, sql: &mut String, binds: &mut Vec<BindValue>) {
        match self {
            PointFilter::Client(client) => {
                sql.push_str(queries::AND_CLIENT);
                binds.push(BindValue::Text(client.clone()));
            }
            PointFilter::CreatedOnOrAfter(millis) => {
                sql.push_str(queries::AND_CREATED_ON_OR_AFTER);
                binds.push(BindValue::Int(*millis));
            }
            PointFilter::CreatedOnOrBefore(millis) => {
                sql.push_str(queries::AND_CREATED_ON_OR_BEFORE);
                binds.push(BindValue::Int(*millis));
            }
            PointFilter::CreatedBetween(start, end) => {
                sql.push_str(queries::AND_CREATED_ON_OR_AFTER);
                sql.push_str(queries::AND_CREATED_ON_OR_BEFORE);
                binds.push(BindValue::Int(*start));
                binds.push(BindValue::Int(*end));
            }
            PointFilter::UploadedOnOrAfter(instant) => {
                sql.push_str(queries::AND_UPLOADED_ON_OR_AFTER);
                binds.push(BindValue::Int(instant.timestamp_millis()));
            }
            PointFilter::UploadedOnOrBefore(instant) => {
                sql.push_str(queries::AND_UPLOADED_ON_OR_BEFORE);
                binds.push(BindValue::Int(instant.timestamp_millis()));
            }
            PointFilter::PrivacyState(state) => {
                sql.push_str(queries::AND_PRIVACY_STATE);
                binds.push(BindValue::Text(state.as_str().to_string()));
            }
            PointFilter::LocationStatus(status) => {
                sql.push_str(queries::AND_LOCATION_STATUS);
                binds.push(BindValue::Text(status.as_str().to_string()));
            }
            PointFilter::Mode(mode) => {
                sql.push_str(queries::AND_MODE);
                binds.push(BindValue::Text(mode.as_str().to_string()));
            }
        }
    }
}

/// Optional conjuncts for the single-pass `fetch_filtered`. Unset fields
/// do not constrain the result.
#[derive(Debug, Clone, Default)]
pub struct PointQuery {
    pub start_millis: Option<i64>,
    pub end_millis: Option<i64>,
    pub privacy_state: Option<PrivacyState>,
    pub location_status: Option<LocationStatus>,
    pub mode: Option<Mode>,
}

impl PointQuery {
    pub(crate) fn filters(&self) -> Vec<PointFilter> {
        let mut filters = Vec::new();
        if let Some(start) = self.start_millis {
            filters.push(PointFilter::CreatedOnOrAfter(start));
        }
        if let Some(end) = self.end_millis {
            filters.push(PointFilter::CreatedOnOrBefore(end));
        }
        if let Some(state) = self.privacy_state {
            filters.push(PointFilter::PrivacyState(state));
        }
        if let Some(status) = self.location_status {
            filters.push(PointFilter::LocationStatus(status));
        }
        if let Some(mode) = self.mode {
            filters.push(PointFilter::Mode(mode));
        }
        filters
    }
}
