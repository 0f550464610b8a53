//! Derived statistics over a user's mobility history. Read-only; every
//! operation is computed from store fetches and propagates store errors
//! unchanged.

use std::collections::{HashMap, HashSet};

use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;

use crate::error::Result;
use crate::store::{MobilityStore, PointQuery};

const MILLIS_PER_HOUR: i64 = 3_600_000;
const MILLIS_PER_DAY: i64 = 86_400_000;

pub struct MobilityAggregator<'a> {
    store: &'a MobilityStore,
}

impl<'a> MobilityAggregator<'a> {
    pub fn new(store: &'a MobilityStore) -> Self {
        Self { store }
    }

    /// Share of the user's points in the last `lookback_hours` that carry a
    /// location fix, in `[0, 1]`.
    ///
    /// Returns `None` when the window holds no points at all, which is a
    /// distinct signal from a ratio of `0.0`. A zero-hour lookback is an
    /// empty window and also yields `None`.
    pub async fn percentage_of_non_null_locations(
        &self,
        username: &str,
        lookback_hours: u32,
    ) -> Result<Option<f64>> {
        if lookback_hours == 0 {
            return Ok(None);
        }

        let cutoff = Utc::now().timestamp_millis() - i64::from(lookback_hours) * MILLIS_PER_HOUR;
        let query = PointQuery {
            start_millis: Some(cutoff),
            ..PointQuery::default()
        };
        let points = self.store.fetch_filtered(username, &query).await?;
        if points.is_empty() {
            return Ok(None);
        }

        let located = points.iter().filter(|p| p.location().is_some()).count();
        Ok(Some(located as f64 / points.len() as f64))
    }

    /// Local calendar dates on which the user recorded mobility activity
    /// between `start_millis` and `end_millis` inclusive.
    ///
    /// Points are grouped by truncated UTC day bucket and timezone; each
    /// group's earliest and latest sample times are then reinterpreted as
    /// local dates in that group's timezone. A bucket straddling a DST
    /// transition keeps this historical behavior rather than exact
    /// local-midnight boundaries.
    pub async fn active_local_dates(
        &self,
        username: &str,
        start_millis: i64,
        end_millis: i64,
    ) -> Result<HashSet<NaiveDate>> {
        let query = PointQuery {
            start_millis: Some(start_millis),
            end_millis: Some(end_millis),
            ..PointQuery::default()
        };
        let points = self.store.fetch_filtered(username, &query).await?;

        // (day bucket, timezone) -> (min sample time, max sample time)
        let mut spans: HashMap<(i64, Tz), (i64, i64)> = HashMap::new();
        for point in &points {
            let bucket = point.time() / MILLIS_PER_DAY;
            let span = spans
                .entry((bucket, point.timezone()))
                .or_insert((point.time(), point.time()));
            span.0 = span.0.min(point.time());
            span.1 = span.1.max(point.time());
        }

        let mut dates = HashSet::new();
        for ((_, timezone), (min, max)) in spans {
            if let Some(date) = local_date(timezone, min) {
                dates.insert(date);
            }
            if let Some(date) = local_date(timezone, max) {
                dates.insert(date);
            }
        }
        Ok(dates)
    }
}

fn local_date(timezone: Tz, millis: i64) -> Option<NaiveDate> {
    use chrono::TimeZone;

    timezone
        .timestamp_millis_opt(millis)
        .single()
        .map(|dt| dt.date_naive())
}
