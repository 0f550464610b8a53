//! Durable storage and filtered retrieval of mobility points, keyed by
//! username.

mod filter;

pub use filter::{PointFilter, PointQuery};

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::db::{queries, DbPool};
use crate::error::{MobilityError, Result};
use crate::models::{Location, MobilityPoint};

use self::filter::BindValue;

/// Storage and query operations for mobility points.
///
/// Holds a connection pool and no other state; concurrent callers operate
/// over independent pooled connections.
pub struct MobilityStore {
    pool: DbPool,
}

impl MobilityStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Inserts a new point for `username` as uploaded by `client`.
    ///
    /// The base row and, for sensor-data points, the extended row commit
    /// atomically; on failure the transaction rolls back leaving zero rows.
    /// Re-uploading an already-stored uuid is treated as a client retry:
    /// the insert is skipped and `Ok(())` returned.
    pub async fn create(&self, username: &str, client: &str, point: &MobilityPoint) -> Result<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(MobilityError::storage("create"))?;

        // Register the upload identity on first contact.
        sqlx::query(queries::INSERT_USER)
            .bind(username)
            .execute(&mut *tx)
            .await
            .map_err(MobilityError::storage("create"))?;

        let row_id = match insert_base_row(&mut tx, username, client, point).await {
            Ok(row_id) => row_id,
            Err(MobilityError::Duplicate { id }) => {
                tx.rollback()
                    .await
                    .map_err(MobilityError::storage("create"))?;
                warn!(
                    "Skipping duplicate mobility point {} for user {}",
                    id, username
                );
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        if let Some(sensor) = point.sensor() {
            sqlx::query(queries::INSERT_EXTENDED)
                .bind(row_id)
                .bind(sensor.sensor_data.to_string())
                .bind(sensor.features.to_string())
                .bind(&sensor.classifier_version)
                .execute(&mut *tx)
                .await
                .map_err(MobilityError::storage("create"))?;
        }

        tx.commit()
            .await
            .map_err(MobilityError::storage("create"))?;

        debug!("Stored mobility point {} for user {}", point.id(), username);
        Ok(())
    }

    /// Resolves the uuids of the user's points matching every given filter.
    /// An empty filter list matches all of the user's points; an unknown
    /// username yields the empty set.
    pub async fn find_ids(
        &self,
        username: &str,
        filters: &[PointFilter],
    ) -> Result<HashSet<Uuid>> {
        let mut sql = String::from(queries::SELECT_IDS);
        let mut binds = Vec::new();
        for filter in filters {
            filter.push_clause(&mut sql, &mut binds);
        }

        let mut stmt = sqlx::query(&sql).bind(username);
        for bind in binds {
            stmt = match bind {
                BindValue::Text(text) => stmt.bind(text),
                BindValue::Int(int) => stmt.bind(int),
            };
        }

        let rows = stmt
            .fetch_all(&self.pool)
            .await
            .map_err(MobilityError::storage("find_ids"))?;

        rows.iter().map(uuid_from_row).collect()
    }

    /// Hydrates full records for the given uuids, ordered ascending by
    /// sample time. Rows that no longer parse surface as `CorruptRecord`.
    pub async fn fetch_by_ids(&self, ids: &[Uuid]) -> Result<Vec<MobilityPoint>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!(
            "{}({}){}",
            queries::SELECT_POINTS_BY_UUIDS,
            placeholders,
            queries::ORDER_BY_TIME
        );

        let mut stmt = sqlx::query(&sql);
        for id in ids {
            stmt = stmt.bind(id.to_string());
        }

        let rows = stmt
            .fetch_all(&self.pool)
            .await
            .map_err(MobilityError::storage("fetch_by_ids"))?;

        rows.iter().map(point_from_row).collect()
    }

    /// Single-pass equivalent of `find_ids` + `fetch_by_ids` for the common
    /// time-range/enum filters, ordered ascending by sample time.
    pub async fn fetch_filtered(
        &self,
        username: &str,
        query: &PointQuery,
    ) -> Result<Vec<MobilityPoint>> {
        let filters = query.filters();
        let mut sql = String::from(queries::SELECT_POINTS);
        let mut binds = Vec::new();
        for filter in &filters {
            filter.push_clause(&mut sql, &mut binds);
        }
        sql.push_str(queries::ORDER_BY_TIME);

        let mut stmt = sqlx::query(&sql).bind(username);
        for bind in binds {
            stmt = match bind {
                BindValue::Text(text) => stmt.bind(text),
                BindValue::Int(int) => stmt.bind(int),
            };
        }

        let rows = stmt
            .fetch_all(&self.pool)
            .await
            .map_err(MobilityError::storage("fetch_filtered"))?;

        rows.iter().map(point_from_row).collect()
    }

    /// Latest sample time across all of the user's points, or `None` when
    /// the user has none.
    pub async fn last_upload_time(&self, username: &str) -> Result<Option<DateTime<Utc>>> {
        let row = sqlx::query(queries::SELECT_LAST_UPLOAD)
            .bind(username)
            .fetch_one(&self.pool)
            .await
            .map_err(MobilityError::storage("last_upload_time"))?;

        let millis: Option<i64> = row
            .try_get("last_millis")
            .map_err(MobilityError::storage("last_upload_time"))?;

        Ok(millis.and_then(DateTime::from_timestamp_millis))
    }
}

/// Inserts the base mobility row, mapping a uuid uniqueness violation to
/// the typed `Duplicate` error. Returns the new row id.
async fn insert_base_row(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    username: &str,
    client: &str,
    point: &MobilityPoint,
) -> Result<i64> {
    let location_json = point
        .location()
        .map(serde_json::to_string)
        .transpose()
        .map_err(|e| MobilityError::InvalidData(format!("unserializable location: {}", e)))?;

    let result = sqlx::query(queries::INSERT_POINT)
        .bind(point.id().to_string())
        .bind(username)
        .bind(client)
        .bind(point.time())
        .bind(Utc::now().timestamp_millis())
        .bind(point.timezone().name())
        .bind(point.location_status().as_str())
        .bind(location_json)
        .bind(point.mode().as_str())
        .bind(point.privacy_state().as_str())
        .execute(&mut **tx)
        .await;

    match result {
        Ok(done) => Ok(done.last_insert_rowid()),
        Err(e) if is_unique_violation(&e) => Err(MobilityError::Duplicate { id: point.id() }),
        Err(e) => Err(MobilityError::storage("create")(e)),
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => matches!(db.kind(), sqlx::error::ErrorKind::UniqueViolation),
        _ => false,
    }
}

fn uuid_from_row(row: &SqliteRow) -> Result<Uuid> {
    let raw: String = row
        .try_get("uuid")
        .map_err(MobilityError::storage("decode uuid"))?;
    Uuid::parse_str(&raw).map_err(|e| MobilityError::CorruptRecord {
        uuid: raw.clone(),
        reason: format!("unparseable uuid: {}", e),
    })
}

/// Rebuilds a `MobilityPoint` from a joined row. Every malformed field is
/// reported as `CorruptRecord`; silently dropping rows would skew any
/// statistics computed over the result.
fn point_from_row(row: &SqliteRow) -> Result<MobilityPoint> {
    let uuid_raw: String = row
        .try_get("uuid")
        .map_err(MobilityError::storage("decode row"))?;

    let corrupt = |err: MobilityError| {
        let reason = match err {
            MobilityError::InvalidData(msg) => msg,
            other => other.to_string(),
        };
        MobilityError::CorruptRecord {
            uuid: uuid_raw.clone(),
            reason,
        }
    };

    let id = Uuid::parse_str(&uuid_raw).map_err(|e| MobilityError::CorruptRecord {
        uuid: uuid_raw.clone(),
        reason: format!("unparseable uuid: {}", e),
    })?;

    let time: i64 = row
        .try_get("epoch_millis")
        .map_err(MobilityError::storage("decode row"))?;
    let timezone: String = row
        .try_get("phone_timezone")
        .map_err(MobilityError::storage("decode row"))?;
    let location_status_raw: String = row
        .try_get("location_status")
        .map_err(MobilityError::storage("decode row"))?;
    let location_raw: Option<String> = row
        .try_get("location")
        .map_err(MobilityError::storage("decode row"))?;
    let mode_raw: String = row
        .try_get("mode")
        .map_err(MobilityError::storage("decode row"))?;
    let privacy_raw: String = row
        .try_get("privacy_state")
        .map_err(MobilityError::storage("decode row"))?;
    let sensor_data_raw: Option<String> = row
        .try_get("sensor_data")
        .map_err(MobilityError::storage("decode row"))?;
    let features_raw: Option<String> = row
        .try_get("features")
        .map_err(MobilityError::storage("decode row"))?;
    let classifier_version: Option<String> = row
        .try_get("classifier_version")
        .map_err(MobilityError::storage("decode row"))?;

    let location_status = location_status_raw.parse().map_err(corrupt)?;
    let mode = mode_raw.parse().map_err(corrupt)?;
    let privacy_state = privacy_raw.parse().map_err(corrupt)?;

    let location: Option<Location> = location_raw
        .as_deref()
        .map(serde_json::from_str)
        .transpose()
        .map_err(|e| corrupt(MobilityError::InvalidData(format!("bad location json: {}", e))))?;

    let sensor_data = sensor_data_raw
        .as_deref()
        .map(serde_json::from_str::<serde_json::Value>)
        .transpose()
        .map_err(|e| corrupt(MobilityError::InvalidData(format!("bad sensor json: {}", e))))?;
    let features = features_raw
        .as_deref()
        .map(serde_json::from_str::<serde_json::Value>)
        .transpose()
        .map_err(|e| corrupt(MobilityError::InvalidData(format!("bad features json: {}", e))))?;

    MobilityPoint::new(
        id,
        time,
        &timezone,
        location_status,
        location,
        mode,
        privacy_state,
        sensor_data,
        features,
        classifier_version,
    )
    .map_err(corrupt)
}
