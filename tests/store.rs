//! Store integration tests. Each test runs against its own temp-file
//! SQLite database.

use std::collections::HashSet;

use chrono::{Duration, Utc};
use serde_json::json;
use tempfile::TempDir;
use uuid::Uuid;

use mobility_store::{
    db, Location, LocationStatus, MobilityPoint, MobilityStore, Mode, PointFilter, PointQuery,
    PrivacyState, SubType,
};

const USER: &str = "mobility.tester";
const CLIENT: &str = "mobility-android";

async fn open_store(tmp_dir: &TempDir) -> MobilityStore {
    let db_path = tmp_dir.path().join("mobility.db");
    let url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = db::init_pool(&url).await.expect("failed to open pool");
    db::init_schema(&pool).await.expect("failed to init schema");
    MobilityStore::new(pool)
}

fn located_point(time: i64, mode: Mode, privacy: PrivacyState) -> MobilityPoint {
    let location = Location::new(34.0689, -118.4452, 12.5, "gps", time).unwrap();
    MobilityPoint::new(
        Uuid::new_v4(),
        time,
        "America/Los_Angeles",
        LocationStatus::Valid,
        Some(location),
        mode,
        privacy,
        None,
        None,
        None,
    )
    .unwrap()
}

fn bare_point(time: i64, mode: Mode, privacy: PrivacyState) -> MobilityPoint {
    MobilityPoint::new(
        Uuid::new_v4(),
        time,
        "America/Los_Angeles",
        LocationStatus::Unavailable,
        None,
        mode,
        privacy,
        None,
        None,
        None,
    )
    .unwrap()
}

#[tokio::test]
async fn create_then_fetch_round_trips_every_field() {
    let tmp_dir = TempDir::new().unwrap();
    let store = open_store(&tmp_dir).await;

    let point = located_point(1_335_940_200_000, Mode::Walk, PrivacyState::Shared);
    store.create(USER, CLIENT, &point).await.unwrap();

    let fetched = store.fetch_by_ids(&[point.id()]).await.unwrap();
    assert_eq!(fetched.len(), 1);

    let got = &fetched[0];
    assert_eq!(got.id(), point.id());
    assert_eq!(got.time(), point.time());
    assert_eq!(got.timezone(), point.timezone());
    assert_eq!(got.location_status(), point.location_status());
    assert_eq!(got.location(), point.location());
    assert_eq!(got.mode(), point.mode());
    assert_eq!(got.privacy_state(), point.privacy_state());
    assert_eq!(got.sub_type(), SubType::ModeOnly);
    assert!(got.sensor().is_none());
}

#[tokio::test]
async fn sensor_payload_round_trips_through_extended_row() {
    let tmp_dir = TempDir::new().unwrap();
    let store = open_store(&tmp_dir).await;

    let time = 1_335_940_200_000;
    let point = MobilityPoint::new(
        Uuid::new_v4(),
        time,
        "America/Los_Angeles",
        LocationStatus::Unavailable,
        None,
        Mode::Run,
        PrivacyState::Private,
        Some(json!({"accel": [0.12, -0.3, 9.81], "speed": 2.4})),
        Some(json!({"fft": [0.9, 0.1], "variance": 0.02})),
        Some("1.3.5".to_string()),
    )
    .unwrap();

    store.create(USER, CLIENT, &point).await.unwrap();

    let fetched = store.fetch_by_ids(&[point.id()]).await.unwrap();
    assert_eq!(fetched.len(), 1);
    assert_eq!(fetched[0].sub_type(), SubType::SensorData);

    let sensor = fetched[0].sensor().expect("extended row missing");
    let original = point.sensor().unwrap();
    assert_eq!(sensor.sensor_data, original.sensor_data);
    assert_eq!(sensor.features, original.features);
    assert_eq!(sensor.classifier_version, original.classifier_version);
}

#[tokio::test]
async fn duplicate_create_is_an_idempotent_no_op() {
    let tmp_dir = TempDir::new().unwrap();
    let store = open_store(&tmp_dir).await;

    let point = located_point(1_335_940_200_000, Mode::Bike, PrivacyState::Private);
    store.create(USER, CLIENT, &point).await.unwrap();

    // A retried upload of the same uuid must not fail and must not add a row.
    store.create(USER, CLIENT, &point).await.unwrap();

    let ids = store.find_ids(USER, &[]).await.unwrap();
    assert_eq!(ids.len(), 1);
    assert!(ids.contains(&point.id()));
}

#[tokio::test]
async fn fetch_filtered_is_ordered_by_sample_time() {
    let tmp_dir = TempDir::new().unwrap();
    let store = open_store(&tmp_dir).await;

    // Insert out of chronological order.
    for time in [5_000_000, 1_000_000, 3_000_000, 2_000_000, 4_000_000] {
        let point = bare_point(time, Mode::Still, PrivacyState::Private);
        store.create(USER, CLIENT, &point).await.unwrap();
    }

    let points = store
        .fetch_filtered(USER, &PointQuery::default())
        .await
        .unwrap();
    assert_eq!(points.len(), 5);
    for pair in points.windows(2) {
        assert!(pair[0].time() <= pair[1].time());
    }
}

#[tokio::test]
async fn combined_filters_are_the_intersection_of_single_filters() {
    let tmp_dir = TempDir::new().unwrap();
    let store = open_store(&tmp_dir).await;

    let mut time = 1_000_000;
    for _ in 0..3 {
        store
            .create(
                USER,
                CLIENT,
                &located_point(time, Mode::Walk, PrivacyState::Private),
            )
            .await
            .unwrap();
        time += 1;
    }
    for _ in 0..2 {
        store
            .create(
                USER,
                CLIENT,
                &located_point(time, Mode::Walk, PrivacyState::Shared),
            )
            .await
            .unwrap();
        time += 1;
    }
    for _ in 0..2 {
        store
            .create(
                USER,
                CLIENT,
                &bare_point(time, Mode::Walk, PrivacyState::Private),
            )
            .await
            .unwrap();
        time += 1;
    }

    let private = store
        .find_ids(USER, &[PointFilter::PrivacyState(PrivacyState::Private)])
        .await
        .unwrap();
    let valid = store
        .find_ids(USER, &[PointFilter::LocationStatus(LocationStatus::Valid)])
        .await
        .unwrap();
    let both = store
        .find_ids(
            USER,
            &[
                PointFilter::PrivacyState(PrivacyState::Private),
                PointFilter::LocationStatus(LocationStatus::Valid),
            ],
        )
        .await
        .unwrap();

    let expected: HashSet<_> = private.intersection(&valid).copied().collect();
    assert_eq!(both, expected);
    assert_eq!(both.len(), 3);
}

#[tokio::test]
async fn time_and_client_filters_constrain_ids() {
    let tmp_dir = TempDir::new().unwrap();
    let store = open_store(&tmp_dir).await;

    let early = bare_point(1_000, Mode::Still, PrivacyState::Private);
    let late = bare_point(9_000, Mode::Still, PrivacyState::Private);
    store.create(USER, CLIENT, &early).await.unwrap();
    store.create(USER, "mobility-ios", &late).await.unwrap();

    let in_range = store
        .find_ids(USER, &[PointFilter::CreatedBetween(500, 5_000)])
        .await
        .unwrap();
    assert_eq!(in_range, HashSet::from([early.id()]));

    let ios_only = store
        .find_ids(USER, &[PointFilter::Client("mobility-ios".to_string())])
        .await
        .unwrap();
    assert_eq!(ios_only, HashSet::from([late.id()]));

    // Both rows were just uploaded, so a recent upload cutoff matches both.
    let recent = store
        .find_ids(
            USER,
            &[PointFilter::UploadedOnOrAfter(
                Utc::now() - Duration::minutes(5),
            )],
        )
        .await
        .unwrap();
    assert_eq!(recent.len(), 2);
}

#[tokio::test]
async fn unknown_user_yields_empty_results() {
    let tmp_dir = TempDir::new().unwrap();
    let store = open_store(&tmp_dir).await;

    let point = bare_point(1_000, Mode::Still, PrivacyState::Private);
    store.create(USER, CLIENT, &point).await.unwrap();

    let ids = store.find_ids("somebody.else", &[]).await.unwrap();
    assert!(ids.is_empty());

    let points = store
        .fetch_filtered("somebody.else", &PointQuery::default())
        .await
        .unwrap();
    assert!(points.is_empty());
}

#[tokio::test]
async fn fetch_by_ids_with_no_ids_skips_storage() {
    let tmp_dir = TempDir::new().unwrap();
    let store = open_store(&tmp_dir).await;

    let points = store.fetch_by_ids(&[]).await.unwrap();
    assert!(points.is_empty());
}

#[tokio::test]
async fn last_upload_time_tracks_the_latest_sample() {
    let tmp_dir = TempDir::new().unwrap();
    let store = open_store(&tmp_dir).await;

    assert!(store.last_upload_time(USER).await.unwrap().is_none());

    for time in [2_000_000, 8_000_000, 5_000_000] {
        let point = bare_point(time, Mode::Drive, PrivacyState::Private);
        store.create(USER, CLIENT, &point).await.unwrap();
    }

    let last = store
        .last_upload_time(USER)
        .await
        .unwrap()
        .expect("points were stored");
    assert_eq!(last.timestamp_millis(), 8_000_000);
}

#[tokio::test]
async fn points_are_scoped_to_their_owner() {
    let tmp_dir = TempDir::new().unwrap();
    let store = open_store(&tmp_dir).await;

    let mine = bare_point(1_000, Mode::Still, PrivacyState::Private);
    let theirs = bare_point(2_000, Mode::Still, PrivacyState::Private);
    store.create(USER, CLIENT, &mine).await.unwrap();
    store.create("somebody.else", CLIENT, &theirs).await.unwrap();

    let ids = store.find_ids(USER, &[]).await.unwrap();
    assert_eq!(ids, HashSet::from([mine.id()]));
}
