pub const INSERT_USER: &str = r#"
INSERT OR IGNORE INTO users (username) VALUES (?);
"#;

pub const INSERT_POINT: &str = r#"
INSERT INTO mobility (uuid, user_id, client, epoch_millis, upload_millis, phone_timezone, location_status, location, mode, privacy_state)
VALUES (?, (SELECT id FROM users WHERE username = ?), ?, ?, ?, ?, ?, ?, ?, ?);
"#;

pub const INSERT_EXTENDED: &str = r#"
INSERT INTO mobility_extended (mobility_id, sensor_data, features, classifier_version)
VALUES (?, ?, ?, ?);
"#;

// Base SELECTs are left open so filter fragments can be appended; every
// fragment binds through placeholders.
pub const SELECT_IDS: &str = r#"
SELECT m.uuid
FROM mobility m
JOIN users u ON u.id = m.user_id
WHERE u.username = ?"#;

pub const SELECT_POINTS: &str = r#"
SELECT m.uuid, m.epoch_millis, m.phone_timezone, m.location_status, m.location,
       m.mode, m.privacy_state, me.sensor_data, me.features, me.classifier_version
FROM mobility m
JOIN users u ON u.id = m.user_id
LEFT JOIN mobility_extended me ON me.mobility_id = m.id
WHERE u.username = ?"#;

// Caller appends a parenthesized placeholder list, one per uuid.
pub const SELECT_POINTS_BY_UUIDS: &str = r#"
SELECT m.uuid, m.epoch_millis, m.phone_timezone, m.location_status, m.location,
       m.mode, m.privacy_state, me.sensor_data, me.features, me.classifier_version
FROM mobility m
LEFT JOIN mobility_extended me ON me.mobility_id = m.id
WHERE m.uuid IN "#;

pub const SELECT_LAST_UPLOAD: &str = r#"
SELECT MAX(m.epoch_millis) AS last_millis
FROM mobility m
JOIN users u ON u.id = m.user_id
WHERE u.username = ?;
"#;

pub const AND_CLIENT: &str = " AND m.client = ?";
pub const AND_CREATED_ON_OR_AFTER: &str = " AND m.epoch_millis >= ?";
pub const AND_CREATED_ON_OR_BEFORE: &str = " AND m.epoch_millis <= ?";
pub const AND_UPLOADED_ON_OR_AFTER: &str = " AND m.upload_millis >= ?";
pub const AND_UPLOADED_ON_OR_BEFORE: &str = " AND m.upload_millis <= ?";
pub const AND_PRIVACY_STATE: &str = " AND m.privacy_state = ?";
pub const AND_LOCATION_STATUS: &str = " AND m.location_status = ?";
pub const AND_MODE: &str = " AND m.mode = ?";

pub const ORDER_BY_TIME: &str = " ORDER BY m.epoch_millis";
