/// Jobs, workers and incorrect cases are keyed by opaque string ids.
pub type EntityId = String;

/// Wire timestamps are Unix seconds.
pub type UnixSeconds = i64;

/// Generate a fresh opaque id (UUID v7, simple form, so ids sort by creation).
pub fn new_entity_id() -> EntityId {
    uuid::Uuid::now_v7().simple().to_string()
}

/// Current time as Unix seconds.
pub fn now_unix() -> UnixSeconds {
    chrono::Utc::now().timestamp()
}
