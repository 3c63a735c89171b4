/// All database primary keys are PostgreSQL BIGSERIAL.
pub type DbId = i64;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Per-page version numbers (1-based, `0` means "no snapshot yet").
pub type VersionNumber = i32;
