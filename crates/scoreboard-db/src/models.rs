//! Database row types. These map directly to SQLite rows.
//! Distinct from scoreboard-types models to keep the DB layer independent.

pub struct UserRow {
    pub id: String,
    pub username: String,
    pub password: String,
    pub created_at: String,
}

#[derive(Debug, Clone)]
pub struct ScoreRow {
    pub id: String,
    pub username: String,
    pub score: i64,
    pub date: String,
}

/// Result of an increment-or-insert on the scores table.
#[derive(Debug)]
pub struct ScoreUpsert {
    pub row: ScoreRow,
    /// `true` when no entry existed for the username before this call.
    pub created: bool,
}
