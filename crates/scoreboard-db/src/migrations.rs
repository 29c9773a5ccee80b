use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

/// One-time schema setup, run when the store is opened.
/// Uniqueness is enforced on `username_key`, the lowercased username.
pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 = conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |r| r.get(0),
    )?;

    if version < 1 {
        info!("Running migration v1 (users, scores)");
        conn.execute_batch(
            "
            CREATE TABLE users (
                id              TEXT PRIMARY KEY,
                username        TEXT NOT NULL,
                username_key    TEXT NOT NULL UNIQUE,
                password        TEXT NOT NULL,
                created_at      TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
            );

            CREATE TABLE scores (
                id              TEXT PRIMARY KEY,
                username        TEXT NOT NULL,
                username_key    TEXT NOT NULL UNIQUE,
                score           INTEGER NOT NULL,
                date            TEXT NOT NULL
            );

            CREATE INDEX idx_scores_ranking
                ON scores(score DESC, date DESC);

            INSERT INTO schema_version (version) VALUES (1);
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
