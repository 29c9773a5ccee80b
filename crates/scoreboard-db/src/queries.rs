use crate::models::{ScoreRow, ScoreUpsert, UserRow};
use crate::Database;
use anyhow::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension};
use scoreboard_types::username_key;

impl Database {
    // -- Users --

    /// Insert a user unless one with the same case-insensitive username exists.
    /// Returns `false` on conflict.
    pub fn create_user(&self, id: &str, username: &str, password_hash: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let inserted = conn.execute(
                "INSERT INTO users (id, username, username_key, password) VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(username_key) DO NOTHING",
                (id, username, username_key(username), password_hash),
            )?;
            Ok(inserted == 1)
        })
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user_by_username(conn, username))
    }

    // -- Scores --

    /// Add `delta` to the entry for `username`, creating it if absent.
    /// A single statement, so concurrent calls never produce two entries or lose an increment.
    pub fn add_score(
        &self,
        id: &str,
        username: &str,
        delta: i64,
        now: DateTime<Utc>,
    ) -> Result<ScoreUpsert> {
        let date = now.to_rfc3339_opts(SecondsFormat::Micros, true);
        self.with_conn(|conn| {
            let row = conn.query_row(
                "INSERT INTO scores (id, username, username_key, score, date) VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(username_key) DO UPDATE SET
                     score = score + excluded.score,
                     date = excluded.date
                 RETURNING id, username, score, date",
                (id, username, username_key(username), delta, &date),
                map_score_row,
            )?;
            let created = row.id == id;
            Ok(ScoreUpsert { row, created })
        })
    }

    /// Every entry, best first: score descending, then most recent, then id.
    pub fn list_scores(&self) -> Result<Vec<ScoreRow>> {
        self.with_conn(query_scores)
    }

    /// Returns `false` if no entry matched.
    pub fn delete_score(&self, username: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let deleted = conn.execute(
                "DELETE FROM scores WHERE username_key = ?1",
                [username_key(username)],
            )?;
            Ok(deleted > 0)
        })
    }
}

fn query_user_by_username(conn: &Connection, username: &str) -> Result<Option<UserRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, username, password, created_at FROM users WHERE username_key = ?1",
    )?;

    let row = stmt
        .query_row([username_key(username)], |row| {
            Ok(UserRow {
                id: row.get(0)?,
                username: row.get(1)?,
                password: row.get(2)?,
                created_at: row.get(3)?,
            })
        })
        .optional()?;

    Ok(row)
}

fn query_scores(conn: &Connection) -> Result<Vec<ScoreRow>> {
    let mut stmt = conn.prepare(
        "SELECT id, username, score, date FROM scores
         ORDER BY score DESC, date DESC, id ASC",
    )?;

    let rows = stmt
        .query_map([], map_score_row)?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

fn map_score_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ScoreRow> {
    Ok(ScoreRow {
        id: row.get(0)?,
        username: row.get(1)?,
        score: row.get(2)?,
        date: row.get(3)?,
    })
}
