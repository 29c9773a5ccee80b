use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::WithRejection;
use chrono::{DateTime, Utc};
use tracing::{info, warn};
use uuid::Uuid;

use scoreboard_db::models::ScoreRow;
use scoreboard_types::api::{
    DeleteScoreRequest, MessageResponse, ScoreInput, ScoreListQuery, ScoreListResponse,
    SubmitScoreRequest, SubmitScoreResponse,
};
use scoreboard_types::models::ScoreEntry;

use crate::auth::{AppState, MAX_USERNAME_LEN};
use crate::error::ApiError;
use crate::leaderboard::{self, PageRequest};

/// Largest amount a single submission may add or subtract.
pub const MAX_SCORE_DELTA: i64 = 1_000_000;

/// POST /api/scores: add to the caller's running total, creating it on first submit.
pub async fn submit_score(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<SubmitScoreRequest>, ApiError>,
) -> Result<impl IntoResponse, ApiError> {
    let username = trimmed(req.username);
    let (Some(username), Some(score)) = (username, req.score) else {
        return Err(ApiError::validation("Username and score are required"));
    };
    check_username_len(&username)?;
    let delta = parse_score(&score)?;

    let app = state.clone();
    let candidate_id = Uuid::new_v4().to_string();
    let upsert = tokio::task::spawn_blocking(move || {
        app.db.add_score(&candidate_id, &username, delta, Utc::now())
    })
    .await??;

    let entry = to_entry(upsert.row);
    let (status, message) = if upsert.created {
        (StatusCode::CREATED, "Score submitted successfully")
    } else {
        (StatusCode::OK, "Score added to existing user")
    };
    info!(
        "Score {:+} for '{}', total now {}",
        delta, entry.username, entry.score
    );

    Ok((
        status,
        Json(SubmitScoreResponse {
            success: true,
            id: entry.id,
            message: message.into(),
            total_score: entry.score,
        }),
    ))
}

/// GET /api/scores?page=&limit=
pub async fn list_scores(
    State(state): State<AppState>,
    WithRejection(Query(query), _): WithRejection<Query<ScoreListQuery>, ApiError>,
) -> Result<Json<ScoreListResponse>, ApiError> {
    let page = PageRequest::from_query(&query)?;

    let app = state.clone();
    let rows = tokio::task::spawn_blocking(move || app.db.list_scores()).await??;

    let entries = rows.into_iter().map(to_entry).collect();
    Ok(Json(leaderboard::build(entries, page)))
}

/// DELETE /api/scores
pub async fn delete_score(
    State(state): State<AppState>,
    WithRejection(Json(req), _): WithRejection<Json<DeleteScoreRequest>, ApiError>,
) -> Result<Json<MessageResponse>, ApiError> {
    let username = trimmed(req.username).ok_or_else(|| ApiError::validation("Username is required"))?;

    let app = state.clone();
    let name = username.clone();
    let deleted = tokio::task::spawn_blocking(move || app.db.delete_score(&name)).await??;

    if !deleted {
        return Err(ApiError::NotFound("Score not found".into()));
    }

    info!("Deleted score entry for '{}'", username);
    Ok(Json(MessageResponse {
        success: true,
        message: "Score deleted successfully".into(),
    }))
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn check_username_len(username: &str) -> Result<(), ApiError> {
    if username.chars().count() > MAX_USERNAME_LEN {
        return Err(ApiError::validation(format!(
            "Username must be at most {MAX_USERNAME_LEN} characters"
        )));
    }
    Ok(())
}

/// Accepts an integer or a string holding one.
pub fn parse_score(input: &ScoreInput) -> Result<i64, ApiError> {
    let value = match input {
        ScoreInput::Int(n) => *n,
        ScoreInput::Text(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| ApiError::validation("Score must be an integer"))?,
    };

    if !(-MAX_SCORE_DELTA..=MAX_SCORE_DELTA).contains(&value) {
        return Err(ApiError::validation(format!(
            "Score must be between -{MAX_SCORE_DELTA} and {MAX_SCORE_DELTA}"
        )));
    }
    Ok(value)
}

fn to_entry(row: ScoreRow) -> ScoreEntry {
    let id = row.id.parse().unwrap_or_else(|e| {
        warn!("Corrupt score id '{}': {}", row.id, e);
        Uuid::default()
    });
    let date = DateTime::parse_from_rfc3339(&row.date)
        .map(|d| d.with_timezone(&Utc))
        .unwrap_or_else(|e| {
            warn!("Corrupt date '{}' on score '{}': {}", row.date, row.id, e);
            DateTime::default()
        });

    ScoreEntry {
        id,
        username: row.username,
        score: row.score,
        date,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_accepts_integers_and_numeric_strings() {
        assert_eq!(parse_score(&ScoreInput::Int(10)).unwrap(), 10);
        assert_eq!(parse_score(&ScoreInput::Int(-3)).unwrap(), -3);
        assert_eq!(parse_score(&ScoreInput::Text(" 42 ".into())).unwrap(), 42);
    }

    #[test]
    fn score_rejects_non_numeric_and_out_of_range() {
        for input in [
            ScoreInput::Text("abc".into()),
            ScoreInput::Text("".into()),
            ScoreInput::Text("7.5".into()),
            ScoreInput::Int(MAX_SCORE_DELTA + 1),
            ScoreInput::Int(i64::MIN),
        ] {
            assert!(parse_score(&input).is_err(), "accepted {input:?}");
        }
    }

    #[test]
    fn blank_username_is_missing() {
        assert_eq!(trimmed(Some("  Ann ".into())), Some("Ann".into()));
        assert_eq!(trimmed(Some("   ".into())), None);
        assert_eq!(trimmed(None), None);
    }

    #[test]
    fn row_conversion_survives_corrupt_fields() {
        let entry = to_entry(ScoreRow {
            id: "not-a-uuid".into(),
            username: "Ann".into(),
            score: 7,
            date: "yesterday".into(),
        });
        assert_eq!(entry.id, Uuid::default());
        assert_eq!(entry.date, DateTime::<Utc>::default());
        assert_eq!(entry.score, 7);
    }
}
