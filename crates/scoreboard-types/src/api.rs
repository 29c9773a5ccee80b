use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// -- JWT Claims --

/// Claims carried by every token issued on register/login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub username: String,
    pub exp: u64,
}

// -- Auth --

/// Body of `/api/auth/register` and `/api/auth/login`.
/// Fields are optional so a missing one is reported as a validation error.
#[derive(Debug, Default, Deserialize)]
pub struct CredentialsRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

/// Body of `POST /api/auth`, which picks register or login from `action`.
#[derive(Debug, Default, Deserialize)]
pub struct AuthActionRequest {
    pub action: Option<String>,
    #[serde(flatten)]
    pub credentials: CredentialsRequest,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub success: bool,
    pub message: String,
    pub token: String,
    pub username: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MeResponse {
    pub success: bool,
    pub user_id: Uuid,
    pub username: String,
}

// -- Scores --

/// A submitted score as it arrives on the wire: either a JSON integer or a
/// string holding one.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ScoreInput {
    Int(i64),
    Text(String),
}

#[derive(Debug, Default, Deserialize)]
pub struct SubmitScoreRequest {
    pub username: Option<String>,
    pub score: Option<ScoreInput>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitScoreResponse {
    pub success: bool,
    pub id: Uuid,
    pub message: String,
    pub total_score: i64,
}

/// Raw `?page=&limit=` values; parsed and bounded by the handler.
#[derive(Debug, Default, Deserialize)]
pub struct ScoreListQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedScore {
    pub rank: usize,
    pub username: String,
    pub score: i64,
    pub date: DateTime<Utc>,
    pub id: Uuid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub page: usize,
    pub limit: usize,
    pub pages: usize,
}

#[derive(Debug, Serialize)]
pub struct ScoreListResponse {
    pub success: bool,
    pub scores: Vec<RankedScore>,
    pub total: usize,
    pub pagination: Pagination,
}

#[derive(Debug, Default, Deserialize)]
pub struct DeleteScoreRequest {
    pub username: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

// -- Errors --

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}
