use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Cumulative score for one username. `date` is the time of the last submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub id: Uuid,
    pub username: String,
    pub score: i64,
    pub date: DateTime<Utc>,
}
