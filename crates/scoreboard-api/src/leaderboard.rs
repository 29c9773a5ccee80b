//! Ranking and pagination of score entries.

use std::cmp::Ordering;

use scoreboard_types::api::{Pagination, RankedScore, ScoreListQuery, ScoreListResponse};
use scoreboard_types::models::ScoreEntry;

use crate::error::ApiError;

pub const DEFAULT_PAGE: usize = 1;
pub const DEFAULT_LIMIT: usize = 10;
pub const MAX_LIMIT: usize = 100;

/// A validated `?page=&limit=` pair. `page` is 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: usize,
    pub limit: usize,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl PageRequest {
    pub fn new(page: usize, limit: usize) -> Result<Self, ApiError> {
        if page == 0 {
            return Err(ApiError::validation("page must be at least 1"));
        }
        if !(1..=MAX_LIMIT).contains(&limit) {
            return Err(ApiError::validation(format!(
                "limit must be between 1 and {MAX_LIMIT}"
            )));
        }
        Ok(Self { page, limit })
    }

    /// Absent or empty values fall back to the defaults; anything else must
    /// be an integer in range.
    pub fn from_query(query: &ScoreListQuery) -> Result<Self, ApiError> {
        let page = parse_param("page", query.page.as_deref(), DEFAULT_PAGE)?;
        let limit = parse_param("limit", query.limit.as_deref(), DEFAULT_LIMIT)?;
        Self::new(page, limit)
    }

    pub fn offset(&self) -> usize {
        (self.page - 1).saturating_mul(self.limit)
    }
}

fn parse_param(name: &str, raw: Option<&str>, default: usize) -> Result<usize, ApiError> {
    let raw = match raw.map(str::trim) {
        None | Some("") => return Ok(default),
        Some(raw) => raw,
    };

    let value: i64 = raw
        .parse()
        .map_err(|_| ApiError::validation(format!("{name} must be an integer")))?;

    usize::try_from(value).map_err(|_| ApiError::validation(format!("{name} must be at least 1")))
}

/// Best first: higher score, then more recent date. Id breaks exact ties so
/// the order is stable across requests.
fn compare(a: &ScoreEntry, b: &ScoreEntry) -> Ordering {
    b.score
        .cmp(&a.score)
        .then_with(|| b.date.cmp(&a.date))
        .then_with(|| a.id.cmp(&b.id))
}

/// Sort the full set and number it from 1.
pub fn rank(mut entries: Vec<ScoreEntry>) -> Vec<RankedScore> {
    entries.sort_by(compare);
    entries
        .into_iter()
        .enumerate()
        .map(|(i, e)| RankedScore {
            rank: i + 1,
            username: e.username,
            score: e.score,
            date: e.date,
            id: e.id,
        })
        .collect()
}

pub fn page_count(total: usize, limit: usize) -> usize {
    total.div_ceil(limit)
}

/// Rank every entry, then cut out the requested window.
pub fn build(entries: Vec<ScoreEntry>, page: PageRequest) -> ScoreListResponse {
    let total = entries.len();
    let scores = rank(entries)
        .into_iter()
        .skip(page.offset())
        .take(page.limit)
        .collect();

    ScoreListResponse {
        success: true,
        scores,
        total,
        pagination: Pagination {
            page: page.page,
            limit: page.limit,
            pages: page_count(total, page.limit),
        },
    }
}
