//! Filtered, paginated listing of user records.
//!
//! # Design Decisions
//! - Candidates are sorted by user identifier (byte order), never by
//!   insertion order
//! - Filter fields are whitespace-stripped, case-sensitive substrings
//! - `limit <= 0` disables pagination; pages are 1-indexed
//! - Out-of-range pages yield an empty slice, never an error

use serde::Deserialize;

use crate::acl::record::{strip_whitespace, UserRecord};

/// Substring filter over user, token and comment.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UserFilter {
    pub user: String,
    pub token: String,
    pub comment: String,
}

impl UserFilter {
    pub fn matches(&self, record: &UserRecord) -> bool {
        contains_stripped(&record.user, &self.user)
            && contains_stripped(&record.token, &self.token)
            && contains_stripped(&record.comment, &self.comment)
    }
}

fn contains_stripped(haystack: &str, needle: &str) -> bool {
    let needle = strip_whitespace(needle);
    needle.is_empty() || haystack.contains(&needle)
}

/// One page of results plus the unpaginated match count.
#[derive(Debug, Clone, Default)]
pub struct QueryPage {
    pub results: Vec<UserRecord>,
    pub total: usize,
}

/// Filter and paginate `records`.
pub fn list<'a, I>(records: I, filter: &UserFilter, page: i64, limit: i64) -> QueryPage
where
    I: IntoIterator<Item = &'a UserRecord>,
{
    let mut matched: Vec<&UserRecord> = records.into_iter().filter(|r| filter.matches(r)).collect();
    matched.sort_by(|a, b| a.user.cmp(&b.user));

    let total = matched.len();
    let (start, end) = page_bounds(page, limit, total);

    QueryPage {
        results: matched[start..end].iter().map(|r| (*r).clone()).collect(),
        total,
    }
}

fn page_bounds(page: i64, limit: i64, total: usize) -> (usize, usize) {
    if limit <= 0 {
        return (0, total);
    }
    let total_i = total as i64;
    let end = page.saturating_mul(limit).clamp(0, total_i);
    let start = page
        .saturating_sub(1)
        .saturating_mul(limit)
        .clamp(0, total_i)
        .min(end);
    (start as usize, end as usize)
}
