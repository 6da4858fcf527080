//! User records and allow-lists.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An ordered, duplicate-free allow-list. Empty means unrestricted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AllowList(Vec<String>);

impl AllowList {
    /// Build from the comma-separated wire form.
    ///
    /// All whitespace is removed first, then empty segments and repeats
    /// are dropped.
    pub fn parse(raw: &str) -> Self {
        let compact = strip_whitespace(raw);
        let mut items: Vec<String> = Vec::new();
        for part in compact.split(',') {
            if !part.is_empty() && !items.iter().any(|i| i == part) {
                items.push(part.to_string());
            }
        }
        Self(items)
    }

    pub fn is_unrestricted(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, value: &str) -> bool {
        self.0.iter().any(|i| i == value)
    }

    /// Port membership; entries may be single ports or `low-high` ranges.
    pub fn permits_port(&self, port: u16) -> bool {
        self.0.iter().any(|entry| match entry.split_once('-') {
            Some((low, high)) => match (low.parse::<u16>(), high.parse::<u16>()) {
                (Ok(low), Ok(high)) => (low..=high).contains(&port),
                _ => false,
            },
            None => entry.parse::<u16>().map(|p| p == port).unwrap_or(false),
        })
    }

    pub fn items(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for AllowList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(","))
    }
}

/// One user's credentials and restrictions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub user: String,
    pub token: String,
    pub comment: String,
    pub ports: AllowList,
    pub domains: AllowList,
    pub subdomains: AllowList,
    pub enabled: bool,
}

impl UserRecord {
    /// Wire representation used by the admin API.
    pub fn to_form(&self) -> UserForm {
        UserForm {
            user: self.user.clone(),
            token: self.token.clone(),
            comment: self.comment.clone(),
            ports: self.ports.to_string(),
            domains: self.domains.to_string(),
            subdomains: self.subdomains.to_string(),
            status: self.enabled,
        }
    }
}

/// A user as it travels over the admin API: lists are comma-joined strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserForm {
    pub user: String,
    pub token: String,
    pub comment: String,
    pub ports: String,
    pub domains: String,
    pub subdomains: String,
    pub status: bool,
}

/// Remove every whitespace character.
pub fn strip_whitespace(raw: &str) -> String {
    raw.chars().filter(|c| !c.is_whitespace()).collect()
}

/// Remove line breaks and tabs, keeping ordinary spaces.
pub fn strip_line_breaks(raw: &str) -> String {
    raw.chars().filter(|c| !matches!(c, '\n' | '\r' | '\t')).collect()
}
