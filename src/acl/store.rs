//! The token store: in-memory user index mirrored onto a section file.
//!
//! # Concurrency
//! One `RwLock` covers the whole index. Policy checks and listings take the
//! read side; every mutation holds the write side across the durable save,
//! so two writers never interleave and readers never see a half-applied
//! update.
//!
//! # Commit Protocol
//! Mutations run against a staged copy of the index. The copy is rendered to
//! a full `SectionDocument` and saved; only a successful save swaps the copy
//! in. A failed save leaves both memory and disk as they were.

use parking_lot::RwLock;
use std::collections::BTreeMap;

use crate::acl::error::{AclError, AclResult};
use crate::acl::query::{self, QueryPage, UserFilter};
use crate::acl::record::{strip_line_breaks, AllowList, UserForm, UserRecord};
use crate::observability::metrics;
use crate::storage::{SectionDocument, SectionStore, StorageError};

pub const USERS_SECTION: &str = "users";
pub const PORTS_SECTION: &str = "ports";
pub const DOMAINS_SECTION: &str = "domains";
pub const SUBDOMAINS_SECTION: &str = "subdomains";
pub const DISABLED_SECTION: &str = "disabled";

const DISABLED_MARKER: &str = "disable";

type UserIndex = BTreeMap<String, UserRecord>;

/// Thread-safe token store backed by a [`SectionStore`].
pub struct AclStore {
    users: RwLock<UserIndex>,
    backend: Box<dyn SectionStore>,
}

impl AclStore {
    /// Load the index from `backend`.
    pub fn open(backend: Box<dyn SectionStore>) -> Result<Self, StorageError> {
        let doc = backend.load()?;
        let users = hydrate(&doc);
        tracing::info!(
            source = %backend.describe(),
            users = users.len(),
            "Loaded token store"
        );
        metrics::record_user_count(users.len());
        Ok(Self {
            users: RwLock::new(users),
            backend,
        })
    }

    pub fn get(&self, user: &str) -> Option<UserRecord> {
        self.users.read().get(user).cloned()
    }

    pub fn len(&self) -> usize {
        self.users.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.read().is_empty()
    }

    /// Run `f` against the live record without cloning it.
    pub fn with_user<T>(&self, user: &str, f: impl FnOnce(Option<&UserRecord>) -> T) -> T {
        let guard = self.users.read();
        f(guard.get(user))
    }

    /// Filtered, paginated listing sorted by user identifier.
    pub fn list(&self, filter: &UserFilter, page: i64, limit: i64) -> QueryPage {
        let guard = self.users.read();
        query::list(guard.values(), filter, page, limit)
    }

    /// Create a new, enabled user.
    pub fn add(&self, form: &UserForm) -> AclResult<()> {
        let user = form.user.trim();
        if user.is_empty() {
            return Err(AclError::UserEmpty);
        }
        validate_user(user)?;

        self.commit(|users| {
            if users.contains_key(user) {
                return Err(AclError::UserExists(user.to_string()));
            }
            let token = checked_token(user, &form.token)?;
            users.insert(
                user.to_string(),
                UserRecord {
                    user: user.to_string(),
                    token,
                    comment: strip_line_breaks(&form.comment),
                    ports: AllowList::parse(&form.ports),
                    domains: AllowList::parse(&form.domains),
                    subdomains: AllowList::parse(&form.subdomains),
                    enabled: true,
                },
            );
            Ok(())
        })
    }

    /// Replace token, comment and allow-lists of an existing user.
    ///
    /// Allow-lists are only touched when `before` and `after` differ, so an
    /// editor that did not change a field never overwrites it.
    pub fn update(&self, before: &UserForm, after: &UserForm) -> AclResult<()> {
        let user = before.user.as_str();
        if user.trim().is_empty() {
            return Err(AclError::UserEmpty);
        }
        if !after.user.is_empty() && after.user != before.user {
            return Err(AclError::IdentifierChanged {
                before: before.user.clone(),
                after: after.user.clone(),
            });
        }

        self.commit(|users| {
            let record = users
                .get_mut(user)
                .ok_or_else(|| AclError::UserNotFound(user.to_string()))?;

            record.token = checked_token(user, &after.token)?;
            record.comment = strip_line_breaks(&after.comment);
            if before.ports != after.ports {
                record.ports = AllowList::parse(&after.ports);
            }
            if before.domains != after.domains {
                record.domains = AllowList::parse(&after.domains);
            }
            if before.subdomains != after.subdomains {
                record.subdomains = AllowList::parse(&after.subdomains);
            }
            Ok(())
        })
    }

    /// Delete users. Unknown identifiers are ignored, so an empty selection
    /// is a successful save of the unchanged index.
    pub fn remove(&self, users: &[String]) -> AclResult<()> {
        self.commit(|index| {
            for user in users {
                index.remove(user);
            }
            Ok(())
        })
    }

    /// Flip the enabled flag on every listed user.
    pub fn set_enabled(&self, users: &[String], enabled: bool) -> AclResult<()> {
        if users.is_empty() {
            return Err(AclError::EmptySelection);
        }
        self.commit(|index| {
            for user in users {
                let record = index
                    .get_mut(user)
                    .ok_or_else(|| AclError::UserNotFound(user.clone()))?;
                record.enabled = enabled;
            }
            Ok(())
        })
    }

    /// Render the current index as it would be persisted.
    pub fn document(&self) -> SectionDocument {
        render(&self.users.read())
    }

    fn commit<F>(&self, mutate: F) -> AclResult<()>
    where
        F: FnOnce(&mut UserIndex) -> AclResult<()>,
    {
        let mut guard = self.users.write();
        let mut staged = guard.clone();
        mutate(&mut staged)?;

        self.backend.save(&render(&staged))?;

        *guard = staged;
        metrics::record_user_count(guard.len());
        Ok(())
    }
}

fn validate_user(user: &str) -> AclResult<()> {
    let bad = user
        .chars()
        .any(|c| c.is_whitespace() || c.is_control() || matches!(c, '=' | '[' | ']'))
        || user.starts_with(';')
        || user.starts_with('#');
    if bad {
        return Err(AclError::InvalidUser(user.to_string()));
    }
    Ok(())
}

fn checked_token(user: &str, token: &str) -> AclResult<String> {
    let token = token.trim();
    if token.is_empty() {
        return Err(AclError::TokenEmpty);
    }
    if token.chars().any(char::is_whitespace) {
        return Err(AclError::InvalidToken(user.to_string()));
    }
    Ok(token.to_string())
}

fn hydrate(doc: &SectionDocument) -> UserIndex {
    let mut users = UserIndex::new();

    if let Some(section) = doc.get_section(USERS_SECTION) {
        for (user, entry) in section.iter() {
            users.insert(
                user.clone(),
                UserRecord {
                    user: user.clone(),
                    token: entry.value.clone(),
                    comment: entry.comment.clone().unwrap_or_default(),
                    ports: AllowList::default(),
                    domains: AllowList::default(),
                    subdomains: AllowList::default(),
                    enabled: true,
                },
            );
        }
    }

    for name in [PORTS_SECTION, DOMAINS_SECTION, SUBDOMAINS_SECTION] {
        let Some(section) = doc.get_section(name) else {
            continue;
        };
        for (user, entry) in section.iter() {
            let Some(record) = users.get_mut(user) else {
                tracing::warn!(section = name, user = %user, "Dropping entry for unknown user");
                continue;
            };
            let list = AllowList::parse(&entry.value);
            match name {
                PORTS_SECTION => record.ports = list,
                DOMAINS_SECTION => record.domains = list,
                _ => record.subdomains = list,
            }
        }
    }

    if let Some(section) = doc.get_section(DISABLED_SECTION) {
        for (user, _) in section.iter() {
            match users.get_mut(user) {
                Some(record) => record.enabled = false,
                None => tracing::warn!(section = DISABLED_SECTION, user = %user, "Dropping entry for unknown user"),
            }
        }
    }

    users
}

fn render(users: &UserIndex) -> SectionDocument {
    let mut doc = SectionDocument::new();
    for name in [
        USERS_SECTION,
        PORTS_SECTION,
        DOMAINS_SECTION,
        SUBDOMAINS_SECTION,
        DISABLED_SECTION,
    ] {
        doc.section_mut(name);
    }

    for record in users.values() {
        let comment = Some(record.comment.clone()).filter(|c| !c.is_empty());
        doc.set(USERS_SECTION, &record.user, &record.token, comment);

        for (section, list, what) in [
            (PORTS_SECTION, &record.ports, "ports"),
            (DOMAINS_SECTION, &record.domains, "domains"),
            (SUBDOMAINS_SECTION, &record.subdomains, "subdomains"),
        ] {
            if !list.is_unrestricted() {
                doc.set(
                    section,
                    &record.user,
                    list.to_string(),
                    Some(format!("user {} allowed {}", record.user, what)),
                );
            }
        }

        if !record.enabled {
            doc.set(
                DISABLED_SECTION,
                &record.user,
                DISABLED_MARKER,
                Some(format!("disable user '{}'", record.user)),
            );
        }
    }
    doc
}
