//! Admission policy for frp lifecycle events.
//!
//! # Evaluation Order
//!
//! 1. User must exist and be enabled (every event)
//! 2. Login: meta token must match exactly
//! 3. NewProxy: remote port (tcp, udp), custom domains (http, https,
//!    tcpmux) and subdomain (http, https) against the user's allow-lists
//!
//! An empty allow-list or an empty request value passes its check.
//! Evaluation only takes the store's read lock and never mutates it.

use std::fmt;
use std::sync::Arc;

use crate::acl::{AclStore, UserRecord};

/// Outcome of a policy check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    pub fn is_allow(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

/// Why a request was denied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DenyReason {
    /// Login failed. Deliberately does not say which part was wrong.
    InvalidCredentials,
    UnknownUser(String),
    UserDisabled(String),
    PortNotAllowed { user: String, port: u16 },
    DomainNotAllowed { user: String, domains: Vec<String> },
    SubdomainNotAllowed { user: String, subdomain: String },
}

impl DenyReason {
    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            DenyReason::InvalidCredentials => "invalid_credentials",
            DenyReason::UnknownUser(_) => "unknown_user",
            DenyReason::UserDisabled(_) => "user_disabled",
            DenyReason::PortNotAllowed { .. } => "port_not_allowed",
            DenyReason::DomainNotAllowed { .. } => "domain_not_allowed",
            DenyReason::SubdomainNotAllowed { .. } => "subdomain_not_allowed",
        }
    }
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DenyReason::InvalidCredentials => write!(f, "invalid user or meta token"),
            DenyReason::UnknownUser(user) => write!(f, "user [{}] not exist", user),
            DenyReason::UserDisabled(user) => write!(f, "user [{}] is disabled", user),
            DenyReason::PortNotAllowed { user, port } => {
                write!(f, "user [{}] port [{}] is not allowed", user, port)
            }
            DenyReason::DomainNotAllowed { user, domains } => {
                write!(f, "user [{}] domain [{}] is not allowed", user, domains.join(","))
            }
            DenyReason::SubdomainNotAllowed { user, subdomain } => {
                write!(f, "user [{}] subdomain [{}] is not allowed", user, subdomain)
            }
        }
    }
}

/// The parts of a proxy registration that the allow-lists restrict.
#[derive(Debug, Clone, Default)]
pub struct ProxyRequest<'a> {
    pub user: &'a str,
    pub proxy_type: &'a str,
    /// `0` means frps picks the port.
    pub remote_port: u16,
    pub custom_domains: &'a [String],
    pub subdomain: &'a str,
}

fn checks_port(proxy_type: &str) -> bool {
    matches!(proxy_type, "tcp" | "udp")
}

fn checks_domains(proxy_type: &str) -> bool {
    matches!(proxy_type, "http" | "https" | "tcpmux")
}

fn checks_subdomain(proxy_type: &str) -> bool {
    matches!(proxy_type, "http" | "https")
}

/// Evaluates lifecycle events against the token store.
#[derive(Clone)]
pub struct PolicyEvaluator {
    store: Arc<AclStore>,
}

impl PolicyEvaluator {
    pub fn new(store: Arc<AclStore>) -> Self {
        Self { store }
    }

    /// Allow iff the user exists, is enabled and the token matches exactly.
    pub fn login(&self, user: &str, token: &str) -> Decision {
        self.store.with_user(user, |record| match record {
            Some(r) if r.enabled && !token.is_empty() && r.token == token => Decision::Allow,
            _ => Decision::Deny(DenyReason::InvalidCredentials),
        })
    }

    pub fn new_proxy(&self, request: &ProxyRequest<'_>) -> Decision {
        self.store.with_user(request.user, |record| {
            let record = match active(request.user, record) {
                Ok(r) => r,
                Err(reason) => return Decision::Deny(reason),
            };
            match check_proxy(record, request) {
                Ok(()) => Decision::Allow,
                Err(reason) => Decision::Deny(reason),
            }
        })
    }

    pub fn ping(&self, user: &str) -> Decision {
        self.enabled_user(user)
    }

    /// Only re-checks status; ports and domains were checked at registration.
    pub fn new_work_conn(&self, user: &str) -> Decision {
        self.enabled_user(user)
    }

    /// Only re-checks status; ports and domains were checked at registration.
    pub fn new_user_conn(&self, user: &str) -> Decision {
        self.enabled_user(user)
    }

    fn enabled_user(&self, user: &str) -> Decision {
        self.store.with_user(user, |record| match active(user, record) {
            Ok(_) => Decision::Allow,
            Err(reason) => Decision::Deny(reason),
        })
    }
}

fn active<'r>(user: &str, record: Option<&'r UserRecord>) -> Result<&'r UserRecord, DenyReason> {
    match record {
        None => Err(DenyReason::UnknownUser(user.to_string())),
        Some(r) if !r.enabled => Err(DenyReason::UserDisabled(user.to_string())),
        Some(r) => Ok(r),
    }
}

fn check_proxy(record: &UserRecord, request: &ProxyRequest<'_>) -> Result<(), DenyReason> {
    let kind = request.proxy_type;

    if checks_port(kind)
        && request.remote_port != 0
        && !record.ports.is_unrestricted()
        && !record.ports.permits_port(request.remote_port)
    {
        return Err(DenyReason::PortNotAllowed {
            user: record.user.clone(),
            port: request.remote_port,
        });
    }

    if checks_domains(kind) && !record.domains.is_unrestricted() {
        let rejected: Vec<String> = request
            .custom_domains
            .iter()
            .filter(|d| !d.is_empty() && !record.domains.contains(d))
            .cloned()
            .collect();
        if !rejected.is_empty() {
            return Err(DenyReason::DomainNotAllowed {
                user: record.user.clone(),
                domains: rejected,
            });
        }
    }

    if checks_subdomain(kind)
        && !request.subdomain.is_empty()
        && !record.subdomains.is_unrestricted()
        && !record.subdomains.contains(request.subdomain)
    {
        return Err(DenyReason::SubdomainNotAllowed {
            user: record.user.clone(),
            subdomain: request.subdomain.to_string(),
        });
    }

    Ok(())
}
