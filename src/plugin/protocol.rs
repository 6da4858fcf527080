//! Wire types of the frp server plugin protocol (v0.1.0).
//!
//! frps posts `{"version", "op", "content"}` and expects
//! `{"reject", "reject_reason", "unchange", "content"}` back. Go serializes
//! nil slices and maps as `null`, so collection fields accept `null`.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

use crate::plugin::PluginError;

/// Outer request envelope. `content` stays opaque until the op is known.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Request {
    #[serde(default)]
    pub version: String,
    pub op: String,
    #[serde(default)]
    pub content: Value,
}

/// Plugin response envelope.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Response {
    pub reject: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub reject_reason: String,
    #[serde(default)]
    pub unchange: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Value>,
}

impl Response {
    /// Accept without modifying the content.
    pub fn allow() -> Self {
        Self {
            reject: false,
            reject_reason: String::new(),
            unchange: true,
            content: None,
        }
    }

    pub fn reject(reason: impl Into<String>) -> Self {
        Self {
            reject: true,
            reject_reason: reason.into(),
            unchange: true,
            content: None,
        }
    }
}

/// Operation tag of an incoming request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Login,
    NewProxy,
    Ping,
    NewWorkConn,
    NewUserConn,
    Unknown(String),
}

impl From<&str> for Operation {
    fn from(op: &str) -> Self {
        match op {
            "Login" => Operation::Login,
            "NewProxy" => Operation::NewProxy,
            "Ping" => Operation::Ping,
            "NewWorkConn" => Operation::NewWorkConn,
            "NewUserConn" => Operation::NewUserConn,
            other => Operation::Unknown(other.to_string()),
        }
    }
}

impl Operation {
    /// Bounded label for metrics: every unrecognized tag shares one value.
    pub fn metric_label(&self) -> &'static str {
        match self {
            Operation::Login => "Login",
            Operation::NewProxy => "NewProxy",
            Operation::Ping => "Ping",
            Operation::NewWorkConn => "NewWorkConn",
            Operation::NewUserConn => "NewUserConn",
            Operation::Unknown(_) => "unknown",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Unknown(op) => op.as_str(),
            known => known.metric_label(),
        };
        f.write_str(name)
    }
}

fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Identity of the frpc session attached to most events.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct UserInfo {
    pub user: String,
    #[serde(deserialize_with = "null_default")]
    pub metas: HashMap<String, String>,
    pub run_id: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct LoginContent {
    pub version: String,
    pub hostname: String,
    pub os: String,
    pub arch: String,
    pub user: String,
    pub timestamp: i64,
    pub privilege_key: String,
    pub run_id: String,
    pub pool_count: i64,
    #[serde(deserialize_with = "null_default")]
    pub metas: HashMap<String, String>,
    pub client_address: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct NewProxyContent {
    pub user: UserInfo,
    pub proxy_name: String,
    pub proxy_type: String,
    pub use_encryption: bool,
    pub use_compression: bool,
    pub bandwidth_limit: String,
    pub bandwidth_limit_mode: String,
    pub group: String,
    pub group_key: String,

    // tcp | udp
    pub remote_port: u16,

    // http | https | tcpmux
    #[serde(deserialize_with = "null_default")]
    pub custom_domains: Vec<String>,
    pub subdomain: String,
    #[serde(deserialize_with = "null_default")]
    pub locations: Vec<String>,
    pub http_user: String,
    pub http_pwd: String,
    pub host_header_rewrite: String,
    #[serde(deserialize_with = "null_default")]
    pub headers: HashMap<String, String>,
    pub multiplexer: String,

    // stcp | sudp | xtcp
    pub sk: String,

    #[serde(deserialize_with = "null_default")]
    pub metas: HashMap<String, String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct PingContent {
    pub user: UserInfo,
    pub timestamp: i64,
    pub privilege_key: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct NewWorkConnContent {
    pub user: UserInfo,
    pub run_id: String,
    pub timestamp: i64,
    pub privilege_key: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct NewUserConnContent {
    pub user: UserInfo,
    pub proxy_name: String,
    pub proxy_type: String,
    pub remote_addr: String,
}

/// A decoded lifecycle event.
#[derive(Debug, Clone)]
pub enum LifecycleEvent {
    Login(LoginContent),
    NewProxy(NewProxyContent),
    Ping(PingContent),
    NewWorkConn(NewWorkConnContent),
    NewUserConn(NewUserConnContent),
}

impl LifecycleEvent {
    /// Decode `content` into the payload type that belongs to `op`.
    pub fn decode(op: &Operation, content: Value) -> Result<Self, PluginError> {
        let event = match op {
            Operation::Login => LifecycleEvent::Login(typed(op, content)?),
            Operation::NewProxy => LifecycleEvent::NewProxy(typed(op, content)?),
            Operation::Ping => LifecycleEvent::Ping(typed(op, content)?),
            Operation::NewWorkConn => LifecycleEvent::NewWorkConn(typed(op, content)?),
            Operation::NewUserConn => LifecycleEvent::NewUserConn(typed(op, content)?),
            Operation::Unknown(name) => return Err(PluginError::Unsupported(name.clone())),
        };
        Ok(event)
    }

    /// User the event belongs to.
    pub fn user(&self) -> &str {
        match self {
            LifecycleEvent::Login(c) => &c.user,
            LifecycleEvent::NewProxy(c) => &c.user.user,
            LifecycleEvent::Ping(c) => &c.user.user,
            LifecycleEvent::NewWorkConn(c) => &c.user.user,
            LifecycleEvent::NewUserConn(c) => &c.user.user,
        }
    }
}

fn typed<T: serde::de::DeserializeOwned>(op: &Operation, content: Value) -> Result<T, PluginError> {
    serde_json::from_value(content)
        .map_err(|e| PluginError::Malformed(format!("invalid {} content: {}", op, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_operation_tags_are_case_sensitive() {
        assert_eq!(Operation::from("NewProxy"), Operation::NewProxy);
        assert_eq!(Operation::from("newproxy"), Operation::Unknown("newproxy".into()));
        assert_eq!(Operation::from("CloseProxy").to_string(), "CloseProxy");
        assert_eq!(Operation::from("CloseProxy").metric_label(), "unknown");
        assert_eq!(Operation::NewWorkConn.to_string(), "NewWorkConn");
    }

    #[test]
    fn test_decode_new_proxy_with_go_nulls() {
        let content = json!({
            "user": {"user": "alice", "metas": null, "run_id": "r1"},
            "proxy_name": "web",
            "proxy_type": "http",
            "custom_domains": null,
            "subdomain": "blog",
            "headers": null
        });
        let event = LifecycleEvent::decode(&Operation::NewProxy, content).unwrap();
        let LifecycleEvent::NewProxy(c) = event else {
            panic!("expected NewProxy");
        };
        assert_eq!(c.user.user, "alice");
        assert!(c.custom_domains.is_empty());
        assert_eq!(c.remote_port, 0);
        assert_eq!(c.subdomain, "blog");
    }

    #[test]
    fn test_decode_type_mismatch_is_malformed() {
        let err = LifecycleEvent::decode(&Operation::NewProxy, json!({"remote_port": "http"})).unwrap_err();
        assert!(matches!(err, PluginError::Malformed(_)));

        let err = LifecycleEvent::decode(&Operation::Login, json!(["not", "an", "object"])).unwrap_err();
        assert!(matches!(err, PluginError::Malformed(_)));
    }

    #[test]
    fn test_decode_unknown_op() {
        let err = LifecycleEvent::decode(&Operation::from("CloseProxy"), json!({})).unwrap_err();
        assert!(matches!(err, PluginError::Unsupported(op) if op == "CloseProxy"));
    }

    #[test]
    fn test_response_shape() {
        let allow = serde_json::to_value(Response::allow()).unwrap();
        assert_eq!(allow, json!({"reject": false, "unchange": true}));

        let deny = serde_json::to_value(Response::reject("nope")).unwrap();
        assert_eq!(deny, json!({"reject": true, "reject_reason": "nope", "unchange": true}));
    }
}
