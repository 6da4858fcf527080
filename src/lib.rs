//! frps multi-user admission plugin.
//!
//! Decides whether frp clients may log in, register proxies and open
//! connections, based on a per-user token and port/domain/subdomain
//! allow-lists kept in an INI token file, and exposes an admin API to
//! manage those users.

pub mod acl;
pub mod admin;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod plugin;
pub mod storage;

pub use acl::AclStore;
pub use config::PluginConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
