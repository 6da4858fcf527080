//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → POST /handler → plugin::handler
//!     → admin routes  → admin::handlers (behind admin::auth)
//! ```

pub mod server;

pub use server::{build_router, AppState, HttpServer};
