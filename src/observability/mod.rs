//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! plugin dispatcher / admin handlers / token store
//!     → logging.rs (structured tracing events)
//!     → metrics.rs (decision and mutation counters, user gauge)
//!
//! Consumers:
//!     → stdout (tracing fmt layer)
//!     → Prometheus scrape endpoint (optional)
//! ```

pub mod logging;
pub mod metrics;
