//! Per-user token and allow-list management.
//!
//! # Data Flow
//! ```text
//! storage::SectionStore (tokens.ini)
//!     → store.rs (hydrate index, serialize on commit)
//!     → record.rs (UserRecord, AllowList normalization)
//!     → query.rs (filter + paginate for the admin listing)
//!
//! Readers:  plugin::policy (read lock)
//! Writers:  admin handlers (write lock held across the save)
//! ```
//!
//! # Design Decisions
//! - Allow-lists live on the record itself; there are no parallel maps to drift
//! - An empty allow-list means unrestricted, never deny-all
//! - Identifiers are case-sensitive and immutable after creation

pub mod error;
pub mod query;
pub mod record;
pub mod store;

pub use error::{AclError, AclResult, OperationCode};
pub use query::{QueryPage, UserFilter};
pub use record::{AllowList, UserForm, UserRecord};
pub use store::AclStore;
