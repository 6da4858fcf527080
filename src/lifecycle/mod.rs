//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Open token store → Bind listener → Serve
//!
//! Shutdown:
//!     Signal or Shutdown::trigger → stop accepting → drain in-flight requests
//! ```

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
