//! # seishdr common
//!
//! Foundational pieces shared by every seishdr crate.
//!
//! ## Modules
//!
//! - [`error`] - Severity classification implemented by each crate's error enum
//! - [`logging`] - `tracing` subscriber setup and log formatting helpers
//!
//! The library crates only emit `tracing` events; installing a subscriber is
//! left to the embedding application (or to tests via [`init_test_tracing`]).

pub mod error;
pub mod logging;

pub use error::{ErrorSeverity, Severity};
pub use logging::{init_test_tracing, init_tracing, Pretty};
