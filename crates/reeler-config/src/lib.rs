#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]

//! File-backed configuration for the Reeler daemon.
//!
//! Layout: `model.rs` (typed config models), `loader.rs` (YAML file loading
//! and default resolution), `validate.rs` (validation helpers), `defaults.rs`
//! (fallback values).

pub mod defaults;
pub mod error;
pub mod loader;
pub mod model;
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use loader::{from_yaml, load};
pub use model::{AppConfig, Credentials, TargetAllowList};
