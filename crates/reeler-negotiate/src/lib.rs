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

//! Platform negotiation: authenticated site client, page parameter parsing,
//! and the push-protocol handshake that yields capture descriptors.
//!
//! Layout: `site.rs` (HTTP session, login, online listing), `parse.rs`
//! (typed extraction of negotiation parameters from target pages),
//! `handshake.rs` (websocket frame exchange), `negotiator.rs` and
//! `resolver.rs` (the seam implementations handed to the supervisor).

use std::time::Duration;

pub mod error;
pub mod handshake;
pub mod negotiator;
pub mod parse;
pub mod resolver;
pub mod site;

pub use error::{NegotiateError, NegotiateResult};
pub use negotiator::PushNegotiator;
pub use resolver::SiteResolver;
pub use site::SiteClient;

/// Hard cap on one negotiation or listing exchange. A stuck target fails
/// instead of stalling the reconcile pass.
pub const NEGOTIATION_TIMEOUT: Duration = Duration::from_secs(15);
