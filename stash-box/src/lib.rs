//! # Stash-box registry integration
//!
//! Client and identification pipeline for stash-box metadata registries:
//! - Fingerprint-based scene identification with per-input fan-in
//! - Performer search and lookup
//! - Fingerprint and draft submission
//!
//! One [`StashBox`] instance is bound to one registry endpoint and one
//! local store. Every public operation takes a cancellation token that is
//! honoured on each remote round trip, owns its own read-transaction scope,
//! and either returns a complete result or a single error. The one
//! documented exception is fingerprint submission, which is at-least-once.

pub mod client;
pub mod draft;
pub mod error;
pub mod graphql;
pub mod identify;
pub mod matcher;
mod scrape;

pub use client::{StashBox, FINGERPRINT_CHUNK_SIZE};
pub use error::{Result, StashBoxError};
