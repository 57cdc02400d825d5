//! Entity models
//!
//! Local entities live in the SQLite store and are only read by this crate;
//! scraped entities are their remote-sourced counterparts, created per call
//! and consumed by the caller.

pub mod local;
pub mod scraped;

pub use local::{Gender, Performer, Scene, StashId, Studio, Tag};
pub use scraped::{
    PerformerQueryResult, ScrapedPerformer, ScrapedScene, ScrapedStudio, ScrapedTag,
    StashBoxFingerprint,
};
