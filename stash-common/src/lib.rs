//! # Stash Common Library
//!
//! Shared code for the stash media library crates:
//! - Local entity models and their scraped counterparts
//! - Content fingerprint codec and perceptual similarity
//! - Read-transactional store access
//! - Configuration loading

pub mod config;
pub mod db;
pub mod error;
pub mod fingerprint;
pub mod models;

pub use error::{Error, Result};
