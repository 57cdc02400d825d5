//! Remote-sourced entity models
//!
//! Values of these types are produced by querying a stash-box registry.
//! After matching, a scraped entity may additionally carry the id of the
//! local record it resolved to (`stored_id`).

use serde::{Deserialize, Serialize};

/// A fingerprint as reported by a remote registry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StashBoxFingerprint {
    pub algorithm: String,
    pub hash: String,
    /// Duration in seconds of the file the fingerprint was taken from
    pub duration: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScrapedScene {
    pub title: Option<String>,
    pub details: Option<String>,
    pub url: Option<String>,
    /// `YYYY-MM-DD`
    pub date: Option<String>,
    /// Base64 data URI of the first remote image
    pub image: Option<String>,
    /// Duration in seconds
    pub duration: Option<i64>,
    /// The remote registry's stable id for this scene
    pub remote_site_id: Option<String>,
    pub fingerprints: Vec<StashBoxFingerprint>,
    pub studio: Option<ScrapedStudio>,
    pub performers: Vec<ScrapedPerformer>,
    pub tags: Vec<ScrapedTag>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScrapedStudio {
    /// Local studio id, populated by matching
    pub stored_id: Option<i64>,
    pub name: String,
    pub url: Option<String>,
    pub remote_site_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScrapedPerformer {
    /// Local performer id, populated by matching
    pub stored_id: Option<i64>,
    pub name: Option<String>,
    pub gender: Option<String>,
    pub url: Option<String>,
    pub twitter: Option<String>,
    pub birthdate: Option<String>,
    pub ethnicity: Option<String>,
    pub country: Option<String>,
    pub eye_color: Option<String>,
    pub hair_color: Option<String>,
    pub height: Option<String>,
    pub measurements: Option<String>,
    pub fake_tits: Option<String>,
    pub career_length: Option<String>,
    pub tattoos: Option<String>,
    pub piercings: Option<String>,
    pub aliases: Option<String>,
    pub remote_site_id: Option<String>,
    pub images: Vec<String>,
    /// Deprecated single-image field, kept for callers that predate
    /// `images`; holds the first image when any exist.
    pub image: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScrapedTag {
    /// Local tag id, populated by matching
    pub stored_id: Option<i64>,
    pub name: String,
}

/// One performer query and the remote results it produced
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformerQueryResult {
    /// The query key: a search term, or the decimal id of the local
    /// performer whose name was searched
    pub query: String,
    pub results: Vec<ScrapedPerformer>,
}
