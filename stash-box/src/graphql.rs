//! Stash-box GraphQL wire types and documents
//!
//! Remote payloads are decoded into the typed fragments below at the
//! response boundary; a response that does not fit the schema fails there
//! rather than deep in the pipeline.

use serde::{Deserialize, Serialize};
use stash_common::fingerprint::FingerprintAlgorithm;

// ---------------------------------------------------------------------------
// Request envelope
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct GraphQlRequest<'a> {
    pub query: &'a str,
    pub variables: serde_json::Value,
    #[serde(rename = "operationName")]
    pub operation_name: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct GraphQlError {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct GraphQlResponse<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<GraphQlError>,
}

// ---------------------------------------------------------------------------
// Fragments
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct UrlFragment {
    pub url: String,
    #[serde(rename = "type")]
    pub url_type: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImageFragment {
    pub id: String,
    pub url: String,
    pub width: Option<i64>,
    pub height: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FingerprintFragment {
    pub algorithm: FingerprintAlgorithm,
    pub hash: String,
    pub duration: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MeasurementsFragment {
    pub band_size: Option<i64>,
    pub cup_size: Option<String>,
    pub waist: Option<i64>,
    pub hip: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BodyModificationFragment {
    pub location: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FuzzyDateFragment {
    pub date: String,
    pub accuracy: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StudioFragment {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub urls: Vec<UrlFragment>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TagFragment {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PerformerFragment {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub aliases: Vec<String>,
    pub gender: Option<String>,
    #[serde(default)]
    pub urls: Vec<UrlFragment>,
    pub birthdate: Option<FuzzyDateFragment>,
    pub ethnicity: Option<String>,
    pub country: Option<String>,
    pub eye_color: Option<String>,
    pub hair_color: Option<String>,
    /// Height in centimetres
    pub height: Option<i64>,
    #[serde(default)]
    pub measurements: MeasurementsFragment,
    pub breast_type: Option<String>,
    pub career_start_year: Option<i64>,
    pub career_end_year: Option<i64>,
    #[serde(default)]
    pub tattoos: Vec<BodyModificationFragment>,
    #[serde(default)]
    pub piercings: Vec<BodyModificationFragment>,
    #[serde(default)]
    pub images: Vec<ImageFragment>,
}

/// A performer credit on a scene
#[derive(Debug, Clone, Deserialize)]
pub struct PerformerAppearanceFragment {
    pub performer: PerformerFragment,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SceneFragment {
    pub id: String,
    pub title: Option<String>,
    pub details: Option<String>,
    /// Duration in seconds
    pub duration: Option<i64>,
    pub date: Option<String>,
    #[serde(default)]
    pub urls: Vec<UrlFragment>,
    #[serde(default)]
    pub images: Vec<ImageFragment>,
    pub studio: Option<StudioFragment>,
    #[serde(default)]
    pub tags: Vec<TagFragment>,
    #[serde(default)]
    pub performers: Vec<PerformerAppearanceFragment>,
    #[serde(default)]
    pub fingerprints: Vec<FingerprintFragment>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserFragment {
    pub id: String,
    pub name: String,
}

// ---------------------------------------------------------------------------
// Inputs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FingerprintQueryInput {
    pub hash: String,
    pub algorithm: FingerprintAlgorithm,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FingerprintInput {
    pub hash: String,
    pub algorithm: FingerprintAlgorithm,
    /// Duration in whole seconds
    pub duration: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct FingerprintSubmission {
    pub scene_id: String,
    pub fingerprint: FingerprintInput,
}

#[derive(Debug, Clone, Serialize)]
pub struct DraftEntityInput {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

/// Scene draft payload. Every field serialises, nulls included, so two
/// snapshots of an unchanged scene produce identical payloads.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SceneDraftInput {
    pub title: Option<String>,
    pub details: Option<String>,
    pub url: Option<String>,
    pub date: Option<String>,
    pub studio: Option<DraftEntityInput>,
    pub performers: Vec<DraftEntityInput>,
    pub tags: Vec<DraftEntityInput>,
    pub fingerprints: Vec<FingerprintInput>,
    /// Upload placeholder; the image itself travels as a multipart part
    pub image: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct PerformerDraftInput {
    pub name: String,
    pub aliases: Option<String>,
    pub gender: Option<String>,
    pub birthdate: Option<String>,
    pub urls: Option<Vec<String>>,
    pub ethnicity: Option<String>,
    pub country: Option<String>,
    pub eye_color: Option<String>,
    pub hair_color: Option<String>,
    pub height: Option<String>,
    pub measurements: Option<String>,
    pub breast_type: Option<String>,
    pub tattoos: Option<String>,
    pub piercings: Option<String>,
    /// Upload placeholder; the image itself travels as a multipart part
    pub image: Option<String>,
}

// ---------------------------------------------------------------------------
// Response data shapes
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct SearchSceneData {
    #[serde(rename = "searchScene")]
    pub search_scene: Vec<SceneFragment>,
}

#[derive(Debug, Deserialize)]
pub struct SearchPerformerData {
    #[serde(rename = "searchPerformer")]
    pub search_performer: Vec<PerformerFragment>,
}

#[derive(Debug, Deserialize)]
pub struct FindPerformerData {
    #[serde(rename = "findPerformer")]
    pub find_performer: Option<PerformerFragment>,
}

#[derive(Debug, Deserialize)]
pub struct FindScenesByFingerprintsData {
    #[serde(rename = "findScenesByFullFingerprints")]
    pub find_scenes_by_full_fingerprints: Vec<SceneFragment>,
}

#[derive(Debug, Deserialize)]
pub struct SubmitFingerprintData {
    #[serde(rename = "submitFingerprint")]
    pub submit_fingerprint: bool,
}

#[derive(Debug, Deserialize)]
pub struct MeData {
    pub me: Option<UserFragment>,
}

#[derive(Debug, Deserialize)]
pub struct DraftSubmissionPayload {
    pub id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SubmitSceneDraftData {
    #[serde(rename = "submitSceneDraft")]
    pub submit_scene_draft: DraftSubmissionPayload,
}

#[derive(Debug, Deserialize)]
pub struct SubmitPerformerDraftData {
    #[serde(rename = "submitPerformerDraft")]
    pub submit_performer_draft: DraftSubmissionPayload,
}

// ---------------------------------------------------------------------------
// Documents
// ---------------------------------------------------------------------------

macro_rules! performer_fragment {
    () => {
        "fragment PerformerFragment on Performer { \
         id name aliases gender urls { url type } birthdate { date accuracy } \
         ethnicity country eye_color hair_color height \
         measurements { band_size cup_size waist hip } breast_type \
         career_start_year career_end_year \
         tattoos { location description } piercings { location description } \
         images { id url width height } }"
    };
}

macro_rules! scene_fragment {
    () => {
        "fragment SceneFragment on Scene { \
         id title details duration date urls { url type } \
         images { id url width height } \
         studio { id name urls { url type } } \
         tags { id name } \
         performers { performer { ...PerformerFragment } } \
         fingerprints { algorithm hash duration } }"
    };
}

pub const SEARCH_SCENE_QUERY: &str = concat!(
    "query SearchScene($term: String!) { searchScene(term: $term) { ...SceneFragment } } ",
    scene_fragment!(),
    " ",
    performer_fragment!(),
);

pub const SEARCH_PERFORMER_QUERY: &str = concat!(
    "query SearchPerformer($term: String!) { searchPerformer(term: $term) { ...PerformerFragment } } ",
    performer_fragment!(),
);

pub const FIND_PERFORMER_QUERY: &str = concat!(
    "query FindPerformer($id: ID!) { findPerformer(id: $id) { ...PerformerFragment } } ",
    performer_fragment!(),
);

pub const FIND_SCENES_BY_FULL_FINGERPRINTS_QUERY: &str = concat!(
    "query FindScenesByFullFingerprints($fingerprints: [FingerprintQueryInput!]!) { \
     findScenesByFullFingerprints(fingerprints: $fingerprints) { ...SceneFragment } } ",
    scene_fragment!(),
    " ",
    performer_fragment!(),
);

pub const SUBMIT_FINGERPRINT_MUTATION: &str =
    "mutation SubmitFingerprint($input: FingerprintSubmission!) { submitFingerprint(input: $input) }";

pub const ME_QUERY: &str = "query Me { me { id name } }";

pub const SUBMIT_SCENE_DRAFT_MUTATION: &str =
    "mutation SubmitSceneDraft($input: SceneDraftInput!) { submitSceneDraft(input: $input) { id } }";

pub const SUBMIT_PERFORMER_DRAFT_MUTATION: &str =
    "mutation SubmitPerformerDraft($input: PerformerDraftInput!) { submitPerformerDraft(input: $input) { id } }";
