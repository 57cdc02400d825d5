//! Stash-box GraphQL client
//!
//! One [`StashBox`] instance talks to one registry endpoint. The HTTP client
//! is shared and may pool connections; transactions and per-call state are
//! not shared between operations.

use serde::de::DeserializeOwned;
use serde_json::json;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use stash_common::config::StashBoxConfig;
use stash_common::db::Repository;

use crate::error::{Result, StashBoxError};
use crate::graphql::{
    FindPerformerData, FindScenesByFingerprintsData, FingerprintQueryInput, FingerprintSubmission,
    GraphQlRequest, GraphQlResponse, MeData, PerformerFragment, SceneFragment,
    SearchPerformerData, SearchSceneData, SubmitFingerprintData, UserFragment,
    FIND_PERFORMER_QUERY, FIND_SCENES_BY_FULL_FINGERPRINTS_QUERY, ME_QUERY,
    SEARCH_PERFORMER_QUERY, SEARCH_SCENE_QUERY, SUBMIT_FINGERPRINT_MUTATION,
};

const USER_AGENT: &str = concat!("stash/", env!("CARGO_PKG_VERSION"));
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Registries accept at most this many fingerprints per lookup; larger
/// batches are chunked by the identification pipeline.
pub const FINGERPRINT_CHUNK_SIZE: usize = 100;

/// Client for one stash-box registry instance
pub struct StashBox {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    repository: Repository,
    max_phash_distance: u32,
}

impl StashBox {
    /// Create a client for the given registry. The API key resolves through
    /// the config's environment override tier.
    pub fn new(config: &StashBoxConfig, repository: Repository) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
            api_key: config.resolved_api_key(),
            repository,
            max_phash_distance: stash_common::fingerprint::DEFAULT_PHASH_DISTANCE,
        })
    }

    /// Override the perceptual-hash match distance.
    pub fn with_max_phash_distance(mut self, max_distance: u32) -> Self {
        self.max_phash_distance = max_distance;
        self
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub(crate) fn repository(&self) -> &Repository {
        &self.repository
    }

    pub(crate) fn max_phash_distance(&self) -> u32 {
        self.max_phash_distance
    }

    /// Search the registry for scenes matching a free-text term.
    pub async fn search_scenes(
        &self,
        cancel: &CancellationToken,
        term: &str,
    ) -> Result<Vec<SceneFragment>> {
        let data: SearchSceneData = self
            .execute(cancel, "searchScene", SEARCH_SCENE_QUERY, json!({ "term": term }))
            .await?;
        Ok(data.search_scene)
    }

    /// Search the registry for performers matching a free-text term.
    pub async fn search_performers(
        &self,
        cancel: &CancellationToken,
        term: &str,
    ) -> Result<Vec<PerformerFragment>> {
        let data: SearchPerformerData = self
            .execute(
                cancel,
                "searchPerformer",
                SEARCH_PERFORMER_QUERY,
                json!({ "term": term }),
            )
            .await?;
        Ok(data.search_performer)
    }

    /// Look up one performer by its remote id.
    pub async fn find_performer(
        &self,
        cancel: &CancellationToken,
        remote_id: &str,
    ) -> Result<Option<PerformerFragment>> {
        let data: FindPerformerData = self
            .execute(
                cancel,
                "findPerformer",
                FIND_PERFORMER_QUERY,
                json!({ "id": remote_id }),
            )
            .await?;
        Ok(data.find_performer)
    }

    /// Look up scenes by fingerprint. Callers keep `fingerprints` within
    /// [`FINGERPRINT_CHUNK_SIZE`]; chunking larger batches is their job.
    pub async fn find_scenes_by_full_fingerprints(
        &self,
        cancel: &CancellationToken,
        fingerprints: &[FingerprintQueryInput],
    ) -> Result<Vec<SceneFragment>> {
        debug_assert!(fingerprints.len() <= FINGERPRINT_CHUNK_SIZE);

        let data: FindScenesByFingerprintsData = self
            .execute(
                cancel,
                "findScenesByFullFingerprints",
                FIND_SCENES_BY_FULL_FINGERPRINTS_QUERY,
                json!({ "fingerprints": fingerprints }),
            )
            .await?;
        Ok(data.find_scenes_by_full_fingerprints)
    }

    /// Submit one fingerprint for a remote scene.
    pub async fn submit_fingerprint(
        &self,
        cancel: &CancellationToken,
        submission: &FingerprintSubmission,
    ) -> Result<bool> {
        let data: SubmitFingerprintData = self
            .execute(
                cancel,
                "submitFingerprint",
                SUBMIT_FINGERPRINT_MUTATION,
                json!({ "input": submission }),
            )
            .await?;
        Ok(data.submit_fingerprint)
    }

    /// The authenticated user, used as a credential probe.
    pub async fn me(&self, cancel: &CancellationToken) -> Result<Option<UserFragment>> {
        let data: MeData = self.execute(cancel, "me", ME_QUERY, json!({})).await?;
        Ok(data.me)
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        cancel: &CancellationToken,
        operation: &'static str,
        query: &'static str,
        variables: serde_json::Value,
    ) -> Result<T> {
        if cancel.is_cancelled() {
            return Err(StashBoxError::Cancelled);
        }

        let request = GraphQlRequest {
            query,
            variables,
            operation_name: "",
        };

        debug!(operation, endpoint = %self.endpoint, "querying stash-box");

        let send = self
            .http
            .post(&self.endpoint)
            .header("ApiKey", &self.api_key)
            .json(&request)
            .send();

        let response = tokio::select! {
            _ = cancel.cancelled() => return Err(StashBoxError::Cancelled),
            result = send => result?,
        };

        read_envelope(response, operation).await
    }

    /// Post a draft as a GraphQL multipart request.
    ///
    /// The JSON operation travels as field `operations`; the file map as
    /// field `map` (`{"0": ["variables.input.image"]}` with an image, `{}`
    /// without); the image bytes, when present, as field `0` under the
    /// filename `draft`.
    pub(crate) async fn submit_draft<T: DeserializeOwned>(
        &self,
        cancel: &CancellationToken,
        query: &'static str,
        input: serde_json::Value,
        image: Option<Vec<u8>>,
    ) -> Result<T> {
        if cancel.is_cancelled() {
            return Err(StashBoxError::Cancelled);
        }

        let request = GraphQlRequest {
            query,
            variables: json!({ "input": input }),
            operation_name: "",
        };
        let operations = serde_json::to_string(&request)?;

        let mut form = reqwest::multipart::Form::new().text("operations", operations);
        form = match image {
            Some(bytes) => form
                .text("map", r#"{ "0": ["variables.input.image"] }"#)
                .part("0", reqwest::multipart::Part::bytes(bytes).file_name("draft")),
            None => form.text("map", "{}"),
        };

        debug!(endpoint = %self.endpoint, "submitting draft");

        let send = self
            .http
            .post(&self.endpoint)
            .header("ApiKey", &self.api_key)
            .multipart(form)
            .send();

        let response = tokio::select! {
            _ = cancel.cancelled() => return Err(StashBoxError::Cancelled),
            result = send => result?,
        };

        read_envelope(response, "submitDraft").await
    }
}

async fn read_envelope<T: DeserializeOwned>(
    response: reqwest::Response,
    operation: &'static str,
) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(StashBoxError::Remote {
            status: status.as_u16(),
            body,
        });
    }

    let envelope: GraphQlResponse<T> = response
        .json()
        .await
        .map_err(|e| StashBoxError::MalformedResponse(format!("{operation}: {e}")))?;

    if let Some(error) = envelope.errors.first() {
        return Err(StashBoxError::GraphQl(error.message.clone()));
    }

    envelope
        .data
        .ok_or_else(|| StashBoxError::MalformedResponse(format!("{operation}: response carried no data")))
}
