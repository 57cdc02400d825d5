//! Draft submission
//!
//! A draft is a candidate contribution to the registry: a snapshot of a
//! local scene or performer, optionally with an image, posted as a GraphQL
//! multipart request.

use std::path::Path;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use stash_common::db::{performers, scenes, studios, tags, ReadTxn};
use stash_common::fingerprint::{self, FingerprintAlgorithm};
use stash_common::models::Performer;
use stash_common::Error;

use crate::client::StashBox;
use crate::error::Result;
use crate::graphql::{
    DraftEntityInput, FingerprintInput, PerformerDraftInput, SceneDraftInput,
    SubmitPerformerDraftData, SubmitSceneDraftData, SUBMIT_PERFORMER_DRAFT_MUTATION,
    SUBMIT_SCENE_DRAFT_MUTATION,
};

impl StashBox {
    /// Submit a scene draft to the registry, returning the remote draft id.
    ///
    /// The local scene is snapshotted inside one read transaction. The image
    /// file, when given, is read outside the transaction; a missing or
    /// unreadable image degrades to a draft without one.
    pub async fn submit_scene_draft(
        &self,
        cancel: &CancellationToken,
        scene_id: i64,
        image_path: Option<&Path>,
    ) -> Result<Option<String>> {
        let endpoint = self.endpoint().to_string();
        let draft = self
            .repository()
            .with_read_txn(|txn| {
                Box::pin(async move { build_scene_draft(txn, scene_id, &endpoint).await })
            })
            .await?;

        let image = match image_path {
            Some(path) => match tokio::fs::read(path).await {
                Ok(bytes) => Some(bytes),
                Err(err) => {
                    warn!(path = %path.display(), %err, "could not read draft image");
                    None
                }
            },
            None => None,
        };

        let input = serde_json::to_value(&draft)?;
        let data: SubmitSceneDraftData = self
            .submit_draft(cancel, SUBMIT_SCENE_DRAFT_MUTATION, input, image)
            .await?;

        Ok(data.submit_scene_draft.id)
    }

    /// Submit a performer draft to the registry, returning the remote draft
    /// id. The image, when stored locally, accompanies the draft.
    pub async fn submit_performer_draft(
        &self,
        cancel: &CancellationToken,
        performer: &Performer,
    ) -> Result<Option<String>> {
        let performer_id = performer.id;
        let image = self
            .repository()
            .with_read_txn(|txn| Box::pin(async move { performers::image(txn, performer_id).await }))
            .await?;

        let draft = build_performer_draft(performer);

        let input = serde_json::to_value(&draft)?;
        let data: SubmitPerformerDraftData = self
            .submit_draft(cancel, SUBMIT_PERFORMER_DRAFT_MUTATION, input, image)
            .await?;

        Ok(data.submit_performer_draft.id)
    }
}

/// Snapshot a local scene into a draft payload. Studio and performers carry
/// their stash id for `endpoint` when they hold one, otherwise name only.
pub(crate) async fn build_scene_draft(
    txn: &mut ReadTxn,
    scene_id: i64,
    endpoint: &str,
) -> stash_common::Result<SceneDraftInput> {
    let scene = scenes::find(txn, scene_id).await?.ok_or(Error::NotFound {
        entity: "scene",
        id: scene_id,
    })?;

    let mut draft = SceneDraftInput {
        title: scene.title.clone(),
        details: scene.details.clone(),
        date: scene.date.map(|d| d.format("%Y-%m-%d").to_string()),
        ..Default::default()
    };

    if let Some(url) = scene.url.as_deref().map(str::trim).filter(|u| !u.is_empty()) {
        draft.url = Some(url.to_string());
    }

    if let Some(studio_id) = scene.studio_id {
        let studio = studios::find(txn, studio_id).await?.ok_or(Error::NotFound {
            entity: "studio",
            id: studio_id,
        })?;
        let mut entity = DraftEntityInput {
            name: studio.name,
            id: None,
        };
        for stash_id in studios::stash_ids(txn, studio_id).await? {
            if stash_id.endpoint == endpoint {
                entity.id = Some(stash_id.stash_id);
                break;
            }
        }
        draft.studio = Some(entity);
    }

    if let Some(duration) = scene.duration {
        let duration = duration as i64;
        if let Some(oshash) = &scene.oshash {
            draft.fingerprints.push(FingerprintInput {
                hash: oshash.clone(),
                algorithm: FingerprintAlgorithm::Oshash,
                duration,
            });
        }
        if let Some(checksum) = &scene.checksum {
            draft.fingerprints.push(FingerprintInput {
                hash: checksum.clone(),
                algorithm: FingerprintAlgorithm::Md5,
                duration,
            });
        }
        if let Some(phash) = scene.phash {
            draft.fingerprints.push(FingerprintInput {
                hash: fingerprint::phash_to_string(phash),
                algorithm: FingerprintAlgorithm::Phash,
                duration,
            });
        }
    }

    for performer in performers::find_by_scene(txn, scene_id).await? {
        let mut entity = DraftEntityInput {
            name: performer.name.clone(),
            id: None,
        };
        for stash_id in performers::stash_ids(txn, performer.id).await? {
            if stash_id.endpoint == endpoint {
                entity.id = Some(stash_id.stash_id);
                break;
            }
        }
        draft.performers.push(entity);
    }

    for tag in tags::find_by_scene(txn, scene_id).await? {
        draft.tags.push(DraftEntityInput {
            name: tag.name,
            id: None,
        });
    }

    Ok(draft)
}

/// Snapshot a performer into a draft payload. Per-network handles become
/// full profile URLs.
pub(crate) fn build_performer_draft(performer: &Performer) -> PerformerDraftInput {
    let mut draft = PerformerDraftInput {
        name: performer.name.clone(),
        aliases: performer.aliases.clone(),
        gender: performer.gender.map(|g| g.as_str().to_string()),
        birthdate: performer.birthdate.map(|d| d.format("%Y-%m-%d").to_string()),
        ethnicity: performer.ethnicity.clone(),
        country: performer.country.clone(),
        eye_color: performer.eye_color.clone(),
        hair_color: performer.hair_color.clone(),
        height: performer.height.clone(),
        measurements: performer.measurements.clone(),
        breast_type: performer.fake_tits.clone(),
        tattoos: performer.tattoos.clone(),
        piercings: performer.piercings.clone(),
        ..Default::default()
    };

    let mut urls = Vec::new();
    if let Some(twitter) = performer.twitter.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
        urls.push(format!("https://twitter.com/{twitter}"));
    }
    if let Some(instagram) = performer
        .instagram
        .as_deref()
        .map(str::trim)
        .filter(|i| !i.is_empty())
    {
        urls.push(format!("https://instagram.com/{instagram}"));
    }
    if let Some(url) = performer.url.as_deref().map(str::trim).filter(|u| !u.is_empty()) {
        urls.push(url.to_string());
    }
    if !urls.is_empty() {
        draft.urls = Some(urls);
    }

    draft
}
