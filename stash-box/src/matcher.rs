//! Resolution of scraped entities to local records
//!
//! Matching runs in two strictly ordered passes: an endpoint-scoped stable
//! id wins outright, and only then does a unique normalised-name equality
//! count. Reversing that order would silently merge distinct remote
//! entities that happen to share a name. Matching never creates local
//! records; an unmatched entity is simply returned unresolved.

use tracing::{debug, warn};

use stash_common::db::{performers, studios, tags, ReadTxn};
use stash_common::models::{ScrapedPerformer, ScrapedStudio, ScrapedTag};
use stash_common::Result;

/// Resolve a scraped performer against the local store, recording the local
/// id on the scraped value when a match is found.
pub async fn scraped_performer(
    txn: &mut ReadTxn,
    performer: &mut ScrapedPerformer,
    endpoint: Option<&str>,
) -> Result<()> {
    if let (Some(endpoint), Some(remote_id)) = (endpoint, performer.remote_site_id.as_deref()) {
        if let Some(local) = performers::find_by_stash_id(txn, endpoint, remote_id).await? {
            performer.stored_id = Some(local.id);
            return Ok(());
        }
    }

    let Some(name) = performer.name.as_deref() else {
        return Ok(());
    };

    let candidates = performers::find_by_name(txn, name).await?;
    match candidates.as_slice() {
        [only] => performer.stored_id = Some(only.id),
        [] => debug!(name, "no local performer match"),
        _ => warn!(
            name,
            candidates = candidates.len(),
            "ambiguous performer name, leaving unresolved"
        ),
    }

    Ok(())
}

/// Resolve a scraped studio against the local store.
pub async fn scraped_studio(
    txn: &mut ReadTxn,
    studio: &mut ScrapedStudio,
    endpoint: Option<&str>,
) -> Result<()> {
    if let (Some(endpoint), Some(remote_id)) = (endpoint, studio.remote_site_id.as_deref()) {
        if let Some(local) = studios::find_by_stash_id(txn, endpoint, remote_id).await? {
            studio.stored_id = Some(local.id);
            return Ok(());
        }
    }

    let candidates = studios::find_by_name(txn, &studio.name).await?;
    match candidates.as_slice() {
        [only] => studio.stored_id = Some(only.id),
        [] => debug!(name = %studio.name, "no local studio match"),
        _ => warn!(
            name = %studio.name,
            candidates = candidates.len(),
            "ambiguous studio name, leaving unresolved"
        ),
    }

    Ok(())
}

/// Resolve a scraped tag against the local store. Tags match by name only.
pub async fn scraped_tag(txn: &mut ReadTxn, tag: &mut ScrapedTag) -> Result<()> {
    let candidates = tags::find_by_name(txn, &tag.name).await?;
    match candidates.as_slice() {
        [only] => tag.stored_id = Some(only.id),
        [] => debug!(name = %tag.name, "no local tag match"),
        _ => warn!(
            name = %tag.name,
            candidates = candidates.len(),
            "ambiguous tag name, leaving unresolved"
        ),
    }

    Ok(())
}
