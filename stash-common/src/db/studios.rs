//! Studio read operations

use crate::db::ReadTxn;
use crate::models::{StashId, Studio};
use crate::Result;

pub async fn find(txn: &mut ReadTxn, id: i64) -> Result<Option<Studio>> {
    let row: Option<(i64, String, Option<String>)> =
        sqlx::query_as("SELECT id, name, url FROM studios WHERE id = ?")
            .bind(id)
            .fetch_optional(txn.conn())
            .await?;

    Ok(row.map(|(id, name, url)| Studio { id, name, url }))
}

pub async fn stash_ids(txn: &mut ReadTxn, studio_id: i64) -> Result<Vec<StashId>> {
    let rows: Vec<(String, String)> = sqlx::query_as(
        "SELECT endpoint, stash_id FROM studio_stash_ids WHERE studio_id = ? ORDER BY endpoint",
    )
    .bind(studio_id)
    .fetch_all(txn.conn())
    .await?;

    Ok(rows
        .into_iter()
        .map(|(endpoint, stash_id)| StashId { endpoint, stash_id })
        .collect())
}

/// The studio holding a given remote identity, if any
pub async fn find_by_stash_id(
    txn: &mut ReadTxn,
    endpoint: &str,
    stash_id: &str,
) -> Result<Option<Studio>> {
    let row: Option<(i64, String, Option<String>)> = sqlx::query_as(
        "SELECT s.id, s.name, s.url FROM studios s \
         JOIN studio_stash_ids i ON i.studio_id = s.id \
         WHERE i.endpoint = ? AND i.stash_id = ?",
    )
    .bind(endpoint)
    .bind(stash_id)
    .fetch_optional(txn.conn())
    .await?;

    Ok(row.map(|(id, name, url)| Studio { id, name, url }))
}

/// Studios whose normalised name equals the given name
pub async fn find_by_name(txn: &mut ReadTxn, name: &str) -> Result<Vec<Studio>> {
    let rows: Vec<(i64, String, Option<String>)> = sqlx::query_as(
        "SELECT id, name, url FROM studios \
         WHERE lower(trim(name)) = lower(trim(?)) ORDER BY id",
    )
    .bind(name)
    .fetch_all(txn.conn())
    .await?;

    Ok(rows
        .into_iter()
        .map(|(id, name, url)| Studio { id, name, url })
        .collect())
}
