//! Scene read operations

use chrono::NaiveDate;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::db::ReadTxn;
use crate::models::{Scene, StashId};
use crate::{Error, Result};

pub async fn find(txn: &mut ReadTxn, id: i64) -> Result<Option<Scene>> {
    let row = sqlx::query(
        "SELECT id, title, details, url, date, duration, height, video_codec, \
         checksum, oshash, phash, interactive, studio_id \
         FROM scenes WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(txn.conn())
    .await?;

    row.map(|r| scene_from_row(&r)).transpose()
}

/// Stash ids linking the scene to remote registries, one per endpoint
pub async fn stash_ids(txn: &mut ReadTxn, scene_id: i64) -> Result<Vec<StashId>> {
    let rows: Vec<(String, String)> = sqlx::query_as(
        "SELECT endpoint, stash_id FROM scene_stash_ids WHERE scene_id = ? ORDER BY endpoint",
    )
    .bind(scene_id)
    .fetch_all(txn.conn())
    .await?;

    Ok(rows
        .into_iter()
        .map(|(endpoint, stash_id)| StashId { endpoint, stash_id })
        .collect())
}

fn scene_from_row(row: &SqliteRow) -> Result<Scene> {
    let date = row
        .try_get::<Option<String>, _>("date")?
        .map(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d"))
        .transpose()
        .map_err(|e| Error::InvalidInput(format!("invalid scene date: {e}")))?;

    Ok(Scene {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        details: row.try_get("details")?,
        url: row.try_get("url")?,
        date,
        duration: row.try_get("duration")?,
        height: row.try_get("height")?,
        video_codec: row.try_get("video_codec")?,
        checksum: row.try_get("checksum")?,
        oshash: row.try_get("oshash")?,
        phash: row.try_get("phash")?,
        interactive: row.try_get::<i64, _>("interactive")? != 0,
        studio_id: row.try_get("studio_id")?,
    })
}
