//! Tag read operations

use crate::db::ReadTxn;
use crate::models::Tag;
use crate::Result;

/// Tags attached to a scene, in stable id order
pub async fn find_by_scene(txn: &mut ReadTxn, scene_id: i64) -> Result<Vec<Tag>> {
    let rows: Vec<(i64, String)> = sqlx::query_as(
        "SELECT t.id, t.name FROM tags t \
         JOIN scene_tags st ON st.tag_id = t.id \
         WHERE st.scene_id = ? ORDER BY t.id",
    )
    .bind(scene_id)
    .fetch_all(txn.conn())
    .await?;

    Ok(rows.into_iter().map(|(id, name)| Tag { id, name }).collect())
}

/// Tags whose normalised name equals the given name
pub async fn find_by_name(txn: &mut ReadTxn, name: &str) -> Result<Vec<Tag>> {
    let rows: Vec<(i64, String)> = sqlx::query_as(
        "SELECT id, name FROM tags WHERE lower(trim(name)) = lower(trim(?)) ORDER BY id",
    )
    .bind(name)
    .fetch_all(txn.conn())
    .await?;

    Ok(rows.into_iter().map(|(id, name)| Tag { id, name }).collect())
}
