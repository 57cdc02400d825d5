//! Performer read operations

use chrono::NaiveDate;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use crate::db::ReadTxn;
use crate::models::{Gender, Performer, StashId};
use crate::{Error, Result};

pub async fn find(txn: &mut ReadTxn, id: i64) -> Result<Option<Performer>> {
    let row = sqlx::query(
        "SELECT id, name, gender, url, twitter, instagram, birthdate, ethnicity, country, \
         eye_color, hair_color, height, measurements, fake_tits, career_length, tattoos, \
         piercings, aliases \
         FROM performers WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(txn.conn())
    .await?;

    row.map(|r| performer_from_row(&r)).transpose()
}

/// Performers appearing in a scene, in stable id order
pub async fn find_by_scene(txn: &mut ReadTxn, scene_id: i64) -> Result<Vec<Performer>> {
    let rows = sqlx::query(
        "SELECT p.id, p.name, p.gender, p.url, p.twitter, p.instagram, p.birthdate, \
         p.ethnicity, p.country, p.eye_color, p.hair_color, p.height, p.measurements, \
         p.fake_tits, p.career_length, p.tattoos, p.piercings, p.aliases \
         FROM performers p \
         JOIN scene_performers sp ON sp.performer_id = p.id \
         WHERE sp.scene_id = ? ORDER BY p.id",
    )
    .bind(scene_id)
    .fetch_all(txn.conn())
    .await?;

    rows.iter().map(performer_from_row).collect()
}

pub async fn stash_ids(txn: &mut ReadTxn, performer_id: i64) -> Result<Vec<StashId>> {
    let rows: Vec<(String, String)> = sqlx::query_as(
        "SELECT endpoint, stash_id FROM performer_stash_ids \
         WHERE performer_id = ? ORDER BY endpoint",
    )
    .bind(performer_id)
    .fetch_all(txn.conn())
    .await?;

    Ok(rows
        .into_iter()
        .map(|(endpoint, stash_id)| StashId { endpoint, stash_id })
        .collect())
}

/// The performer holding a given remote identity, if any
pub async fn find_by_stash_id(
    txn: &mut ReadTxn,
    endpoint: &str,
    stash_id: &str,
) -> Result<Option<Performer>> {
    let row = sqlx::query(
        "SELECT p.id, p.name, p.gender, p.url, p.twitter, p.instagram, p.birthdate, \
         p.ethnicity, p.country, p.eye_color, p.hair_color, p.height, p.measurements, \
         p.fake_tits, p.career_length, p.tattoos, p.piercings, p.aliases \
         FROM performers p \
         JOIN performer_stash_ids i ON i.performer_id = p.id \
         WHERE i.endpoint = ? AND i.stash_id = ?",
    )
    .bind(endpoint)
    .bind(stash_id)
    .fetch_optional(txn.conn())
    .await?;

    row.map(|r| performer_from_row(&r)).transpose()
}

/// Performers whose normalised name equals the given name
pub async fn find_by_name(txn: &mut ReadTxn, name: &str) -> Result<Vec<Performer>> {
    let rows = sqlx::query(
        "SELECT id, name, gender, url, twitter, instagram, birthdate, ethnicity, country, \
         eye_color, hair_color, height, measurements, fake_tits, career_length, tattoos, \
         piercings, aliases \
         FROM performers WHERE lower(trim(name)) = lower(trim(?)) ORDER BY id",
    )
    .bind(name)
    .fetch_all(txn.conn())
    .await?;

    rows.iter().map(performer_from_row).collect()
}

/// Stored image bytes for a performer, if any
pub async fn image(txn: &mut ReadTxn, performer_id: i64) -> Result<Option<Vec<u8>>> {
    let row: Option<(Option<Vec<u8>>,)> =
        sqlx::query_as("SELECT image FROM performers WHERE id = ?")
            .bind(performer_id)
            .fetch_optional(txn.conn())
            .await?;

    Ok(row.and_then(|(image,)| image))
}

fn performer_from_row(row: &SqliteRow) -> Result<Performer> {
    let gender = row
        .try_get::<Option<String>, _>("gender")?
        .map(|g| g.parse::<Gender>())
        .transpose()?;

    let birthdate = row
        .try_get::<Option<String>, _>("birthdate")?
        .map(|d| NaiveDate::parse_from_str(&d, "%Y-%m-%d"))
        .transpose()
        .map_err(|e| Error::InvalidInput(format!("invalid performer birthdate: {e}")))?;

    Ok(Performer {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        gender,
        url: row.try_get("url")?,
        twitter: row.try_get("twitter")?,
        instagram: row.try_get("instagram")?,
        birthdate,
        ethnicity: row.try_get("ethnicity")?,
        country: row.try_get("country")?,
        eye_color: row.try_get("eye_color")?,
        hair_color: row.try_get("hair_color")?,
        height: row.try_get("height")?,
        measurements: row.try_get("measurements")?,
        fake_tits: row.try_get("fake_tits")?,
        career_length: row.try_get("career_length")?,
        tattoos: row.try_get("tattoos")?,
        piercings: row.try_get("piercings")?,
        aliases: row.try_get("aliases")?,
    })
}
