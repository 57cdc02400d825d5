//! Local store access
//!
//! The identification pipeline only ever reads the local store; all reads go
//! through [`Repository::with_read_txn`] so one call sees one consistent
//! snapshot. Writes belong to the scanner and the CRUD layer, which live
//! elsewhere.

pub mod performers;
pub mod repository;
pub mod scenes;
pub mod studios;
pub mod tags;

pub use repository::{ReadTxn, Repository};

use anyhow::Result;
use sqlx::SqlitePool;
use std::path::Path;

/// Initialize database connection pool
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Use proper SQLite URI with mode=rwc (read, write, create)
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    tracing::debug!("Connecting to database: {}", db_url);

    let pool = SqlitePool::connect(&db_url).await?;

    init_tables(&pool).await?;

    Ok(pool)
}

/// Create the tables the identification pipeline reads, if absent
pub async fn init_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS studios (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            url TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS scenes (
            id INTEGER PRIMARY KEY,
            title TEXT,
            details TEXT,
            url TEXT,
            date TEXT,
            duration REAL,
            height INTEGER,
            video_codec TEXT,
            checksum TEXT,
            oshash TEXT,
            phash INTEGER,
            interactive INTEGER NOT NULL DEFAULT 0,
            studio_id INTEGER REFERENCES studios(id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS performers (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            gender TEXT,
            url TEXT,
            twitter TEXT,
            instagram TEXT,
            birthdate TEXT,
            ethnicity TEXT,
            country TEXT,
            eye_color TEXT,
            hair_color TEXT,
            height TEXT,
            measurements TEXT,
            fake_tits TEXT,
            career_length TEXT,
            tattoos TEXT,
            piercings TEXT,
            aliases TEXT,
            image BLOB
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS tags (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS scene_performers (
            scene_id INTEGER NOT NULL REFERENCES scenes(id),
            performer_id INTEGER NOT NULL REFERENCES performers(id),
            PRIMARY KEY (scene_id, performer_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS scene_tags (
            scene_id INTEGER NOT NULL REFERENCES scenes(id),
            tag_id INTEGER NOT NULL REFERENCES tags(id),
            PRIMARY KEY (scene_id, tag_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    // One remote identity per endpoint per entity
    for table in ["scene_stash_ids", "performer_stash_ids", "studio_stash_ids"] {
        let owner = match table {
            "scene_stash_ids" => "scene_id INTEGER NOT NULL REFERENCES scenes(id)",
            "performer_stash_ids" => "performer_id INTEGER NOT NULL REFERENCES performers(id)",
            _ => "studio_id INTEGER NOT NULL REFERENCES studios(id)",
        };
        let owner_col = match table {
            "scene_stash_ids" => "scene_id",
            "performer_stash_ids" => "performer_id",
            _ => "studio_id",
        };
        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {table} (
                {owner},
                endpoint TEXT NOT NULL,
                stash_id TEXT NOT NULL,
                PRIMARY KEY ({owner_col}, endpoint)
            )
            "#,
        ))
        .execute(pool)
        .await?;
    }

    tracing::info!("Database tables initialized");

    Ok(())
}
