//! SQLite persistence for the location table.
//!
//! The store owns the only cross-request state in the process: a single
//! `locations` table keyed by exact coordinates. `save` replaces it
//! wholesale inside one transaction, and `query` pushes the bounding-box
//! predicate down to SQL.

use std::fs::OpenOptions;
use std::io::ErrorKind;

use anyhow::{Context, Error};
use log::{debug, info};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqlitePool};

use crate::model::{BoundingBox, Location, LocationTable};

/// In-memory database path, matching the SQLite convention.
pub const MEMORY_DATABASE: &str = ":memory:";

#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Opens (creating if necessary) the database at `path` and ensures the
    /// schema exists. `":memory:"` opens a transient in-memory database.
    pub async fn connect(path: &str) -> Result<Self, Error> {
        if path == MEMORY_DATABASE {
            // An in-memory database lives and dies with its connection, so
            // the pool must hold exactly one and never reap it.
            let pool = SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect("sqlite::memory:")
                .await
                .context("Failed to open in-memory database")?;
            return Self::with_schema(pool).await;
        }

        let url = {
            // SQLite will not create the file through sqlx's default
            // connect options, so create it up front.
            match OpenOptions::new()
                .read(true)
                .write(true)
                .create_new(true)
                .open(path)
            {
                Ok(_) => info!("Database file created at {}", path),
                Err(ref e) if e.kind() == ErrorKind::AlreadyExists => {
                    debug!("Reusing existing database file at {}", path)
                }
                Err(e) => {
                    return Err(
                        Error::from(e).context(format!("Failed to create database file {}", path))
                    )
                }
            }
            format!("sqlite:{}", path)
        };

        let pool = SqlitePool::connect(&url)
            .await
            .with_context(|| format!("Failed to open database {}", path))?;

        sqlx::query("PRAGMA journal_mode=WAL")
            .execute(&pool)
            .await?;

        Self::with_schema(pool).await
    }

    async fn with_schema(pool: SqlitePool) -> Result<Self, Error> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS locations (
                latitude REAL NOT NULL,
                longitude REAL NOT NULL,
                addresses REAL NOT NULL,
                PRIMARY KEY (latitude, longitude)
            )",
        )
        .execute(&pool)
        .await?;

        Ok(SqliteStore { pool })
    }

    /// Returns the persisted entries inside `bounds`.
    ///
    /// Latitude bounds are inclusive on both ends; longitude is the
    /// half-open interval (west, east], with no wraparound across ±180°.
    pub async fn query(&self, bounds: &BoundingBox) -> Result<LocationTable, sqlx::Error> {
        let rows = sqlx::query(
            "SELECT latitude, longitude, addresses FROM locations
             WHERE latitude BETWEEN ? AND ? AND longitude > ? AND longitude <= ?",
        )
        .bind(bounds.south)
        .bind(bounds.north)
        .bind(bounds.west)
        .bind(bounds.east)
        .fetch_all(&self.pool)
        .await?;

        let mut table = LocationTable::new();
        for row in rows {
            table.add(
                Location {
                    latitude: row.try_get("latitude")?,
                    longitude: row.try_get("longitude")?,
                },
                row.try_get("addresses")?,
            );
        }

        Ok(table)
    }

    /// Replaces the entire persisted table with `table`.
    ///
    /// Runs as one transaction: the old contents are deleted, the new rows
    /// inserted, and any failure before commit rolls back and leaves the
    /// previous table intact.
    pub async fn save(&self, table: &LocationTable) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM locations").execute(&mut *tx).await?;

        for (location, quantity) in table.iter() {
            sqlx::query("INSERT INTO locations (latitude, longitude, addresses) VALUES (?, ?, ?)")
                .bind(location.latitude)
                .bind(location.longitude)
                .bind(quantity)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        info!("Saved location table with {} entries", table.len());
        Ok(())
    }
}
