//! SQLite-backed document store.

use std::fs;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use cropwatch_core::CropError;
use rusqlite::Connection;
use thiserror::Error;
use tracing::info;

/// Errors from store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("Lock error")]
    Lock,
    #[error("Failed to prepare database directory: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serial number already registered: {0}")]
    DuplicateSerial(String),
    #[error("Farm not found: {0}")]
    FarmMissing(String),
    #[error("Corrupt record: {0}")]
    Corrupt(#[from] CropError),
}

/// SQLite-backed store for plants and farms.
///
/// Farms own their assignment rows; plants are shared by reference and may be
/// deleted while still referenced.
pub struct FarmStore {
    conn: Mutex<Connection>,
}

impl FarmStore {
    /// Opens (or creates) the database at `path`, creating parent directories.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        info!("Database initialized at {}", path.display());
        Ok(store)
    }

    /// Creates an in-memory store (for testing).
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init_schema()?;
        Ok(store)
    }

    pub(crate) fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Lock)
    }

    fn init_schema(&self) -> Result<(), StoreError> {
        let conn = self.lock()?;

        conn.execute_batch(
            r#"
            PRAGMA foreign_keys = ON;

            CREATE TABLE IF NOT EXISTS plants (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                life_cycle INTEGER NOT NULL,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE IF NOT EXISTS farms (
                id TEXT PRIMARY KEY,
                serial_number TEXT NOT NULL UNIQUE,
                name TEXT NOT NULL DEFAULT '',
                owner_id TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS plant_assignments (
                farm_id TEXT NOT NULL,
                position INTEGER NOT NULL,
                plant_id TEXT NOT NULL,
                plant_count INTEGER NOT NULL,
                harvest_date TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'healthy',
                PRIMARY KEY (farm_id, position),
                FOREIGN KEY (farm_id) REFERENCES farms(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_plants_name ON plants(name);
            CREATE INDEX IF NOT EXISTS idx_farms_owner ON farms(owner_id);
            "#,
        )?;

        Ok(())
    }
}

pub(crate) fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
