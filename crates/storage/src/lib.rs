use std::collections::HashMap;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use tripit_core::Itinerary;

/// Result of an upsert. An id already owned by a different user is left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveOutcome {
    Created,
    Updated,
    OwnedByAnother,
}

pub trait ItineraryRepository: Send + Sync {
    async fn save(&self, itinerary: &Itinerary, owner_id: &str) -> Result<SaveOutcome>;
    async fn get(&self, id: &str) -> Result<Option<Itinerary>>;
    /// Newest first.
    async fn list_for(&self, owner_id: &str) -> Result<Vec<Itinerary>>;
    /// `false` when the id is unknown or belongs to someone else.
    async fn delete(&self, id: &str, owner_id: &str) -> Result<bool>;
}

#[derive(Debug, Clone)]
struct MemoryEntry {
    owner_id: String,
    created_at: DateTime<Utc>,
    sequence: u64,
    itinerary: Itinerary,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    itineraries: Arc<RwLock<HashMap<String, MemoryEntry>>>,
    sequence: Arc<AtomicU64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ItineraryRepository for MemoryStore {
    async fn save(&self, itinerary: &Itinerary, owner_id: &str) -> Result<SaveOutcome> {
        let mut guard = self.itineraries.write();
        if let Some(existing) = guard.get_mut(&itinerary.id) {
            if existing.owner_id != owner_id {
                return Ok(SaveOutcome::OwnedByAnother);
            }
            existing.itinerary = itinerary.clone();
            return Ok(SaveOutcome::Updated);
        }

        guard.insert(
            itinerary.id.clone(),
            MemoryEntry {
                owner_id: owner_id.to_string(),
                created_at: Utc::now(),
                sequence: self.sequence.fetch_add(1, Ordering::Relaxed),
                itinerary: itinerary.clone(),
            },
        );
        Ok(SaveOutcome::Created)
    }

    async fn get(&self, id: &str) -> Result<Option<Itinerary>> {
        Ok(self
            .itineraries
            .read()
            .get(id)
            .map(|entry| entry.itinerary.clone()))
    }

    async fn list_for(&self, owner_id: &str) -> Result<Vec<Itinerary>> {
        let guard = self.itineraries.read();
        let mut owned = guard
            .values()
            .filter(|entry| entry.owner_id == owner_id)
            .collect::<Vec<_>>();
        owned.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then(b.sequence.cmp(&a.sequence))
        });
        Ok(owned
            .into_iter()
            .map(|entry| entry.itinerary.clone())
            .collect())
    }

    async fn delete(&self, id: &str, owner_id: &str) -> Result<bool> {
        let mut guard = self.itineraries.write();
        match guard.get(id) {
            Some(entry) if entry.owner_id == owner_id => {
                guard.remove(id);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .with_context(|| format!("invalid sqlite url {}", database_url))?
            .create_if_missing(true);
        // Each in-memory connection is its own database.
        let max_connections = if database_url.contains(":memory:") { 1 } else { 5 };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(options)
            .await
            .with_context(|| format!("failed connecting to sqlite at {}", database_url))?;

        let store = Self { pool };
        store.ensure_schema().await?;
        Ok(store)
    }

    async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS itineraries (
              id TEXT PRIMARY KEY,
              owner_id TEXT NOT NULL,
              destination TEXT NOT NULL,
              content_json TEXT NOT NULL,
              created_at TEXT NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_itineraries_owner
            ON itineraries (owner_id, created_at)
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

impl ItineraryRepository for SqliteStore {
    async fn save(&self, itinerary: &Itinerary, owner_id: &str) -> Result<SaveOutcome> {
        let content_json = serde_json::to_string(itinerary)?;
        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query(
            r#"
            INSERT INTO itineraries (id, owner_id, destination, content_json, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(id) DO NOTHING
            "#,
        )
        .bind(&itinerary.id)
        .bind(owner_id)
        .bind(&itinerary.destination)
        .bind(&content_json)
        .bind(Utc::now().to_rfc3339_opts(SecondsFormat::Nanos, true))
        .execute(&mut *tx)
        .await?;

        let outcome = if inserted.rows_affected() > 0 {
            SaveOutcome::Created
        } else {
            let updated = sqlx::query(
                r#"
                UPDATE itineraries
                SET destination = ?3, content_json = ?4
                WHERE id = ?1 AND owner_id = ?2
                "#,
            )
            .bind(&itinerary.id)
            .bind(owner_id)
            .bind(&itinerary.destination)
            .bind(&content_json)
            .execute(&mut *tx)
            .await?;

            if updated.rows_affected() > 0 {
                SaveOutcome::Updated
            } else {
                SaveOutcome::OwnedByAnother
            }
        };

        tx.commit().await?;
        Ok(outcome)
    }

    async fn get(&self, id: &str) -> Result<Option<Itinerary>> {
        let row = sqlx::query("SELECT content_json FROM itineraries WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let content_json: String = row.get("content_json");
        let itinerary = serde_json::from_str(&content_json)
            .with_context(|| format!("stored itinerary {} is not valid json", id))?;
        Ok(Some(itinerary))
    }

    async fn list_for(&self, owner_id: &str) -> Result<Vec<Itinerary>> {
        let rows = sqlx::query(
            r#"
            SELECT id, content_json
            FROM itineraries
            WHERE owner_id = ?1
            ORDER BY created_at DESC, rowid DESC
            "#,
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await?;

        let mut itineraries = Vec::with_capacity(rows.len());
        for row in rows {
            let id: String = row.get("id");
            let content_json: String = row.get("content_json");
            match serde_json::from_str::<Itinerary>(&content_json) {
                Ok(mut itinerary) => {
                    itinerary.id = id;
                    itineraries.push(itinerary);
                }
                Err(err) => {
                    tracing::warn!(
                        itinerary_id = %id,
                        error = %err,
                        "skipping unreadable stored itinerary"
                    );
                }
            }
        }

        Ok(itineraries)
    }

    async fn delete(&self, id: &str, owner_id: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM itineraries WHERE id = ?1 AND owner_id = ?2")
            .bind(id)
            .bind(owner_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[derive(Clone)]
pub enum Store {
    Memory(MemoryStore),
    Sqlite(SqliteStore),
}

impl Store {
    pub fn memory() -> Self {
        Self::Memory(MemoryStore::new())
    }

    pub async fn sqlite(database_url: &str) -> Result<Self> {
        let sqlite = SqliteStore::connect(database_url).await?;
        Ok(Self::Sqlite(sqlite))
    }

    pub fn backend_name(&self) -> &'static str {
        match self {
            Store::Memory(_) => "memory",
            Store::Sqlite(_) => "sqlite",
        }
    }
}

impl ItineraryRepository for Store {
    async fn save(&self, itinerary: &Itinerary, owner_id: &str) -> Result<SaveOutcome> {
        match self {
            Store::Memory(store) => store.save(itinerary, owner_id).await,
            Store::Sqlite(store) => store.save(itinerary, owner_id).await,
        }
    }

    async fn get(&self, id: &str) -> Result<Option<Itinerary>> {
        match self {
            Store::Memory(store) => store.get(id).await,
            Store::Sqlite(store) => store.get(id).await,
        }
    }

    async fn list_for(&self, owner_id: &str) -> Result<Vec<Itinerary>> {
        match self {
            Store::Memory(store) => store.list_for(owner_id).await,
            Store::Sqlite(store) => store.list_for(owner_id).await,
        }
    }

    async fn delete(&self, id: &str, owner_id: &str) -> Result<bool> {
        match self {
            Store::Memory(store) => store.delete(id, owner_id).await,
            Store::Sqlite(store) => store.delete(id, owner_id).await,
        }
    }
}
