//! SQLite-backed rating store implementation.

use std::path::Path;
use std::sync::Mutex;

use chrono::Utc;
use rusqlite::{params, Connection};

use super::store::{RatedTrack, RatingStore, RatingStoreError};

/// SQLite-backed rating store.
pub struct SqliteRatingStore {
    conn: Mutex<Connection>,
}

impl SqliteRatingStore {
    /// Create a new store, creating the database file and tables if needed.
    pub fn new(path: &Path) -> Result<Self, RatingStoreError> {
        let conn = Connection::open(path).map_err(|e| RatingStoreError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory store (useful for testing).
    pub fn in_memory() -> Result<Self, RatingStoreError> {
        let conn =
            Connection::open_in_memory().map_err(|e| RatingStoreError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), RatingStoreError> {
        conn.execute_batch(
            r#"
            -- One row per library track seen with a rating
            CREATE TABLE IF NOT EXISTS ratings (
                track_id TEXT PRIMARY KEY,
                artist TEXT NOT NULL,
                title TEXT NOT NULL,
                rating INTEGER NOT NULL,
                last_updated TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_ratings_rating ON ratings(rating);

            CREATE TABLE IF NOT EXISTS cache_metadata (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            );
            "#,
        )
        .map_err(|e| RatingStoreError::Database(e.to_string()))?;

        Ok(())
    }
}

impl RatingStore for SqliteRatingStore {
    fn last_scan_date(&self) -> Result<Option<String>, RatingStoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare("SELECT value FROM cache_metadata WHERE key = 'last_scan_date'")
            .map_err(|e| RatingStoreError::Database(e.to_string()))?;

        let mut rows = stmt
            .query([])
            .map_err(|e| RatingStoreError::Database(e.to_string()))?;
        let row = rows
            .next()
            .map_err(|e| RatingStoreError::Database(e.to_string()))?;

        match row {
            Some(row) => {
                let value: String = row
                    .get(0)
                    .map_err(|e| RatingStoreError::Database(e.to_string()))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    fn set_last_scan_date(&self, date: &str) -> Result<(), RatingStoreError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT OR REPLACE INTO cache_metadata (key, value) VALUES ('last_scan_date', ?)",
            params![date],
        )
        .map_err(|e| RatingStoreError::Database(e.to_string()))?;
        Ok(())
    }

    fn upsert(
        &self,
        track_id: &str,
        artist: &str,
        title: &str,
        rating: u32,
    ) -> Result<(), RatingStoreError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "INSERT OR REPLACE INTO ratings (track_id, artist, title, rating, last_updated)
             VALUES (?, ?, ?, ?, ?)",
            params![track_id, artist, title, rating, Utc::now().to_rfc3339()],
        )
        .map_err(|e| RatingStoreError::Database(e.to_string()))?;
        Ok(())
    }

    fn tracks_rated_between(
        &self,
        min: u32,
        max: u32,
    ) -> Result<Vec<RatedTrack>, RatingStoreError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare(
                "SELECT track_id, artist, title, rating FROM ratings
                 WHERE rating BETWEEN ? AND ?",
            )
            .map_err(|e| RatingStoreError::Database(e.to_string()))?;

        let rows = stmt
            .query_map(params![min, max], |row| {
                Ok(RatedTrack {
                    id: row.get(0)?,
                    artist: row.get(1)?,
                    title: row.get(2)?,
                    rating: row.get(3)?,
                })
            })
            .map_err(|e| RatingStoreError::Database(e.to_string()))?;

        let mut tracks = Vec::new();
        for row in rows {
            tracks.push(row.map_err(|e| RatingStoreError::Database(e.to_string()))?);
        }
        Ok(tracks)
    }

    fn clear(&self) -> Result<(), RatingStoreError> {
        let conn = self.conn.lock().unwrap();
        conn.execute("DELETE FROM ratings", [])
            .map_err(|e| RatingStoreError::Database(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_upsert_and_query_range() {
        let store = SqliteRatingStore::in_memory().unwrap();
        store.upsert("t1", "Daft Punk", "One More Time", 4).unwrap();
        store.upsert("t2", "Artist", "Meh Song", 2).unwrap();
        store.upsert("t3", "Artist", "Bad Song", 1).unwrap();

        let low = store.tracks_rated_between(1, 2).unwrap();
        assert_eq!(low.len(), 2);
        assert!(low.iter().all(|t| (1..=2).contains(&t.rating)));
    }

    #[test]
    fn test_upsert_last_write_wins() {
        let store = SqliteRatingStore::in_memory().unwrap();
        store.upsert("t1", "Artist", "Song", 1).unwrap();
        store.upsert("t1", "Artist", "Song", 5).unwrap();

        let low = store.tracks_rated_between(1, 2).unwrap();
        assert!(low.is_empty());
        let high = store.tracks_rated_between(5, 5).unwrap();
        assert_eq!(high.len(), 1);
        assert_eq!(high[0].id, "t1");
    }

    #[test]
    fn test_scan_date_roundtrip() {
        let store = SqliteRatingStore::in_memory().unwrap();
        assert!(store.last_scan_date().unwrap().is_none());

        store.set_last_scan_date("2026-08-07").unwrap();
        assert_eq!(store.last_scan_date().unwrap().as_deref(), Some("2026-08-07"));

        store.set_last_scan_date("2026-08-08").unwrap();
        assert_eq!(store.last_scan_date().unwrap().as_deref(), Some("2026-08-08"));
    }

    #[test]
    fn test_clear_keeps_metadata() {
        let store = SqliteRatingStore::in_memory().unwrap();
        store.upsert("t1", "Artist", "Song", 2).unwrap();
        store.set_last_scan_date("2026-08-07").unwrap();

        store.clear().unwrap();
        assert!(store.tracks_rated_between(0, 5).unwrap().is_empty());
        // The scan-date marker survives a rating wipe
        assert!(store.last_scan_date().unwrap().is_some());
    }

    #[test]
    fn test_persistence_across_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ratings.db");

        {
            let store = SqliteRatingStore::new(&path).unwrap();
            store.upsert("t1", "Artist", "Song", 2).unwrap();
            store.set_last_scan_date("2026-08-07").unwrap();
        }

        let store = SqliteRatingStore::new(&path).unwrap();
        assert_eq!(store.tracks_rated_between(1, 2).unwrap().len(), 1);
        assert_eq!(store.last_scan_date().unwrap().as_deref(), Some("2026-08-07"));
    }
}
