//! SQLite snapshot store.
//!
//! A [`Memory`] serializes to one opaque JSON blob; this module persists
//! those blobs keyed by reasoner id:
//!
//! ```sql
//! CREATE TABLE IF NOT EXISTS snapshots (
//!     reasoner_id INTEGER PRIMARY KEY,
//!     data        BLOB NOT NULL,
//!     updated_at  TEXT NOT NULL,
//!     checksum    TEXT NOT NULL
//! );
//! ```
//!
//! JSON inside a BLOB column keeps the schema stable across struct changes,
//! WAL mode allows concurrent readers, and a CRC-32 column catches
//! corrupted saves before they deserialize into nonsense. The event bus,
//! counters, and RNG handle are rebuilt on load; the RNG fast-forwards to
//! its persisted draw count, so replay behavior survives the round trip.

use std::path::{Path, PathBuf};

use chrono::Utc;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use tracing::{debug, info};

use crate::error::{AlannError, Result};
use crate::memory::Memory;

/// Basic CRC-32 (ISO 3309 / ITU-T V.42), hex-encoded.
fn crc32_hex(data: &[u8]) -> String {
    const POLY: u32 = 0xEDB8_8320;
    let mut crc: u32 = 0xFFFF_FFFF;
    for &byte in data {
        crc ^= u32::from(byte);
        for _ in 0..8 {
            if crc & 1 == 1 {
                crc = (crc >> 1) ^ POLY;
            } else {
                crc >>= 1;
            }
        }
    }
    format!("{:08x}", !crc)
}

/// Handle to an open SQLite database of memory snapshots.
pub struct SnapshotStore {
    conn: Connection,
    db_path: PathBuf,
}

impl std::fmt::Debug for SnapshotStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SnapshotStore")
            .field("db_path", &self.db_path)
            .finish_non_exhaustive()
    }
}

impl SnapshotStore {
    /// Open (or create) a snapshot database at `path`.
    ///
    /// # Errors
    /// Returns [`AlannError::Database`] on SQLite failures.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db_path = path.as_ref().to_path_buf();
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(&db_path, flags)?;
        Self::init(conn, db_path)
    }

    /// Open an in-memory database (useful for tests).
    ///
    /// # Errors
    /// Returns [`AlannError::Database`] on SQLite failures.
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?, PathBuf::from(":memory:"))
    }

    fn init(conn: Connection, db_path: PathBuf) -> Result<Self> {
        conn.execute_batch("PRAGMA journal_mode = WAL;")?;
        conn.execute_batch("PRAGMA synchronous = NORMAL;")?;
        conn.execute_batch("PRAGMA busy_timeout = 5000;")?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS snapshots (
                reasoner_id INTEGER PRIMARY KEY,
                data        BLOB NOT NULL,
                updated_at  TEXT NOT NULL,
                checksum    TEXT NOT NULL
            );",
        )?;
        info!(path = %db_path.display(), "snapshot store opened");
        Ok(Self { conn, db_path })
    }

    /// Serialize and persist a memory, replacing any previous snapshot for
    /// the same reasoner id.
    ///
    /// # Errors
    /// Returns [`AlannError::Serialization`] if encoding fails, or
    /// [`AlannError::Database`] on SQLite failures.
    pub fn save(&self, memory: &Memory) -> Result<()> {
        let data =
            serde_json::to_vec(memory).map_err(|e| AlannError::Serialization(e.to_string()))?;
        let checksum = crc32_hex(&data);
        let updated_at = Utc::now().to_rfc3339();
        self.conn.execute(
            "INSERT OR REPLACE INTO snapshots (reasoner_id, data, updated_at, checksum)
             VALUES (?1, ?2, ?3, ?4)",
            params![memory.reasoner_id, data, updated_at, checksum],
        )?;
        debug!(
            reasoner_id = memory.reasoner_id,
            bytes = data.len(),
            "snapshot saved"
        );
        Ok(())
    }

    /// Load the snapshot for a reasoner id, if one exists.
    ///
    /// # Errors
    /// Returns [`AlannError::SnapshotCorrupt`] when the stored checksum does
    /// not match the blob, [`AlannError::Serialization`] when decoding
    /// fails, or [`AlannError::Database`] on SQLite failures.
    pub fn load(&self, reasoner_id: i64) -> Result<Option<Memory>> {
        let row: Option<(Vec<u8>, String)> = self
            .conn
            .query_row(
                "SELECT data, checksum FROM snapshots WHERE reasoner_id = ?1",
                params![reasoner_id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        let Some((data, expected)) = row else {
            return Ok(None);
        };
        let actual = crc32_hex(&data);
        if actual != expected {
            return Err(AlannError::SnapshotCorrupt {
                reasoner_id,
                expected,
                actual,
            });
        }
        let memory: Memory =
            serde_json::from_slice(&data).map_err(|e| AlannError::Serialization(e.to_string()))?;
        Ok(Some(memory))
    }

    /// Delete the snapshot for a reasoner id. Returns whether one existed.
    ///
    /// # Errors
    /// Returns [`AlannError::Database`] on SQLite failures.
    pub fn delete(&self, reasoner_id: i64) -> Result<bool> {
        let affected = self.conn.execute(
            "DELETE FROM snapshots WHERE reasoner_id = ?1",
            params![reasoner_id],
        )?;
        Ok(affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bag::Bag;
    use crate::budget::BudgetValue;
    use crate::config::ReasonerConfig;
    use crate::interfaces::DefaultConceptBuilder;
    use crate::term::Term;

    fn populated_memory() -> Memory {
        let builder = DefaultConceptBuilder;
        let mut memory = Memory::new(ReasonerConfig {
            concept_bag_size: 16,
            subconscious_bag_size: 16,
            ..ReasonerConfig::default()
        })
        .expect("valid config");
        for name in ["a", "b", "c"] {
            memory.conceptualize(
                BudgetValue::new(0.7, 0.5, 0.3),
                &Term::atom(name),
                true,
                &builder,
                0,
            );
        }
        memory
    }

    #[test]
    fn save_load_round_trip() {
        let store = SnapshotStore::open_in_memory().expect("open");
        let memory = populated_memory();
        store.save(&memory).expect("save");
        let restored = store
            .load(memory.reasoner_id)
            .expect("load")
            .expect("snapshot exists");
        assert_eq!(restored.concepts.len(), memory.concepts.len());
        assert_eq!(restored.config.concept_bag_size, 16);
    }

    #[test]
    fn load_missing_returns_none() {
        let store = SnapshotStore::open_in_memory().expect("open");
        assert!(store.load(42).expect("load").is_none());
    }

    #[test]
    fn corrupted_blob_is_detected() {
        let store = SnapshotStore::open_in_memory().expect("open");
        let memory = populated_memory();
        store.save(&memory).expect("save");
        store
            .conn
            .execute(
                "UPDATE snapshots SET data = X'00ff00ff' WHERE reasoner_id = ?1",
                params![memory.reasoner_id],
            )
            .expect("tamper");
        assert!(matches!(
            store.load(memory.reasoner_id),
            Err(AlannError::SnapshotCorrupt { .. })
        ));
    }

    #[test]
    fn delete_removes_snapshot() {
        let store = SnapshotStore::open_in_memory().expect("open");
        let memory = populated_memory();
        store.save(&memory).expect("save");
        assert!(store.delete(memory.reasoner_id).expect("delete"));
        assert!(!store.delete(memory.reasoner_id).expect("second delete"));
    }

    #[test]
    fn crc_is_stable() {
        assert_eq!(crc32_hex(b"alann"), crc32_hex(b"alann"));
        assert_ne!(crc32_hex(b"alann"), crc32_hex(b"nnala"));
    }
}
