use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};
use thiserror::Error;
use tracing::{debug, warn};

use crate::features::{freeze, thaw_value, FeatureError};
use crate::store::{
    sample_key, LoadedFeatures, SampleRecord, Scope, SkippedRecord, StoredFeature,
    UnknownFeaturePolicy,
};

/// Minimum schema version we know how to handle.
///
/// `0` means "no schema yet" (fresh DB).
const MIN_SUPPORTED_SCHEMA_VERSION: i32 = 0;

/// Latest schema version this crate knows about.
pub const CURRENT_SCHEMA_VERSION: i32 = 2;

/// Error type for feature archive operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying SQLite error.
    #[error("SQLite error: {0}")]
    Sql(#[from] rusqlite::Error),

    /// The database was created with a newer schema version than we support.
    #[error(
        "Unsupported schema version {found}; supported range is {min_supported}..={max_supported}"
    )]
    UnsupportedSchemaVersion { found: i32, min_supported: i32, max_supported: i32 },

    #[error("Stored record is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Feature(#[from] FeatureError),

    #[error("Sample {0} is not registered in the archive")]
    UnknownSample(String),

    #[error("Stored row {row_id} has invalid scope: {reason}")]
    InvalidScope { row_id: i64, reason: String },
}

/// Convenience result type for archive operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// SQLite-backed feature archive.
///
/// Features are stored frozen (wire JSON), so rows written by a newer codec
/// remain readable by older builds up to the unknown feature types.
#[derive(Debug)]
pub struct FeatureStore {
    conn: Connection,
}

impl FeatureStore {
    /// Open (or create) an archive database at the given path and ensure the schema exists.
    pub fn open(path: &Path) -> StoreResult<Self> {
        let conn = Connection::open(path)?;
        apply_migrations(&conn)?;
        Ok(Self { conn })
    }

    /// In-memory archive, mostly for tests and one-shot conversions.
    pub fn open_in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        apply_migrations(&conn)?;
        Ok(Self { conn })
    }

    /// Expose a reference to the underlying connection for advanced callers.
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Register a sample and return its row id. Re-registering the same
    /// SHA-256, in any hex case, keeps the original row.
    pub fn insert_sample(&self, record: &SampleRecord) -> StoreResult<i64> {
        let key = sample_key(&record.sha256);
        self.conn.execute(
            r#"
            INSERT INTO samples (sha256, md5, sha1, format, source, added_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(sha256) DO NOTHING
            "#,
            params![
                key,
                record.md5,
                record.sha1,
                record.format,
                record.source,
                record.added_at
            ],
        )?;
        let id = self.sample_id(&key)?;
        id.ok_or_else(|| StoreError::UnknownSample(record.sha256.clone()))
    }

    /// List all samples (ordered by id).
    pub fn list_samples(&self) -> StoreResult<Vec<SampleRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT sha256, md5, sha1, format, source, added_at
            FROM samples
            ORDER BY id
            "#,
        )?;
        let rows = stmt.query_map([], map_sample)?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    pub fn find_sample(&self, sha256: &str) -> StoreResult<Option<SampleRecord>> {
        let sample = self
            .conn
            .query_row(
                r#"
                SELECT sha256, md5, sha1, format, source, added_at
                FROM samples
                WHERE sha256 = ?1
                "#,
                params![sample_key(sha256)],
                map_sample,
            )
            .optional()?;
        Ok(sample)
    }

    /// Freeze and store features for a registered sample in one transaction.
    /// Returns the number of rows written.
    pub fn insert_features(&self, sha256: &str, features: &[StoredFeature]) -> StoreResult<usize> {
        let sample_id =
            self.sample_id(sha256)?.ok_or_else(|| StoreError::UnknownSample(sha256.to_string()))?;

        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(
                r#"
                INSERT INTO features (sample_id, scope, address, feature_type, record)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
            )?;
            for stored in features {
                let record = freeze(&stored.feature);
                let json = record.to_json()?;
                stmt.execute(params![
                    sample_id,
                    stored.scope.as_str(),
                    stored.address.map(address_to_sql),
                    record.feature_type().as_str(),
                    json
                ])?;
            }
        }
        tx.commit()?;

        debug!(sample = %sha256, count = features.len(), "stored features");
        Ok(features.len())
    }

    /// Load and thaw every feature stored for a sample, in insertion order.
    pub fn load_features(
        &self,
        sha256: &str,
        policy: UnknownFeaturePolicy,
    ) -> StoreResult<LoadedFeatures> {
        let sample_id =
            self.sample_id(sha256)?.ok_or_else(|| StoreError::UnknownSample(sha256.to_string()))?;

        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, scope, address, record
            FROM features
            WHERE sample_id = ?1
            ORDER BY id
            "#,
        )?;
        let rows = stmt.query_map(params![sample_id], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<i64>>(2)?,
                row.get::<_, String>(3)?,
            ))
        })?;

        let mut loaded = LoadedFeatures::default();
        for row in rows {
            let (row_id, scope, address, record) = row?;
            let scope = scope
                .parse::<Scope>()
                .map_err(|reason| StoreError::InvalidScope { row_id, reason })?;
            let value: serde_json::Value = serde_json::from_str(&record)?;
            match thaw_value(value) {
                Ok(feature) => loaded.features.push(StoredFeature {
                    scope,
                    address: address.map(address_from_sql),
                    feature,
                }),
                Err(FeatureError::UnknownFeatureType(tag))
                    if policy == UnknownFeaturePolicy::Skip =>
                {
                    warn!(sample = %sha256, row_id, feature_type = %tag, "skipping feature with unknown type");
                    loaded.skipped.push(SkippedRecord { row_id, feature_type: tag });
                }
                Err(err) => return Err(err.into()),
            }
        }
        Ok(loaded)
    }

    /// Count stored feature rows for a sample, readable or not.
    pub fn count_features(&self, sha256: &str) -> StoreResult<usize> {
        let count: i64 = self.conn.query_row(
            r#"
            SELECT COUNT(*)
            FROM features f
            JOIN samples s ON s.id = f.sample_id
            WHERE s.sha256 = ?1
            "#,
            params![sample_key(sha256)],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    fn sample_id(&self, sha256: &str) -> StoreResult<Option<i64>> {
        let id = self
            .conn
            .query_row(
                "SELECT id FROM samples WHERE sha256 = ?1",
                params![sample_key(sha256)],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }
}

fn map_sample(row: &rusqlite::Row<'_>) -> rusqlite::Result<SampleRecord> {
    Ok(SampleRecord {
        sha256: row.get(0)?,
        md5: row.get(1)?,
        sha1: row.get(2)?,
        format: row.get(3)?,
        source: row.get(4)?,
        added_at: row.get(5)?,
    })
}

// SQLite integers are signed; addresses keep their bit pattern.
fn address_to_sql(address: u64) -> i64 {
    address as i64
}

fn address_from_sql(value: i64) -> u64 {
    value as u64
}

/// Apply schema migrations to bring the database to the latest version.
///
/// We use `PRAGMA user_version` as the schema version indicator.
///
/// Version map:
/// - 0: no schema
/// - 1: samples
/// - 2: features
fn apply_migrations(conn: &Connection) -> StoreResult<()> {
    let current_version = current_schema_version(conn)?;

    // Reject DBs created with a newer schema than we support.
    if current_version > CURRENT_SCHEMA_VERSION {
        return Err(StoreError::UnsupportedSchemaVersion {
            found: current_version,
            min_supported: MIN_SUPPORTED_SCHEMA_VERSION,
            max_supported: CURRENT_SCHEMA_VERSION,
        });
    }

    if current_version == 0 {
        debug!("creating archive schema v1");
        conn.execute_batch(
            r#"
            BEGIN;
            CREATE TABLE IF NOT EXISTS samples (
                id        INTEGER PRIMARY KEY AUTOINCREMENT,
                sha256    TEXT NOT NULL UNIQUE,
                md5       TEXT NOT NULL,
                sha1      TEXT NOT NULL,
                format    TEXT NOT NULL,
                source    TEXT,
                added_at  TEXT NOT NULL
            );

            PRAGMA user_version = 1;
            COMMIT;
            "#,
        )?;
    }

    if current_version < 2 {
        debug!("migrating archive schema to v2");
        conn.execute_batch(
            r#"
            BEGIN;
            CREATE TABLE IF NOT EXISTS features (
                id            INTEGER PRIMARY KEY AUTOINCREMENT,
                sample_id     INTEGER NOT NULL REFERENCES samples(id),
                scope         TEXT NOT NULL,
                address       INTEGER,
                feature_type  TEXT NOT NULL,
                record        TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_features_sample ON features(sample_id);

            PRAGMA user_version = 2;
            COMMIT;
            "#,
        )?;
    }

    Ok(())
}

/// Read the SQLite schema version from `PRAGMA user_version`.
fn current_schema_version(conn: &Connection) -> StoreResult<i32> {
    let version: i32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    Ok(version)
}
