//! SQLite vector collection implementation.

use std::cmp::Ordering;
use std::path::Path;

use async_trait::async_trait;
use mnemo_protocols::embedding::cosine_distance;
use mnemo_protocols::{
    CollectionError, CollectionHit, CollectionRecord, Metadata, MetadataFilter, VectorCollection,
};
use rusqlite::{params, OptionalExtension};
use tokio_rusqlite::Connection;
use tracing::debug;

use crate::schema::init_schema;
use crate::vector;

/// A stored row: id, document, metadata JSON, vector blob.
type Row = (String, String, String, Vec<u8>);

/// SQLite-backed vector collection.
pub struct SqliteCollection {
    conn: Connection,
    dimension: Option<usize>,
}

impl SqliteCollection {
    /// Create a new in-memory database.
    pub async fn in_memory() -> Result<Self, CollectionError> {
        let conn = Connection::open_in_memory()
            .await
            .map_err(|e| CollectionError::Storage(e.to_string()))?;
        Self::init(conn).await
    }

    /// Open (or create) a file-backed database.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, CollectionError> {
        let path = path.as_ref().to_path_buf();
        let conn = Connection::open(path)
            .await
            .map_err(|e| CollectionError::Storage(e.to_string()))?;
        Self::init(conn).await
    }

    async fn init(conn: Connection) -> Result<Self, CollectionError> {
        conn.call(|conn| init_schema(conn))
            .await
            .map_err(|e| CollectionError::Storage(e.to_string()))?;
        Ok(Self {
            conn,
            dimension: None,
        })
    }

    /// Reject vectors of any other dimension.
    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = Some(dimension);
        self
    }

    fn check_dimension(&self, vector: &[f32]) -> Result<(), CollectionError> {
        match self.dimension {
            Some(expected) if expected != vector.len() => Err(CollectionError::DimensionMismatch {
                expected,
                actual: vector.len(),
            }),
            _ => Ok(()),
        }
    }

    async fn load_partition(&self, user_id: &str) -> Result<Vec<Row>, CollectionError> {
        let user_id = user_id.to_string();
        self.conn
            .call(move |conn| {
                let mut stmt = conn.prepare(
                    "SELECT id, document, metadata, vector FROM records WHERE user_id = ?1",
                )?;
                let rows = stmt
                    .query_map([&user_id], |row| {
                        Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?))
                    })?
                    .collect::<Result<Vec<Row>, _>>()?;
                Ok(rows)
            })
            .await
            .map_err(|e| CollectionError::Query(e.to_string()))
    }
}

fn parse_metadata(raw: &str) -> Result<Metadata, CollectionError> {
    serde_json::from_str(raw).map_err(|e| CollectionError::Serialization(e.to_string()))
}

#[async_trait]
impl VectorCollection for SqliteCollection {
    async fn upsert(&self, user_id: &str, record: CollectionRecord) -> Result<(), CollectionError> {
        self.check_dimension(&record.vector)?;
        let metadata = serde_json::to_string(&record.metadata)
            .map_err(|e| CollectionError::Serialization(e.to_string()))?;
        let blob = vector::encode(&record.vector);
        let user_id = user_id.to_string();

        debug!("Upserting record {} for user {}", record.id, user_id);
        self.conn
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO records (user_id, id, document, metadata, vector)
                     VALUES (?1, ?2, ?3, ?4, ?5)
                     ON CONFLICT(user_id, id) DO UPDATE SET
                        document = excluded.document,
                        metadata = excluded.metadata,
                        vector = excluded.vector",
                    params![user_id, record.id, record.document, metadata, blob],
                )?;
                Ok(())
            })
            .await
            .map_err(|e| CollectionError::Storage(e.to_string()))
    }

    async fn query(
        &self,
        user_id: &str,
        query_vector: &[f32],
        filter: Option<&MetadataFilter>,
        k: usize,
    ) -> Result<Vec<CollectionHit>, CollectionError> {
        self.check_dimension(query_vector)?;

        let mut hits = Vec::new();
        for (id, document, raw_metadata, blob) in self.load_partition(user_id).await? {
            let metadata = parse_metadata(&raw_metadata)?;
            if filter.is_some_and(|f| !f.matches(&metadata)) {
                continue;
            }
            let stored = vector::decode(&blob)?;
            hits.push(CollectionHit {
                id,
                document,
                metadata,
                distance: cosine_distance(query_vector, &stored),
            });
        }

        hits.sort_by(|a, b| {
            a.distance
                .partial_cmp(&b.distance)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        hits.truncate(k);
        Ok(hits)
    }

    async fn get(&self, user_id: &str, id: &str) -> Result<Option<CollectionHit>, CollectionError> {
        let user_id = user_id.to_string();
        let id = id.to_string();
        let row = self
            .conn
            .call(move |conn| {
                let row = conn
                    .query_row(
                        "SELECT id, document, metadata FROM records WHERE user_id = ?1 AND id = ?2",
                        params![user_id, id],
                        |row| {
                            Ok::<_, rusqlite::Error>((
                                row.get::<_, String>(0)?,
                                row.get::<_, String>(1)?,
                                row.get::<_, String>(2)?,
                            ))
                        },
                    )
                    .optional()?;
                Ok(row)
            })
            .await
            .map_err(|e| CollectionError::Query(e.to_string()))?;

        row.map(|(id, document, raw_metadata)| {
            Ok(CollectionHit {
                id,
                document,
                metadata: parse_metadata(&raw_metadata)?,
                distance: 0.0,
            })
        })
        .transpose()
    }

    async fn update_metadata(
        &self,
        user_id: &str,
        id: &str,
        metadata: Metadata,
    ) -> Result<bool, CollectionError> {
        let metadata = serde_json::to_string(&metadata)
            .map_err(|e| CollectionError::Serialization(e.to_string()))?;
        let user_id = user_id.to_string();
        let id = id.to_string();
        self.conn
            .call(move |conn| {
                let changed = conn.execute(
                    "UPDATE records SET metadata = ?1 WHERE user_id = ?2 AND id = ?3",
                    params![metadata, user_id, id],
                )?;
                Ok(changed > 0)
            })
            .await
            .map_err(|e| CollectionError::Storage(e.to_string()))
    }

    async fn delete(&self, user_id: &str, id: &str) -> Result<bool, CollectionError> {
        let user_id = user_id.to_string();
        let id = id.to_string();
        self.conn
            .call(move |conn| {
                let changed = conn.execute(
                    "DELETE FROM records WHERE user_id = ?1 AND id = ?2",
                    params![user_id, id],
                )?;
                Ok(changed > 0)
            })
            .await
            .map_err(|e| CollectionError::Storage(e.to_string()))
    }

    async fn count(&self, user_id: &str) -> Result<usize, CollectionError> {
        let user_id = user_id.to_string();
        self.conn
            .call(move |conn| {
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM records WHERE user_id = ?1",
                    [&user_id],
                    |row| row.get(0),
                )?;
                Ok(count as usize)
            })
            .await
            .map_err(|e| CollectionError::Query(e.to_string()))
    }
}

#[cfg(test)]
#[path = "collection_tests.rs"]
mod tests;
