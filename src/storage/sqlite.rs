//! SQLite storage backend implementation
//!
//! Persists quality records in a single `food_quality` table through a
//! deadpool-sqlite connection pool. Two indexes back the aggregation
//! queries: `(branch, created_at)` and `(chef_name, dish_name, created_at)`.

use crate::clock::{Clock, SystemClock};
use crate::error::{QualityError, Result};
use crate::storage::{validate_record, RecordStore};
use crate::types::{NewRecord, QualityRecord, RecordId, Role, Scope};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use deadpool_sqlite::{Config, Pool, Runtime};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Fixed-width UTC format so text order equals time order
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

/// Format written by earlier deployments (`CURRENT_TIMESTAMP` style)
const LEGACY_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS food_quality (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    branch TEXT NOT NULL,
    chef_name TEXT NOT NULL,
    dish_name TEXT NOT NULL,
    score INTEGER NOT NULL CHECK(score BETWEEN 1 AND 10),
    notes TEXT NOT NULL DEFAULT '',
    created_at TEXT NOT NULL,
    submitted_by TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_food_branch_time ON food_quality(branch, created_at);
CREATE INDEX IF NOT EXISTS idx_food_chef_dish_time ON food_quality(chef_name, dish_name, created_at);
"#;

const SELECT_COLUMNS: &str = "SELECT id, branch, chef_name, dish_name, score, notes, \
                              created_at, submitted_by FROM food_quality";

/// SQLite record store
pub struct SqliteRecordStore {
    pool: Pool,
    clock: Arc<dyn Clock>,
    path: String,
}

/// Row as read from SQLite, before timestamp and role parsing
struct RawRow {
    id: i64,
    branch: String,
    chef_name: String,
    dish_name: String,
    score: i64,
    notes: Option<String>,
    created_at: String,
    submitted_by: Option<String>,
}

impl SqliteRecordStore {
    /// Open (and create if missing) the database at `db_path`
    ///
    /// # Example
    /// ```ignore
    /// let store = SqliteRecordStore::open("food_quality.db").await?;
    /// ```
    pub async fn open<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        Self::open_with_clock(db_path, Arc::new(SystemClock)).await
    }

    /// Open with an explicit time source for `created_at`
    pub async fn open_with_clock<P: AsRef<Path>>(
        db_path: P,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let path = db_path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let path_str = path.to_string_lossy().to_string();
        info!("Opening record store at: {}", path_str);

        let pool = Config::new(path_str.clone())
            .create_pool(Runtime::Tokio1)
            .map_err(|e| {
                QualityError::Database(format!("Failed to create connection pool: {}", e))
            })?;

        let store = Self {
            pool,
            clock,
            path: path_str,
        };
        store.init().await?;
        Ok(store)
    }

    /// Create table and indexes; safe to call repeatedly
    pub async fn init(&self) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute_batch(SCHEMA)?;
            Ok(())
        })
        .await?;

        debug!("Record store schema ready");
        Ok(())
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    /// Run `f` on a pooled connection
    async fn with_conn<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.pool.get().await.map_err(|e| {
            QualityError::Database(format!("Failed to get connection from pool: {}", e))
        })?;

        conn.interact(f)
            .await
            .map_err(|e| QualityError::Database(format!("Pool interaction failed: {}", e)))?
    }

    async fn query_records(&self, branch: Option<String>) -> Result<Vec<QualityRecord>> {
        let raw = self
            .with_conn(move |conn| {
                let rows = match branch {
                    Some(branch) => {
                        let sql = format!(
                            "{} WHERE branch = ?1 ORDER BY created_at DESC, id DESC",
                            SELECT_COLUMNS
                        );
                        let mut stmt = conn.prepare(&sql)?;
                        let rows = stmt
                            .query_map(params![branch], read_row)?
                            .collect::<rusqlite::Result<Vec<_>>>()?;
                        rows
                    }
                    None => {
                        let sql = format!("{} ORDER BY created_at DESC, id DESC", SELECT_COLUMNS);
                        let mut stmt = conn.prepare(&sql)?;
                        let rows = stmt
                            .query_map([], read_row)?
                            .collect::<rusqlite::Result<Vec<_>>>()?;
                        rows
                    }
                };
                Ok(rows)
            })
            .await?;

        let mut records = raw
            .into_iter()
            .map(row_to_record)
            .collect::<Result<Vec<_>>>()?;

        // Legacy and current timestamp formats do not sort together as text
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(records)
    }
}

fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawRow> {
    Ok(RawRow {
        id: row.get(0)?,
        branch: row.get(1)?,
        chef_name: row.get(2)?,
        dish_name: row.get(3)?,
        score: row.get(4)?,
        notes: row.get(5)?,
        created_at: row.get(6)?,
        submitted_by: row.get(7)?,
    })
}

fn row_to_record(raw: RawRow) -> Result<QualityRecord> {
    let created_at = parse_timestamp(&raw.created_at)?;

    // Rows without a tag predate role tracking; they were entered at headquarters
    let submitted_by = match raw.submitted_by.as_deref() {
        None | Some("") => Role::Headquarters,
        Some(tag) => Role::from_tag(tag).ok_or_else(|| {
            QualityError::Database(format!("Unknown submitted_by tag '{}' on row {}", tag, raw.id))
        })?,
    };

    let score = u8::try_from(raw.score)
        .map_err(|_| QualityError::Database(format!("Score out of range on row {}", raw.id)))?;

    Ok(QualityRecord {
        id: RecordId(raw.id),
        branch: raw.branch,
        chef_name: raw.chef_name,
        dish_name: raw.dish_name,
        score,
        notes: raw.notes.unwrap_or_default(),
        created_at,
        submitted_by,
    })
}

pub(crate) fn format_timestamp(instant: &DateTime<Utc>) -> String {
    instant.format(TIMESTAMP_FORMAT).to_string()
}

pub(crate) fn parse_timestamp(text: &str) -> Result<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Ok(parsed.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(text, LEGACY_TIMESTAMP_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|e| QualityError::Database(format!("Invalid created_at '{}': {}", text, e)))
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn insert(&self, record: NewRecord) -> Result<RecordId> {
        let valid = validate_record(&record).map_err(|e| {
            debug!("Rejected quality record: {}", e);
            QualityError::Validation(e)
        })?;

        let created_at = format_timestamp(&self.clock.now());
        debug!(
            "Storing quality record: {} / {} / {} = {}",
            valid.branch, valid.chef_name, valid.dish_name, valid.score
        );

        let id = self
            .with_conn(move |conn| {
                conn.execute(
                    r#"
                    INSERT INTO food_quality
                        (branch, chef_name, dish_name, score, notes, created_at, submitted_by)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                    "#,
                    params![
                        valid.branch,
                        valid.chef_name,
                        valid.dish_name,
                        i64::from(valid.score),
                        valid.notes,
                        created_at,
                        valid.submitted_by,
                    ],
                )?;
                Ok(conn.last_insert_rowid())
            })
            .await?;

        debug!("Quality record stored: {}", id);
        Ok(RecordId(id))
    }

    async fn get(&self, id: RecordId) -> Result<Option<QualityRecord>> {
        let raw = self
            .with_conn(move |conn| {
                let sql = format!("{} WHERE id = ?1", SELECT_COLUMNS);
                let mut stmt = conn.prepare(&sql)?;
                let mut rows = stmt.query_map(params![id.0], read_row)?;
                Ok(rows.next().transpose()?)
            })
            .await?;

        raw.map(row_to_record).transpose()
    }

    async fn load_all(&self) -> Result<Vec<QualityRecord>> {
        self.query_records(None).await
    }

    async fn load_scope(&self, scope: &Scope) -> Result<Vec<QualityRecord>> {
        self.query_records(scope.branch().map(str::to_string)).await
    }

    async fn count(&self) -> Result<usize> {
        let count: i64 = self
            .with_conn(|conn| {
                let count =
                    conn.query_row("SELECT COUNT(*) FROM food_quality", [], |row| row.get(0))?;
                Ok(count)
            })
            .await?;
        Ok(count as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use chrono::{Duration, TimeZone};
    use tempfile::TempDir;

    fn new_record(branch: &str, chef: &str, dish: &str, score: i64) -> NewRecord {
        NewRecord {
            branch: branch.to_string(),
            chef_name: chef.to_string(),
            dish_name: dish.to_string(),
            score,
            notes: String::new(),
            submitted_by: Role::Branch,
        }
    }

    async fn store_with_clock(dir: &TempDir) -> (SqliteRecordStore, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 5, 15, 9, 0, 0).unwrap(),
        ));
        let store = SqliteRecordStore::open_with_clock(dir.path().join("fq.db"), clock.clone())
            .await
            .unwrap();
        (store, clock)
    }

    #[tokio::test]
    async fn test_insert_and_load_newest_first() {
        let dir = TempDir::new().unwrap();
        let (store, clock) = store_with_clock(&dir).await;

        let first = store.insert(new_record("Haifa", "Dana", "Pad Thai", 8)).await.unwrap();
        clock.advance(Duration::minutes(5));
        let second = store.insert(new_record("Savyon", "Omer", "Fried Rice", 6)).await.unwrap();

        assert!(second > first);

        let records = store.load_all().await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, second);
        assert_eq!(records[1].id, first);
        assert_eq!(records[1].created_at, Utc.with_ymd_and_hms(2024, 5, 15, 9, 0, 0).unwrap());
        assert_eq!(store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_get_by_id() {
        let dir = TempDir::new().unwrap();
        let (store, _) = store_with_clock(&dir).await;

        let id = store.insert(new_record("Haifa", "Dana", "Pad Thai", 8)).await.unwrap();
        let record = store.get(id).await.unwrap().unwrap();
        assert_eq!(record.chef_name, "Dana");
        assert_eq!(record.score, 8);

        assert!(store.get(RecordId(id.0 + 100)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_empty_store_loads_empty() {
        let dir = TempDir::new().unwrap();
        let (store, _) = store_with_clock(&dir).await;
        assert!(store.load_all().await.unwrap().is_empty());
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_out_of_range_score_persists_nothing() {
        let dir = TempDir::new().unwrap();
        let (store, _) = store_with_clock(&dir).await;

        let err = store.insert(new_record("Haifa", "Dana", "Pad Thai", 0)).await.unwrap_err();
        assert!(err.is_validation());
        let err = store.insert(new_record("Haifa", "Dana", "Pad Thai", 11)).await.unwrap_err();
        assert!(err.is_validation());

        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_check_constraint_backs_up_validation() {
        let dir = TempDir::new().unwrap();
        let (store, _) = store_with_clock(&dir).await;

        let result = store
            .with_conn(|conn| {
                conn.execute(
                    "INSERT INTO food_quality (branch, chef_name, dish_name, score, created_at, submitted_by)
                     VALUES ('Haifa', 'Dana', 'Pad Thai', 42, '2024-01-01T00:00:00.000000Z', 'branch')",
                    [],
                )?;
                Ok(())
            })
            .await;

        assert!(matches!(result, Err(QualityError::Database(_))));
    }

    #[tokio::test]
    async fn test_load_scope_filters_branch() {
        let dir = TempDir::new().unwrap();
        let (store, _) = store_with_clock(&dir).await;

        store.insert(new_record("Haifa", "Dana", "Pad Thai", 8)).await.unwrap();
        store.insert(new_record("Savyon", "Omer", "Pad Thai", 5)).await.unwrap();

        let haifa = store.load_scope(&Scope::Branch("Haifa".to_string())).await.unwrap();
        assert_eq!(haifa.len(), 1);
        assert_eq!(haifa[0].chef_name, "Dana");

        let network = store.load_scope(&Scope::Network).await.unwrap();
        assert_eq!(network.len(), 2);
    }

    #[tokio::test]
    async fn test_reads_legacy_rows() {
        let dir = TempDir::new().unwrap();
        let (store, _) = store_with_clock(&dir).await;

        store
            .with_conn(|conn| {
                conn.execute(
                    "INSERT INTO food_quality (branch, chef_name, dish_name, score, created_at, submitted_by)
                     VALUES ('Haifa', 'Dana', 'Pad Thai', 7, '2023-11-02 18:30:00', '')",
                    [],
                )?;
                Ok(())
            })
            .await
            .unwrap();

        let records = store.load_all().await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].notes, "");
        assert_eq!(records[0].submitted_by, Role::Headquarters);
        assert_eq!(
            records[0].created_at,
            Utc.with_ymd_and_hms(2023, 11, 2, 18, 30, 0).unwrap()
        );
    }

    #[test]
    fn test_timestamp_format_is_fixed_width() {
        let a = format_timestamp(&Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
        let b = format_timestamp(
            &(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::microseconds(1500)),
        );
        assert_eq!(a.len(), b.len());
        assert!(a < b);
        assert_eq!(
            parse_timestamp(&a).unwrap(),
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
        );
    }
}
