use crate::types::{DigestError, LedgerKey, LedgerRecord, Result, SeenStatus};
use chrono::NaiveDate;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Persistent record of which item keys were surfaced and on which day.
///
/// One pool is shared by every enrichment task of a run. Writes are upserts, so two
/// tasks that both saw a key as new still leave a single row behind.
pub struct SeenLedger {
    pool: SqlitePool,
    today: NaiveDate,
}

impl SeenLedger {
    pub async fn open(path: &Path, today: NaiveDate) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(Duration::from_secs(10));

        let pool = SqlitePoolOptions::new()
            .max_connections(8)
            .connect_with(options)
            .await?;

        let ledger = Self { pool, today };
        ledger.setup_schema().await?;

        info!("Opened seen ledger at {} (today is {})", path.display(), today);
        Ok(ledger)
    }

    pub async fn setup_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS seen (
                url TEXT PRIMARY KEY,
                date TEXT NOT NULL,
                summary TEXT
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        // Older ledgers were created without a key constraint; the upsert needs one.
        sqlx::query("CREATE UNIQUE INDEX IF NOT EXISTS seen_url_unique ON seen (url)")
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub async fn get_record(&self, key: &LedgerKey) -> Result<Option<LedgerRecord>> {
        let row = sqlx::query("SELECT url, date, summary FROM seen WHERE url = ?1")
            .bind(key.as_str())
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(r) => {
                let date: String = r.try_get("date")?;
                let date = NaiveDate::parse_from_str(&date, DATE_FORMAT).map_err(|e| {
                    DigestError::General(format!("Bad ledger date '{}' for {}: {}", date, key, e))
                })?;
                Ok(Some(LedgerRecord {
                    key: LedgerKey::new(r.try_get::<String, _>("url")?.as_str()),
                    date,
                    summary: r.try_get("summary")?,
                }))
            }
            None => Ok(None),
        }
    }

    /// Read failures are logged and reported as unseen.
    pub async fn lookup(&self, key: &LedgerKey) -> SeenStatus {
        match self.get_record(key).await {
            Ok(Some(record)) => SeenStatus::from_record(&record, self.today),
            Ok(None) => SeenStatus::unseen(),
            Err(e) => {
                warn!("Ledger lookup failed for {}, treating as unseen: {}", key, e);
                SeenStatus::unseen()
            }
        }
    }

    /// Marks `key` as shown today.
    ///
    /// On conflict the stored date only moves forward, and a non-empty incoming
    /// summary replaces the cached one while an empty one leaves it untouched.
    pub async fn record(&self, key: &LedgerKey, summary: &str) -> Result<()> {
        let summary = Some(summary).filter(|s| !s.is_empty());

        sqlx::query(
            r#"
            INSERT INTO seen (url, date, summary)
            VALUES (?1, ?2, ?3)
            ON CONFLICT (url) DO UPDATE SET
                date = MAX(seen.date, excluded.date),
                summary = COALESCE(excluded.summary, seen.summary)
            "#,
        )
        .bind(key.as_str())
        .bind(self.today.format(DATE_FORMAT).to_string())
        .bind(summary)
        .execute(&self.pool)
        .await?;

        debug!("Recorded {} as seen on {}", key, self.today);
        Ok(())
    }

    pub async fn count(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM seen")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.try_get("count")?)
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
