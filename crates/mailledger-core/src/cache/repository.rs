//! Message cache storage repository.

use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

use super::model::{CachedBodyPart, CachedMessageContent, CachedMessageSummary, CachedSyncState};
use crate::{AccountId, Result};

/// Repository for message cache storage and retrieval.
pub struct CacheRepository {
    pool: SqlitePool,
}

impl CacheRepository {
    /// Create a new repository with the given database path.
    ///
    /// Creates the database and tables if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails or schema creation fails.
    pub async fn new(database_path: &str) -> Result<Self> {
        let url = format!("sqlite:{database_path}?mode=rwc");
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await?;

        let repo = Self { pool };
        repo.initialize().await?;
        Ok(repo)
    }

    /// Create an in-memory repository for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails or schema creation fails.
    #[allow(dead_code)]
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;

        let repo = Self { pool };
        repo.initialize().await?;
        Ok(repo)
    }

    /// Initialize database schema.
    async fn initialize(&self) -> Result<()> {
        // Message summaries table (for list view)
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS cached_message_summaries (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                account_id INTEGER NOT NULL,
                folder_path TEXT NOT NULL,
                uid INTEGER NOT NULL,
                from_name TEXT NOT NULL DEFAULT '',
                from_email TEXT NOT NULL DEFAULT '',
                subject TEXT NOT NULL DEFAULT '',
                snippet TEXT NOT NULL DEFAULT '',
                date TEXT NOT NULL DEFAULT '',
                is_read INTEGER NOT NULL DEFAULT 0,
                is_flagged INTEGER NOT NULL DEFAULT 0,
                has_attachments INTEGER NOT NULL DEFAULT 0,
                cached_at TEXT NOT NULL,
                UNIQUE(account_id, folder_path, uid)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        // Message content table (for viewing)
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS cached_message_content (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                account_id INTEGER NOT NULL,
                folder_path TEXT NOT NULL,
                uid INTEGER NOT NULL,
                from_full TEXT NOT NULL DEFAULT '',
                to_recipients TEXT NOT NULL DEFAULT '',
                cc_recipients TEXT NOT NULL DEFAULT '',
                subject TEXT NOT NULL DEFAULT '',
                date TEXT NOT NULL DEFAULT '',
                body_text TEXT,
                body_html TEXT,
                attachments_json TEXT,
                cached_at TEXT NOT NULL,
                UNIQUE(account_id, folder_path, uid)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        // Indexes for efficient lookups
        sqlx::query(
            r"
            CREATE INDEX IF NOT EXISTS idx_summaries_folder
            ON cached_message_summaries(account_id, folder_path)
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE INDEX IF NOT EXISTS idx_content_lookup
            ON cached_message_content(account_id, folder_path, uid)
            ",
        )
        .execute(&self.pool)
        .await?;

        // Synchronisation checkpoint: one row per (account, folder).
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS cached_sync_state (
                account_id INTEGER NOT NULL,
                folder_path TEXT NOT NULL,
                uidvalidity INTEGER NOT NULL,
                highestmodseq INTEGER,
                cached_at TEXT NOT NULL,
                PRIMARY KEY (account_id, folder_path)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        // seq -> UID map, replaced wholesale on each sync.
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS cached_uid_map (
                account_id INTEGER NOT NULL,
                folder_path TEXT NOT NULL,
                seq INTEGER NOT NULL,
                uid INTEGER NOT NULL,
                PRIMARY KEY (account_id, folder_path, seq)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        // Per-message flags, tracked independently of the summary table's
        // is_read/is_flagged convenience columns.
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS cached_flags (
                account_id INTEGER NOT NULL,
                folder_path TEXT NOT NULL,
                uid INTEGER NOT NULL,
                flags_json TEXT NOT NULL,
                PRIMARY KEY (account_id, folder_path, uid)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS cached_body_parts (
                account_id INTEGER NOT NULL,
                folder_path TEXT NOT NULL,
                uid INTEGER NOT NULL,
                part_number TEXT NOT NULL,
                content_type TEXT NOT NULL DEFAULT '',
                data BLOB NOT NULL,
                cached_at TEXT NOT NULL,
                PRIMARY KEY (account_id, folder_path, uid, part_number)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        // Threading is stored as a single serialized blob per mailbox
        // (the client is responsible for encoding/decoding it).
        sqlx::query(
            r"
            CREATE TABLE IF NOT EXISTS cached_threading (
                account_id INTEGER NOT NULL,
                folder_path TEXT NOT NULL,
                threading_json TEXT NOT NULL,
                cached_at TEXT NOT NULL,
                PRIMARY KEY (account_id, folder_path)
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Cache a message summary.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn cache_summary(&self, summary: &CachedMessageSummary) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO cached_message_summaries
                (account_id, folder_path, uid, from_name, from_email, subject, snippet,
                 date, is_read, is_flagged, has_attachments, cached_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(account_id, folder_path, uid) DO UPDATE SET
                from_name = excluded.from_name,
                from_email = excluded.from_email,
                subject = excluded.subject,
                snippet = excluded.snippet,
                date = excluded.date,
                is_read = excluded.is_read,
                is_flagged = excluded.is_flagged,
                has_attachments = excluded.has_attachments,
                cached_at = excluded.cached_at
            ",
        )
        .bind(summary.account_id.0)
        .bind(&summary.folder_path)
        .bind(summary.uid)
        .bind(&summary.from_name)
        .bind(&summary.from_email)
        .bind(&summary.subject)
        .bind(&summary.snippet)
        .bind(&summary.date)
        .bind(summary.is_read)
        .bind(summary.is_flagged)
        .bind(summary.has_attachments)
        .bind(summary.cached_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Cache multiple message summaries in a batch.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn cache_summaries(&self, summaries: &[CachedMessageSummary]) -> Result<()> {
        for summary in summaries {
            self.cache_summary(summary).await?;
        }
        Ok(())
    }

    /// Get cached summaries for a folder.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn get_summaries(
        &self,
        account_id: AccountId,
        folder_path: &str,
    ) -> Result<Vec<CachedMessageSummary>> {
        let rows = sqlx::query(
            r"
            SELECT account_id, folder_path, uid, from_name, from_email, subject, snippet,
                   date, is_read, is_flagged, has_attachments, cached_at
            FROM cached_message_summaries
            WHERE account_id = ? AND folder_path = ?
            ORDER BY uid DESC
            ",
        )
        .bind(account_id.0)
        .bind(folder_path)
        .fetch_all(&self.pool)
        .await?;

        let summaries = rows
            .iter()
            .filter_map(|row| {
                let cached_at_str: String = row.get("cached_at");
                let cached_at = DateTime::parse_from_rfc3339(&cached_at_str)
                    .ok()?
                    .with_timezone(&Utc);

                Some(CachedMessageSummary {
                    account_id: AccountId(row.get::<i64, _>("account_id")),
                    folder_path: row.get("folder_path"),
                    uid: row.get::<u32, _>("uid"),
                    from_name: row.get("from_name"),
                    from_email: row.get("from_email"),
                    subject: row.get("subject"),
                    snippet: row.get("snippet"),
                    date: row.get("date"),
                    is_read: row.get::<bool, _>("is_read"),
                    is_flagged: row.get::<bool, _>("is_flagged"),
                    has_attachments: row.get::<bool, _>("has_attachments"),
                    cached_at,
                })
            })
            .collect();

        Ok(summaries)
    }

    /// Cache message content.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn cache_content(&self, content: &CachedMessageContent) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO cached_message_content
                (account_id, folder_path, uid, from_full, to_recipients, cc_recipients,
                 subject, date, body_text, body_html, attachments_json, cached_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(account_id, folder_path, uid) DO UPDATE SET
                from_full = excluded.from_full,
                to_recipients = excluded.to_recipients,
                cc_recipients = excluded.cc_recipients,
                subject = excluded.subject,
                date = excluded.date,
                body_text = excluded.body_text,
                body_html = excluded.body_html,
                attachments_json = excluded.attachments_json,
                cached_at = excluded.cached_at
            ",
        )
        .bind(content.account_id.0)
        .bind(&content.folder_path)
        .bind(content.uid)
        .bind(&content.from)
        .bind(&content.to)
        .bind(&content.cc)
        .bind(&content.subject)
        .bind(&content.date)
        .bind(&content.body_text)
        .bind(&content.body_html)
        .bind(&content.attachments_json)
        .bind(content.cached_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get cached content for a message.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn get_content(
        &self,
        account_id: AccountId,
        folder_path: &str,
        uid: u32,
    ) -> Result<Option<CachedMessageContent>> {
        let row = sqlx::query(
            r"
            SELECT account_id, folder_path, uid, from_full, to_recipients, cc_recipients,
                   subject, date, body_text, body_html, attachments_json, cached_at
            FROM cached_message_content
            WHERE account_id = ? AND folder_path = ? AND uid = ?
            ",
        )
        .bind(account_id.0)
        .bind(folder_path)
        .bind(uid)
        .fetch_optional(&self.pool)
        .await?;

        let content = row.and_then(|row| {
            let cached_at_str: String = row.get("cached_at");
            let cached_at = DateTime::parse_from_rfc3339(&cached_at_str)
                .ok()?
                .with_timezone(&Utc);

            Some(CachedMessageContent {
                account_id: AccountId(row.get::<i64, _>("account_id")),
                folder_path: row.get("folder_path"),
                uid: row.get::<u32, _>("uid"),
                from: row.get("from_full"),
                to: row.get("to_recipients"),
                cc: row.get("cc_recipients"),
                subject: row.get("subject"),
                date: row.get("date"),
                body_text: row.get("body_text"),
                body_html: row.get("body_html"),
                attachments_json: row.get("attachments_json"),
                cached_at,
            })
        });

        Ok(content)
    }

    /// Clear cache for a specific folder.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn clear_folder(&self, account_id: AccountId, folder_path: &str) -> Result<()> {
        sqlx::query(
            r"DELETE FROM cached_message_summaries WHERE account_id = ? AND folder_path = ?",
        )
        .bind(account_id.0)
        .bind(folder_path)
        .execute(&self.pool)
        .await?;

        sqlx::query(r"DELETE FROM cached_message_content WHERE account_id = ? AND folder_path = ?")
            .bind(account_id.0)
            .bind(folder_path)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Clear all cache for an account.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn clear_account(&self, account_id: AccountId) -> Result<()> {
        sqlx::query(r"DELETE FROM cached_message_summaries WHERE account_id = ?")
            .bind(account_id.0)
            .execute(&self.pool)
            .await?;

        sqlx::query(r"DELETE FROM cached_message_content WHERE account_id = ?")
            .bind(account_id.0)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Update message flags in cache (read/flagged status).
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn update_flags(
        &self,
        account_id: AccountId,
        folder_path: &str,
        uid: u32,
        is_read: bool,
        is_flagged: bool,
    ) -> Result<()> {
        sqlx::query(
            r"
            UPDATE cached_message_summaries
            SET is_read = ?, is_flagged = ?
            WHERE account_id = ? AND folder_path = ? AND uid = ?
            ",
        )
        .bind(is_read)
        .bind(is_flagged)
        .bind(account_id.0)
        .bind(folder_path)
        .bind(uid)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Check if we have cached data for a folder.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn has_cached_folder(
        &self,
        account_id: AccountId,
        folder_path: &str,
    ) -> Result<bool> {
        let row = sqlx::query(
            r"
            SELECT COUNT(*) as count
            FROM cached_message_summaries
            WHERE account_id = ? AND folder_path = ?
            ",
        )
        .bind(account_id.0)
        .bind(folder_path)
        .fetch_one(&self.pool)
        .await?;

        let count: i64 = row.get("count");
        Ok(count > 0)
    }

    /// Gets the cached synchronisation checkpoint for a mailbox.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn get_sync_state(
        &self,
        account_id: AccountId,
        folder_path: &str,
    ) -> Result<Option<CachedSyncState>> {
        let row = sqlx::query(
            r"
            SELECT account_id, folder_path, uidvalidity, highestmodseq, cached_at
            FROM cached_sync_state
            WHERE account_id = ? AND folder_path = ?
            ",
        )
        .bind(account_id.0)
        .bind(folder_path)
        .fetch_optional(&self.pool)
        .await?;

        let state = row.and_then(|row| {
            let cached_at_str: String = row.get("cached_at");
            let cached_at = DateTime::parse_from_rfc3339(&cached_at_str)
                .ok()?
                .with_timezone(&Utc);

            Some(CachedSyncState {
                account_id: AccountId(row.get::<i64, _>("account_id")),
                folder_path: row.get("folder_path"),
                uidvalidity: row.get::<u32, _>("uidvalidity"),
                highestmodseq: row.get::<Option<i64>, _>("highestmodseq").map(|v| v as u64),
                cached_at,
            })
        });

        Ok(state)
    }

    /// Sets (replaces) the synchronisation checkpoint for a mailbox.
    ///
    /// If the `UIDVALIDITY` differs from what was previously cached, callers
    /// must discard dependent per-message metadata first - see
    /// [`invalidate_on_uidvalidity_change`](Self::invalidate_on_uidvalidity_change).
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn set_sync_state(&self, state: &CachedSyncState) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO cached_sync_state (account_id, folder_path, uidvalidity, highestmodseq, cached_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(account_id, folder_path) DO UPDATE SET
                uidvalidity = excluded.uidvalidity,
                highestmodseq = excluded.highestmodseq,
                cached_at = excluded.cached_at
            ",
        )
        .bind(state.account_id.0)
        .bind(&state.folder_path)
        .bind(state.uidvalidity)
        .bind(state.highestmodseq.map(|v| v as i64))
        .bind(state.cached_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// If the mailbox's cached `UIDVALIDITY` differs from `new_uidvalidity`
    /// (or nothing is cached yet), discards every piece of per-message
    /// metadata cached for it - summaries, content, flags, body parts,
    /// threading, and the UID map - since none of it can be trusted against
    /// the new UID namespace. Returns whether an invalidation occurred.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn invalidate_on_uidvalidity_change(
        &self,
        account_id: AccountId,
        folder_path: &str,
        new_uidvalidity: u32,
    ) -> Result<bool> {
        let changed = match self.get_sync_state(account_id, folder_path).await? {
            Some(state) => state.uidvalidity != new_uidvalidity,
            None => false,
        };

        if changed {
            self.clear_all_messages(account_id, folder_path).await?;
            self.clear_uid_map(account_id, folder_path).await?;
        }

        Ok(changed)
    }

    /// Gets the cached seq -> UID map for a mailbox, ordered by sequence number.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn get_uid_map(
        &self,
        account_id: AccountId,
        folder_path: &str,
    ) -> Result<Vec<(u32, u32)>> {
        let rows = sqlx::query(
            r"
            SELECT seq, uid FROM cached_uid_map
            WHERE account_id = ? AND folder_path = ?
            ORDER BY seq ASC
            ",
        )
        .bind(account_id.0)
        .bind(folder_path)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .iter()
            .map(|row| (row.get::<u32, _>("seq"), row.get::<u32, _>("uid")))
            .collect())
    }

    /// Replaces the cached seq -> UID map for a mailbox wholesale.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn set_uid_map(
        &self,
        account_id: AccountId,
        folder_path: &str,
        map: &[(u32, u32)],
    ) -> Result<()> {
        self.clear_uid_map(account_id, folder_path).await?;

        for &(seq, uid) in map {
            sqlx::query(
                r"
                INSERT INTO cached_uid_map (account_id, folder_path, seq, uid)
                VALUES (?, ?, ?, ?)
                ",
            )
            .bind(account_id.0)
            .bind(folder_path)
            .bind(seq)
            .bind(uid)
            .execute(&self.pool)
            .await?;
        }

        Ok(())
    }

    /// Clears the cached seq -> UID map for a mailbox.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn clear_uid_map(&self, account_id: AccountId, folder_path: &str) -> Result<()> {
        sqlx::query(r"DELETE FROM cached_uid_map WHERE account_id = ? AND folder_path = ?")
            .bind(account_id.0)
            .bind(folder_path)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Gets the cached flags for a message, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails, or if the cached JSON
    /// is malformed.
    pub async fn get_flags(
        &self,
        account_id: AccountId,
        folder_path: &str,
        uid: u32,
    ) -> Result<Option<Vec<String>>> {
        let row = sqlx::query(
            r"
            SELECT flags_json FROM cached_flags
            WHERE account_id = ? AND folder_path = ? AND uid = ?
            ",
        )
        .bind(account_id.0)
        .bind(folder_path)
        .bind(uid)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else { return Ok(None) };
        let flags_json: String = row.get("flags_json");
        let flags = serde_json::from_str(&flags_json).map_err(crate::Error::from)?;
        Ok(Some(flags))
    }

    /// Sets the cached flags for a message.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn set_flags(
        &self,
        account_id: AccountId,
        folder_path: &str,
        uid: u32,
        flags: &[String],
    ) -> Result<()> {
        let flags_json = serde_json::to_string(flags).map_err(crate::Error::from)?;

        sqlx::query(
            r"
            INSERT INTO cached_flags (account_id, folder_path, uid, flags_json)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(account_id, folder_path, uid) DO UPDATE SET
                flags_json = excluded.flags_json
            ",
        )
        .bind(account_id.0)
        .bind(folder_path)
        .bind(uid)
        .bind(flags_json)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a cached body part's raw bytes, if present.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn get_body_part(
        &self,
        account_id: AccountId,
        folder_path: &str,
        uid: u32,
        part_number: &str,
    ) -> Result<Option<Vec<u8>>> {
        let row = sqlx::query(
            r"
            SELECT data FROM cached_body_parts
            WHERE account_id = ? AND folder_path = ? AND uid = ? AND part_number = ?
            ",
        )
        .bind(account_id.0)
        .bind(folder_path)
        .bind(uid)
        .bind(part_number)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| row.get::<Vec<u8>, _>("data")))
    }

    /// Caches a body part's raw bytes.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn set_body_part(&self, part: &CachedBodyPart) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO cached_body_parts
                (account_id, folder_path, uid, part_number, content_type, data, cached_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(account_id, folder_path, uid, part_number) DO UPDATE SET
                content_type = excluded.content_type,
                data = excluded.data,
                cached_at = excluded.cached_at
            ",
        )
        .bind(part.account_id.0)
        .bind(&part.folder_path)
        .bind(part.uid)
        .bind(&part.part_number)
        .bind(&part.content_type)
        .bind(&part.data)
        .bind(part.cached_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets the cached threading tree for a mailbox, serialized as JSON.
    ///
    /// The repository treats the payload as opaque; callers own the schema.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn get_threading(
        &self,
        account_id: AccountId,
        folder_path: &str,
    ) -> Result<Option<String>> {
        let row = sqlx::query(
            r"
            SELECT threading_json FROM cached_threading
            WHERE account_id = ? AND folder_path = ?
            ",
        )
        .bind(account_id.0)
        .bind(folder_path)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| row.get::<String, _>("threading_json")))
    }

    /// Sets the cached threading tree for a mailbox.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn set_threading(
        &self,
        account_id: AccountId,
        folder_path: &str,
        threading_json: &str,
        cached_at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO cached_threading (account_id, folder_path, threading_json, cached_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(account_id, folder_path) DO UPDATE SET
                threading_json = excluded.threading_json,
                cached_at = excluded.cached_at
            ",
        )
        .bind(account_id.0)
        .bind(folder_path)
        .bind(threading_json)
        .bind(cached_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Clears every piece of per-message metadata cached for a mailbox:
    /// summaries, content, flags, body parts, and threading. Does not touch
    /// the UID map (see [`clear_uid_map`](Self::clear_uid_map)) or the sync
    /// state checkpoint, so callers can set a fresh checkpoint afterward.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn clear_all_messages(&self, account_id: AccountId, folder_path: &str) -> Result<()> {
        self.clear_folder(account_id, folder_path).await?;

        sqlx::query(r"DELETE FROM cached_flags WHERE account_id = ? AND folder_path = ?")
            .bind(account_id.0)
            .bind(folder_path)
            .execute(&self.pool)
            .await?;

        sqlx::query(r"DELETE FROM cached_body_parts WHERE account_id = ? AND folder_path = ?")
            .bind(account_id.0)
            .bind(folder_path)
            .execute(&self.pool)
            .await?;

        sqlx::query(r"DELETE FROM cached_threading WHERE account_id = ? AND folder_path = ?")
            .bind(account_id.0)
            .bind(folder_path)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Clears every cached trace of a single message: summary, content,
    /// flags, and body parts. Used when a message is expunged.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn clear_message(
        &self,
        account_id: AccountId,
        folder_path: &str,
        uid: u32,
    ) -> Result<()> {
        sqlx::query(
            r"DELETE FROM cached_message_summaries WHERE account_id = ? AND folder_path = ? AND uid = ?",
        )
        .bind(account_id.0)
        .bind(folder_path)
        .bind(uid)
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r"DELETE FROM cached_message_content WHERE account_id = ? AND folder_path = ? AND uid = ?",
        )
        .bind(account_id.0)
        .bind(folder_path)
        .bind(uid)
        .execute(&self.pool)
        .await?;

        sqlx::query(r"DELETE FROM cached_flags WHERE account_id = ? AND folder_path = ? AND uid = ?")
            .bind(account_id.0)
            .bind(folder_path)
            .bind(uid)
            .execute(&self.pool)
            .await?;

        sqlx::query(
            r"DELETE FROM cached_body_parts WHERE account_id = ? AND folder_path = ? AND uid = ?",
        )
        .bind(account_id.0)
        .bind(folder_path)
        .bind(uid)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_cache_and_retrieve_summary() {
        let repo = CacheRepository::in_memory().await.unwrap();

        let summary = CachedMessageSummary {
            account_id: AccountId(1),
            folder_path: "INBOX".to_string(),
            uid: 123,
            from_name: "John Doe".to_string(),
            from_email: "john@example.com".to_string(),
            subject: "Test Subject".to_string(),
            snippet: "This is a test...".to_string(),
            date: "Jan 24".to_string(),
            is_read: false,
            is_flagged: true,
            has_attachments: false,
            cached_at: Utc::now(),
        };

        repo.cache_summary(&summary).await.unwrap();

        let summaries = repo.get_summaries(AccountId(1), "INBOX").await.unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].uid, 123);
        assert_eq!(summaries[0].subject, "Test Subject");
        assert!(!summaries[0].is_read);
        assert!(summaries[0].is_flagged);
    }

    #[tokio::test]
    async fn test_cache_and_retrieve_content() {
        let repo = CacheRepository::in_memory().await.unwrap();

        let content = CachedMessageContent {
            account_id: AccountId(1),
            folder_path: "INBOX".to_string(),
            uid: 123,
            from: "John Doe <john@example.com>".to_string(),
            to: "me@example.com".to_string(),
            cc: "".to_string(),
            subject: "Test Subject".to_string(),
            date: "Fri, 24 Jan 2026 10:00:00 +0000".to_string(),
            body_text: Some("Hello, this is the message body.".to_string()),
            body_html: Some("<p>Hello, this is the message body.</p>".to_string()),
            attachments_json: None,
            cached_at: Utc::now(),
        };

        repo.cache_content(&content).await.unwrap();

        let retrieved = repo.get_content(AccountId(1), "INBOX", 123).await.unwrap();
        assert!(retrieved.is_some());
        let retrieved = retrieved.unwrap();
        assert_eq!(retrieved.subject, "Test Subject");
        assert_eq!(
            retrieved.body_text,
            Some("Hello, this is the message body.".to_string())
        );
    }

    #[tokio::test]
    async fn test_update_flags() {
        let repo = CacheRepository::in_memory().await.unwrap();

        let summary = CachedMessageSummary {
            account_id: AccountId(1),
            folder_path: "INBOX".to_string(),
            uid: 123,
            from_name: "Test".to_string(),
            from_email: "test@example.com".to_string(),
            subject: "Test".to_string(),
            snippet: "...".to_string(),
            date: "Jan 24".to_string(),
            is_read: false,
            is_flagged: false,
            has_attachments: false,
            cached_at: Utc::now(),
        };

        repo.cache_summary(&summary).await.unwrap();

        // Update flags
        repo.update_flags(AccountId(1), "INBOX", 123, true, true)
            .await
            .unwrap();

        let summaries = repo.get_summaries(AccountId(1), "INBOX").await.unwrap();
        assert!(summaries[0].is_read);
        assert!(summaries[0].is_flagged);
    }

    #[tokio::test]
    async fn test_clear_folder() {
        let repo = CacheRepository::in_memory().await.unwrap();

        let summary = CachedMessageSummary {
            account_id: AccountId(1),
            folder_path: "INBOX".to_string(),
            uid: 123,
            from_name: "Test".to_string(),
            from_email: "test@example.com".to_string(),
            subject: "Test".to_string(),
            snippet: "...".to_string(),
            date: "Jan 24".to_string(),
            is_read: false,
            is_flagged: false,
            has_attachments: false,
            cached_at: Utc::now(),
        };

        repo.cache_summary(&summary).await.unwrap();
        assert!(repo.has_cached_folder(AccountId(1), "INBOX").await.unwrap());

        repo.clear_folder(AccountId(1), "INBOX").await.unwrap();
        assert!(!repo.has_cached_folder(AccountId(1), "INBOX").await.unwrap());
    }

    #[tokio::test]
    async fn test_sync_state_round_trip() {
        let repo = CacheRepository::in_memory().await.unwrap();
        assert!(
            repo.get_sync_state(AccountId(1), "INBOX")
                .await
                .unwrap()
                .is_none()
        );

        let state = CachedSyncState {
            account_id: AccountId(1),
            folder_path: "INBOX".to_string(),
            uidvalidity: 1000,
            highestmodseq: Some(42),
            cached_at: Utc::now(),
        };
        repo.set_sync_state(&state).await.unwrap();

        let loaded = repo
            .get_sync_state(AccountId(1), "INBOX")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(loaded.uidvalidity, 1000);
        assert_eq!(loaded.highestmodseq, Some(42));
    }

    #[tokio::test]
    async fn test_uid_map_round_trip_and_clear() {
        let repo = CacheRepository::in_memory().await.unwrap();
        let map = vec![(1, 100), (2, 101), (3, 105)];
        repo.set_uid_map(AccountId(1), "INBOX", &map).await.unwrap();

        let loaded = repo.get_uid_map(AccountId(1), "INBOX").await.unwrap();
        assert_eq!(loaded, map);

        // Replacing wholesale drops stale entries.
        repo.set_uid_map(AccountId(1), "INBOX", &[(1, 200)])
            .await
            .unwrap();
        let loaded = repo.get_uid_map(AccountId(1), "INBOX").await.unwrap();
        assert_eq!(loaded, vec![(1, 200)]);

        repo.clear_uid_map(AccountId(1), "INBOX").await.unwrap();
        assert!(repo.get_uid_map(AccountId(1), "INBOX").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_flags_round_trip() {
        let repo = CacheRepository::in_memory().await.unwrap();
        assert!(
            repo.get_flags(AccountId(1), "INBOX", 123)
                .await
                .unwrap()
                .is_none()
        );

        repo.set_flags(
            AccountId(1),
            "INBOX",
            123,
            &["\\Seen".to_string(), "\\Flagged".to_string()],
        )
        .await
        .unwrap();

        let flags = repo
            .get_flags(AccountId(1), "INBOX", 123)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(flags, vec!["\\Seen".to_string(), "\\Flagged".to_string()]);
    }

    #[tokio::test]
    async fn test_body_part_round_trip() {
        let repo = CacheRepository::in_memory().await.unwrap();
        let part = CachedBodyPart {
            account_id: AccountId(1),
            folder_path: "INBOX".to_string(),
            uid: 123,
            part_number: "1".to_string(),
            content_type: "text/plain".to_string(),
            data: b"hello world".to_vec(),
            cached_at: Utc::now(),
        };
        repo.set_body_part(&part).await.unwrap();

        let data = repo
            .get_body_part(AccountId(1), "INBOX", 123, "1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(data, b"hello world");

        assert!(
            repo.get_body_part(AccountId(1), "INBOX", 123, "2")
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_threading_round_trip() {
        let repo = CacheRepository::in_memory().await.unwrap();
        assert!(
            repo.get_threading(AccountId(1), "INBOX")
                .await
                .unwrap()
                .is_none()
        );

        repo.set_threading(AccountId(1), "INBOX", r#"{"root": []}"#, Utc::now())
            .await
            .unwrap();

        let json = repo
            .get_threading(AccountId(1), "INBOX")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(json, r#"{"root": []}"#);
    }

    #[tokio::test]
    async fn test_uidvalidity_change_discards_pre_change_metadata() {
        let repo = CacheRepository::in_memory().await.unwrap();

        repo.set_sync_state(&CachedSyncState {
            account_id: AccountId(1),
            folder_path: "INBOX".to_string(),
            uidvalidity: 1000,
            highestmodseq: None,
            cached_at: Utc::now(),
        })
        .await
        .unwrap();

        repo.cache_summary(&CachedMessageSummary {
            account_id: AccountId(1),
            folder_path: "INBOX".to_string(),
            uid: 123,
            from_name: "Test".to_string(),
            from_email: "test@example.com".to_string(),
            subject: "Test".to_string(),
            snippet: "...".to_string(),
            date: "Jan 24".to_string(),
            is_read: false,
            is_flagged: false,
            has_attachments: false,
            cached_at: Utc::now(),
        })
        .await
        .unwrap();
        repo.set_flags(AccountId(1), "INBOX", 123, &["\\Seen".to_string()])
            .await
            .unwrap();
        repo.set_uid_map(AccountId(1), "INBOX", &[(1, 123)])
            .await
            .unwrap();

        // Same UIDVALIDITY: nothing is discarded.
        let changed = repo
            .invalidate_on_uidvalidity_change(AccountId(1), "INBOX", 1000)
            .await
            .unwrap();
        assert!(!changed);
        assert!(repo.has_cached_folder(AccountId(1), "INBOX").await.unwrap());

        // UIDVALIDITY changed: everything dependent on the old UID
        // namespace must be discarded.
        let changed = repo
            .invalidate_on_uidvalidity_change(AccountId(1), "INBOX", 2000)
            .await
            .unwrap();
        assert!(changed);
        assert!(!repo.has_cached_folder(AccountId(1), "INBOX").await.unwrap());
        assert!(
            repo.get_flags(AccountId(1), "INBOX", 123)
                .await
                .unwrap()
                .is_none()
        );
        assert!(repo.get_uid_map(AccountId(1), "INBOX").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_clear_message_removes_all_of_a_single_messages_data() {
        let repo = CacheRepository::in_memory().await.unwrap();

        repo.cache_summary(&CachedMessageSummary {
            account_id: AccountId(1),
            folder_path: "INBOX".to_string(),
            uid: 123,
            from_name: "Test".to_string(),
            from_email: "test@example.com".to_string(),
            subject: "Test".to_string(),
            snippet: "...".to_string(),
            date: "Jan 24".to_string(),
            is_read: false,
            is_flagged: false,
            has_attachments: false,
            cached_at: Utc::now(),
        })
        .await
        .unwrap();
        repo.set_flags(AccountId(1), "INBOX", 123, &["\\Seen".to_string()])
            .await
            .unwrap();

        repo.clear_message(AccountId(1), "INBOX", 123).await.unwrap();

        assert!(!repo.has_cached_folder(AccountId(1), "INBOX").await.unwrap());
        assert!(
            repo.get_flags(AccountId(1), "INBOX", 123)
                .await
                .unwrap()
                .is_none()
        );
    }
}
