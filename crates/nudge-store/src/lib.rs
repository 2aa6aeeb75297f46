use chrono::{DateTime, Utc};
use tokio_rusqlite::Connection;

pub mod schema;

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] tokio_rusqlite::Error),
}

/// A scheduled "check this PR again later" task.
#[derive(Debug, Clone)]
pub struct Reminder {
    pub id: i64,
    pub owner: String,
    pub repo: String,
    pub pr_number: u64,
    pub channel: String,
    pub thread_ts: Option<String>,
    pub remind_at: DateTime<Utc>,
    pub sent: bool,
}

#[derive(Debug, Clone)]
pub struct NewReminder {
    pub owner: String,
    pub repo: String,
    pub pr_number: u64,
    pub channel: String,
    pub thread_ts: Option<String>,
    pub remind_at: DateTime<Utc>,
}

/// Durable reminder table on SQLite. `Clone` is cheap; all clones share one
/// serialized connection, which is enough concurrency control since store
/// work is tiny compared to the fetch/post latency around it.
#[derive(Clone)]
pub struct ReminderStore {
    conn: Connection,
}

impl ReminderStore {
    pub async fn open(path: &str) -> Result<Self, StoreError> {
        let conn = Connection::open(path).await?;
        Self::prepare(conn).await
    }

    pub async fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().await?;
        Self::prepare(conn).await
    }

    async fn prepare(conn: Connection) -> Result<Self, StoreError> {
        conn.call(|db| {
            db.execute_batch(
                "PRAGMA journal_mode=WAL;
                 PRAGMA synchronous=NORMAL;",
            )?;
            db.busy_timeout(std::time::Duration::from_secs(5))?;
            schema::migrate(db)?;
            Ok(())
        })
        .await?;

        Ok(Self { conn })
    }

    pub async fn insert(&self, reminder: NewReminder) -> Result<i64, StoreError> {
        let id = self
            .conn
            .call(move |db| {
                db.execute(
                    "INSERT INTO reminders (owner, repo, pr_number, channel, thread_ts, remind_at, sent)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0)",
                    rusqlite::params![
                        reminder.owner,
                        reminder.repo,
                        reminder.pr_number,
                        reminder.channel,
                        reminder.thread_ts,
                        reminder.remind_at.timestamp(),
                    ],
                )?;
                Ok(db.last_insert_rowid())
            })
            .await?;

        Ok(id)
    }

    /// Reminders whose due time has passed and which have not yet been
    /// processed, oldest first.
    pub async fn due_unsent(&self, now: DateTime<Utc>) -> Result<Vec<Reminder>, StoreError> {
        let now = now.timestamp();
        let reminders = self
            .conn
            .call(move |db| {
                let mut stmt = db.prepare(
                    "SELECT id, owner, repo, pr_number, channel, thread_ts, remind_at, sent
                     FROM reminders
                     WHERE sent = 0 AND remind_at <= ?1
                     ORDER BY remind_at ASC",
                )?;
                let rows = stmt
                    .query_map([now], row_to_reminder)?
                    .collect::<rusqlite::Result<Vec<_>>>()?;
                Ok(rows)
            })
            .await?;

        Ok(reminders)
    }

    /// Terminal transition; idempotent.
    pub async fn mark_sent(&self, id: i64) -> Result<(), StoreError> {
        self.conn
            .call(move |db| {
                db.execute("UPDATE reminders SET sent = 1 WHERE id = ?1", [id])?;
                Ok(())
            })
            .await?;

        Ok(())
    }

    pub async fn get(&self, id: i64) -> Result<Option<Reminder>, StoreError> {
        use rusqlite::OptionalExtension;

        let reminder = self
            .conn
            .call(move |db| {
                let reminder = db
                    .query_row(
                        "SELECT id, owner, repo, pr_number, channel, thread_ts, remind_at, sent
                         FROM reminders WHERE id = ?1",
                        [id],
                        row_to_reminder,
                    )
                    .optional()?;
                Ok(reminder)
            })
            .await?;

        Ok(reminder)
    }
}

fn row_to_reminder(row: &rusqlite::Row<'_>) -> rusqlite::Result<Reminder> {
    Ok(Reminder {
        id: row.get(0)?,
        owner: row.get(1)?,
        repo: row.get(2)?,
        pr_number: row.get(3)?,
        channel: row.get(4)?,
        thread_ts: row.get(5)?,
        remind_at: DateTime::from_timestamp(row.get(6)?, 0).unwrap_or_default(),
        sent: row.get(7)?,
    })
}
