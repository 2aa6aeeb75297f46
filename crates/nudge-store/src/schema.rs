pub const SCHEMA_VERSION_DDL: &str = "
    CREATE TABLE IF NOT EXISTS schema_version (
        version INTEGER NOT NULL
    );
";

/// v1 schema: one row per scheduled recheck. Rows are never deleted; the
/// `sent` flag is the terminal state.
pub const SCHEMA_V1_SQL: &str = "
    CREATE TABLE IF NOT EXISTS reminders (
        id         INTEGER PRIMARY KEY AUTOINCREMENT,
        owner      TEXT    NOT NULL,
        repo       TEXT    NOT NULL,
        pr_number  INTEGER NOT NULL,
        channel    TEXT    NOT NULL,
        thread_ts  TEXT,
        remind_at  INTEGER NOT NULL,
        sent       INTEGER NOT NULL DEFAULT 0
    );

    CREATE INDEX IF NOT EXISTS idx_reminders_due ON reminders (sent, remind_at);
";

/// Forward-only migration, safe to call on every open.
pub fn migrate(db: &mut rusqlite::Connection) -> rusqlite::Result<()> {
    db.execute_batch(SCHEMA_VERSION_DDL)?;

    let version: i64 = db
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_version",
            [],
            |r| r.get(0),
        )
        .unwrap_or(0);

    if version < 1 {
        let tx = db.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;
        tx.execute_batch(SCHEMA_V1_SQL)?;
        tx.execute("INSERT INTO schema_version (version) VALUES (1)", [])?;
        tx.commit()?;
    }

    Ok(())
}
