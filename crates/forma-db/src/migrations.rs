use anyhow::Result;
use rusqlite::Connection;
use tracing::info;

pub fn run(conn: &Connection) -> Result<()> {
    conn.execute_batch("CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL);")?;

    let version: i64 =
        conn.query_row("SELECT COALESCE(MAX(version), 0) FROM schema_version", [], |r| r.get(0))?;

    if version < 1 {
        info!("Running migration v1 (users, event_form, tasks)");
        conn.execute_batch(
            "
            BEGIN;

            CREATE TABLE users (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                username    TEXT NOT NULL,
                email       TEXT NOT NULL UNIQUE COLLATE NOCASE,
                password    TEXT NOT NULL,
                created_at  TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE event_form (
                id               INTEGER PRIMARY KEY AUTOINCREMENT,
                submitter_name   TEXT,
                whatsapp_number  TEXT,
                instagram_url    TEXT,
                event_name       TEXT,
                event_date       TEXT,
                file_upload_ref  TEXT,
                status           TEXT NOT NULL DEFAULT 'waiting'
                                 CHECK (status IN ('waiting', 'approved', 'rejected')),
                created_at       TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE tasks (
                id           INTEGER PRIMARY KEY AUTOINCREMENT,
                title        TEXT NOT NULL,
                description  TEXT,
                completed    INTEGER NOT NULL DEFAULT 0,
                pic_name     TEXT,
                start_date   TEXT,
                end_date     TEXT,
                created_at   TEXT NOT NULL DEFAULT (datetime('now'))
            );

            INSERT INTO schema_version (version) VALUES (1);

            COMMIT;
            ",
        )?;
    }

    info!("Database migrations complete");
    Ok(())
}
