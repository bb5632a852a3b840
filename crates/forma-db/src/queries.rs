use crate::Database;
use crate::models::{EventRow, NewEvent, TaskFields, TaskRow, UserRow};
use anyhow::Result;
use rusqlite::{Connection, Row};

const USER_COLUMNS: &str = "id, username, email, password, created_at";

const EVENT_COLUMNS: &str = "id, submitter_name, whatsapp_number, instagram_url, event_name, \
     event_date, file_upload_ref, status, created_at";

const TASK_COLUMNS: &str =
    "id, title, description, completed, pic_name, start_date, end_date, created_at";

impl Database {
    // -- Users --

    /// Insert a user and return its id, or `None` if the email is already
    /// registered. The UNIQUE constraint is the source of truth, so this is
    /// race-free even when callers pre-check with [`Database::email_exists`].
    pub fn create_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<Option<i64>> {
        self.with_conn_mut(|conn| {
            match conn.execute(
                "INSERT INTO users (username, email, password) VALUES (?1, ?2, ?3)",
                (username, email, password_hash),
            ) {
                Ok(_) => Ok(Some(conn.last_insert_rowid())),
                Err(e) if is_unique_violation(&e) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
    }

    pub fn email_exists(&self, email: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let exists = conn.query_row(
                "SELECT EXISTS(SELECT 1 FROM users WHERE email = ?1)",
                [email],
                |row| row.get(0),
            )?;
            Ok(exists)
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
                [email],
                map_user,
            )
            .optional()
        })
    }

    pub fn list_users(&self, limit: u32, offset: u64) -> Result<Vec<UserRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {USER_COLUMNS} FROM users ORDER BY id DESC LIMIT ?1 OFFSET ?2"
            ))?;
            let rows = stmt
                .query_map(page_params(limit, offset), map_user)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn count_users(&self) -> Result<u64> {
        self.with_conn(|conn| count(conn, "users"))
    }

    // -- Event submissions --

    pub fn insert_event(&self, event: &NewEvent) -> Result<i64> {
        self.with_conn_mut(|conn| {
            conn.execute(
                "INSERT INTO event_form
                    (submitter_name, whatsapp_number, instagram_url, event_name,
                     event_date, file_upload_ref, status)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                rusqlite::params![
                    event.submitter_name,
                    event.whatsapp_number,
                    event.instagram_url,
                    event.event_name,
                    event.event_date,
                    event.file_upload_ref,
                    event.status.as_str(),
                ],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn list_events(&self, limit: u32, offset: u64) -> Result<Vec<EventRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(&format!(
                "SELECT {EVENT_COLUMNS} FROM event_form ORDER BY id DESC LIMIT ?1 OFFSET ?2"
            ))?;
            let rows = stmt
                .query_map(page_params(limit, offset), map_event)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn count_events(&self) -> Result<u64> {
        self.with_conn(|conn| count(conn, "event_form"))
    }

    pub fn get_event(&self, id: i64) -> Result<Option<EventRow>> {
        self.with_conn(|conn| {
            conn.query_row(
                &format!("SELECT {EVENT_COLUMNS} FROM event_form WHERE id = ?1"),
                [id],
                map_event,
            )
            .optional()
        })
    }

    /// Returns the number of rows changed (0 when no event has this id).
    pub fn update_event_status(&self, id: i64, status: &str) -> Result<usize> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE event_form SET status = ?1 WHERE id = ?2",
                rusqlite::params![status, id],
            )?;
            Ok(changed)
        })
    }

    // -- Tasks --

    pub fn list_tasks(&self) -> Result<Vec<TaskRow>> {
        self.with_conn(|conn| {
            let mut stmt =
                conn.prepare(&format!("SELECT {TASK_COLUMNS} FROM tasks ORDER BY id DESC"))?;
            let rows = stmt
                .query_map([], map_task)?
                .collect::<std::result::Result<Vec<_>, _>>()?;
            Ok(rows)
        })
    }

    pub fn get_task(&self, id: i64) -> Result<Option<TaskRow>> {
        self.with_conn(|conn| query_task(conn, id))
    }

    pub fn count_tasks(&self) -> Result<u64> {
        self.with_conn(|conn| count(conn, "tasks"))
    }

    /// Insert a new, not yet completed task and return the stored row.
    pub fn insert_task(&self, fields: &TaskFields) -> Result<TaskRow> {
        self.with_conn_mut(|conn| {
            let (id, created_at): (i64, String) = conn.query_row(
                "INSERT INTO tasks (title, description, completed, pic_name, start_date, end_date)
                 VALUES (?1, ?2, 0, ?3, ?4, ?5)
                 RETURNING id, created_at",
                rusqlite::params![
                    fields.title,
                    fields.description,
                    fields.pic_name,
                    fields.start_date,
                    fields.end_date,
                ],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?;

            Ok(TaskRow {
                id,
                title: fields.title.clone(),
                description: fields.description.clone(),
                completed: false,
                pic_name: fields.pic_name.clone(),
                start_date: fields.start_date.clone(),
                end_date: fields.end_date.clone(),
                created_at,
            })
        })
    }

    /// Apply the given columns, leaving `None` ones untouched, and re-read the
    /// row. Returns `None` when no task has this id.
    pub fn patch_task(
        &self,
        id: i64,
        title: Option<&str>,
        description: Option<&str>,
        completed: Option<bool>,
    ) -> Result<Option<TaskRow>> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE tasks SET
                    title = COALESCE(?2, title),
                    description = COALESCE(?3, description),
                    completed = COALESCE(?4, completed)
                 WHERE id = ?1",
                rusqlite::params![id, title, description, completed],
            )?;

            if changed == 0 {
                return Ok(None);
            }
            query_task(conn, id)
        })
    }

    /// Overwrite every writable column and re-read the row. Returns `None`
    /// when no task has this id.
    pub fn replace_task(
        &self,
        id: i64,
        fields: &TaskFields,
        completed: bool,
    ) -> Result<Option<TaskRow>> {
        self.with_conn_mut(|conn| {
            let changed = conn.execute(
                "UPDATE tasks SET
                    title = ?2, description = ?3, completed = ?4,
                    pic_name = ?5, start_date = ?6, end_date = ?7
                 WHERE id = ?1",
                rusqlite::params![
                    id,
                    fields.title,
                    fields.description,
                    completed,
                    fields.pic_name,
                    fields.start_date,
                    fields.end_date,
                ],
            )?;

            if changed == 0 {
                return Ok(None);
            }
            query_task(conn, id)
        })
    }

    /// Delete a task if it exists. Returns `false` when it did not.
    pub fn delete_task(&self, id: i64) -> Result<bool> {
        self.with_conn_mut(|conn| {
            let exists: bool =
                conn.query_row("SELECT EXISTS(SELECT 1 FROM tasks WHERE id = ?1)", [id], |row| {
                    row.get(0)
                })?;
            if !exists {
                return Ok(false);
            }

            conn.execute("DELETE FROM tasks WHERE id = ?1", [id])?;
            Ok(true)
        })
    }
}

fn page_params(limit: u32, offset: u64) -> [i64; 2] {
    [i64::from(limit), i64::try_from(offset).unwrap_or(i64::MAX)]
}

fn count(conn: &Connection, table: &str) -> Result<u64> {
    let n: i64 = conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
    Ok(n as u64)
}

fn query_task(conn: &Connection, id: i64) -> Result<Option<TaskRow>> {
    conn.query_row(
        &format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = ?1"),
        [id],
        map_task,
    )
    .optional()
}

fn map_user(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn map_event(row: &Row<'_>) -> rusqlite::Result<EventRow> {
    Ok(EventRow {
        id: row.get(0)?,
        submitter_name: row.get(1)?,
        whatsapp_number: row.get(2)?,
        instagram_url: row.get(3)?,
        event_name: row.get(4)?,
        event_date: row.get(5)?,
        file_upload_ref: row.get(6)?,
        status: row.get(7)?,
        created_at: row.get(8)?,
    })
}

fn map_task(row: &Row<'_>) -> rusqlite::Result<TaskRow> {
    Ok(TaskRow {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        completed: row.get(3)?,
        pic_name: row.get(4)?,
        start_date: row.get(5)?,
        end_date: row.get(6)?,
        created_at: row.get(7)?,
    })
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use forma_types::models::EventStatus;
    use tempfile::TempDir;

    fn open() -> (TempDir, Database) {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(&dir.path().join("test.db"), 2).unwrap();
        (dir, db)
    }

    fn fields(title: &str) -> TaskFields {
        TaskFields {
            title: title.to_string(),
            description: Some("desc".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn duplicate_email_is_reported_not_raised() {
        let (_dir, db) = open();

        let first = db.create_user("alice", "alice@example.com", "hash").unwrap();
        assert!(first.is_some());

        let second = db.create_user("alice2", "alice@example.com", "hash").unwrap();
        assert_eq!(second, None);

        // Emails compare case-insensitively
        let third = db.create_user("alice3", "ALICE@example.com", "hash").unwrap();
        assert_eq!(third, None);

        assert_eq!(db.count_users().unwrap(), 1);
        assert!(db.email_exists("Alice@Example.com").unwrap());
    }

    #[test]
    fn user_lookup_by_email() {
        let (_dir, db) = open();
        let id = db.create_user("bob", "bob@example.com", "phc").unwrap().unwrap();

        let row = db.get_user_by_email("bob@example.com").unwrap().unwrap();
        assert_eq!(row.id, id);
        assert_eq!(row.username, "bob");
        assert_eq!(row.password, "phc");

        assert!(db.get_user_by_email("nobody@example.com").unwrap().is_none());
    }

    #[test]
    fn event_pages_are_newest_first() {
        let (_dir, db) = open();
        for i in 0..5 {
            db.insert_event(&NewEvent {
                event_name: Some(format!("event {i}")),
                ..Default::default()
            })
            .unwrap();
        }

        assert_eq!(db.count_events().unwrap(), 5);

        let first = db.list_events(2, 0).unwrap();
        let ids: Vec<i64> = first.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![5, 4]);

        let last = db.list_events(2, 4).unwrap();
        assert_eq!(last.len(), 1);
        assert_eq!(last[0].id, 1);
        assert_eq!(last[0].status, "waiting");
    }

    #[test]
    fn status_update_reports_affected_rows() {
        let (_dir, db) = open();
        let id = db.insert_event(&NewEvent::default()).unwrap();

        assert_eq!(db.update_event_status(id, EventStatus::Approved.as_str()).unwrap(), 1);
        assert_eq!(db.update_event_status(id + 100, "approved").unwrap(), 0);

        let row = db.get_event(id).unwrap().unwrap();
        assert_eq!(row.status, "approved");

        // Unknown values are rejected by the CHECK constraint
        assert!(db.update_event_status(id, "archived").is_err());
        assert_eq!(db.get_event(id).unwrap().unwrap().status, "approved");
    }

    #[test]
    fn insert_task_returns_stored_row() {
        let (_dir, db) = open();
        let row = db.insert_task(&fields("write docs")).unwrap();
        assert!(!row.completed);

        let stored = db.get_task(row.id).unwrap().unwrap();
        assert_eq!(stored.title, "write docs");
        assert_eq!(stored.description.as_deref(), Some("desc"));
        assert_eq!(stored.created_at, row.created_at);
        assert!(!stored.completed);
    }

    #[test]
    fn patch_task_only_touches_given_columns() {
        let (_dir, db) = open();
        let row = db.insert_task(&fields("ship")).unwrap();

        let patched = db.patch_task(row.id, None, None, Some(true)).unwrap().unwrap();
        assert!(patched.completed);
        assert_eq!(patched.title, "ship");
        assert_eq!(patched.description.as_deref(), Some("desc"));

        let renamed = db.patch_task(row.id, Some("ship it"), None, None).unwrap().unwrap();
        assert_eq!(renamed.title, "ship it");
        assert!(renamed.completed);

        assert!(db.patch_task(999, None, None, Some(true)).unwrap().is_none());
    }

    #[test]
    fn replace_task_overwrites_everything() {
        let (_dir, db) = open();
        let row = db.insert_task(&fields("old")).unwrap();

        let replacement = TaskFields {
            title: "new".to_string(),
            description: None,
            pic_name: Some("Dina".to_string()),
            start_date: Some("2024-01-01".to_string()),
            end_date: Some("2024-01-05".to_string()),
        };
        assert!(db.replace_task(row.id + 1, &replacement, true).unwrap().is_none());

        let stored = db.replace_task(row.id, &replacement, true).unwrap().unwrap();
        assert_eq!(stored.created_at, row.created_at);
        assert_eq!(stored.title, "new");
        assert_eq!(stored.description, None);
        assert!(stored.completed);
        assert_eq!(stored.pic_name.as_deref(), Some("Dina"));
    }

    #[test]
    fn delete_task_checks_existence_first() {
        let (_dir, db) = open();
        let a = db.insert_task(&fields("a")).unwrap();
        db.insert_task(&fields("b")).unwrap();

        assert!(!db.delete_task(a.id + 10).unwrap());
        assert_eq!(db.count_tasks().unwrap(), 2);

        assert!(db.delete_task(a.id).unwrap());
        assert_eq!(db.count_tasks().unwrap(), 1);
        assert!(!db.delete_task(a.id).unwrap());
    }

    #[test]
    fn tasks_list_newest_first() {
        let (_dir, db) = open();
        db.insert_task(&fields("first")).unwrap();
        db.insert_task(&fields("second")).unwrap();

        let titles: Vec<String> = db.list_tasks().unwrap().into_iter().map(|t| t.title).collect();
        assert_eq!(titles, vec!["second", "first"]);
    }

    #[test]
    fn reads_fall_back_to_writer_without_readers() {
        let dir = tempfile::tempdir().unwrap();
        let db = Database::open(&dir.path().join("solo.db"), 0).unwrap();
        db.create_user("solo", "solo@example.com", "hash").unwrap();
        assert_eq!(db.count_users().unwrap(), 1);
    }
}
