use crate::errors::ServerError;
use rusqlite::{params, Connection, OptionalExtension};

/// The slice of an auth-provider user record the lookups need.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: String,
    pub email: String,
    pub name: String,
}

pub fn get_user(conn: &Connection, user_id: &str) -> Result<Option<UserRecord>, ServerError> {
    conn.query_row(
        "SELECT id, email, name FROM users WHERE id = ?",
        [user_id],
        |row| {
            Ok(UserRecord {
                id: row.get(0)?,
                email: row.get(1)?,
                name: row.get(2)?,
            })
        },
    )
    .optional()
    .map_err(|e| ServerError::DbError(e.to_string()))
}

pub fn upsert_user(
    conn: &Connection,
    user_id: &str,
    email: &str,
    name: &str,
) -> Result<(), ServerError> {
    conn.execute(
        r#"
        INSERT INTO users (id, email, name) VALUES (?1, ?2, ?3)
        ON CONFLICT(id) DO UPDATE SET email = excluded.email, name = excluded.name
        "#,
        params![user_id, email, name],
    )
    .map_err(|e| ServerError::DbError(e.to_string()))?;
    Ok(())
}
