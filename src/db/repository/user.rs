use chrono::Utc;
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::StoreError;
use crate::models::{NewUser, User};

use super::{date_from_sql, timestamp_from_sql, timestamp_to_sql};

pub fn create_user(conn: &Connection, user: &NewUser) -> Result<String, StoreError> {
    let id = Uuid::new_v4().to_string();
    let now = timestamp_to_sql(&Utc::now());

    conn.execute(
        "INSERT INTO users (id, name, email, date_of_birth, gender, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            id,
            user.name,
            user.email,
            user.date_of_birth.map(|d| d.to_string()),
            user.gender,
            now,
            now,
        ],
    )?;
    Ok(id)
}

/// Create the user row for a fixed id if it is not there yet.
///
/// Child tables carry enforced foreign keys to `users.id`, so the implicit
/// single user must exist before any entity write.
pub fn ensure_user(conn: &Connection, id: &str, name: &str) -> Result<(), StoreError> {
    let now = timestamp_to_sql(&Utc::now());
    conn.execute(
        "INSERT OR IGNORE INTO users (id, name, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![id, name, now, now],
    )?;
    Ok(())
}

pub fn get_user(conn: &Connection, id: &str) -> Result<Option<User>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT id, name, email, date_of_birth, gender, created_at, updated_at
         FROM users WHERE id = ?1",
    )?;
    let mut rows = stmt.query_map(params![id], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, Option<String>>(2)?,
            row.get::<_, Option<String>>(3)?,
            row.get::<_, Option<String>>(4)?,
            row.get::<_, String>(5)?,
            row.get::<_, String>(6)?,
        ))
    })?;

    match rows.next() {
        Some(row) => {
            let (id, name, email, dob, gender, created, updated) = row?;
            Ok(Some(User {
                id,
                name,
                email,
                date_of_birth: dob.map(|d| date_from_sql("date_of_birth", &d)).transpose()?,
                gender,
                created_at: timestamp_from_sql(&created)?,
                updated_at: timestamp_from_sql(&updated)?,
            }))
        }
        None => Ok(None),
    }
}
