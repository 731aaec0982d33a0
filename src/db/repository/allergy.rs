use std::str::FromStr;

use chrono::Utc;
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::StoreError;
use crate::models::enums::AllergySeverity;
use crate::models::{Allergy, NewAllergy};

use super::{id_from_sql, timestamp_from_sql, timestamp_to_sql};

pub fn create_allergy(
    conn: &Connection,
    user_id: &str,
    allergy: &NewAllergy,
) -> Result<Uuid, StoreError> {
    let id = Uuid::new_v4();
    let now = timestamp_to_sql(&Utc::now());

    conn.execute(
        "INSERT INTO allergies (id, user_id, allergen, reaction_type, severity, notes, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            id.to_string(),
            user_id,
            allergy.allergen,
            allergy.reaction_type,
            allergy.severity.as_ref().map(|s| s.as_str()),
            allergy.notes,
            now,
            now,
        ],
    )?;
    Ok(id)
}

pub fn get_allergies(conn: &Connection, user_id: &str) -> Result<Vec<Allergy>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, allergen, reaction_type, severity, notes, created_at, updated_at
         FROM allergies WHERE user_id = ?1 ORDER BY created_at DESC",
    )?;

    let rows = stmt.query_map(params![user_id], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, Option<String>>(3)?,
            row.get::<_, Option<String>>(4)?,
            row.get::<_, Option<String>>(5)?,
            row.get::<_, String>(6)?,
            row.get::<_, String>(7)?,
        ))
    })?;

    let mut allergies = Vec::new();
    for row in rows {
        let (id, user_id, allergen, reaction_type, severity, notes, created, updated) = row?;
        allergies.push(Allergy {
            id: id_from_sql(&id)?,
            user_id,
            allergen,
            reaction_type,
            severity: severity.map(|s| AllergySeverity::from_str(&s)).transpose()?,
            notes,
            created_at: timestamp_from_sql(&created)?,
            updated_at: timestamp_from_sql(&updated)?,
        });
    }
    Ok(allergies)
}

pub fn delete_allergy(conn: &Connection, id: &Uuid) -> Result<(), StoreError> {
    conn.execute(
        "DELETE FROM allergies WHERE id = ?1",
        params![id.to_string()],
    )?;
    Ok(())
}
