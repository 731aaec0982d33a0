use std::str::FromStr;

use chrono::Utc;
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::StoreError;
use crate::models::enums::{ConditionSeverity, ConditionStatus};
use crate::models::{ChronicCondition, ChronicConditionPatch, NewChronicCondition};

use super::{date_from_sql, id_from_sql, push_set, timestamp_from_sql, timestamp_to_sql};

pub fn create_chronic_condition(
    conn: &Connection,
    user_id: &str,
    condition: &NewChronicCondition,
) -> Result<Uuid, StoreError> {
    let id = Uuid::new_v4();
    let now = timestamp_to_sql(&Utc::now());

    conn.execute(
        "INSERT INTO chronic_conditions (id, user_id, name, diagnosed_date, notes, severity, status, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            id.to_string(),
            user_id,
            condition.name,
            condition.diagnosed_date.to_string(),
            condition.notes,
            condition.severity.as_ref().map(|s| s.as_str()),
            condition.status.as_str(),
            now,
            now,
        ],
    )?;
    Ok(id)
}

pub fn get_chronic_conditions(
    conn: &Connection,
    user_id: &str,
) -> Result<Vec<ChronicCondition>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, name, diagnosed_date, notes, severity, status, created_at, updated_at
         FROM chronic_conditions WHERE user_id = ?1 ORDER BY created_at DESC",
    )?;

    let rows = stmt.query_map(params![user_id], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, Option<String>>(4)?,
            row.get::<_, Option<String>>(5)?,
            row.get::<_, String>(6)?,
            row.get::<_, String>(7)?,
            row.get::<_, String>(8)?,
        ))
    })?;

    let mut conditions = Vec::new();
    for row in rows {
        let (id, user_id, name, diagnosed, notes, severity, status, created, updated) = row?;
        conditions.push(ChronicCondition {
            id: id_from_sql(&id)?,
            user_id,
            name,
            diagnosed_date: date_from_sql("diagnosed_date", &diagnosed)?,
            notes,
            severity: severity
                .map(|s| ConditionSeverity::from_str(&s))
                .transpose()?,
            status: ConditionStatus::from_str(&status)?,
            created_at: timestamp_from_sql(&created)?,
            updated_at: timestamp_from_sql(&updated)?,
        });
    }
    Ok(conditions)
}

/// Partial update; absent patch fields leave their columns untouched.
/// A nonexistent id is a no-op.
pub fn update_chronic_condition(
    conn: &Connection,
    id: &Uuid,
    patch: &ChronicConditionPatch,
) -> Result<(), StoreError> {
    let mut sets = Vec::new();
    let mut values: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

    push_set(&mut sets, &mut values, "name", patch.name.clone());
    push_set(
        &mut sets,
        &mut values,
        "diagnosed_date",
        patch.diagnosed_date.map(|d| d.to_string()),
    );
    push_set(&mut sets, &mut values, "notes", patch.notes.clone());
    push_set(
        &mut sets,
        &mut values,
        "severity",
        patch
            .severity
            .as_ref()
            .map(|s| s.as_ref().map(|s| s.as_str().to_string())),
    );
    push_set(
        &mut sets,
        &mut values,
        "status",
        patch.status.as_ref().map(|s| s.as_str().to_string()),
    );

    sets.push("updated_at = ?".to_string());
    values.push(Box::new(timestamp_to_sql(&Utc::now())));
    values.push(Box::new(id.to_string()));

    let sql = format!(
        "UPDATE chronic_conditions SET {} WHERE id = ?",
        sets.join(", ")
    );
    conn.execute(
        &sql,
        rusqlite::params_from_iter(values.iter().map(|v| v.as_ref())),
    )?;
    Ok(())
}

pub fn delete_chronic_condition(conn: &Connection, id: &Uuid) -> Result<(), StoreError> {
    conn.execute(
        "DELETE FROM chronic_conditions WHERE id = ?1",
        params![id.to_string()],
    )?;
    Ok(())
}
