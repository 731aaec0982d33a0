use chrono::Utc;
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::StoreError;
use crate::models::{NewSurgery, Surgery, SurgeryPatch};

use super::{
    date_from_sql, id_from_sql, json_from_sql, json_to_sql, push_set, timestamp_from_sql,
    timestamp_to_sql,
};

pub fn create_surgery(
    conn: &Connection,
    user_id: &str,
    surgery: &NewSurgery,
) -> Result<Uuid, StoreError> {
    let id = Uuid::new_v4();
    let now = timestamp_to_sql(&Utc::now());

    conn.execute(
        "INSERT INTO surgeries (id, user_id, name, date, surgeon, hospital, notes, complications,
         recovery_time, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            id.to_string(),
            user_id,
            surgery.name,
            surgery.date.to_string(),
            surgery.surgeon,
            surgery.hospital,
            surgery.notes,
            surgery
                .complications
                .as_deref()
                .map(json_to_sql)
                .transpose()?,
            surgery.recovery_time,
            now,
            now,
        ],
    )?;
    Ok(id)
}

/// All surgeries for the user, newest first by surgery date.
pub fn get_surgeries(conn: &Connection, user_id: &str) -> Result<Vec<Surgery>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, name, date, surgeon, hospital, notes, complications, recovery_time,
         created_at, updated_at
         FROM surgeries WHERE user_id = ?1 ORDER BY date DESC",
    )?;
    let rows = stmt.query_map(params![user_id], |row| Ok(surgery_row_from_rusqlite(row)))?;

    let mut surgeries = Vec::new();
    for row in rows {
        surgeries.push(surgery_from_row(row??)?);
    }
    Ok(surgeries)
}

pub fn get_surgery(conn: &Connection, id: &Uuid) -> Result<Option<Surgery>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, name, date, surgeon, hospital, notes, complications, recovery_time,
         created_at, updated_at
         FROM surgeries WHERE id = ?1",
    )?;
    let mut rows = stmt.query_map(params![id.to_string()], |row| {
        Ok(surgery_row_from_rusqlite(row))
    })?;

    match rows.next() {
        Some(row) => Ok(Some(surgery_from_row(row??)?)),
        None => Ok(None),
    }
}

/// Partial update; absent patch fields leave their columns untouched.
/// A nonexistent id is a no-op.
pub fn update_surgery(
    conn: &Connection,
    id: &Uuid,
    patch: &SurgeryPatch,
) -> Result<(), StoreError> {
    let mut sets = Vec::new();
    let mut values: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

    push_set(&mut sets, &mut values, "name", patch.name.clone());
    push_set(
        &mut sets,
        &mut values,
        "date",
        patch.date.map(|d| d.to_string()),
    );
    push_set(&mut sets, &mut values, "surgeon", patch.surgeon.clone());
    push_set(&mut sets, &mut values, "hospital", patch.hospital.clone());
    push_set(&mut sets, &mut values, "notes", patch.notes.clone());
    push_set(
        &mut sets,
        &mut values,
        "complications",
        match &patch.complications {
            Some(Some(list)) => Some(Some(json_to_sql(list)?)),
            Some(None) => Some(None),
            None => None,
        },
    );
    push_set(
        &mut sets,
        &mut values,
        "recovery_time",
        patch.recovery_time.clone(),
    );

    sets.push("updated_at = ?".to_string());
    values.push(Box::new(timestamp_to_sql(&Utc::now())));
    values.push(Box::new(id.to_string()));

    let sql = format!("UPDATE surgeries SET {} WHERE id = ?", sets.join(", "));
    conn.execute(
        &sql,
        rusqlite::params_from_iter(values.iter().map(|v| v.as_ref())),
    )?;
    Ok(())
}

pub fn delete_surgery(conn: &Connection, id: &Uuid) -> Result<(), StoreError> {
    conn.execute(
        "DELETE FROM surgeries WHERE id = ?1",
        params![id.to_string()],
    )?;
    Ok(())
}

// Internal row type for Surgery mapping
struct SurgeryRow {
    id: String,
    user_id: String,
    name: String,
    date: String,
    surgeon: Option<String>,
    hospital: Option<String>,
    notes: Option<String>,
    complications: Option<String>,
    recovery_time: Option<String>,
    created_at: String,
    updated_at: String,
}

fn surgery_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<SurgeryRow, rusqlite::Error> {
    Ok(SurgeryRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        date: row.get(3)?,
        surgeon: row.get(4)?,
        hospital: row.get(5)?,
        notes: row.get(6)?,
        complications: row.get(7)?,
        recovery_time: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

fn surgery_from_row(row: SurgeryRow) -> Result<Surgery, StoreError> {
    Ok(Surgery {
        id: id_from_sql(&row.id)?,
        user_id: row.user_id,
        name: row.name,
        date: date_from_sql("date", &row.date)?,
        surgeon: row.surgeon,
        hospital: row.hospital,
        notes: row.notes,
        complications: row
            .complications
            .map(|s| json_from_sql("complications", &s))
            .transpose()?,
        recovery_time: row.recovery_time,
        created_at: timestamp_from_sql(&row.created_at)?,
        updated_at: timestamp_from_sql(&row.updated_at)?,
    })
}
