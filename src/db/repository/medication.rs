use chrono::{NaiveTime, Utc};
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::StoreError;
use crate::models::{Medication, MedicationPatch, MedicationTime, NewMedication};

use super::{
    date_from_sql, id_from_sql, json_from_sql, json_to_sql, push_set, time_from_sql, time_to_sql,
    timestamp_from_sql, timestamp_to_sql,
};

/// Insert a medication plus one `medication_times` row per dose time.
///
/// One transaction: a medication never lands without its times.
pub fn create_medication(
    conn: &Connection,
    user_id: &str,
    medication: &NewMedication,
) -> Result<Uuid, StoreError> {
    let id = Uuid::new_v4();
    let now = timestamp_to_sql(&Utc::now());

    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "INSERT INTO medications (id, user_id, name, dosage, frequency, start_date, end_date,
         side_effects, for_condition, notes, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            id.to_string(),
            user_id,
            medication.name,
            medication.dosage,
            medication.frequency,
            medication.start_date.to_string(),
            medication.end_date.map(|d| d.to_string()),
            medication
                .side_effects
                .as_deref()
                .map(json_to_sql)
                .transpose()?,
            medication.for_condition,
            medication.notes,
            now,
            now,
        ],
    )?;

    insert_medication_times(&tx, &id, &medication.times, &now)?;
    tx.commit()?;
    Ok(id)
}

fn insert_medication_times(
    conn: &Connection,
    medication_id: &Uuid,
    times: &[NaiveTime],
    now: &str,
) -> Result<(), StoreError> {
    for time in times {
        conn.execute(
            "INSERT INTO medication_times (id, medication_id, time, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                Uuid::new_v4().to_string(),
                medication_id.to_string(),
                time_to_sql(time),
                now,
            ],
        )?;
    }
    Ok(())
}

/// All medications for the user, newest first, each with its ordered dose
/// times attached.
pub fn get_medications(conn: &Connection, user_id: &str) -> Result<Vec<Medication>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, name, dosage, frequency, start_date, end_date,
         side_effects, for_condition, notes, created_at, updated_at
         FROM medications WHERE user_id = ?1 ORDER BY created_at DESC",
    )?;

    let rows = stmt.query_map(params![user_id], |row| Ok(medication_row_from_rusqlite(row)))?;

    let mut meds = Vec::new();
    for row in rows {
        let mut med = medication_from_row(row??)?;
        med.times = get_medication_times(conn, &med.id)?
            .into_iter()
            .map(|t| t.time)
            .collect();
        meds.push(med);
    }
    Ok(meds)
}

/// Dose-time rows for one medication, ordered by time of day.
pub fn get_medication_times(
    conn: &Connection,
    medication_id: &Uuid,
) -> Result<Vec<MedicationTime>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT id, medication_id, time, created_at
         FROM medication_times WHERE medication_id = ?1 ORDER BY time",
    )?;

    let rows = stmt.query_map(params![medication_id.to_string()], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, String>(3)?,
        ))
    })?;

    let mut times = Vec::new();
    for row in rows {
        let (id, med_id, time, created) = row?;
        times.push(MedicationTime {
            id: id_from_sql(&id)?,
            medication_id: id_from_sql(&med_id)?,
            time: time_from_sql("time", &time)?,
            created_at: timestamp_from_sql(&created)?,
        });
    }
    Ok(times)
}

/// Partial update; absent patch fields leave their columns untouched.
/// When `times` is given the whole dose-time set is replaced — delete-all
/// then re-insert, never a partial merge, in the same transaction as the
/// column update. A nonexistent id is a no-op.
pub fn update_medication(
    conn: &Connection,
    id: &Uuid,
    patch: &MedicationPatch,
    times: Option<&[NaiveTime]>,
) -> Result<(), StoreError> {
    let now = timestamp_to_sql(&Utc::now());
    let tx = conn.unchecked_transaction()?;

    let mut sets = Vec::new();
    let mut values: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

    push_set(&mut sets, &mut values, "name", patch.name.clone());
    push_set(&mut sets, &mut values, "dosage", patch.dosage.clone());
    push_set(&mut sets, &mut values, "frequency", patch.frequency.clone());
    push_set(
        &mut sets,
        &mut values,
        "start_date",
        patch.start_date.map(|d| d.to_string()),
    );
    push_set(
        &mut sets,
        &mut values,
        "end_date",
        patch.end_date.map(|d| d.map(|d| d.to_string())),
    );
    push_set(
        &mut sets,
        &mut values,
        "side_effects",
        match &patch.side_effects {
            Some(Some(list)) => Some(Some(json_to_sql(list)?)),
            Some(None) => Some(None),
            None => None,
        },
    );
    push_set(
        &mut sets,
        &mut values,
        "for_condition",
        patch.for_condition.clone(),
    );
    push_set(&mut sets, &mut values, "notes", patch.notes.clone());

    sets.push("updated_at = ?".to_string());
    values.push(Box::new(now.clone()));
    values.push(Box::new(id.to_string()));

    let sql = format!("UPDATE medications SET {} WHERE id = ?", sets.join(", "));
    tx.execute(
        &sql,
        rusqlite::params_from_iter(values.iter().map(|v| v.as_ref())),
    )?;

    if let Some(times) = times {
        tx.execute(
            "DELETE FROM medication_times WHERE medication_id = ?1",
            params![id.to_string()],
        )?;
        insert_medication_times(&tx, id, times, &now)?;
    }
    tx.commit()?;
    Ok(())
}

/// Dose-time rows go with the parent via the schema cascade.
pub fn delete_medication(conn: &Connection, id: &Uuid) -> Result<(), StoreError> {
    conn.execute(
        "DELETE FROM medications WHERE id = ?1",
        params![id.to_string()],
    )?;
    Ok(())
}

// Internal row type for Medication mapping
struct MedicationRow {
    id: String,
    user_id: String,
    name: String,
    dosage: String,
    frequency: String,
    start_date: String,
    end_date: Option<String>,
    side_effects: Option<String>,
    for_condition: Option<String>,
    notes: Option<String>,
    created_at: String,
    updated_at: String,
}

fn medication_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<MedicationRow, rusqlite::Error> {
    Ok(MedicationRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        name: row.get(2)?,
        dosage: row.get(3)?,
        frequency: row.get(4)?,
        start_date: row.get(5)?,
        end_date: row.get(6)?,
        side_effects: row.get(7)?,
        for_condition: row.get(8)?,
        notes: row.get(9)?,
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

fn medication_from_row(row: MedicationRow) -> Result<Medication, StoreError> {
    Ok(Medication {
        id: id_from_sql(&row.id)?,
        user_id: row.user_id,
        name: row.name,
        dosage: row.dosage,
        frequency: row.frequency,
        start_date: date_from_sql("start_date", &row.start_date)?,
        end_date: row
            .end_date
            .map(|d| date_from_sql("end_date", &d))
            .transpose()?,
        side_effects: row
            .side_effects
            .map(|s| json_from_sql("side_effects", &s))
            .transpose()?,
        for_condition: row.for_condition,
        notes: row.notes,
        times: Vec::new(),
        created_at: timestamp_from_sql(&row.created_at)?,
        updated_at: timestamp_from_sql(&row.updated_at)?,
    })
}
