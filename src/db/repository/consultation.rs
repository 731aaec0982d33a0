use std::str::FromStr;

use chrono::Utc;
use rusqlite::{params, Connection};
use uuid::Uuid;

use crate::db::StoreError;
use crate::models::enums::ConsultationSeverity;
use crate::models::{Consultation, NewConsultation};

use super::{id_from_sql, json_from_sql, json_to_sql, timestamp_from_sql, timestamp_to_sql};

pub fn create_consultation(
    conn: &Connection,
    user_id: &str,
    consultation: &NewConsultation,
) -> Result<Uuid, StoreError> {
    let id = Uuid::new_v4();
    let now = timestamp_to_sql(&Utc::now());

    conn.execute(
        "INSERT INTO consultations (id, user_id, date, symptoms, diagnosis, recommendations,
         severity, ai_model, image_uri, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            id.to_string(),
            user_id,
            timestamp_to_sql(&consultation.date),
            consultation.symptoms,
            consultation.diagnosis,
            json_to_sql(&consultation.recommendations)?,
            consultation.severity.as_str(),
            consultation.ai_model,
            consultation.image_uri,
            now,
            now,
        ],
    )?;
    Ok(id)
}

/// All consultations for the user, newest first by consultation date.
pub fn get_consultations(conn: &Connection, user_id: &str) -> Result<Vec<Consultation>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, date, symptoms, diagnosis, recommendations, severity, ai_model,
         image_uri, created_at, updated_at
         FROM consultations WHERE user_id = ?1 ORDER BY date DESC",
    )?;
    let rows = stmt.query_map(params![user_id], |row| Ok(consultation_row_from_rusqlite(row)))?;

    let mut consultations = Vec::new();
    for row in rows {
        consultations.push(consultation_from_row(row??)?);
    }
    Ok(consultations)
}

pub fn get_consultation(conn: &Connection, id: &Uuid) -> Result<Option<Consultation>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT id, user_id, date, symptoms, diagnosis, recommendations, severity, ai_model,
         image_uri, created_at, updated_at
         FROM consultations WHERE id = ?1",
    )?;
    let mut rows = stmt.query_map(params![id.to_string()], |row| {
        Ok(consultation_row_from_rusqlite(row))
    })?;

    match rows.next() {
        Some(row) => Ok(Some(consultation_from_row(row??)?)),
        None => Ok(None),
    }
}

pub fn delete_consultation(conn: &Connection, id: &Uuid) -> Result<(), StoreError> {
    conn.execute(
        "DELETE FROM consultations WHERE id = ?1",
        params![id.to_string()],
    )?;
    Ok(())
}

// Internal row type for Consultation mapping
struct ConsultationRow {
    id: String,
    user_id: String,
    date: String,
    symptoms: String,
    diagnosis: String,
    recommendations: Option<String>,
    severity: String,
    ai_model: Option<String>,
    image_uri: Option<String>,
    created_at: String,
    updated_at: String,
}

fn consultation_row_from_rusqlite(
    row: &rusqlite::Row<'_>,
) -> Result<ConsultationRow, rusqlite::Error> {
    Ok(ConsultationRow {
        id: row.get(0)?,
        user_id: row.get(1)?,
        date: row.get(2)?,
        symptoms: row.get(3)?,
        diagnosis: row.get(4)?,
        recommendations: row.get(5)?,
        severity: row.get(6)?,
        ai_model: row.get(7)?,
        image_uri: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

fn consultation_from_row(row: ConsultationRow) -> Result<Consultation, StoreError> {
    Ok(Consultation {
        id: id_from_sql(&row.id)?,
        user_id: row.user_id,
        date: timestamp_from_sql(&row.date)?,
        symptoms: row.symptoms,
        diagnosis: row.diagnosis,
        recommendations: row
            .recommendations
            .map(|s| json_from_sql("recommendations", &s))
            .transpose()?
            .unwrap_or_default(),
        severity: ConsultationSeverity::from_str(&row.severity)?,
        ai_model: row.ai_model,
        image_uri: row.image_uri,
        created_at: timestamp_from_sql(&row.created_at)?,
        updated_at: timestamp_from_sql(&row.updated_at)?,
    })
}
