//! Repository layer — entity-scoped database operations.
//!
//! Free functions over `&Connection`, one sub-module per entity. All public
//! functions are re-exported here; `RecordStore` is the guarded front door.

mod allergy;
mod condition;
mod consultation;
mod medication;
mod surgery;
mod user;

use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat, Utc};
use rusqlite::{Connection, ToSql};
use uuid::Uuid;

use super::StoreError;

pub use allergy::*;
pub use condition::*;
pub use consultation::*;
pub use medication::*;
pub use surgery::*;
pub use user::*;

/// Wipe every table, children before parents.
///
/// Only the explicit "reset" path calls this; nothing invokes it implicitly.
pub fn clear_all_data(conn: &Connection) -> Result<(), StoreError> {
    let tables = [
        "appointments",
        "medical_documents",
        "vital_signs",
        "consultations",
        "allergies",
        "medication_times",
        "medications",
        "chronic_conditions",
        "surgeries",
        "users",
    ];
    for table in tables {
        conn.execute(&format!("DELETE FROM {table}"), [])?;
    }
    Ok(())
}

// ──────────────────────────────────────────────
// Column codecs shared by the entity modules
// ──────────────────────────────────────────────

/// UTC timestamp → fixed-width RFC 3339 text, lexicographically sortable.
pub(crate) fn timestamp_to_sql(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn timestamp_from_sql(s: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(s)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|_| StoreError::InvalidValue {
            field: "timestamp".into(),
            value: s.into(),
        })
}

pub(crate) fn date_from_sql(field: &str, s: &str) -> Result<NaiveDate, StoreError> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").map_err(|_| StoreError::InvalidValue {
        field: field.into(),
        value: s.into(),
    })
}

/// Dose times are "HH:MM" 24h text in the schema.
pub(crate) fn time_to_sql(t: &NaiveTime) -> String {
    t.format("%H:%M").to_string()
}

pub(crate) fn time_from_sql(field: &str, s: &str) -> Result<NaiveTime, StoreError> {
    NaiveTime::parse_from_str(s, "%H:%M").map_err(|_| StoreError::InvalidValue {
        field: field.into(),
        value: s.into(),
    })
}

/// List-valued columns are serialized JSON arrays and must round-trip
/// through the same serialization on read.
pub(crate) fn json_to_sql(list: &[String]) -> Result<String, StoreError> {
    serde_json::to_string(list).map_err(|e| StoreError::InvalidValue {
        field: "json list".into(),
        value: e.to_string(),
    })
}

pub(crate) fn json_from_sql(field: &str, s: &str) -> Result<Vec<String>, StoreError> {
    serde_json::from_str(s).map_err(|_| StoreError::InvalidValue {
        field: field.into(),
        value: s.into(),
    })
}

pub(crate) fn id_from_sql(s: &str) -> Result<Uuid, StoreError> {
    Uuid::parse_str(s).map_err(|e| StoreError::ConstraintViolation(e.to_string()))
}

/// Append one `column = ?` fragment when the patch carries a value.
pub(crate) fn push_set<T: ToSql + 'static>(
    sets: &mut Vec<String>,
    values: &mut Vec<Box<dyn ToSql>>,
    column: &str,
    value: Option<T>,
) {
    if let Some(v) = value {
        sets.push(format!("{column} = ?"));
        values.push(Box::new(v));
    }
}

#[cfg(test)]
mod tests {
    use std::thread::sleep;
    use std::time::Duration;

    use chrono::TimeZone;

    use super::*;
    use crate::db::sqlite::open_memory_database;
    use crate::models::enums::*;
    use crate::models::*;

    fn test_db() -> Connection {
        let conn = open_memory_database().unwrap();
        ensure_user(&conn, "default_user", "Patient").unwrap();
        conn
    }

    fn make_medication(times: &[&str], end_date: Option<NaiveDate>) -> NewMedication {
        NewMedication {
            name: "Metformin".into(),
            dosage: "500mg".into(),
            frequency: "twice daily".into(),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date,
            side_effects: Some(vec!["nausea".into(), "headache".into()]),
            for_condition: Some("Type 2 diabetes".into()),
            notes: None,
            times: times
                .iter()
                .map(|t| NaiveTime::parse_from_str(t, "%H:%M").unwrap())
                .collect(),
        }
    }

    #[test]
    fn condition_create_and_round_trip() {
        let conn = test_db();
        let id = create_chronic_condition(
            &conn,
            "default_user",
            &NewChronicCondition {
                name: "Asthma".into(),
                diagnosed_date: NaiveDate::from_ymd_opt(2019, 3, 12).unwrap(),
                notes: Some("Seasonal".into()),
                severity: Some(ConditionSeverity::Moderate),
                status: ConditionStatus::Active,
            },
        )
        .unwrap();

        let conditions = get_chronic_conditions(&conn, "default_user").unwrap();
        assert_eq!(conditions.len(), 1);
        let c = &conditions[0];
        assert_eq!(c.id, id);
        assert_eq!(c.name, "Asthma");
        assert_eq!(c.diagnosed_date, NaiveDate::from_ymd_opt(2019, 3, 12).unwrap());
        assert_eq!(c.notes.as_deref(), Some("Seasonal"));
        assert_eq!(c.severity, Some(ConditionSeverity::Moderate));
        assert_eq!(c.status, ConditionStatus::Active);
        assert_eq!(c.created_at, c.updated_at);
    }

    #[test]
    fn conditions_ordered_newest_first() {
        let conn = test_db();
        let first = create_chronic_condition(
            &conn,
            "default_user",
            &NewChronicCondition {
                name: "Asthma".into(),
                diagnosed_date: NaiveDate::from_ymd_opt(2019, 3, 12).unwrap(),
                notes: None,
                severity: None,
                status: ConditionStatus::Active,
            },
        )
        .unwrap();
        sleep(Duration::from_millis(5));
        let second = create_chronic_condition(
            &conn,
            "default_user",
            &NewChronicCondition {
                name: "Hypertension".into(),
                diagnosed_date: NaiveDate::from_ymd_opt(2022, 7, 1).unwrap(),
                notes: None,
                severity: None,
                status: ConditionStatus::Active,
            },
        )
        .unwrap();

        let conditions = get_chronic_conditions(&conn, "default_user").unwrap();
        assert_eq!(conditions[0].id, second);
        assert_eq!(conditions[1].id, first);
    }

    #[test]
    fn condition_partial_update_touches_only_given_fields() {
        let conn = test_db();
        let id = create_chronic_condition(
            &conn,
            "default_user",
            &NewChronicCondition {
                name: "Asthma".into(),
                diagnosed_date: NaiveDate::from_ymd_opt(2019, 3, 12).unwrap(),
                notes: Some("Seasonal".into()),
                severity: Some(ConditionSeverity::Mild),
                status: ConditionStatus::Active,
            },
        )
        .unwrap();

        sleep(Duration::from_millis(5));
        update_chronic_condition(
            &conn,
            &id,
            &ChronicConditionPatch {
                status: Some(ConditionStatus::Resolved),
                severity: Some(None),
                ..Default::default()
            },
        )
        .unwrap();

        let c = &get_chronic_conditions(&conn, "default_user").unwrap()[0];
        assert_eq!(c.name, "Asthma");
        assert_eq!(c.notes.as_deref(), Some("Seasonal"));
        assert_eq!(c.status, ConditionStatus::Resolved);
        assert_eq!(c.severity, None);
        assert!(c.updated_at > c.created_at);
    }

    #[test]
    fn update_and_delete_of_unknown_id_are_noops() {
        let conn = test_db();
        let ghost = Uuid::new_v4();
        update_chronic_condition(
            &conn,
            &ghost,
            &ChronicConditionPatch {
                name: Some("Ghost".into()),
                ..Default::default()
            },
        )
        .unwrap();
        delete_chronic_condition(&conn, &ghost).unwrap();
        delete_medication(&conn, &ghost).unwrap();
        delete_surgery(&conn, &ghost).unwrap();
    }

    #[test]
    fn medication_round_trip_with_ordered_times() {
        let conn = test_db();
        let id = create_medication(
            &conn,
            "default_user",
            &make_medication(&["20:00", "08:00"], None),
        )
        .unwrap();

        let meds = get_medications(&conn, "default_user").unwrap();
        assert_eq!(meds.len(), 1);
        let m = &meds[0];
        assert_eq!(m.id, id);
        assert_eq!(m.dosage, "500mg");
        assert_eq!(
            m.side_effects.as_deref(),
            Some(&["nausea".to_string(), "headache".to_string()][..])
        );
        // attached times come back ordered by time of day
        assert_eq!(
            m.times,
            vec![
                NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
                NaiveTime::from_hms_opt(20, 0, 0).unwrap(),
            ]
        );
    }

    #[test]
    fn medication_update_replaces_whole_time_set() {
        let conn = test_db();
        let id = create_medication(
            &conn,
            "default_user",
            &make_medication(&["08:00", "20:00"], None),
        )
        .unwrap();

        update_medication(
            &conn,
            &id,
            &MedicationPatch {
                dosage: Some("850mg".into()),
                ..Default::default()
            },
            Some(&[NaiveTime::from_hms_opt(12, 30, 0).unwrap()]),
        )
        .unwrap();

        let m = &get_medications(&conn, "default_user").unwrap()[0];
        assert_eq!(m.dosage, "850mg");
        assert_eq!(m.name, "Metformin");
        assert_eq!(m.times, vec![NaiveTime::from_hms_opt(12, 30, 0).unwrap()]);
        assert_eq!(get_medication_times(&conn, &id).unwrap().len(), 1);
    }

    #[test]
    fn medication_update_without_times_keeps_existing_rows() {
        let conn = test_db();
        let id = create_medication(
            &conn,
            "default_user",
            &make_medication(&["08:00", "20:00"], None),
        )
        .unwrap();

        update_medication(
            &conn,
            &id,
            &MedicationPatch {
                end_date: Some(Some(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap())),
                ..Default::default()
            },
            None,
        )
        .unwrap();

        let m = &get_medications(&conn, "default_user").unwrap()[0];
        assert_eq!(m.end_date, NaiveDate::from_ymd_opt(2025, 1, 1));
        assert_eq!(m.times.len(), 2);
    }

    #[test]
    fn medication_delete_cascades_to_times() {
        let conn = test_db();
        let id = create_medication(
            &conn,
            "default_user",
            &make_medication(&["08:00", "20:00"], None),
        )
        .unwrap();
        assert_eq!(get_medication_times(&conn, &id).unwrap().len(), 2);

        delete_medication(&conn, &id).unwrap();

        assert!(get_medications(&conn, "default_user").unwrap().is_empty());
        assert!(get_medication_times(&conn, &id).unwrap().is_empty());
    }

    #[test]
    fn allergy_round_trip_and_delete() {
        let conn = test_db();
        let id = create_allergy(
            &conn,
            "default_user",
            &NewAllergy {
                allergen: "Penicillin".into(),
                reaction_type: Some("Hives".into()),
                severity: Some(AllergySeverity::LifeThreatening),
                notes: None,
            },
        )
        .unwrap();

        let allergies = get_allergies(&conn, "default_user").unwrap();
        assert_eq!(allergies.len(), 1);
        assert_eq!(allergies[0].allergen, "Penicillin");
        assert_eq!(allergies[0].severity, Some(AllergySeverity::LifeThreatening));

        delete_allergy(&conn, &id).unwrap();
        assert!(get_allergies(&conn, "default_user").unwrap().is_empty());
    }

    #[test]
    fn consultations_ordered_by_date_not_insertion() {
        let conn = test_db();
        let older = Utc.with_ymd_and_hms(2025, 1, 10, 9, 0, 0).unwrap();
        let newer = Utc.with_ymd_and_hms(2025, 6, 2, 17, 30, 0).unwrap();

        // insert newest-date row first to prove ordering is by date column
        let newer_id = create_consultation(
            &conn,
            "default_user",
            &NewConsultation {
                date: newer,
                symptoms: "Cough".into(),
                diagnosis: "Common cold".into(),
                recommendations: vec!["Rest".into(), "Fluids".into()],
                severity: ConsultationSeverity::Low,
                ai_model: Some("gpt-4".into()),
                image_uri: None,
            },
        )
        .unwrap();
        create_consultation(
            &conn,
            "default_user",
            &NewConsultation {
                date: older,
                symptoms: "Chest pain".into(),
                diagnosis: "Needs urgent review".into(),
                recommendations: vec!["See a doctor immediately".into()],
                severity: ConsultationSeverity::High,
                ai_model: None,
                image_uri: None,
            },
        )
        .unwrap();

        let consultations = get_consultations(&conn, "default_user").unwrap();
        assert_eq!(consultations.len(), 2);
        assert_eq!(consultations[0].id, newer_id);
        assert_eq!(consultations[0].date, newer);
        assert_eq!(
            consultations[0].recommendations,
            vec!["Rest".to_string(), "Fluids".to_string()]
        );

        let single = get_consultation(&conn, &newer_id).unwrap().unwrap();
        assert_eq!(single.symptoms, "Cough");
        assert!(get_consultation(&conn, &Uuid::new_v4()).unwrap().is_none());
    }

    #[test]
    fn surgery_round_trip_update_and_order() {
        let conn = test_db();
        let recent = create_surgery(
            &conn,
            "default_user",
            &NewSurgery {
                name: "Appendectomy".into(),
                date: NaiveDate::from_ymd_opt(2023, 5, 20).unwrap(),
                surgeon: Some("Dr. Osei".into()),
                hospital: Some("General Hospital".into()),
                notes: None,
                complications: Some(vec!["Minor infection".into()]),
                recovery_time: Some("6 weeks".into()),
            },
        )
        .unwrap();
        create_surgery(
            &conn,
            "default_user",
            &NewSurgery {
                name: "Tonsillectomy".into(),
                date: NaiveDate::from_ymd_opt(2009, 8, 3).unwrap(),
                surgeon: None,
                hospital: None,
                notes: None,
                complications: None,
                recovery_time: None,
            },
        )
        .unwrap();

        let surgeries = get_surgeries(&conn, "default_user").unwrap();
        assert_eq!(surgeries[0].id, recent);
        assert_eq!(
            surgeries[0].complications.as_deref(),
            Some(&["Minor infection".to_string()][..])
        );

        update_surgery(
            &conn,
            &recent,
            &SurgeryPatch {
                recovery_time: Some(Some("8 weeks".into())),
                complications: Some(None),
                ..Default::default()
            },
        )
        .unwrap();
        let s = get_surgery(&conn, &recent).unwrap().unwrap();
        assert_eq!(s.recovery_time.as_deref(), Some("8 weeks"));
        assert_eq!(s.complications, None);
        assert_eq!(s.name, "Appendectomy");
    }

    #[test]
    fn user_create_get_and_ensure() {
        let conn = open_memory_database().unwrap();
        let id = create_user(
            &conn,
            &NewUser {
                name: "Ama".into(),
                email: Some("ama@example.com".into()),
                date_of_birth: NaiveDate::from_ymd_opt(1990, 11, 2),
                gender: Some("female".into()),
            },
        )
        .unwrap();
        let user = get_user(&conn, &id).unwrap().unwrap();
        assert_eq!(user.name, "Ama");
        assert_eq!(user.date_of_birth, NaiveDate::from_ymd_opt(1990, 11, 2));

        // ensure_user never overwrites an existing row
        ensure_user(&conn, &id, "Somebody Else").unwrap();
        assert_eq!(get_user(&conn, &id).unwrap().unwrap().name, "Ama");
        assert!(get_user(&conn, "missing").unwrap().is_none());
    }

    #[test]
    fn child_insert_without_user_violates_foreign_key() {
        let conn = open_memory_database().unwrap();
        let result = create_allergy(
            &conn,
            "nobody",
            &NewAllergy {
                allergen: "Dust".into(),
                reaction_type: None,
                severity: None,
                notes: None,
            },
        );
        assert!(result.is_err());
    }

    #[test]
    fn clear_all_data_empties_every_table() {
        let conn = test_db();
        create_chronic_condition(
            &conn,
            "default_user",
            &NewChronicCondition {
                name: "Asthma".into(),
                diagnosed_date: NaiveDate::from_ymd_opt(2019, 3, 12).unwrap(),
                notes: None,
                severity: None,
                status: ConditionStatus::Active,
            },
        )
        .unwrap();
        create_medication(&conn, "default_user", &make_medication(&["08:00"], None)).unwrap();
        create_allergy(
            &conn,
            "default_user",
            &NewAllergy {
                allergen: "Peanuts".into(),
                reaction_type: None,
                severity: None,
                notes: None,
            },
        )
        .unwrap();

        clear_all_data(&conn).unwrap();

        assert!(get_chronic_conditions(&conn, "default_user").unwrap().is_empty());
        assert!(get_medications(&conn, "default_user").unwrap().is_empty());
        assert!(get_allergies(&conn, "default_user").unwrap().is_empty());
        assert!(get_consultations(&conn, "default_user").unwrap().is_empty());
        assert!(get_surgeries(&conn, "default_user").unwrap().is_empty());
        assert!(get_user(&conn, "default_user").unwrap().is_none());
    }
}
