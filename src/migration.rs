//! One-shot migration of the legacy profile blob into the record store.
//!
//! Runs at most once per install in the common case: callers gate on
//! `is_migration_completed()` and `has_data_to_migrate()` before invoking
//! `migrate_from_legacy`, which sets the completion flag only after a full
//! pass. A failed pass leaves already-inserted rows in place (no rollback)
//! and the flag unset, so a retry will duplicate them — there is no
//! per-item idempotency key in the legacy data to dedup on. Known
//! limitation, inherited from the data, not hidden.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing;

use crate::db::{RecordStore, StoreError};
use crate::legacy::{
    LegacyProfile, LegacyStore, LegacyStoreError, MIGRATION_FLAG_KEY, PROFILE_KEY,
};
use crate::models::enums::{AllergySeverity, ConditionStatus, ConsultationSeverity};
use crate::models::{NewAllergy, NewChronicCondition, NewConsultation, NewMedication};

/// Model label stamped on consultations that predate the relational store.
const LEGACY_AI_MODEL: &str = "gpt-4";

#[derive(Error, Debug)]
pub enum MigrationError {
    #[error("legacy blob could not be parsed: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Legacy(#[from] LegacyStoreError),

    #[error("invalid legacy value for {field}: {value}")]
    InvalidField { field: String, value: String },
}

/// Rows created per entity kind by one migration pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    pub chronic_conditions: usize,
    pub medications: usize,
    pub allergies: usize,
    pub consultations: usize,
}

/// True iff the legacy blob exists and at least one of its four lists is
/// non-empty. Pure check — an unreadable blob counts as nothing to migrate.
pub fn has_data_to_migrate(legacy: &LegacyStore) -> bool {
    match legacy.get_item(PROFILE_KEY) {
        Some(raw) => serde_json::from_str::<LegacyProfile>(raw)
            .map(|profile| !profile.is_empty())
            .unwrap_or(false),
        None => false,
    }
}

/// Reads the persisted completion flag.
pub fn is_migration_completed(legacy: &LegacyStore) -> bool {
    legacy.get_item(MIGRATION_FLAG_KEY) == Some("true")
}

/// Transfer every legacy item into the record store, one row per item.
///
/// Tolerant of an absent blob (zero-count success, flag untouched). On any
/// mid-pass failure the error is returned as-is: rows inserted so far stay,
/// the completion flag stays unset. Re-entry is the caller's gate — this
/// function will happily run a second full pass if asked.
pub fn migrate_from_legacy(
    legacy: &mut LegacyStore,
    store: &RecordStore,
    user_id: &str,
) -> Result<MigrationReport, MigrationError> {
    let Some(raw) = legacy.get_item(PROFILE_KEY) else {
        return Ok(MigrationReport::default());
    };
    let profile: LegacyProfile = serde_json::from_str(raw)?;

    let mut report = MigrationReport::default();

    for condition in &profile.chronic_conditions {
        store.create_chronic_condition(
            user_id,
            &NewChronicCondition {
                name: condition.name.clone(),
                diagnosed_date: parse_legacy_date("diagnosedDate", &condition.diagnosed_date)?,
                notes: condition.notes.clone(),
                severity: None,
                status: ConditionStatus::Active,
            },
        )?;
        report.chronic_conditions += 1;
    }

    for medication in &profile.medications {
        let times = medication
            .times
            .iter()
            .map(|t| parse_legacy_time(t))
            .collect::<Result<Vec<NaiveTime>, _>>()?;
        store.create_medication(
            user_id,
            &NewMedication {
                name: medication.name.clone(),
                dosage: medication.dosage.clone(),
                frequency: medication.frequency.clone(),
                start_date: parse_legacy_date("startDate", &medication.start_date)?,
                end_date: medication
                    .end_date
                    .as_deref()
                    .map(|d| parse_legacy_date("endDate", d))
                    .transpose()?,
                side_effects: medication.side_effects.clone(),
                for_condition: medication.for_condition.clone(),
                notes: medication.notes.clone(),
                times,
            },
        )?;
        report.medications += 1;
    }

    for allergen in &profile.allergies {
        store.create_allergy(
            user_id,
            &NewAllergy {
                allergen: allergen.clone(),
                reaction_type: None,
                // Default severity for migrated allergies — the legacy
                // shape was a bare allergen string.
                severity: Some(AllergySeverity::Mild),
                notes: None,
            },
        )?;
        report.allergies += 1;
    }

    for consultation in &profile.consultations {
        store.create_consultation(
            user_id,
            &NewConsultation {
                date: parse_legacy_timestamp("date", &consultation.date)?,
                symptoms: consultation.symptoms.clone(),
                diagnosis: consultation.diagnosis.clone(),
                recommendations: consultation.recommendations.clone(),
                severity: ConsultationSeverity::from_str(&consultation.severity)?,
                ai_model: Some(LEGACY_AI_MODEL.to_string()),
                image_uri: None,
            },
        )?;
        report.consultations += 1;
    }

    legacy.set_item(MIGRATION_FLAG_KEY, "true")?;
    tracing::info!(
        conditions = report.chronic_conditions,
        medications = report.medications,
        allergies = report.allergies,
        consultations = report.consultations,
        "Legacy migration pass completed"
    );
    Ok(report)
}

/// Destructive reset: drop the legacy blob, the completion flag, and every
/// record store row. Not part of the normal migration flow.
pub fn reset_all_data(
    legacy: &mut LegacyStore,
    store: &RecordStore,
) -> Result<(), MigrationError> {
    tracing::warn!("Resetting legacy store and record store");
    legacy.remove_item(PROFILE_KEY)?;
    legacy.remove_item(MIGRATION_FLAG_KEY)?;
    store.clear_all_data()?;
    Ok(())
}

/// Legacy dates are either bare `YYYY-MM-DD` or a full JS ISO timestamp.
fn parse_legacy_date(field: &str, value: &str) -> Result<NaiveDate, MigrationError> {
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Ok(date);
    }
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.date_naive())
        .map_err(|_| MigrationError::InvalidField {
            field: field.into(),
            value: value.into(),
        })
}

fn parse_legacy_time(value: &str) -> Result<NaiveTime, MigrationError> {
    NaiveTime::parse_from_str(value, "%H:%M").map_err(|_| MigrationError::InvalidField {
        field: "times".into(),
        value: value.into(),
    })
}

fn parse_legacy_timestamp(field: &str, value: &str) -> Result<DateTime<Utc>, MigrationError> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|_| MigrationError::InvalidField {
            field: field.into(),
            value: value.into(),
        })
}
