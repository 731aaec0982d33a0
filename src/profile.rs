//! Profile aggregate — one coherent in-memory snapshot of the user's
//! medical profile, with every mutation serialized through the record store.
//!
//! Mutations never patch the snapshot in place: each one performs its
//! store write and then re-reads every table. Two I/O round trips per
//! mutation is the price for a snapshot that cannot drift from storage —
//! a deliberate trade for this small single-user dataset.

use chrono::{Local, NaiveDateTime, NaiveTime, TimeDelta};
use tracing;
use uuid::Uuid;

use crate::config::{DEFAULT_USER_ID, DEFAULT_USER_NAME};
use crate::db::{RecordStore, StoreError};
use crate::legacy::LegacyStore;
use crate::migration;
use crate::models::{
    MedicalProfile, Medication, MedicationPatch, NewAllergy, NewChronicCondition, NewConsultation,
    NewMedication, NewSurgery,
};

/// Dose times at most this far ahead count as upcoming.
const UPCOMING_WINDOW_MINUTES: i64 = 60;

pub struct ProfileAggregate {
    store: RecordStore,
    legacy: LegacyStore,
    user_id: String,
    profile: MedicalProfile,
    ready: bool,
}

impl ProfileAggregate {
    /// Build an inactive aggregate for the implicit single user. Nothing
    /// touches storage until `activate`.
    pub fn new(store: RecordStore, legacy: LegacyStore) -> Self {
        Self::with_user(store, legacy, DEFAULT_USER_ID)
    }

    pub fn with_user(store: RecordStore, legacy: LegacyStore, user_id: impl Into<String>) -> Self {
        Self {
            store,
            legacy,
            user_id: user_id.into(),
            profile: MedicalProfile::default(),
            ready: false,
        }
    }

    /// Bring the aggregate up: initialize the store, run the legacy
    /// migration if it has never completed and there is data to move,
    /// then load the full snapshot.
    ///
    /// Store initialization failures propagate — there is no fallback
    /// state to operate in. A failed migration is logged and skipped; the
    /// app still comes up against whatever the store already holds.
    pub fn activate(&mut self) -> Result<(), StoreError> {
        self.store.initialize()?;
        self.store.ensure_user(&self.user_id, DEFAULT_USER_NAME)?;
        self.ready = true;

        if !migration::is_migration_completed(&self.legacy)
            && migration::has_data_to_migrate(&self.legacy)
        {
            tracing::info!("Migrating legacy profile into the record store");
            match migration::migrate_from_legacy(&mut self.legacy, &self.store, &self.user_id) {
                Ok(report) => tracing::info!(
                    conditions = report.chronic_conditions,
                    medications = report.medications,
                    allergies = report.allergies,
                    consultations = report.consultations,
                    "Legacy migration completed"
                ),
                Err(e) => tracing::error!("Legacy migration failed: {e}"),
            }
        }

        self.refresh()
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// The current snapshot. Empty until `activate` has run.
    pub fn profile(&self) -> &MedicalProfile {
        &self.profile
    }

    /// Reload every entity list from the store. Always a full replace.
    pub fn refresh(&mut self) -> Result<(), StoreError> {
        if !self.ready {
            return Ok(());
        }
        self.profile = MedicalProfile {
            chronic_conditions: self.store.get_chronic_conditions(&self.user_id)?,
            medications: self.store.get_medications(&self.user_id)?,
            allergies: self.store.get_allergies(&self.user_id)?,
            consultations: self.store.get_consultations(&self.user_id)?,
            surgeries: self.store.get_surgeries(&self.user_id)?,
        };
        Ok(())
    }

    // ──────────────────────────────────────────────
    // Mutators — one store write, then a full reload.
    // Before activation each is a silent no-op.
    // ──────────────────────────────────────────────

    pub fn add_chronic_condition(
        &mut self,
        condition: NewChronicCondition,
    ) -> Result<(), StoreError> {
        if !self.ready {
            return Ok(());
        }
        self.store
            .create_chronic_condition(&self.user_id, &condition)?;
        self.refresh()
    }

    pub fn remove_chronic_condition(&mut self, id: &Uuid) -> Result<(), StoreError> {
        if !self.ready {
            return Ok(());
        }
        self.store.delete_chronic_condition(id)?;
        self.refresh()
    }

    pub fn add_medication(&mut self, medication: NewMedication) -> Result<(), StoreError> {
        if !self.ready {
            return Ok(());
        }
        self.store.create_medication(&self.user_id, &medication)?;
        self.refresh()
    }

    pub fn update_medication(
        &mut self,
        id: &Uuid,
        patch: MedicationPatch,
        times: Option<Vec<NaiveTime>>,
    ) -> Result<(), StoreError> {
        if !self.ready {
            return Ok(());
        }
        self.store.update_medication(id, &patch, times.as_deref())?;
        self.refresh()
    }

    pub fn remove_medication(&mut self, id: &Uuid) -> Result<(), StoreError> {
        if !self.ready {
            return Ok(());
        }
        self.store.delete_medication(id)?;
        self.refresh()
    }

    pub fn add_allergy(&mut self, allergy: NewAllergy) -> Result<(), StoreError> {
        if !self.ready {
            return Ok(());
        }
        self.store.create_allergy(&self.user_id, &allergy)?;
        self.refresh()
    }

    /// Remove by allergen text — the UI works with allergen names, not ids.
    /// Unknown allergen is a no-op.
    pub fn remove_allergy(&mut self, allergen: &str) -> Result<(), StoreError> {
        if !self.ready {
            return Ok(());
        }
        let allergies = self.store.get_allergies(&self.user_id)?;
        if let Some(found) = allergies.iter().find(|a| a.allergen == allergen) {
            self.store.delete_allergy(&found.id)?;
            self.refresh()?;
        }
        Ok(())
    }

    pub fn add_consultation(&mut self, consultation: NewConsultation) -> Result<(), StoreError> {
        if !self.ready {
            return Ok(());
        }
        self.store
            .create_consultation(&self.user_id, &consultation)?;
        self.refresh()
    }

    pub fn add_surgery(&mut self, surgery: NewSurgery) -> Result<(), StoreError> {
        if !self.ready {
            return Ok(());
        }
        self.store.create_surgery(&self.user_id, &surgery)?;
        self.refresh()
    }

    pub fn remove_surgery(&mut self, id: &Uuid) -> Result<(), StoreError> {
        if !self.ready {
            return Ok(());
        }
        self.store.delete_surgery(id)?;
        self.refresh()
    }

    /// Destructive start-over: clears the legacy medium, the migration
    /// flag, and every store table, then reloads the (now empty) snapshot.
    pub fn reset(&mut self) -> Result<(), migration::MigrationError> {
        if !self.ready {
            return Ok(());
        }
        migration::reset_all_data(&mut self.legacy, &self.store)?;
        // the wipe removed the user row; recreate it so writes keep working
        self.store.ensure_user(&self.user_id, DEFAULT_USER_NAME)?;
        self.refresh()?;
        Ok(())
    }

    // ──────────────────────────────────────────────
    // Queries over the snapshot
    // ──────────────────────────────────────────────

    /// Medications still active at `now` with at least one dose time in
    /// the next 60 minutes. Recomputed on demand from the snapshot —
    /// callers wanting live updates re-invoke on their own timer.
    pub fn upcoming_medications_at(&self, now: NaiveDateTime) -> Vec<&Medication> {
        self.profile
            .medications
            .iter()
            .filter(|med| med.is_active_on(now.date()))
            .filter(|med| {
                med.times.iter().any(|time| {
                    let dose = now.date().and_time(*time);
                    let until = dose - now;
                    until > TimeDelta::zero() && until < TimeDelta::minutes(UPCOMING_WINDOW_MINUTES)
                })
            })
            .collect()
    }

    /// Upcoming medications against the local wall clock.
    pub fn upcoming_medications(&self) -> Vec<&Medication> {
        self.upcoming_medications_at(Local::now().naive_local())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};

    use super::*;
    use crate::legacy::PROFILE_KEY;
    use crate::models::enums::{ConditionStatus, ConsultationSeverity};

    fn empty_aggregate() -> (tempfile::TempDir, ProfileAggregate) {
        let dir = tempfile::tempdir().unwrap();
        let legacy = LegacyStore::open(dir.path().join("kv.json")).unwrap();
        (dir, ProfileAggregate::new(RecordStore::in_memory(), legacy))
    }

    fn new_medication(times: &[&str], end_date: Option<NaiveDate>) -> NewMedication {
        NewMedication {
            name: "Metformin".into(),
            dosage: "500mg".into(),
            frequency: "twice daily".into(),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date,
            side_effects: None,
            for_condition: None,
            notes: None,
            times: times
                .iter()
                .map(|t| NaiveTime::parse_from_str(t, "%H:%M").unwrap())
                .collect(),
        }
    }

    #[test]
    fn mutators_are_noops_before_activation() {
        let (_d, mut agg) = empty_aggregate();
        assert!(!agg.is_ready());
        agg.add_allergy(NewAllergy {
            allergen: "Peanuts".into(),
            reaction_type: None,
            severity: None,
            notes: None,
        })
        .unwrap();
        assert!(agg.profile().is_empty());
    }

    #[test]
    fn mutation_rebuilds_the_snapshot_from_the_store() {
        let (_d, mut agg) = empty_aggregate();
        agg.activate().unwrap();

        agg.add_chronic_condition(NewChronicCondition {
            name: "Asthma".into(),
            diagnosed_date: NaiveDate::from_ymd_opt(2019, 3, 12).unwrap(),
            notes: None,
            severity: None,
            status: ConditionStatus::Active,
        })
        .unwrap();
        assert_eq!(agg.profile().chronic_conditions.len(), 1);

        let id = agg.profile().chronic_conditions[0].id;
        agg.remove_chronic_condition(&id).unwrap();
        assert!(agg.profile().chronic_conditions.is_empty());
    }

    #[test]
    fn remove_allergy_matches_on_allergen_text() {
        let (_d, mut agg) = empty_aggregate();
        agg.activate().unwrap();

        agg.add_allergy(NewAllergy {
            allergen: "Peanuts".into(),
            reaction_type: None,
            severity: None,
            notes: None,
        })
        .unwrap();
        agg.remove_allergy("Dust").unwrap();
        assert_eq!(agg.profile().allergies.len(), 1);
        agg.remove_allergy("Peanuts").unwrap();
        assert!(agg.profile().allergies.is_empty());
    }

    #[test]
    fn activation_runs_the_legacy_migration_once() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kv.json");
        let mut legacy = LegacyStore::open(&path).unwrap();
        legacy
            .set_item(
                PROFILE_KEY,
                r#"{"chronicConditions": [
                    {"id": "c1", "name": "Asthma", "diagnosedDate": "2019-03-12"}
                ], "medications": [], "allergies": ["Peanuts"], "consultations": []}"#,
            )
            .unwrap();

        let mut agg = ProfileAggregate::new(RecordStore::in_memory(), legacy);
        agg.activate().unwrap();

        assert_eq!(agg.profile().chronic_conditions.len(), 1);
        assert_eq!(agg.profile().allergies.len(), 1);

        // flag now set — a second activation must not duplicate rows
        agg.activate().unwrap();
        assert_eq!(agg.profile().chronic_conditions.len(), 1);
    }

    #[test]
    fn add_consultation_carries_the_boundary_severity() {
        let (_d, mut agg) = empty_aggregate();
        agg.activate().unwrap();

        agg.add_consultation(NewConsultation {
            date: Utc.with_ymd_and_hms(2025, 6, 2, 17, 30, 0).unwrap(),
            symptoms: "Chest pain".into(),
            diagnosis: "Needs urgent review".into(),
            recommendations: vec!["See a doctor immediately".into()],
            severity: ConsultationSeverity::High,
            ai_model: Some("claude-sonnet".into()),
            image_uri: None,
        })
        .unwrap();

        assert_eq!(
            agg.profile().consultations[0].severity,
            ConsultationSeverity::High
        );
    }

    #[test]
    fn upcoming_medications_fixed_now_cases() {
        let (_d, mut agg) = empty_aggregate();
        agg.activate().unwrap();

        // fixed simulated now: 2025-06-10 10:00
        let now = NaiveDate::from_ymd_opt(2025, 6, 10)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();

        // dose 15 minutes from now → upcoming
        agg.add_medication(new_medication(&["10:15"], None)).unwrap();
        // dose 90 minutes from now → not upcoming
        agg.add_medication(new_medication(&["11:30"], None)).unwrap();
        // dose 15 minutes from now but ended yesterday → not upcoming
        agg.add_medication(new_medication(
            &["10:15"],
            NaiveDate::from_ymd_opt(2025, 6, 9),
        ))
        .unwrap();

        let upcoming = agg.upcoming_medications_at(now);
        assert_eq!(upcoming.len(), 1);
        assert_eq!(upcoming[0].times, vec![NaiveTime::from_hms_opt(10, 15, 0).unwrap()]);
        assert!(upcoming[0].end_date.is_none());
    }

    #[test]
    fn reset_empties_everything() {
        let (_d, mut agg) = empty_aggregate();
        agg.activate().unwrap();
        agg.add_medication(new_medication(&["08:00"], None)).unwrap();
        assert!(!agg.profile().is_empty());

        agg.reset().unwrap();
        assert!(agg.profile().is_empty());

        // the aggregate stays writable after a reset
        agg.add_medication(new_medication(&["09:00"], None)).unwrap();
        assert_eq!(agg.profile().medications.len(), 1);
    }
}
