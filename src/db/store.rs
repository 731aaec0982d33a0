//! Record store — owned, initialize-guarded access to the medical database.
//!
//! One explicitly constructed instance is threaded through the profile
//! aggregate (no process-wide singleton), so tests can run an isolated
//! in-memory store per test.

use std::path::PathBuf;

use chrono::NaiveTime;
use rusqlite::Connection;
use tracing;
use uuid::Uuid;

use crate::models::*;

use super::repository;
use super::sqlite::{open_database, open_memory_database};
use super::StoreError;

/// Where the store keeps its data.
#[derive(Debug, Clone)]
pub enum StoreLocation {
    Disk(PathBuf),
    Memory,
}

/// Durable, queryable storage for every record entity.
///
/// Construction is cheap and does not touch the filesystem; `initialize`
/// opens the connection and brings the schema up to date. Every other
/// operation fails with `StoreError::NotInitialized` until that succeeds.
pub struct RecordStore {
    location: StoreLocation,
    conn: Option<Connection>,
}

impl RecordStore {
    pub fn new(location: StoreLocation) -> Self {
        Self {
            location,
            conn: None,
        }
    }

    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self::new(StoreLocation::Disk(path.into()))
    }

    pub fn in_memory() -> Self {
        Self::new(StoreLocation::Memory)
    }

    /// Open the database and run schema migrations. Safe to call again —
    /// a store that already initialized once is left untouched. Open
    /// failures propagate; there is no fallback.
    pub fn initialize(&mut self) -> Result<(), StoreError> {
        if self.conn.is_some() {
            return Ok(());
        }
        let conn = match &self.location {
            StoreLocation::Disk(path) => open_database(path)?,
            StoreLocation::Memory => open_memory_database()?,
        };
        self.conn = Some(conn);
        tracing::info!("Record store initialized");
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.conn.is_some()
    }

    fn conn(&self) -> Result<&Connection, StoreError> {
        self.conn.as_ref().ok_or(StoreError::NotInitialized)
    }

    // ──────────────────────────────────────────────
    // Users
    // ──────────────────────────────────────────────

    pub fn create_user(&self, user: &NewUser) -> Result<String, StoreError> {
        repository::create_user(self.conn()?, user)
    }

    pub fn ensure_user(&self, id: &str, name: &str) -> Result<(), StoreError> {
        repository::ensure_user(self.conn()?, id, name)
    }

    pub fn get_user(&self, id: &str) -> Result<Option<User>, StoreError> {
        repository::get_user(self.conn()?, id)
    }

    // ──────────────────────────────────────────────
    // Chronic conditions
    // ──────────────────────────────────────────────

    pub fn create_chronic_condition(
        &self,
        user_id: &str,
        condition: &NewChronicCondition,
    ) -> Result<Uuid, StoreError> {
        repository::create_chronic_condition(self.conn()?, user_id, condition)
    }

    pub fn get_chronic_conditions(
        &self,
        user_id: &str,
    ) -> Result<Vec<ChronicCondition>, StoreError> {
        repository::get_chronic_conditions(self.conn()?, user_id)
    }

    pub fn update_chronic_condition(
        &self,
        id: &Uuid,
        patch: &ChronicConditionPatch,
    ) -> Result<(), StoreError> {
        repository::update_chronic_condition(self.conn()?, id, patch)
    }

    pub fn delete_chronic_condition(&self, id: &Uuid) -> Result<(), StoreError> {
        repository::delete_chronic_condition(self.conn()?, id)
    }

    // ──────────────────────────────────────────────
    // Medications
    // ──────────────────────────────────────────────

    pub fn create_medication(
        &self,
        user_id: &str,
        medication: &NewMedication,
    ) -> Result<Uuid, StoreError> {
        repository::create_medication(self.conn()?, user_id, medication)
    }

    pub fn get_medications(&self, user_id: &str) -> Result<Vec<Medication>, StoreError> {
        repository::get_medications(self.conn()?, user_id)
    }

    pub fn get_medication_times(
        &self,
        medication_id: &Uuid,
    ) -> Result<Vec<MedicationTime>, StoreError> {
        repository::get_medication_times(self.conn()?, medication_id)
    }

    pub fn update_medication(
        &self,
        id: &Uuid,
        patch: &MedicationPatch,
        times: Option<&[NaiveTime]>,
    ) -> Result<(), StoreError> {
        repository::update_medication(self.conn()?, id, patch, times)
    }

    pub fn delete_medication(&self, id: &Uuid) -> Result<(), StoreError> {
        repository::delete_medication(self.conn()?, id)
    }

    // ──────────────────────────────────────────────
    // Allergies
    // ──────────────────────────────────────────────

    pub fn create_allergy(&self, user_id: &str, allergy: &NewAllergy) -> Result<Uuid, StoreError> {
        repository::create_allergy(self.conn()?, user_id, allergy)
    }

    pub fn get_allergies(&self, user_id: &str) -> Result<Vec<Allergy>, StoreError> {
        repository::get_allergies(self.conn()?, user_id)
    }

    pub fn delete_allergy(&self, id: &Uuid) -> Result<(), StoreError> {
        repository::delete_allergy(self.conn()?, id)
    }

    // ──────────────────────────────────────────────
    // Consultations
    // ──────────────────────────────────────────────

    pub fn create_consultation(
        &self,
        user_id: &str,
        consultation: &NewConsultation,
    ) -> Result<Uuid, StoreError> {
        repository::create_consultation(self.conn()?, user_id, consultation)
    }

    pub fn get_consultations(&self, user_id: &str) -> Result<Vec<Consultation>, StoreError> {
        repository::get_consultations(self.conn()?, user_id)
    }

    pub fn get_consultation(&self, id: &Uuid) -> Result<Option<Consultation>, StoreError> {
        repository::get_consultation(self.conn()?, id)
    }

    pub fn delete_consultation(&self, id: &Uuid) -> Result<(), StoreError> {
        repository::delete_consultation(self.conn()?, id)
    }

    // ──────────────────────────────────────────────
    // Surgeries
    // ──────────────────────────────────────────────

    pub fn create_surgery(&self, user_id: &str, surgery: &NewSurgery) -> Result<Uuid, StoreError> {
        repository::create_surgery(self.conn()?, user_id, surgery)
    }

    pub fn get_surgeries(&self, user_id: &str) -> Result<Vec<Surgery>, StoreError> {
        repository::get_surgeries(self.conn()?, user_id)
    }

    pub fn get_surgery(&self, id: &Uuid) -> Result<Option<Surgery>, StoreError> {
        repository::get_surgery(self.conn()?, id)
    }

    pub fn update_surgery(&self, id: &Uuid, patch: &SurgeryPatch) -> Result<(), StoreError> {
        repository::update_surgery(self.conn()?, id, patch)
    }

    pub fn delete_surgery(&self, id: &Uuid) -> Result<(), StoreError> {
        repository::delete_surgery(self.conn()?, id)
    }

    // ──────────────────────────────────────────────
    // Maintenance
    // ──────────────────────────────────────────────

    /// Destructive wipe of every table. Only the explicit reset path
    /// calls this.
    pub fn clear_all_data(&self) -> Result<(), StoreError> {
        tracing::warn!("Clearing all record store data");
        repository::clear_all_data(self.conn()?)
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::models::enums::ConditionStatus;

    fn new_condition() -> NewChronicCondition {
        NewChronicCondition {
            name: "Asthma".into(),
            diagnosed_date: NaiveDate::from_ymd_opt(2019, 3, 12).unwrap(),
            notes: None,
            severity: None,
            status: ConditionStatus::Active,
        }
    }

    #[test]
    fn operations_before_initialize_fail() {
        let store = RecordStore::in_memory();
        let err = store.get_chronic_conditions("default_user").unwrap_err();
        assert!(matches!(err, StoreError::NotInitialized));
        let err = store
            .create_chronic_condition("default_user", &new_condition())
            .unwrap_err();
        assert!(matches!(err, StoreError::NotInitialized));
    }

    #[test]
    fn initialize_twice_is_a_noop() {
        let mut store = RecordStore::in_memory();
        store.initialize().unwrap();
        store.ensure_user("default_user", "Patient").unwrap();
        store
            .create_chronic_condition("default_user", &new_condition())
            .unwrap();

        // second initialize must not reopen and lose the in-memory data
        store.initialize().unwrap();
        assert_eq!(store.get_chronic_conditions("default_user").unwrap().len(), 1);
    }

    #[test]
    fn disk_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("medical_history.db");

        let mut store = RecordStore::at_path(&path);
        store.initialize().unwrap();
        store.ensure_user("default_user", "Patient").unwrap();
        let id = store
            .create_chronic_condition("default_user", &new_condition())
            .unwrap();
        drop(store);

        let mut reopened = RecordStore::at_path(&path);
        reopened.initialize().unwrap();
        let conditions = reopened.get_chronic_conditions("default_user").unwrap();
        assert_eq!(conditions.len(), 1);
        assert_eq!(conditions[0].id, id);
    }
}
