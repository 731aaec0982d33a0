//! Legacy storage medium — the flat key-value store the app used before
//! the relational schema existed.
//!
//! One JSON object file maps string keys to string values, mirroring the
//! superseded mobile key-value plugin. Two keys matter: the serialized
//! profile blob, and the migration completion flag. The migration service
//! reads the former and retires it; nothing else writes here anymore.

use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Key holding the serialized legacy profile blob.
pub const PROFILE_KEY: &str = "medical_profile";

/// Key holding the literal string `"true"` once migration has completed.
pub const MIGRATION_FLAG_KEY: &str = "migration_completed";

#[derive(Error, Debug)]
pub enum LegacyStoreError {
    #[error("legacy store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("legacy store file is not valid JSON: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// File-backed string key-value store. The whole map is loaded on open and
/// written through on every mutation; the data set is a handful of keys.
pub struct LegacyStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl LegacyStore {
    /// Load the store from disk. A missing file is an empty store, not an
    /// error; a present-but-corrupt file is surfaced.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, LegacyStoreError> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self { path, entries })
    }

    pub fn get_item(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn set_item(&mut self, key: &str, value: &str) -> Result<(), LegacyStoreError> {
        self.entries.insert(key.to_string(), value.to_string());
        self.persist()
    }

    pub fn remove_item(&mut self, key: &str) -> Result<(), LegacyStoreError> {
        if self.entries.remove(key).is_some() {
            self.persist()?;
        }
        Ok(())
    }

    fn persist(&self) -> Result<(), LegacyStoreError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(&self.entries)?;
        fs::write(&self.path, raw)?;
        Ok(())
    }
}

// ──────────────────────────────────────────────
// Blob shape — exactly what the superseded app serialized
// ──────────────────────────────────────────────

/// The legacy profile blob. Field names are camelCase on the wire.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LegacyProfile {
    pub chronic_conditions: Vec<LegacyCondition>,
    pub medications: Vec<LegacyMedication>,
    pub allergies: Vec<String>,
    pub consultations: Vec<LegacyConsultation>,
}

impl LegacyProfile {
    pub fn is_empty(&self) -> bool {
        self.chronic_conditions.is_empty()
            && self.medications.is_empty()
            && self.allergies.is_empty()
            && self.consultations.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyCondition {
    pub id: String,
    pub name: String,
    pub diagnosed_date: String,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyMedication {
    pub id: String,
    pub name: String,
    pub dosage: String,
    pub frequency: String,
    #[serde(default)]
    pub times: Vec<String>,
    pub start_date: String,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub side_effects: Option<Vec<String>>,
    #[serde(default)]
    pub for_condition: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyConsultation {
    pub id: String,
    pub date: String,
    pub symptoms: String,
    pub diagnosis: String,
    #[serde(default)]
    pub recommendations: Vec<String>,
    pub severity: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_an_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = LegacyStore::open(dir.path().join("kv.json")).unwrap();
        assert!(store.get_item(PROFILE_KEY).is_none());
    }

    #[test]
    fn set_get_remove_round_trip_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kv.json");

        let mut store = LegacyStore::open(&path).unwrap();
        store.set_item(MIGRATION_FLAG_KEY, "true").unwrap();
        assert_eq!(store.get_item(MIGRATION_FLAG_KEY), Some("true"));
        drop(store);

        let mut reopened = LegacyStore::open(&path).unwrap();
        assert_eq!(reopened.get_item(MIGRATION_FLAG_KEY), Some("true"));
        reopened.remove_item(MIGRATION_FLAG_KEY).unwrap();
        drop(reopened);

        let third = LegacyStore::open(&path).unwrap();
        assert!(third.get_item(MIGRATION_FLAG_KEY).is_none());
    }

    #[test]
    fn blob_parses_camel_case_wire_shape() {
        let raw = r#"{
            "chronicConditions": [
                {"id": "c1", "name": "Asthma", "diagnosedDate": "2019-03-12", "notes": "Seasonal"}
            ],
            "medications": [
                {"id": "m1", "name": "Metformin", "dosage": "500mg", "frequency": "twice daily",
                 "times": ["08:00", "20:00"], "startDate": "2024-01-01",
                 "sideEffects": ["nausea"], "forCondition": "Type 2 diabetes"}
            ],
            "allergies": ["Peanuts"],
            "consultations": [
                {"id": "k1", "date": "2025-01-10T09:00:00.000Z", "symptoms": "Cough",
                 "diagnosis": "Common cold", "recommendations": ["Rest"], "severity": "low"}
            ]
        }"#;
        let profile: LegacyProfile = serde_json::from_str(raw).unwrap();
        assert_eq!(profile.chronic_conditions[0].diagnosed_date, "2019-03-12");
        assert_eq!(profile.medications[0].times.len(), 2);
        assert_eq!(profile.medications[0].end_date, None);
        assert_eq!(profile.consultations[0].severity, "low");
        assert!(!profile.is_empty());
        assert!(LegacyProfile::default().is_empty());
    }
}
