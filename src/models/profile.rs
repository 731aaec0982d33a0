use serde::{Deserialize, Serialize};

use super::allergy::Allergy;
use super::condition::ChronicCondition;
use super::consultation::Consultation;
use super::medication::Medication;
use super::surgery::Surgery;

/// Full in-memory copy of one user's medical profile.
///
/// Rebuilt wholesale from the record store after every mutation — never
/// patched incrementally, so it is always a faithful re-read of storage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MedicalProfile {
    pub chronic_conditions: Vec<ChronicCondition>,
    pub medications: Vec<Medication>,
    pub allergies: Vec<Allergy>,
    pub consultations: Vec<Consultation>,
    pub surgeries: Vec<Surgery>,
}

impl MedicalProfile {
    pub fn is_empty(&self) -> bool {
        self.chronic_conditions.is_empty()
            && self.medications.is_empty()
            && self.allergies.is_empty()
            && self.consultations.is_empty()
            && self.surgeries.is_empty()
    }
}
