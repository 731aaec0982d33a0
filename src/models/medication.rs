use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A medication with its scheduled dose times attached (ordered by time).
///
/// There is no stored active flag: activity is derived from `end_date`
/// at read time, so it can never go stale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Medication {
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    pub dosage: String,
    pub frequency: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub side_effects: Option<Vec<String>>,
    pub for_condition: Option<String>,
    pub notes: Option<String>,
    pub times: Vec<NaiveTime>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Medication {
    /// Active on `today` iff there is no end date or the end date is still
    /// in the future. A medication ending today already counts as ended.
    pub fn is_active_on(&self, today: NaiveDate) -> bool {
        self.end_date.map_or(true, |end| end > today)
    }

    /// Active against the local wall clock.
    pub fn is_active(&self) -> bool {
        self.is_active_on(chrono::Local::now().date_naive())
    }
}

/// One scheduled dose-time row. Child of a medication; the full set is
/// replaced wholesale whenever times change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MedicationTime {
    pub id: Uuid,
    pub medication_id: Uuid,
    pub time: NaiveTime,
    pub created_at: DateTime<Utc>,
}

/// Input fields for a new medication; the store assigns id and timestamps
/// and creates one `medication_times` row per entry in `times`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMedication {
    pub name: String,
    pub dosage: String,
    pub frequency: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub side_effects: Option<Vec<String>>,
    pub for_condition: Option<String>,
    pub notes: Option<String>,
    pub times: Vec<NaiveTime>,
}

/// Partial update. `None` leaves a column untouched; for nullable columns
/// the inner `Option` distinguishes set from clear. Dose times travel
/// separately (`RecordStore::update_medication`), since replacing them is a
/// delete-all + re-insert rather than a column write.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MedicationPatch {
    pub name: Option<String>,
    pub dosage: Option<String>,
    pub frequency: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<Option<NaiveDate>>,
    pub side_effects: Option<Option<Vec<String>>>,
    pub for_condition: Option<Option<String>>,
    pub notes: Option<Option<String>>,
}
