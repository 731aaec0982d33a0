use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Surgery {
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    pub date: NaiveDate,
    pub surgeon: Option<String>,
    pub hospital: Option<String>,
    pub notes: Option<String>,
    pub complications: Option<Vec<String>>,
    pub recovery_time: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input fields for a new surgery; the store assigns id and timestamps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSurgery {
    pub name: String,
    pub date: NaiveDate,
    pub surgeon: Option<String>,
    pub hospital: Option<String>,
    pub notes: Option<String>,
    pub complications: Option<Vec<String>>,
    pub recovery_time: Option<String>,
}

/// Partial update. `None` leaves a column untouched; for nullable columns
/// the inner `Option` distinguishes set from clear.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SurgeryPatch {
    pub name: Option<String>,
    pub date: Option<NaiveDate>,
    pub surgeon: Option<Option<String>>,
    pub hospital: Option<Option<String>>,
    pub notes: Option<Option<String>>,
    pub complications: Option<Option<Vec<String>>>,
    pub recovery_time: Option<Option<String>>,
}
