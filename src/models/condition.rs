use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::{ConditionSeverity, ConditionStatus};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChronicCondition {
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    pub diagnosed_date: NaiveDate,
    pub notes: Option<String>,
    pub severity: Option<ConditionSeverity>,
    pub status: ConditionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input fields for a new condition; the store assigns id and timestamps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewChronicCondition {
    pub name: String,
    pub diagnosed_date: NaiveDate,
    pub notes: Option<String>,
    pub severity: Option<ConditionSeverity>,
    pub status: ConditionStatus,
}

/// Partial update. `None` leaves a column untouched; for nullable columns
/// the inner `Option` distinguishes set from clear.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChronicConditionPatch {
    pub name: Option<String>,
    pub diagnosed_date: Option<NaiveDate>,
    pub notes: Option<Option<String>>,
    pub severity: Option<Option<ConditionSeverity>>,
    pub status: Option<ConditionStatus>,
}
