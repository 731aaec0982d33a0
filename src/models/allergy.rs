use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::AllergySeverity;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Allergy {
    pub id: Uuid,
    pub user_id: String,
    pub allergen: String,
    pub reaction_type: Option<String>,
    pub severity: Option<AllergySeverity>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input fields for a new allergy; the store assigns id and timestamps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAllergy {
    pub allergen: String,
    pub reaction_type: Option<String>,
    pub severity: Option<AllergySeverity>,
    pub notes: Option<String>,
}
