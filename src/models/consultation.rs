use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::enums::ConsultationSeverity;

/// One AI symptom-checker session. Append-only in practice: consultations
/// are recorded and deleted, never edited.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Consultation {
    pub id: Uuid,
    pub user_id: String,
    pub date: DateTime<Utc>,
    pub symptoms: String,
    pub diagnosis: String,
    pub recommendations: Vec<String>,
    pub severity: ConsultationSeverity,
    pub ai_model: Option<String>,
    pub image_uri: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input fields for a new consultation. Severity arrives already assigned
/// by the chat boundary; the store does not grade responses itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewConsultation {
    pub date: DateTime<Utc>,
    pub symptoms: String,
    pub diagnosis: String,
    pub recommendations: Vec<String>,
    pub severity: ConsultationSeverity,
    pub ai_model: Option<String>,
    pub image_uri: Option<String>,
}
