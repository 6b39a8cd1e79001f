use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct UserProfile {
    pub user_id: Uuid,
    pub full_name: String,
    pub email: String,
    pub campus: Option<String>,
    /// JSON-encoded list of availability slots, kept as stored text so the
    /// scorer can degrade gracefully on malformed profiles.
    pub availability: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkillType {
    Offered,
    Needed,
}

impl SkillType {
    pub fn as_str(self) -> &'static str {
        match self {
            SkillType::Offered => "offered",
            SkillType::Needed => "needed",
        }
    }
}

#[derive(Debug, Clone)]
pub struct SkillRecord {
    pub skill_type: SkillType,
    pub proficiency_level: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilitySlot {
    pub day: String,
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FactorScore {
    pub score: f64,
    pub weight: f64,
    pub contribution: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchBreakdown {
    pub skills: FactorScore,
    pub campus: FactorScore,
    pub availability: FactorScore,
    pub experience: FactorScore,
    pub rating: FactorScore,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchResult {
    pub total_score: f64,
    pub breakdown: MatchBreakdown,
}

#[derive(Debug, Clone)]
pub struct MatchCandidate {
    pub mentor: UserProfile,
    pub result: MatchResult,
}

/// Aggregate feedback for one mentor, consumed by the rating providers.
#[derive(Debug, Clone, Copy, Default)]
pub struct RatingInputs {
    pub avg_rating: Option<f64>,
    pub rating_count: i64,
}

#[derive(Debug, Clone)]
pub struct RecordedMatch {
    pub learner_email: String,
    pub mentor_email: String,
    pub skill_name: String,
    pub total_score: f64,
    pub breakdown: serde_json::Value,
    pub created_at: DateTime<Utc>,
}
