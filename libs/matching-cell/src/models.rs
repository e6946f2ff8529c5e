// libs/matching-cell/src/models.rs
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};
use std::fmt;

// ==============================================================================
// SPECIALTY TAXONOMY
// ==============================================================================

/// Closed set of clinical specialties the platform matches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Specialty {
    GeneralPsychiatry,
    DepressionAnxiety,
    TraumaPtsd,
    ChildAdolescent,
    AddictionRecovery,
    SleepDisorders,
    EatingDisorders,
    BipolarDisorder,
    OcdRelated,
    GeriatricPsychiatry,
}

impl Specialty {
    pub const ALL: [Specialty; 10] = [
        Specialty::GeneralPsychiatry,
        Specialty::DepressionAnxiety,
        Specialty::TraumaPtsd,
        Specialty::ChildAdolescent,
        Specialty::AddictionRecovery,
        Specialty::SleepDisorders,
        Specialty::EatingDisorders,
        Specialty::BipolarDisorder,
        Specialty::OcdRelated,
        Specialty::GeriatricPsychiatry,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Specialty::GeneralPsychiatry => "general-psychiatry",
            Specialty::DepressionAnxiety => "depression-anxiety",
            Specialty::TraumaPtsd => "trauma-ptsd",
            Specialty::ChildAdolescent => "child-adolescent",
            Specialty::AddictionRecovery => "addiction-recovery",
            Specialty::SleepDisorders => "sleep-disorders",
            Specialty::EatingDisorders => "eating-disorders",
            Specialty::BipolarDisorder => "bipolar-disorder",
            Specialty::OcdRelated => "ocd-related",
            Specialty::GeriatricPsychiatry => "geriatric-psychiatry",
        }
    }

    /// Lenient parse of freeform specialty text. Trims, lower-cases and
    /// treats whitespace and underscores as hyphens, so "Trauma PTSD" and
    /// "trauma_ptsd" both resolve. Unknown values resolve to `None`.
    pub fn parse_normalized(raw: &str) -> Option<Specialty> {
        let normalized = raw
            .trim()
            .split(|c: char| c.is_whitespace() || c == '_' || c == '-')
            .filter(|segment| !segment.is_empty())
            .collect::<Vec<_>>()
            .join("-")
            .to_lowercase();
        Specialty::ALL.iter().copied().find(|s| s.as_str() == normalized)
    }
}

impl fmt::Display for Specialty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==============================================================================
// DOCTOR PROFILE MODELS
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Patient,
    Doctor,
    Companion,
    Admin,
}

impl UserRole {
    pub fn parse(raw: &str) -> Option<UserRole> {
        match raw.trim().to_lowercase().as_str() {
            "patient" => Some(UserRole::Patient),
            "doctor" => Some(UserRole::Doctor),
            "companion" => Some(UserRole::Companion),
            "admin" => Some(UserRole::Admin),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorProfile {
    pub id: Uuid,
    pub name: String,
    pub specialties: Vec<Specialty>,
    pub experience_years: i32,
    pub languages: Vec<String>,
    pub role: UserRole,
    pub approved: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One ranked candidate. Scores run 0-100, higher is better.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResult {
    pub doctor: DoctorProfile,
    pub match_score: u8,
}

// ==============================================================================
// REQUEST/RESPONSE MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchRequest {
    /// Freeform specialty names; unknown entries are dropped during
    /// normalization rather than rejected.
    pub specialties: Vec<String>,
    /// Optional result cap. The platform-wide maximum still applies.
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DoctorSearchQuery {
    pub specialty: Option<String>,
    pub min_experience: Option<i32>,
    pub language: Option<String>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
pub enum MatchingError {
    #[error("Doctor not found")]
    NotFound,

    #[error("Database error: {0}")]
    DatabaseError(String),
}
