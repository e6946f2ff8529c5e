// libs/matching-cell/src/repository.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::Deserialize;
use tracing::warn;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::SupabaseClient;

use crate::models::{DoctorProfile, MatchingError, Specialty, UserRole};

/// Read access to the doctor catalog. Implemented against Supabase in
/// production and by in-memory fakes in tests.
#[async_trait]
pub trait DoctorDirectory: Send + Sync {
    /// Every approved doctor profile, in stable catalog order.
    async fn fetch_doctor_catalog(
        &self,
        auth_token: Option<&str>,
    ) -> Result<Vec<DoctorProfile>, MatchingError>;

    async fn fetch_doctor(
        &self,
        doctor_id: Uuid,
        auth_token: Option<&str>,
    ) -> Result<DoctorProfile, MatchingError>;
}

// ==============================================================================
// SUPABASE IMPLEMENTATION
// ==============================================================================

/// Storage row shape. Specialties arrive as freeform text and are folded
/// into the closed taxonomy on the way out, so one bad value never breaks
/// a whole catalog read.
#[derive(Debug, Deserialize)]
struct DoctorRow {
    id: Uuid,
    name: String,
    specialties: Vec<String>,
    experience_years: i32,
    languages: Vec<String>,
    role: String,
    approved: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl DoctorRow {
    fn into_profile(self) -> Option<DoctorProfile> {
        let role = match UserRole::parse(&self.role) {
            Some(role) => role,
            None => {
                warn!("Skipping doctor {} with unknown role {:?}", self.id, self.role);
                return None;
            }
        };

        let mut specialties: Vec<Specialty> = Vec::with_capacity(self.specialties.len());
        for raw in &self.specialties {
            match Specialty::parse_normalized(raw) {
                Some(specialty) => {
                    if !specialties.contains(&specialty) {
                        specialties.push(specialty);
                    }
                }
                None => warn!(
                    "Dropping unrecognized specialty {:?} on doctor {}",
                    raw, self.id
                ),
            }
        }

        Some(DoctorProfile {
            id: self.id,
            name: self.name,
            specialties,
            experience_years: self.experience_years,
            languages: self.languages,
            role,
            approved: self.approved,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

pub struct SupabaseDoctorDirectory {
    supabase: SupabaseClient,
}

impl SupabaseDoctorDirectory {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }
}

#[async_trait]
impl DoctorDirectory for SupabaseDoctorDirectory {
    async fn fetch_doctor_catalog(
        &self,
        auth_token: Option<&str>,
    ) -> Result<Vec<DoctorProfile>, MatchingError> {
        let path = "/rest/v1/doctors?role=eq.doctor&approved=eq.true&order=created_at.asc";
        let rows: Vec<DoctorRow> = self
            .supabase
            .request(Method::GET, path, auth_token, None)
            .await
            .map_err(|e| MatchingError::DatabaseError(e.to_string()))?;
        Ok(rows.into_iter().filter_map(DoctorRow::into_profile).collect())
    }

    async fn fetch_doctor(
        &self,
        doctor_id: Uuid,
        auth_token: Option<&str>,
    ) -> Result<DoctorProfile, MatchingError> {
        let path = format!("/rest/v1/doctors?id=eq.{}", doctor_id);
        let rows: Vec<DoctorRow> = self
            .supabase
            .request(Method::GET, &path, auth_token, None)
            .await
            .map_err(|e| MatchingError::DatabaseError(e.to_string()))?;
        rows.into_iter()
            .next()
            .and_then(DoctorRow::into_profile)
            .ok_or(MatchingError::NotFound)
    }
}
