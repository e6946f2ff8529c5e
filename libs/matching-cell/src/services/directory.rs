// libs/matching-cell/src/services/directory.rs
use uuid::Uuid;

use crate::models::{DoctorProfile, DoctorSearchQuery, MatchingError, Specialty};
use crate::repository::DoctorDirectory;

const DEFAULT_SEARCH_LIMIT: usize = 20;

/// Browse and lookup over the doctor catalog.
pub struct DirectoryService<D: DoctorDirectory> {
    directory: D,
}

impl<D: DoctorDirectory> DirectoryService<D> {
    pub fn new(directory: D) -> Self {
        Self { directory }
    }

    pub async fn get_doctor(
        &self,
        doctor_id: Uuid,
        auth_token: Option<&str>,
    ) -> Result<DoctorProfile, MatchingError> {
        self.directory.fetch_doctor(doctor_id, auth_token).await
    }

    /// Filtered catalog search. A specialty filter that normalizes to
    /// nothing in the taxonomy matches no doctor.
    pub async fn search_doctors(
        &self,
        query: &DoctorSearchQuery,
        auth_token: Option<&str>,
    ) -> Result<Vec<DoctorProfile>, MatchingError> {
        let specialty_filter = match query.specialty.as_deref() {
            Some(raw) => match Specialty::parse_normalized(raw) {
                Some(specialty) => Some(specialty),
                None => return Ok(Vec::new()),
            },
            None => None,
        };

        let catalog = self.directory.fetch_doctor_catalog(auth_token).await?;
        let offset = query.offset.unwrap_or(0);
        let limit = query.limit.unwrap_or(DEFAULT_SEARCH_LIMIT);

        let doctors = catalog
            .into_iter()
            .filter(|profile| {
                if let Some(specialty) = specialty_filter {
                    if !profile.specialties.contains(&specialty) {
                        return false;
                    }
                }
                if let Some(min_experience) = query.min_experience {
                    if profile.experience_years < min_experience {
                        return false;
                    }
                }
                if let Some(language) = query.language.as_deref() {
                    if !profile
                        .languages
                        .iter()
                        .any(|spoken| spoken.eq_ignore_ascii_case(language))
                    {
                        return false;
                    }
                }
                true
            })
            .skip(offset)
            .take(limit)
            .collect();

        Ok(doctors)
    }
}
