// libs/matching-cell/src/lib.rs
pub mod handlers;
pub mod models;
pub mod repository;
pub mod router;
pub mod services;

pub use models::{
    DoctorProfile, DoctorSearchQuery, MatchRequest, MatchResult, MatchingError, Specialty,
    UserRole,
};
pub use repository::{DoctorDirectory, SupabaseDoctorDirectory};
pub use router::matching_routes;
pub use services::{DirectoryService, MatcherService, MAX_MATCH_RESULTS};
