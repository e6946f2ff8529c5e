// libs/matching-cell/src/services/matching.rs
use tracing::debug;

use crate::models::{DoctorProfile, MatchResult, MatchingError, Specialty, UserRole};
use crate::repository::DoctorDirectory;

/// Callers never see more than the top five candidates.
pub const MAX_MATCH_RESULTS: usize = 5;

/// Baseline score when the patient expressed no specialty needs.
const NEUTRAL_SCORE: u8 = 60;
/// Score for an approved doctor sharing no specialty with the request.
const NO_OVERLAP_SCORE: u8 = 15;
/// Any doctor with at least one shared specialty scores at least this.
const OVERLAP_FLOOR: u8 = 20;

/// Weight of requirement coverage (how much of the request is satisfied)
/// against specialty depth (how focused the doctor is on the request).
const COVERAGE_WEIGHT: f64 = 70.0;
const DEPTH_WEIGHT: f64 = 30.0;

/// Score one candidate against the required specialty set.
///
/// Coverage dominates depth so a doctor satisfying more of the request
/// always outranks a narrowly focused partial match.
pub fn score_candidate(required: &[Specialty], candidate: &[Specialty]) -> u8 {
    if required.is_empty() {
        return NEUTRAL_SCORE;
    }

    let matched = required
        .iter()
        .filter(|specialty| candidate.contains(specialty))
        .count();
    if matched == 0 {
        return NO_OVERLAP_SCORE;
    }

    let coverage = matched as f64 / required.len() as f64 * COVERAGE_WEIGHT;
    let depth = matched as f64 / candidate.len() as f64 * DEPTH_WEIGHT;
    let score = (coverage + depth).min(100.0).round() as u8;
    score.max(OVERLAP_FLOOR)
}

/// Rank candidates for a required specialty set.
///
/// Unapproved profiles and non-doctor roles never appear in results. The
/// sort is stable, so equally scored doctors keep their catalog order.
pub fn rank_doctors(required: &[Specialty], candidates: &[DoctorProfile]) -> Vec<MatchResult> {
    let mut results: Vec<MatchResult> = candidates
        .iter()
        .filter(|profile| profile.approved && profile.role == UserRole::Doctor)
        .map(|profile| MatchResult {
            match_score: score_candidate(required, &profile.specialties),
            doctor: profile.clone(),
        })
        .collect();

    results.sort_by(|a, b| b.match_score.cmp(&a.match_score));
    results.truncate(MAX_MATCH_RESULTS);
    results
}

/// Normalize freeform specialty names into the closed taxonomy, dropping
/// unknown entries and duplicates while preserving first-seen order.
pub fn normalize_specialties(raw: &[String]) -> Vec<Specialty> {
    let mut normalized: Vec<Specialty> = Vec::with_capacity(raw.len());
    for value in raw {
        match Specialty::parse_normalized(value) {
            Some(specialty) => {
                if !normalized.contains(&specialty) {
                    normalized.push(specialty);
                }
            }
            None => debug!("Dropping unrecognized specialty {:?}", value),
        }
    }
    normalized
}

// ==============================================================================
// MATCHER SERVICE
// ==============================================================================

pub struct MatcherService<D: DoctorDirectory> {
    directory: D,
}

impl<D: DoctorDirectory> MatcherService<D> {
    pub fn new(directory: D) -> Self {
        Self { directory }
    }

    /// Rank the doctor catalog against freeform specialty requirements.
    /// An empty or fully unrecognized requirement list still ranks every
    /// approved doctor at the neutral baseline.
    pub async fn rank_for_requirements(
        &self,
        raw_specialties: &[String],
        limit: Option<usize>,
        auth_token: Option<&str>,
    ) -> Result<Vec<MatchResult>, MatchingError> {
        let required = normalize_specialties(raw_specialties);
        let candidates = self.directory.fetch_doctor_catalog(auth_token).await?;
        debug!(
            "Ranking {} candidates against {} required specialties",
            candidates.len(),
            required.len()
        );

        let mut results = rank_doctors(&required, &candidates);
        if let Some(limit) = limit {
            results.truncate(limit.min(MAX_MATCH_RESULTS));
        }
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn doctor(name: &str, specialties: Vec<Specialty>) -> DoctorProfile {
        DoctorProfile {
            id: Uuid::new_v4(),
            name: name.to_string(),
            specialties,
            experience_years: 5,
            languages: vec!["en".to_string()],
            role: UserRole::Doctor,
            approved: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn empty_requirements_score_neutral_baseline() {
        let score = score_candidate(&[], &[Specialty::GeneralPsychiatry]);
        assert_eq!(score, 60);
    }

    #[test]
    fn no_overlap_scores_fifteen() {
        let required = [Specialty::ChildAdolescent];
        let candidate = [Specialty::GeriatricPsychiatry, Specialty::SleepDisorders];
        assert_eq!(score_candidate(&required, &candidate), 15);
    }

    #[test]
    fn focused_specialist_outscores_broader_match() {
        let required = [Specialty::DepressionAnxiety, Specialty::TraumaPtsd];
        let specialist = [Specialty::DepressionAnxiety, Specialty::TraumaPtsd];
        let generalist = [
            Specialty::DepressionAnxiety,
            Specialty::TraumaPtsd,
            Specialty::GeneralPsychiatry,
            Specialty::SleepDisorders,
        ];

        assert_eq!(score_candidate(&required, &specialist), 100);
        assert_eq!(score_candidate(&required, &generalist), 85);
    }

    #[test]
    fn depth_rewards_focus_on_a_single_requirement() {
        let required = [Specialty::GeneralPsychiatry];
        let two = [Specialty::GeneralPsychiatry, Specialty::SleepDisorders];
        let four = [
            Specialty::GeneralPsychiatry,
            Specialty::SleepDisorders,
            Specialty::EatingDisorders,
            Specialty::BipolarDisorder,
        ];

        assert_eq!(score_candidate(&required, &two), 85);
        assert_eq!(score_candidate(&required, &four), 78);
    }

    #[test]
    fn coverage_outweighs_depth() {
        let required = [Specialty::DepressionAnxiety, Specialty::TraumaPtsd];
        // Covers both requirements but is spread across four areas.
        let broad_full_cover = [
            Specialty::DepressionAnxiety,
            Specialty::TraumaPtsd,
            Specialty::BipolarDisorder,
            Specialty::EatingDisorders,
        ];
        // Covers only one requirement but nothing else.
        let narrow_half_cover = [Specialty::DepressionAnxiety];

        let broad = score_candidate(&required, &broad_full_cover);
        let narrow = score_candidate(&required, &narrow_half_cover);
        assert_eq!(broad, 85);
        assert_eq!(narrow, 65);
        assert!(broad > narrow);
    }

    #[test]
    fn weak_overlap_floors_at_twenty() {
        // One hit out of eight requirements, diluted across three areas,
        // lands below twenty before the floor kicks in.
        let required = [
            Specialty::GeneralPsychiatry,
            Specialty::DepressionAnxiety,
            Specialty::TraumaPtsd,
            Specialty::ChildAdolescent,
            Specialty::AddictionRecovery,
            Specialty::SleepDisorders,
            Specialty::EatingDisorders,
            Specialty::BipolarDisorder,
        ];
        let candidate = [
            Specialty::GeneralPsychiatry,
            Specialty::OcdRelated,
            Specialty::GeriatricPsychiatry,
        ];
        assert_eq!(score_candidate(&required, &candidate), 20);
    }

    #[test]
    fn full_overlap_never_exceeds_one_hundred() {
        // Repeated requirements inflate the raw sum past 100.
        let required = [Specialty::DepressionAnxiety, Specialty::DepressionAnxiety];
        let candidate = [Specialty::DepressionAnxiety];
        assert_eq!(score_candidate(&required, &candidate), 100);
    }

    #[test]
    fn rank_orders_descending_by_score() {
        let required = [Specialty::DepressionAnxiety, Specialty::TraumaPtsd];
        let candidates = vec![
            doctor("partial", vec![Specialty::DepressionAnxiety]),
            doctor(
                "exact",
                vec![Specialty::DepressionAnxiety, Specialty::TraumaPtsd],
            ),
            doctor("unrelated", vec![Specialty::GeriatricPsychiatry]),
        ];

        let results = rank_doctors(&required, &candidates);

        let names: Vec<&str> = results.iter().map(|r| r.doctor.name.as_str()).collect();
        assert_eq!(names, vec!["exact", "partial", "unrelated"]);
        assert_eq!(results[0].match_score, 100);
        assert_eq!(results[1].match_score, 65);
        assert_eq!(results[2].match_score, 15);
    }

    #[test]
    fn rank_excludes_unapproved_and_non_doctor_roles() {
        let required = [Specialty::GeneralPsychiatry];
        let mut pending = doctor("pending", vec![Specialty::GeneralPsychiatry]);
        pending.approved = false;
        let mut admin = doctor("admin", vec![Specialty::GeneralPsychiatry]);
        admin.role = UserRole::Admin;
        let candidates = vec![
            pending,
            admin,
            doctor("visible", vec![Specialty::GeneralPsychiatry]),
        ];

        let results = rank_doctors(&required, &candidates);

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].doctor.name, "visible");
    }

    #[test]
    fn rank_caps_results_at_five() {
        let required = [Specialty::GeneralPsychiatry];
        let candidates: Vec<DoctorProfile> = (0..7)
            .map(|i| doctor(&format!("doctor-{i}"), vec![Specialty::GeneralPsychiatry]))
            .collect();

        let results = rank_doctors(&required, &candidates);
        assert_eq!(results.len(), MAX_MATCH_RESULTS);
    }

    #[test]
    fn rank_keeps_catalog_order_for_ties() {
        let required = [Specialty::GeneralPsychiatry];
        let candidates: Vec<DoctorProfile> = (0..3)
            .map(|i| doctor(&format!("doctor-{i}"), vec![Specialty::GeneralPsychiatry]))
            .collect();

        let results = rank_doctors(&required, &candidates);

        let expected: Vec<Uuid> = candidates.iter().map(|d| d.id).collect();
        let ranked: Vec<Uuid> = results.iter().map(|r| r.doctor.id).collect();
        assert_eq!(ranked, expected);
    }

    #[test]
    fn rank_empty_catalog_yields_empty_result() {
        let results = rank_doctors(&[Specialty::GeneralPsychiatry], &[]);
        assert!(results.is_empty());
    }

    #[test]
    fn rank_with_no_requirements_scores_everyone_neutral() {
        let candidates = vec![
            doctor("a", vec![Specialty::SleepDisorders]),
            doctor("b", vec![]),
        ];

        let results = rank_doctors(&[], &candidates);

        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.match_score == 60));
    }

    #[test]
    fn normalize_drops_unknown_and_duplicates() {
        let raw = vec![
            "Trauma PTSD".to_string(),
            "astrology".to_string(),
            "trauma_ptsd".to_string(),
            "sleep-disorders".to_string(),
        ];

        let normalized = normalize_specialties(&raw);
        assert_eq!(
            normalized,
            vec![Specialty::TraumaPtsd, Specialty::SleepDisorders]
        );
    }
}
