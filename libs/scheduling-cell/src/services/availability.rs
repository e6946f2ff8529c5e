// libs/scheduling-cell/src/services/availability.rs
use tracing::info;
use uuid::Uuid;

use crate::models::{
    CreateAvailabilityRequest, SchedulingError, UpdateAvailabilityRequest, WeeklyAvailabilityRule,
};
use crate::repository::ScheduleRepository;

/// Upper bound on slot length; one rule never spans more than a day.
const MAX_SLOT_DURATION_MINUTES: i32 = 24 * 60;

/// Management of a doctor's recurring weekly availability rules.
pub struct AvailabilityService<R: ScheduleRepository> {
    repository: R,
}

impl<R: ScheduleRepository> AvailabilityService<R> {
    pub fn new(repository: R) -> Self {
        Self { repository }
    }

    /// Create a new weekly rule for a doctor.
    ///
    /// Overlapping rules on the same weekday are allowed; the slot generator
    /// collapses them into a single grid.
    pub async fn create_rule(
        &self,
        doctor_id: Uuid,
        request: &CreateAvailabilityRequest,
        auth_token: &str,
    ) -> Result<WeeklyAvailabilityRule, SchedulingError> {
        if !(0..=6).contains(&request.weekday) {
            return Err(SchedulingError::ValidationError(
                "Weekday must be between 0 (Sunday) and 6 (Saturday)".to_string(),
            ));
        }
        if request.start_time >= request.end_time {
            return Err(SchedulingError::ValidationError(
                "Start time must be before end time".to_string(),
            ));
        }
        if request.slot_duration_minutes <= 0
            || request.slot_duration_minutes > MAX_SLOT_DURATION_MINUTES
        {
            return Err(SchedulingError::InvalidSlotDuration);
        }

        let rule = self.repository.insert_rule(doctor_id, request, auth_token).await?;
        info!(
            "Created availability rule {} for doctor {} on weekday {}",
            rule.id, doctor_id, rule.weekday
        );
        Ok(rule)
    }

    /// Apply a partial update to one of the doctor's rules. Setting
    /// `is_active` to false retires the rule without deleting it, so past
    /// appointments keep their context.
    pub async fn update_rule(
        &self,
        doctor_id: Uuid,
        rule_id: Uuid,
        request: &UpdateAvailabilityRequest,
        auth_token: &str,
    ) -> Result<WeeklyAvailabilityRule, SchedulingError> {
        let current = self.repository.fetch_rule(rule_id, Some(auth_token)).await?;
        if current.doctor_id != doctor_id {
            return Err(SchedulingError::RuleNotFound);
        }

        let start = request.start_time.unwrap_or(current.start_time);
        let end = request.end_time.unwrap_or(current.end_time);
        if start >= end {
            return Err(SchedulingError::ValidationError(
                "Start time must be before end time".to_string(),
            ));
        }
        if let Some(duration) = request.slot_duration_minutes {
            if duration <= 0 || duration > MAX_SLOT_DURATION_MINUTES {
                return Err(SchedulingError::InvalidSlotDuration);
            }
        }

        let updated = self.repository.update_rule(rule_id, request, auth_token).await?;
        info!("Updated availability rule {} for doctor {}", rule_id, doctor_id);
        Ok(updated)
    }

    /// All of a doctor's rules, active and retired, ordered by weekday.
    pub async fn list_rules(
        &self,
        doctor_id: Uuid,
        auth_token: Option<&str>,
    ) -> Result<Vec<WeeklyAvailabilityRule>, SchedulingError> {
        self.repository.fetch_weekly_rules(doctor_id, auth_token).await
    }
}
