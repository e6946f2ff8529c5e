// libs/scheduling-cell/src/repository.rs
use async_trait::async_trait;
use chrono::{Duration, NaiveDate, NaiveTime, Utc};
use reqwest::{
    header::{HeaderMap, HeaderValue},
    Method,
};
use serde_json::json;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::SupabaseClient;

use crate::models::{
    Appointment, AppointmentStatus, CreateAvailabilityRequest, NewAppointment, SchedulingError,
    UpdateAvailabilityRequest, WeeklyAvailabilityRule,
};

/// Storage access needed by the scheduling services. Implemented against
/// Supabase in production and by in-memory fakes in tests.
#[async_trait]
pub trait ScheduleRepository: Send + Sync {
    async fn fetch_weekly_rules(
        &self,
        doctor_id: Uuid,
        auth_token: Option<&str>,
    ) -> Result<Vec<WeeklyAvailabilityRule>, SchedulingError>;

    async fn fetch_rule(
        &self,
        rule_id: Uuid,
        auth_token: Option<&str>,
    ) -> Result<WeeklyAvailabilityRule, SchedulingError>;

    /// Non-cancelled appointments overlapping the given calendar day.
    async fn fetch_day_appointments(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        auth_token: Option<&str>,
    ) -> Result<Vec<Appointment>, SchedulingError>;

    /// Every appointment on the given day, regardless of status.
    async fn fetch_day_appointments_all(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        auth_token: Option<&str>,
    ) -> Result<Vec<Appointment>, SchedulingError>;

    async fn fetch_appointment(
        &self,
        appointment_id: Uuid,
        auth_token: Option<&str>,
    ) -> Result<Appointment, SchedulingError>;

    async fn insert_rule(
        &self,
        doctor_id: Uuid,
        request: &CreateAvailabilityRequest,
        auth_token: &str,
    ) -> Result<WeeklyAvailabilityRule, SchedulingError>;

    async fn update_rule(
        &self,
        rule_id: Uuid,
        request: &UpdateAvailabilityRequest,
        auth_token: &str,
    ) -> Result<WeeklyAvailabilityRule, SchedulingError>;

    async fn insert_appointment(
        &self,
        appointment: &NewAppointment,
        auth_token: &str,
    ) -> Result<Appointment, SchedulingError>;

    async fn update_appointment_status(
        &self,
        appointment_id: Uuid,
        status: AppointmentStatus,
        auth_token: &str,
    ) -> Result<Appointment, SchedulingError>;
}

// ==============================================================================
// SUPABASE IMPLEMENTATION
// ==============================================================================

pub struct SupabaseScheduleRepository {
    supabase: SupabaseClient,
}

impl SupabaseScheduleRepository {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    fn representation_headers() -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("Prefer", HeaderValue::from_static("return=representation"));
        headers
    }

    fn day_bounds(date: NaiveDate) -> (String, String) {
        let day_start = date.and_time(NaiveTime::MIN).and_utc();
        let day_end = day_start + Duration::days(1);
        // Keeps query values free of '+', which PostgREST reads as a space.
        let fmt = "%Y-%m-%dT%H:%M:%SZ";
        (
            day_start.format(fmt).to_string(),
            day_end.format(fmt).to_string(),
        )
    }
}

#[async_trait]
impl ScheduleRepository for SupabaseScheduleRepository {
    async fn fetch_weekly_rules(
        &self,
        doctor_id: Uuid,
        auth_token: Option<&str>,
    ) -> Result<Vec<WeeklyAvailabilityRule>, SchedulingError> {
        let path = format!(
            "/rest/v1/availability_rules?doctor_id=eq.{}&order=weekday.asc,start_time.asc",
            doctor_id
        );
        self.supabase
            .request(Method::GET, &path, auth_token, None)
            .await
            .map_err(|e| SchedulingError::DatabaseError(e.to_string()))
    }

    async fn fetch_rule(
        &self,
        rule_id: Uuid,
        auth_token: Option<&str>,
    ) -> Result<WeeklyAvailabilityRule, SchedulingError> {
        let path = format!("/rest/v1/availability_rules?id=eq.{}", rule_id);
        let rules: Vec<WeeklyAvailabilityRule> = self
            .supabase
            .request(Method::GET, &path, auth_token, None)
            .await
            .map_err(|e| SchedulingError::DatabaseError(e.to_string()))?;
        rules.into_iter().next().ok_or(SchedulingError::RuleNotFound)
    }

    async fn fetch_day_appointments(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        auth_token: Option<&str>,
    ) -> Result<Vec<Appointment>, SchedulingError> {
        let (day_start, day_end) = Self::day_bounds(date);
        let path = format!(
            "/rest/v1/appointments?doctor_id=eq.{}&scheduled_at=gte.{}&scheduled_at=lt.{}&status=neq.cancelled&order=scheduled_at.asc",
            doctor_id, day_start, day_end
        );
        self.supabase
            .request(Method::GET, &path, auth_token, None)
            .await
            .map_err(|e| SchedulingError::DatabaseError(e.to_string()))
    }

    async fn fetch_day_appointments_all(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        auth_token: Option<&str>,
    ) -> Result<Vec<Appointment>, SchedulingError> {
        let (day_start, day_end) = Self::day_bounds(date);
        let path = format!(
            "/rest/v1/appointments?doctor_id=eq.{}&scheduled_at=gte.{}&scheduled_at=lt.{}&order=scheduled_at.asc",
            doctor_id, day_start, day_end
        );
        self.supabase
            .request(Method::GET, &path, auth_token, None)
            .await
            .map_err(|e| SchedulingError::DatabaseError(e.to_string()))
    }

    async fn fetch_appointment(
        &self,
        appointment_id: Uuid,
        auth_token: Option<&str>,
    ) -> Result<Appointment, SchedulingError> {
        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let appointments: Vec<Appointment> = self
            .supabase
            .request(Method::GET, &path, auth_token, None)
            .await
            .map_err(|e| SchedulingError::DatabaseError(e.to_string()))?;
        appointments
            .into_iter()
            .next()
            .ok_or(SchedulingError::AppointmentNotFound)
    }

    async fn insert_rule(
        &self,
        doctor_id: Uuid,
        request: &CreateAvailabilityRequest,
        auth_token: &str,
    ) -> Result<WeeklyAvailabilityRule, SchedulingError> {
        let body = json!({
            "doctor_id": doctor_id,
            "weekday": request.weekday,
            "start_time": request.start_time.format("%H:%M:%S").to_string(),
            "end_time": request.end_time.format("%H:%M:%S").to_string(),
            "slot_duration_minutes": request.slot_duration_minutes,
            "is_active": true,
        });

        let created: Vec<WeeklyAvailabilityRule> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/availability_rules",
                Some(auth_token),
                Some(body),
                Some(Self::representation_headers()),
            )
            .await
            .map_err(|e| SchedulingError::DatabaseError(e.to_string()))?;
        created
            .into_iter()
            .next()
            .ok_or_else(|| SchedulingError::DatabaseError("Insert returned no rule".to_string()))
    }

    async fn update_rule(
        &self,
        rule_id: Uuid,
        request: &UpdateAvailabilityRequest,
        auth_token: &str,
    ) -> Result<WeeklyAvailabilityRule, SchedulingError> {
        let mut body = json!({
            "updated_at": Utc::now().to_rfc3339(),
        });
        if let Some(start_time) = request.start_time {
            body["start_time"] = json!(start_time.format("%H:%M:%S").to_string());
        }
        if let Some(end_time) = request.end_time {
            body["end_time"] = json!(end_time.format("%H:%M:%S").to_string());
        }
        if let Some(duration) = request.slot_duration_minutes {
            body["slot_duration_minutes"] = json!(duration);
        }
        if let Some(is_active) = request.is_active {
            body["is_active"] = json!(is_active);
        }

        let path = format!("/rest/v1/availability_rules?id=eq.{}", rule_id);
        let updated: Vec<WeeklyAvailabilityRule> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                Some(auth_token),
                Some(body),
                Some(Self::representation_headers()),
            )
            .await
            .map_err(|e| SchedulingError::DatabaseError(e.to_string()))?;
        updated.into_iter().next().ok_or(SchedulingError::RuleNotFound)
    }

    async fn insert_appointment(
        &self,
        appointment: &NewAppointment,
        auth_token: &str,
    ) -> Result<Appointment, SchedulingError> {
        let body = json!({
            "patient_id": appointment.patient_id,
            "doctor_id": appointment.doctor_id,
            "scheduled_at": appointment.scheduled_at.to_rfc3339(),
            "duration_minutes": appointment.duration_minutes,
            "status": AppointmentStatus::Pending.to_string(),
        });

        let created: Vec<Appointment> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/appointments",
                Some(auth_token),
                Some(body),
                Some(Self::representation_headers()),
            )
            .await
            .map_err(|e| SchedulingError::DatabaseError(e.to_string()))?;
        created.into_iter().next().ok_or_else(|| {
            SchedulingError::DatabaseError("Insert returned no appointment".to_string())
        })
    }

    async fn update_appointment_status(
        &self,
        appointment_id: Uuid,
        status: AppointmentStatus,
        auth_token: &str,
    ) -> Result<Appointment, SchedulingError> {
        let body = json!({
            "status": status.to_string(),
            "updated_at": Utc::now().to_rfc3339(),
        });

        let path = format!("/rest/v1/appointments?id=eq.{}", appointment_id);
        let updated: Vec<Appointment> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                Some(auth_token),
                Some(body),
                Some(Self::representation_headers()),
            )
            .await
            .map_err(|e| SchedulingError::DatabaseError(e.to_string()))?;
        updated
            .into_iter()
            .next()
            .ok_or(SchedulingError::AppointmentNotFound)
    }
}
