// libs/scheduling-cell/src/services/booking.rs
use chrono::{NaiveDate, Utc};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::models::{
    Appointment, AppointmentStatus, BookAppointmentRequest, NewAppointment, SchedulingError,
};
use crate::repository::ScheduleRepository;
use crate::services::cache::SlotCache;
use crate::services::slots::build_day_slots;

/// Appointment lifecycle built on top of the generated slot grids.
pub struct BookingService<R: ScheduleRepository> {
    repository: R,
    cache: Arc<SlotCache>,
}

impl<R: ScheduleRepository> BookingService<R> {
    pub fn new(repository: R, cache: Arc<SlotCache>) -> Self {
        Self { repository, cache }
    }

    /// Book an appointment at an offered slot start.
    ///
    /// The target day's grid is regenerated from storage (never from cache)
    /// so the booked check always sees the latest appointments.
    pub async fn book_appointment(
        &self,
        request: &BookAppointmentRequest,
        auth_token: &str,
    ) -> Result<Appointment, SchedulingError> {
        let now = Utc::now();
        if request.scheduled_at <= now {
            return Err(SchedulingError::SlotInPast);
        }

        let date = request.scheduled_at.date_naive();
        let rules = self
            .repository
            .fetch_weekly_rules(request.doctor_id, Some(auth_token))
            .await?;
        let appointments = self
            .repository
            .fetch_day_appointments(request.doctor_id, date, Some(auth_token))
            .await?;
        let slots = build_day_slots(request.doctor_id, date, &rules, &appointments, now)?;

        let requested_time = request.scheduled_at.time();
        let slot = slots
            .iter()
            .find(|s| s.start_time == requested_time)
            .ok_or(SchedulingError::SlotMismatch)?;
        if slot.is_booked {
            return Err(SchedulingError::SlotTaken);
        }
        if !slot.is_available {
            return Err(SchedulingError::SlotInPast);
        }

        let duration_minutes = (slot.end_time - slot.start_time).num_minutes() as i32;
        let appointment = self
            .repository
            .insert_appointment(
                &NewAppointment {
                    patient_id: request.patient_id,
                    doctor_id: request.doctor_id,
                    scheduled_at: request.scheduled_at,
                    duration_minutes,
                },
                auth_token,
            )
            .await?;

        self.cache.invalidate(request.doctor_id, date);
        info!(
            "Booked appointment {} for doctor {} at {}",
            appointment.id, appointment.doctor_id, appointment.scheduled_at
        );
        Ok(appointment)
    }

    /// Cancel an appointment, freeing its slot for rebooking.
    pub async fn cancel_appointment(
        &self,
        appointment_id: Uuid,
        auth_token: &str,
    ) -> Result<Appointment, SchedulingError> {
        let current = self
            .repository
            .fetch_appointment(appointment_id, Some(auth_token))
            .await?;

        match current.status {
            AppointmentStatus::Pending | AppointmentStatus::Confirmed => {}
            other => return Err(SchedulingError::InvalidStatusTransition(other)),
        }

        let cancelled = self
            .repository
            .update_appointment_status(appointment_id, AppointmentStatus::Cancelled, auth_token)
            .await?;

        self.cache
            .invalidate(cancelled.doctor_id, cancelled.scheduled_at.date_naive());
        info!("Cancelled appointment {}", appointment_id);
        Ok(cancelled)
    }

    pub async fn get_appointment(
        &self,
        appointment_id: Uuid,
        auth_token: &str,
    ) -> Result<Appointment, SchedulingError> {
        self.repository
            .fetch_appointment(appointment_id, Some(auth_token))
            .await
    }

    /// A doctor's appointments for one calendar day, cancelled ones included.
    pub async fn get_day_appointments(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        auth_token: &str,
    ) -> Result<Vec<Appointment>, SchedulingError> {
        self.repository
            .fetch_day_appointments_all(doctor_id, date, Some(auth_token))
            .await
    }
}
