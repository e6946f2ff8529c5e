// libs/scheduling-cell/src/services/slots.rs
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc, Weekday};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

use crate::models::{Appointment, SchedulingError, TimeSlot, WeeklyAvailabilityRule};
use crate::repository::ScheduleRepository;
use crate::services::cache::SlotCache;

/// Weekday index used by availability rules, with Sunday as 0.
pub fn weekday_index(date: NaiveDate) -> i32 {
    match date.weekday() {
        Weekday::Sun => 0,
        Weekday::Mon => 1,
        Weekday::Tue => 2,
        Weekday::Wed => 3,
        Weekday::Thu => 4,
        Weekday::Fri => 5,
        Weekday::Sat => 6,
    }
}

/// Generate the bookable slot grid for one doctor on one calendar day.
///
/// Walks every active rule for the day's weekday, de-duplicates overlapping
/// ranges, then marks each surviving slot against the day's appointments.
/// A slot is available only when it is unbooked and starts after `now`.
pub fn build_day_slots(
    doctor_id: Uuid,
    date: NaiveDate,
    rules: &[WeeklyAvailabilityRule],
    appointments: &[Appointment],
    now: DateTime<Utc>,
) -> Result<Vec<TimeSlot>, SchedulingError> {
    let weekday = weekday_index(date);

    let day_rules: Vec<&WeeklyAvailabilityRule> = rules
        .iter()
        .filter(|r| r.doctor_id == doctor_id && r.weekday == weekday && r.is_active)
        .collect();

    if day_rules.is_empty() {
        return Ok(Vec::new());
    }

    // Walk each rule's window in fixed steps, collecting candidate ranges.
    let mut candidates: Vec<(DateTime<Utc>, DateTime<Utc>)> = Vec::new();
    for rule in &day_rules {
        if rule.slot_duration_minutes <= 0 {
            return Err(SchedulingError::InvalidSlotDuration);
        }
        let step = Duration::minutes(rule.slot_duration_minutes as i64);
        let mut current_time = date.and_time(rule.start_time).and_utc();
        let end_datetime = date.and_time(rule.end_time).and_utc();

        // Stored durations can exceed the day; stepping past the calendar's
        // range ends the walk instead of overflowing.
        while let Some(slot_end) = current_time.checked_add_signed(step) {
            if slot_end > end_datetime {
                break;
            }
            candidates.push((current_time, slot_end));
            current_time = slot_end;
        }
    }

    // Stable sort by start time, then sweep so overlapping ranges from
    // different rules collapse to the earliest-rule slot.
    candidates.sort_by(|a, b| a.0.cmp(&b.0));
    let mut kept: Vec<(DateTime<Utc>, DateTime<Utc>)> = Vec::with_capacity(candidates.len());
    let mut last_end: Option<DateTime<Utc>> = None;
    for (start, end) in candidates {
        match last_end {
            Some(boundary) if start < boundary => continue,
            _ => {
                last_end = Some(end);
                kept.push((start, end));
            }
        }
    }

    let slots = kept
        .into_iter()
        .map(|(start, end)| {
            let booked_by = appointments.iter().find(|apt| {
                apt.doctor_id == doctor_id
                    && !apt.is_cancelled()
                    && apt.scheduled_at >= start
                    && apt.scheduled_at < end
            });
            let is_booked = booked_by.is_some();
            TimeSlot {
                start_time: start.time(),
                end_time: end.time(),
                is_available: !is_booked && start > now,
                is_booked,
                appointment_id: booked_by.map(|apt| apt.id),
            }
        })
        .collect();

    Ok(slots)
}

/// Re-derives availability for slots pulled from the cache. Booked state is
/// invalidated on writes so only the "starts after now" half can drift.
pub fn refresh_availability(date: NaiveDate, slots: &mut [TimeSlot], now: DateTime<Utc>) {
    for slot in slots.iter_mut() {
        let start = date.and_time(slot.start_time).and_utc();
        slot.is_available = !slot.is_booked && start > now;
    }
}

// ==============================================================================
// SLOT SERVICE
// ==============================================================================

/// Read path for day slot grids, fronted by the shared in-process cache.
pub struct SlotService<R: ScheduleRepository> {
    repository: R,
    cache: Arc<SlotCache>,
}

impl<R: ScheduleRepository> SlotService<R> {
    pub fn new(repository: R, cache: Arc<SlotCache>) -> Self {
        Self { repository, cache }
    }

    /// Generate the slot grid for a doctor's day, serving from cache when fresh.
    pub async fn generate_slots(
        &self,
        doctor_id: Uuid,
        date: NaiveDate,
        auth_token: Option<&str>,
    ) -> Result<Vec<TimeSlot>, SchedulingError> {
        let now = Utc::now();

        if let Some(slots) = self.cache.get(doctor_id, date, now) {
            debug!("Slot cache hit for doctor {} on {}", doctor_id, date);
            return Ok(slots);
        }
        debug!("Slot cache miss for doctor {} on {}", doctor_id, date);

        let rules = self.repository.fetch_weekly_rules(doctor_id, auth_token).await?;
        let appointments = self
            .repository
            .fetch_day_appointments(doctor_id, date, auth_token)
            .await?;

        let slots = build_day_slots(doctor_id, date, &rules, &appointments, now)?;
        self.cache.insert(doctor_id, date, slots.clone());
        Ok(slots)
    }
}
