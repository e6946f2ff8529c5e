// libs/scheduling-cell/src/lib.rs
pub mod handlers;
pub mod models;
pub mod repository;
pub mod router;
pub mod services;

pub use models::{
    Appointment, AppointmentStatus, BookAppointmentRequest, CreateAvailabilityRequest,
    SchedulingError, TimeSlot, UpdateAvailabilityRequest, WeeklyAvailabilityRule,
};
pub use repository::{ScheduleRepository, SupabaseScheduleRepository};
pub use router::{scheduling_routes, SchedulingState};
pub use services::{AvailabilityService, BookingService, SlotCache, SlotCacheStats, SlotService};
