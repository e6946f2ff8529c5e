// libs/scheduling-cell/src/services/mod.rs
pub mod availability;
pub mod booking;
pub mod cache;
pub mod slots;

pub use availability::AvailabilityService;
pub use booking::BookingService;
pub use cache::{SlotCache, SlotCacheStats};
pub use slots::SlotService;
