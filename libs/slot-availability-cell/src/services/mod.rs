pub mod blocked_minutes;
pub mod booked_times;
pub mod availability;
pub mod slot_finder;

pub use blocked_minutes::{compute_blocked_minutes, is_hour_fully_blocked, is_minute_blocked};
pub use booked_times::{BookedTimesClient, BookedTimesSource};
pub use availability::AvailabilityService;
pub use slot_finder::find_next_available_slot;
