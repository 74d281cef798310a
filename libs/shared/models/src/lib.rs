pub mod booking;
pub mod error;

pub use booking::{BookedInterval, BookedSlot, BookedTimesResponse};
pub use error::AppError;
