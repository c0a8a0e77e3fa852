pub mod booking;
pub mod catalog;
pub mod record;

pub use booking::{BookingRequest, BookingStatus, BookingValidationError, Collection};
pub use catalog::BusService;
pub use record::{BookingRecord, RawRecord};
