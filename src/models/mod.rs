//! Database entities for the booking core

pub mod booking;
pub mod car;
pub mod payment;

pub use booking::{Booking, BookingStatus, PaymentStatus};
pub use car::{AvailabilityBlock, Car};
pub use payment::{PaymentLogEntry, PaymentType};
