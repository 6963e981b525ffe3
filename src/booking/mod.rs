//! Booking module: availability, the reservation guard, lifecycle
//! transitions, cancellation/refund and reviews.

pub mod calculators;
pub mod queries;
pub mod requests;
pub mod responses;
pub mod routes;
pub mod services;

// Re-export commonly used items
pub use calculators::{compute_quote, refund_amount, rental_days, windows_overlap};
pub use routes::router;
