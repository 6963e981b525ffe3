//! Payments module: advance payment initiation and the gateway
//! reconciliation protocol.

pub mod queries;
pub mod requests;
pub mod responses;
pub mod routes;
pub mod services;

pub use routes::router;
pub use services::PaymentReport;
