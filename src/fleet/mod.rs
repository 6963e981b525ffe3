//! Fleet module: car catalog and staff availability blocks.

pub mod queries;
pub mod requests;
pub mod responses;
pub mod routes;
pub mod services;

pub use routes::router;
