//! HTTP surface: health, page routes and transport endpoints

pub mod routes;

pub use routes::build_router;
