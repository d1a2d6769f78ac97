//! Intervals in which a minimum area exceeds a precipitation threshold
pub mod functions;
pub mod models;
