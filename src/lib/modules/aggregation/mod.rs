//! Loading of monthly datasets and aggregation to coarser time steps
pub mod functions;
pub mod models;
