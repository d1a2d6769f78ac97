//! Classification of precipitation intervals by depth
pub mod constants;
pub mod functions;
pub mod models;
