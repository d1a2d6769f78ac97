//! DWD rain gauge files in MR90 format.
//!
//! Every line of a station file holds one hour of one minute values,
//! split into six ten minute blocks with a seesaw (Wippe) and a drop
//! counter (Tropfer) series each.
pub mod constants;
pub mod functions;
pub mod models;
