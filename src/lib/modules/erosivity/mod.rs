//! Rainfall erosivity (R-factor) after Schwertmann et al. (1990)
pub mod constants;
pub mod functions;
