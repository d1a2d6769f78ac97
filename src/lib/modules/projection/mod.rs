//! RADOLAN polar stereographic grid and cell ID lists
pub mod functions;
