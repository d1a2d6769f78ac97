pub mod frame;
pub mod resample;
pub mod table;
