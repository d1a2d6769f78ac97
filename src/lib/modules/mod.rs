pub mod aggregation;
pub mod classification;
pub mod erosivity;
pub mod gauge;
pub mod heavyrain;
pub mod projection;
