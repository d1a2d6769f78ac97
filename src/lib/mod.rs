pub mod constants;
pub mod errors;
pub mod models;
pub mod modules;
pub mod store;
pub mod version;

pub use errors::RadprocError;
pub use models::frame::TimeFrame;
pub use store::{DatasetKey, FrameStore};
