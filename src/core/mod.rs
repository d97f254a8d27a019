pub mod error;
pub mod types;

pub use error::CaptureError;
pub use types::*;
