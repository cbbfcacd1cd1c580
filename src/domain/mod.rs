pub mod error;
pub mod ports;
pub mod types;

pub use error::{BootstrapError, ErrorCode};
