pub mod config;
pub mod dates;
pub mod error;
pub mod types;

pub use config::Config;
pub use dates::*;
pub use error::LinkPulseError;
pub use types::*;
