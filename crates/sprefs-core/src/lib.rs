pub mod config;
pub mod error;

pub use config::SprefsConfig;
pub use error::{SprefsError, SprefsResult};
