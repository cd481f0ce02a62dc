pub mod commands;
pub mod config;
pub mod counter;
pub mod error;
pub mod formats;
pub mod region;
pub mod source;
pub mod types;

pub use config::Config;
pub use error::{Error, Result};
pub use formats::{FastaIndex, FastaReference};
pub use region::{ReferenceRange, RegionSpec};
