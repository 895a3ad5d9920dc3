pub mod checkpoint;
pub mod config;
pub mod error;
pub mod executor;
pub mod io;
pub mod orchestrator;
pub mod paths;
pub mod source;
pub mod types;
pub mod ui;
pub mod usage;

pub use error::{Result, UnpostError};
