pub mod config;
pub mod error;
pub mod history;
pub mod paths;
pub mod query;
pub mod ranking;
pub mod recorder;
pub mod selector;

pub use error::{Error, Result};
