pub mod catalog;
pub mod config;
mod error;
pub mod health;
pub mod tracing;
pub mod transaction;

pub use error::set_development_mode;
