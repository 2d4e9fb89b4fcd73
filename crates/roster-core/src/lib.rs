pub mod config;
pub mod criteria;
pub mod error;
pub mod evaluator;
pub mod io;
pub mod paths;
pub mod queue;
pub mod repository;
pub mod scan;
pub mod snapshot;
pub mod status_store;
pub mod types;

pub use error::{Result, RosterError};
