//! Run submission and listing feature

pub mod commands;
pub mod indications;
pub mod pairs;
pub mod queries;
pub mod records;
pub mod routes;
pub mod types;

pub use routes::{indications_routes, runs_routes};
