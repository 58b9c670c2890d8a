//! Read operations for the runs feature

pub mod list;

pub use list::{ListRunsError, ListRunsQuery, ListRunsResponse};
