//! Write operations for the runs feature

pub mod submit;

pub use submit::{SubmitRunsCommand, SubmitRunsError, SubmitRunsResponse};
