//! Store queries

pub mod runs;
