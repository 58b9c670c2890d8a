//! Parsing of uploaded tabular files

pub mod tabular;
