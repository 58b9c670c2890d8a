//! API types shared across routes

pub mod response;
