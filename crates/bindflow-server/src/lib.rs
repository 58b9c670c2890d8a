//! BindFlow Server Library
//!
//! HTTP server for submitting ligand/target affinity prediction runs.
//!
//! # Overview
//!
//! A submission uploads two tabular files (ligands with SMILES strings,
//! targets with amino-acid sequences). The server expands them into every
//! ligand×target pair, validates each pair, recognizes already-computed
//! results by content hash, optionally resolves target gene symbols to
//! Ensembl identifiers and attaches disease-association scores, and persists
//! one run record per pair in a single transaction.
//!
//! # Architecture
//!
//! The server is organized as vertical feature slices:
//!
//! - **commands** (write operations): the run submission pipeline
//! - **queries** (read operations): run listing for the calling user
//! - **routes**: HTTP route definitions per feature
//!
//! Supporting modules:
//!
//! - [`ingest`]: forgiving tabular parsing of uploaded files
//! - [`services`]: outbound HTTP clients (identity, gene lookup, association
//!   ranking), each with an explicit per-call timeout
//! - [`db`]: chunked dedup lookups and the transactional batch insert
//!
//! ## Framework Stack
//!
//! - **Axum**: web framework with multipart upload support
//! - **SQLx**: PostgreSQL access and embedded migrations
//! - **Reqwest**: outbound HTTP clients
//! - **Tower**: middleware and service abstractions

pub mod api;
pub mod config;
pub mod db;
pub mod features;
pub mod ingest;
pub mod middleware;
pub mod services;
