//! Outbound HTTP clients
//!
//! Each client owns a `reqwest::Client` built with an explicit timeout so a
//! slow collaborator can never hang a submission. Enrichment clients
//! (gene lookup, association ranking) are fail-open: their failures degrade
//! to missing data rather than errors, because the submission's primary
//! guarantee is that runs get queued.

pub mod association;
pub mod gene_lookup;
pub mod identity;

pub use association::AssociationClient;
pub use gene_lookup::GeneLookupClient;
pub use identity::{IdentityClient, IdentityError};

use crate::config::ServicesConfig;

/// Outbound service clients shared across request handlers
#[derive(Clone)]
pub struct ExternalServices {
    pub identity: IdentityClient,
    pub gene_lookup: GeneLookupClient,
    pub association: AssociationClient,
}

impl ExternalServices {
    pub fn new(config: &ServicesConfig) -> anyhow::Result<Self> {
        Ok(Self {
            identity: IdentityClient::new(config.identity_url.clone())?,
            gene_lookup: GeneLookupClient::new(config.gene_lookup_url.clone())?,
            association: AssociationClient::new(config.association_url.clone())?,
        })
    }
}
