//! Shared application state injected into every handler.

use std::sync::Arc;

use sqlx::types::ipnetwork::IpNetwork;

use crate::application::services::LinkService;
use crate::domain::deletion_pipeline::DeletionSender;

/// Cheaply cloneable handle to the services used by handlers.
#[derive(Clone)]
pub struct AppState {
    pub link_service: Arc<LinkService>,
    /// Kept separately from the service for queue health reporting.
    pub deletions: DeletionSender,
    /// Callers allowed to read internal statistics; `None` denies everyone.
    pub trusted_subnet: Option<IpNetwork>,
}

impl AppState {
    pub fn new(link_service: Arc<LinkService>, deletions: DeletionSender) -> Self {
        Self {
            link_service,
            deletions,
            trusted_subnet: None,
        }
    }

    pub fn with_trusted_subnet(mut self, subnet: Option<IpNetwork>) -> Self {
        self.trusted_subnet = subnet;
        self
    }
}
