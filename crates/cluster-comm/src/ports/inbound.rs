//! # Inbound Ports (Driving Ports / API)
//!
//! What a replication or consensus driver calls on this crate.

use crate::domain::entities::EndpointConfig;
use crate::domain::errors::{ExtractionError, VerificationError};
use crate::transport::{DialError, RemoteContext, Stub};
use async_trait::async_trait;
use shared_types::Block;
use std::sync::Arc;
use thiserror::Error;

/// Errors from applying a committed config block to the dialer.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RefreshError {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Dialer(#[from] DialError),
}

/// Cluster replication API.
///
/// Implementations must be thread-safe (`Send + Sync`).
#[async_trait]
pub trait ClusterReplicationApi: Send + Sync {
    /// Validates an inbound batch of blocks; any failure rejects the whole batch.
    fn verify_blocks(&self, blocks: &[Block]) -> Result<(), VerificationError>;

    /// Applies a committed config block: its orderer TLS certificates become
    /// the dialer's server roots, and stubs of members no longer listed are
    /// dropped. Returns the new endpoint configuration.
    async fn refresh_from_config_block(
        &self,
        block: &Block,
    ) -> Result<EndpointConfig, RefreshError>;

    /// The shared stub of `endpoint`, created on first request.
    fn stub(&self, endpoint: &str) -> Arc<Stub>;

    /// The active connection to `endpoint`, dialing it if there is none.
    async fn remote_context(&self, endpoint: &str) -> Result<Arc<RemoteContext>, DialError>;
}
