//! # Cluster Service
//!
//! Application service layer that implements the `ClusterReplicationApi` trait.
//!
//! ## Architecture
//!
//! This is the hexagonal "application service" that:
//! - Implements the inbound port (`ClusterReplicationApi`)
//! - Uses the outbound ports (`BlockVerifier`, `ChannelBundleBuilder`,
//!   `StreamConnector`)
//! - Delegates validation to the domain layer and dialing to the transport layer

use crate::adapters::{ConfigTreeBundleBuilder, TcpConnector};
use crate::domain::endpoint::endpoint_config_from_config_block;
use crate::domain::entities::EndpointConfig;
use crate::domain::errors::VerificationError;
use crate::domain::sequence;
use crate::ports::inbound::{ClusterReplicationApi, RefreshError};
use crate::ports::outbound::{BlockVerifier, ChannelBundleBuilder, StreamConnector};
use crate::transport::{DialError, PredicateDialer, RemoteContext, StandardDialer, Stub};
use async_trait::async_trait;
use parking_lot::RwLock;
use shared_types::Block;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

/// Cluster Service.
///
/// Owns the policy evaluator used to validate inbound blocks, the dialer
/// whose trust roots follow committed config blocks, and one stub per
/// remote member.
pub struct ClusterService<V, B = ConfigTreeBundleBuilder, C = TcpConnector> {
    verifier: V,
    bundle_builder: B,
    dialer: StandardDialer<C>,
    stubs: RwLock<HashMap<String, Arc<Stub>>>,
}

impl<V: BlockVerifier> ClusterService<V> {
    /// Create a service reading bundles straight from the config tree.
    pub fn new(verifier: V, dialer: Arc<PredicateDialer>) -> Self {
        Self::with_bundle_builder(verifier, ConfigTreeBundleBuilder::new(), dialer)
    }
}

impl<V, B, C> ClusterService<V, B, C>
where
    V: BlockVerifier,
    B: ChannelBundleBuilder,
    C: StreamConnector,
{
    pub fn with_bundle_builder(
        verifier: V,
        bundle_builder: B,
        dialer: Arc<PredicateDialer<C>>,
    ) -> Self {
        Self {
            verifier,
            bundle_builder,
            dialer: StandardDialer::new(dialer),
            stubs: RwLock::new(HashMap::new()),
        }
    }

    pub fn verifier(&self) -> &V {
        &self.verifier
    }

    pub fn dialer(&self) -> &Arc<PredicateDialer<C>> {
        self.dialer.dialer()
    }

    /// Endpoints that currently have a stub.
    pub fn stub_endpoints(&self) -> Vec<String> {
        let mut endpoints: Vec<_> = self.stubs.read().keys().cloned().collect();
        endpoints.sort();
        endpoints
    }

    fn retain_stubs(&self, endpoints: &[String]) -> Vec<Arc<Stub>> {
        let mut stubs = self.stubs.write();
        let removed: Vec<_> = stubs
            .keys()
            .filter(|endpoint| !endpoints.contains(*endpoint))
            .cloned()
            .collect();
        removed
            .iter()
            .filter_map(|endpoint| stubs.remove(endpoint))
            .collect()
    }
}

#[async_trait]
impl<V, B, C> ClusterReplicationApi for ClusterService<V, B, C>
where
    V: BlockVerifier,
    B: ChannelBundleBuilder,
    C: StreamConnector,
{
    fn verify_blocks(&self, blocks: &[Block]) -> Result<(), VerificationError> {
        sequence::verify_blocks(blocks, &self.verifier)
    }

    async fn refresh_from_config_block(
        &self,
        block: &Block,
    ) -> Result<EndpointConfig, RefreshError> {
        let endpoint_config = endpoint_config_from_config_block(Some(block), &self.bundle_builder)?;
        self.dialer()
            .update_server_root_cas(endpoint_config.tls_root_cas.clone())?;

        let removed = self.retain_stubs(&endpoint_config.endpoints);
        for stub in &removed {
            stub.deactivate().await;
        }

        info!(
            block = block.number(),
            endpoints = endpoint_config.endpoints.len(),
            tls_roots = endpoint_config.tls_root_cas.len(),
            stubs_dropped = removed.len(),
            "[cluster] Applied config block"
        );
        Ok(endpoint_config)
    }

    fn stub(&self, endpoint: &str) -> Arc<Stub> {
        if let Some(stub) = self.stubs.read().get(endpoint) {
            return Arc::clone(stub);
        }
        let mut stubs = self.stubs.write();
        Arc::clone(
            stubs
                .entry(endpoint.to_string())
                .or_insert_with(|| Arc::new(Stub::new(endpoint))),
        )
    }

    async fn remote_context(&self, endpoint: &str) -> Result<Arc<RemoteContext>, DialError> {
        self.stub(endpoint).activate_with(&self.dialer).await
    }
}
