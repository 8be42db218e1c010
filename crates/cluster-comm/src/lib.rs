//! # Cluster Communication (Ordering Cluster)
//!
//! Lets members of an ordering cluster trust each other's blocks and reach
//! each other over pinned mutual TLS.
//!
//! ## Architecture
//!
//! This crate follows hexagonal architecture:
//! - **Domain Layer** (`domain/`): Block hashing, chain linkage, signature
//!   collection and config-block extraction. Pure, no I/O
//! - **Ports Layer** (`ports/`): The replication API and the collaborators it
//!   needs (policy evaluator, bundle builder, stream connector)
//! - **Adapters Layer** (`adapters/`): Default bundle builder over the config
//!   tree and a plain TCP connector
//! - **Transport Layer** (`transport/`): Client configuration, the pinning
//!   dialer, connections and per-member stubs
//! - **Service Layer** (`service.rs`): Wires domain logic to ports
//!
//! ## Trust Model
//!
//! - A batch of blocks is accepted only if every block links to its
//!   predecessor, its data matches its header, and its signatures satisfy
//!   the policy of the most recent config block seen so far
//! - Server roots used for dialing are replaced wholesale by the orderer TLS
//!   certificates of each committed config block

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;
pub mod transport;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// Re-export public API
pub use adapters::{ConfigTreeBundleBuilder, TcpConnector};
pub use domain::chain::verify_block_hash;
pub use domain::codec::{
    block_data_hash, classify_config_transaction, config_envelope_from_payload, data_hash,
    extract_channel_header, extract_envelope, extract_payload, extract_payload_header,
    header_bytes, header_hash, is_config_block, Hash,
};
pub use domain::endpoint::{
    bundle_from_envelope, config_from_block, endpoint_config_from_config_block,
};
pub use domain::entities::{ChannelBundle, EndpointConfig, OrdererOrganization};
pub use domain::errors::{BlockError, ExtractionError, VerificationError};
pub use domain::sequence::verify_blocks;
pub use domain::signature::{
    signature_set_from_block, signature_set_over, verify_block_signature,
};
pub use ports::inbound::{ClusterReplicationApi, RefreshError};
pub use ports::outbound::{
    BlockVerifier, BundleError, ChannelBundleBuilder, PolicyError, StreamConnector,
};
pub use service::ClusterService;
pub use transport::{
    der_to_pem, CertificatePin, CertificateRejected, ClientConfig, ClusterConnection,
    ConfigError, DialError, KeepaliveOptions, PredicateDialer, RemoteContext, RemoteVerifier,
    SecureOptions, StandardDialer, Stub,
};
