//! # Outbound Ports (Driven Ports / SPI)
//!
//! Collaborators this crate consumes but does not implement policy for:
//! the channel policy evaluator, the channel bundle builder, and the raw
//! stream transport underneath the TLS dialer.

use crate::domain::entities::ChannelBundle;
use shared_types::{Config, ConfigEnvelope, SignedData};
use thiserror::Error;
use tokio::net::TcpStream;

/// Rejection returned by a policy evaluator.
///
/// Carried through block validation unmodified.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{reason}")]
pub struct PolicyError {
    pub reason: String,
}

impl PolicyError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Channel policy evaluator.
///
/// Decides whether a block's signature set satisfies the block validation
/// policy. `config` is the configuration in force before the block being
/// checked; `None` means the policy already committed to the ledger.
pub trait BlockVerifier: Send + Sync {
    fn verify_block_signature(
        &self,
        signature_set: &[SignedData],
        config: Option<&ConfigEnvelope>,
    ) -> Result<(), PolicyError>;
}

impl<V: BlockVerifier + ?Sized> BlockVerifier for std::sync::Arc<V> {
    fn verify_block_signature(
        &self,
        signature_set: &[SignedData],
        config: Option<&ConfigEnvelope>,
    ) -> Result<(), PolicyError> {
        (**self).verify_block_signature(signature_set, config)
    }
}

/// Errors from building a channel bundle.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BundleError {
    #[error("envelope header cannot be nil")]
    MissingEnvelopeHeader,

    #[error("error unmarshaling {kind}: {reason}")]
    Unmarshal { kind: &'static str, reason: String },

    #[error("config envelope carries no config")]
    MissingConfig,

    #[error("config has no channel group")]
    MissingChannelGroup,

    #[error("channel config has no {0} group")]
    MissingGroup(&'static str),

    #[error("invalid config value {key} in {path}: {reason}")]
    InvalidValue {
        key: &'static str,
        path: String,
        reason: String,
    },

    #[error("organization {organization} uses unsupported MSP type {msp_type}")]
    UnsupportedMsp { organization: String, msp_type: i32 },
}

/// Turns a channel configuration into a queryable [`ChannelBundle`].
pub trait ChannelBundleBuilder: Send + Sync {
    fn build(&self, channel_id: &str, config: &Config) -> Result<ChannelBundle, BundleError>;
}

/// Opens the raw stream a dial runs its handshake over.
#[async_trait::async_trait]
pub trait StreamConnector: Send + Sync {
    async fn connect(&self, address: &str) -> std::io::Result<TcpStream>;
}
