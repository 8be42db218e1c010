//! # Endpoint/Config Extractor
//!
//! Turns a committed config block into the membership and trust material the
//! dialer needs: orderer endpoints and the TLS certificates of every orderer
//! organization.

use super::codec::{config_envelope_from_payload, extract_envelope, first_transaction};
use super::entities::{ChannelBundle, EndpointConfig};
use super::errors::{BlockError, ExtractionError};
use crate::ports::outbound::{BundleError, ChannelBundleBuilder};
use prost::Message;
use shared_types::{Block, ChannelHeader, ConfigEnvelope, Envelope, Payload};

/// Decodes the config envelope carried by the first transaction of `block`.
///
/// The transaction's declared type is not checked; the body is decoded as a
/// config envelope whatever the header says.
pub fn config_from_block(block: Option<&Block>) -> Result<ConfigEnvelope, BlockError> {
    let block = block.ok_or(BlockError::EmptyBlock)?;
    let (_, payload) = first_transaction(block)?;
    config_envelope_from_payload(&payload)
}

/// Builds the channel bundle described by a configuration envelope.
pub fn bundle_from_envelope<B: ChannelBundleBuilder + ?Sized>(
    envelope: &Envelope,
    builder: &B,
) -> Result<ChannelBundle, BundleError> {
    let payload =
        Payload::decode(envelope.payload.as_slice()).map_err(|e| BundleError::Unmarshal {
            kind: "Payload",
            reason: e.to_string(),
        })?;
    let header = payload
        .header
        .as_ref()
        .ok_or(BundleError::MissingEnvelopeHeader)?;

    let config_envelope =
        ConfigEnvelope::decode(payload.data.as_slice()).map_err(|e| BundleError::Unmarshal {
            kind: "ConfigEnvelope",
            reason: e.to_string(),
        })?;
    let channel_header = ChannelHeader::decode(header.channel_header.as_slice()).map_err(|e| {
        BundleError::Unmarshal {
            kind: "ChannelHeader",
            reason: e.to_string(),
        }
    })?;
    let config = config_envelope
        .config
        .as_ref()
        .ok_or(BundleError::MissingConfig)?;

    builder.build(&channel_header.channel_id, config)
}

/// Ordering endpoints and orderer TLS certificates declared by a config block.
pub fn endpoint_config_from_config_block<B: ChannelBundleBuilder + ?Sized>(
    block: Option<&Block>,
    builder: &B,
) -> Result<EndpointConfig, ExtractionError> {
    let block = block.ok_or(ExtractionError::NilBlock)?;
    if block.data.is_none() {
        return Err(ExtractionError::NilBlockData);
    }

    let envelope = extract_envelope(block, 0)?;
    let bundle = bundle_from_envelope(&envelope, builder)?;

    Ok(EndpointConfig {
        tls_root_cas: bundle.orderer_tls_certificates(),
        endpoints: bundle.orderer_addresses,
    })
}
