//! # Block Codec Helpers
//!
//! Canonical header encoding, header and data hashing, and extraction of the
//! nested envelope structures carried in block data.
//!
//! ## Header Encoding
//!
//! A header is hashed over its DER encoding:
//!
//! ```text
//! SEQUENCE {
//!     number        INTEGER,       -- signed 64-bit
//!     previous_hash OCTET STRING,
//!     data_hash     OCTET STRING
//! }
//! ```
//!
//! The encoding cannot represent block numbers above `i64::MAX`; hashing such
//! a header panics rather than produce a hash no other member would agree on.

use super::errors::BlockError;
use prost::Message;
use sha2::{Digest, Sha256};
use shared_types::{Block, BlockHeader, ChannelHeader, ConfigEnvelope, Envelope, Header, Payload};

/// A SHA-256 digest.
pub type Hash = [u8; 32];

const TAG_INTEGER: u8 = 0x02;
const TAG_OCTET_STRING: u8 = 0x04;
const TAG_SEQUENCE: u8 = 0x30;

fn encode_length(len: usize, out: &mut Vec<u8>) {
    if len < 0x80 {
        out.push(len as u8);
        return;
    }
    let bytes = len.to_be_bytes();
    let skip = bytes.iter().take_while(|b| **b == 0).count();
    out.push(0x80 | (bytes.len() - skip) as u8);
    out.extend_from_slice(&bytes[skip..]);
}

fn encode_integer(value: i64, out: &mut Vec<u8>) {
    let bytes = value.to_be_bytes();
    // Minimal two's complement: drop a leading byte while the next one
    // still carries the same sign bit.
    let mut start = 0;
    while start < bytes.len() - 1 {
        let redundant = (bytes[start] == 0x00 && bytes[start + 1] & 0x80 == 0)
            || (bytes[start] == 0xff && bytes[start + 1] & 0x80 != 0);
        if !redundant {
            break;
        }
        start += 1;
    }
    out.push(TAG_INTEGER);
    encode_length(bytes.len() - start, out);
    out.extend_from_slice(&bytes[start..]);
}

fn encode_octet_string(value: &[u8], out: &mut Vec<u8>) {
    out.push(TAG_OCTET_STRING);
    encode_length(value.len(), out);
    out.extend_from_slice(value);
}

/// Canonical DER encoding of a block header.
///
/// # Panics
///
/// If `header.number` exceeds `i64::MAX`.
pub fn header_bytes(header: &BlockHeader) -> Vec<u8> {
    let number = i64::try_from(header.number).unwrap_or_else(|_| {
        panic!(
            "block number {} cannot be encoded as a signed 64-bit ASN.1 integer",
            header.number
        )
    });

    let mut body = Vec::with_capacity(header.previous_hash.len() + header.data_hash.len() + 16);
    encode_integer(number, &mut body);
    encode_octet_string(&header.previous_hash, &mut body);
    encode_octet_string(&header.data_hash, &mut body);

    let mut out = Vec::with_capacity(body.len() + 4);
    out.push(TAG_SEQUENCE);
    encode_length(body.len(), &mut out);
    out.extend_from_slice(&body);
    out
}

/// Hash of a block header; what the successor stores as `previous_hash`.
///
/// # Panics
///
/// If `header.number` exceeds `i64::MAX`.
pub fn header_hash(header: &BlockHeader) -> Hash {
    Sha256::digest(header_bytes(header)).into()
}

/// Hash over the concatenation of every transaction, in order, undelimited.
pub fn data_hash(data: &[Vec<u8>]) -> Hash {
    let mut hasher = Sha256::new();
    for tx in data {
        hasher.update(tx);
    }
    hasher.finalize().into()
}

/// [`data_hash`] of a block's transactions; an absent data section hashes as empty.
pub fn block_data_hash(block: &Block) -> Hash {
    data_hash(block.transactions())
}

/// Decodes the envelope at `index` of the block data.
pub fn extract_envelope(block: &Block, index: usize) -> Result<Envelope, BlockError> {
    let transactions = block.transactions();
    let raw = transactions
        .get(index)
        .ok_or(BlockError::EnvelopeIndexOutOfBounds {
            index,
            len: transactions.len(),
        })?;
    Envelope::decode(raw.as_slice()).map_err(|e| BlockError::unmarshal("Envelope", e))
}

/// Decodes the payload of an envelope.
pub fn extract_payload(envelope: &Envelope) -> Result<Payload, BlockError> {
    Payload::decode(envelope.payload.as_slice()).map_err(|e| BlockError::unmarshal("Payload", e))
}

/// Decodes the payload of an envelope and returns its header.
pub fn extract_payload_header(envelope: &Envelope) -> Result<Header, BlockError> {
    extract_payload(envelope)?
        .header
        .ok_or(BlockError::MissingPayloadHeader)
}

/// Decodes the channel header of a payload header.
pub fn extract_channel_header(header: &Header) -> Result<ChannelHeader, BlockError> {
    ChannelHeader::decode(header.channel_header.as_slice())
        .map_err(|e| BlockError::unmarshal("ChannelHeader", e))
}

/// Decodes a config envelope from a payload body.
pub fn config_envelope_from_payload(payload: &Payload) -> Result<ConfigEnvelope, BlockError> {
    ConfigEnvelope::decode(payload.data.as_slice())
        .map_err(|e| BlockError::InvalidConfigEnvelope(e.to_string()))
}

/// First transaction of a block, decoded down to its channel header.
pub(crate) fn first_transaction(block: &Block) -> Result<(ChannelHeader, Payload), BlockError> {
    if block.transactions().is_empty() {
        return Err(BlockError::EmptyBlock);
    }
    let envelope = extract_envelope(block, 0)?;
    let payload = extract_payload(&envelope)?;
    let header = payload
        .header
        .as_ref()
        .ok_or(BlockError::MissingPayloadHeader)?;
    let channel_header = extract_channel_header(header)?;
    Ok((channel_header, payload))
}

/// Returns the block's config envelope if its transaction is a configuration
/// transaction, `None` for any other transaction type.
///
/// A configuration transaction whose body does not decode is an error, as is
/// a block whose transaction does not decode down to its channel header.
pub fn classify_config_transaction(block: &Block) -> Result<Option<ConfigEnvelope>, BlockError> {
    let (channel_header, payload) = first_transaction(block)?;
    if !channel_header.is_config() {
        return Ok(None);
    }
    config_envelope_from_payload(&payload).map(Some)
}

/// Whether the block is a well-formed config block.
pub fn is_config_block(block: &Block) -> bool {
    matches!(classify_config_transaction(block), Ok(Some(_)))
}
