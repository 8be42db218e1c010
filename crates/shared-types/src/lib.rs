//! # Shared Types Crate
//!
//! Protocol messages exchanged between ordering cluster members.
//!
//! ## Design Principles
//!
//! - **Wire compatibility**: every message is a `prost` message carrying the
//!   field numbers of the ordering protocol, so bytes produced by any member
//!   decode here unchanged.
//! - **Absence is explicit**: nested messages are `Option`s. A block without a
//!   header, or a payload without a header, is representable and must be
//!   rejected by validators rather than silently defaulted.
//! - **Opaque nesting**: envelopes carry their payloads as raw bytes. Decoding
//!   one layer never implies decoding the next.

pub mod block;
pub mod config;
pub mod envelope;
pub mod signed_data;

pub use block::{
    Block, BlockData, BlockHeader, BlockMetadata, BlockMetadataIndex, Metadata, MetadataSignature,
};
pub use config::{
    Config, ConfigEnvelope, ConfigGroup, ConfigSignature, ConfigUpdateEnvelope, ConfigValue,
    FabricMspConfig, MspConfig, MspType, OrdererAddresses, MSP_KEY, ORDERER_ADDRESSES_KEY,
    ORDERER_GROUP_KEY,
};
pub use envelope::{ChannelHeader, Envelope, Header, HeaderType, Payload, SignatureHeader};
pub use signed_data::{Signable, SignedData, SignedDataError};

/// Re-exported so downstream crates encode and decode with the same codec version.
pub use prost::Message;
