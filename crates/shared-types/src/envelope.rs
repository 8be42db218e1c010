//! # Envelopes
//!
//! Every transaction in a block is a marshaled [`Envelope`]. Its payload
//! carries a [`Header`] whose channel header declares the transaction type.
//!
//! ```text
//! Envelope { payload, signature }
//!     |
//!     +-- Payload { header, data }
//!           |
//!           +-- Header { channel_header, signature_header }
//!                 |              |
//!                 |              +-- SignatureHeader { creator, nonce }
//!                 +-- ChannelHeader { type, channel_id, ... }
//! ```

use prost::Message;

/// A signed, marshaled payload.
#[derive(Clone, PartialEq, Message)]
pub struct Envelope {
    #[prost(bytes = "vec", tag = "1")]
    pub payload: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub signature: Vec<u8>,
}

/// Body of an [`Envelope`]. A payload without a header is never valid.
#[derive(Clone, PartialEq, Message)]
pub struct Payload {
    #[prost(message, optional, tag = "1")]
    pub header: Option<Header>,
    #[prost(bytes = "vec", tag = "2")]
    pub data: Vec<u8>,
}

/// The two marshaled headers of a payload.
#[derive(Clone, PartialEq, Message)]
pub struct Header {
    #[prost(bytes = "vec", tag = "1")]
    pub channel_header: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub signature_header: Vec<u8>,
}

/// Channel-scoped header; `type` is a [`HeaderType`] discriminant.
#[derive(Clone, PartialEq, Message)]
pub struct ChannelHeader {
    #[prost(int32, tag = "1")]
    pub r#type: i32,
    #[prost(int32, tag = "2")]
    pub version: i32,
    #[prost(string, tag = "4")]
    pub channel_id: String,
    #[prost(string, tag = "5")]
    pub tx_id: String,
    #[prost(uint64, tag = "6")]
    pub epoch: u64,
    #[prost(bytes = "vec", tag = "7")]
    pub extension: Vec<u8>,
    #[prost(bytes = "vec", tag = "8")]
    pub tls_cert_hash: Vec<u8>,
}

/// Identifies the signer of a payload.
#[derive(Clone, PartialEq, Message)]
pub struct SignatureHeader {
    #[prost(bytes = "vec", tag = "1")]
    pub creator: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub nonce: Vec<u8>,
}

/// Transaction types a channel header can declare.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum HeaderType {
    Message = 0,
    Config = 1,
    ConfigUpdate = 2,
    EndorserTransaction = 3,
    OrdererTransaction = 4,
    DeliverSeekInfo = 5,
    ChaincodePackage = 6,
}

impl ChannelHeader {
    /// Declared type, or `None` for a discriminant this node does not know.
    pub fn header_type(&self) -> Option<HeaderType> {
        HeaderType::try_from(self.r#type).ok()
    }

    /// Whether this header marks a channel configuration transaction.
    pub fn is_config(&self) -> bool {
        self.r#type == HeaderType::Config as i32
    }
}
