//! # Blocks
//!
//! The unit of the replicated ledger: a header linking to the predecessor,
//! the ordered transaction envelopes, and an indexed list of metadata blobs.

use prost::Message;

/// A block of the ordering ledger.
#[derive(Clone, PartialEq, Message)]
pub struct Block {
    #[prost(message, optional, tag = "1")]
    pub header: Option<BlockHeader>,
    #[prost(message, optional, tag = "2")]
    pub data: Option<BlockData>,
    #[prost(message, optional, tag = "3")]
    pub metadata: Option<BlockMetadata>,
}

/// Header of a block: its number and the two hashes binding it into the chain.
#[derive(Clone, PartialEq, Eq, Hash, Message)]
pub struct BlockHeader {
    #[prost(uint64, tag = "1")]
    pub number: u64,
    #[prost(bytes = "vec", tag = "2")]
    pub previous_hash: Vec<u8>,
    #[prost(bytes = "vec", tag = "3")]
    pub data_hash: Vec<u8>,
}

/// Ordered transaction envelopes of a block, each one marshaled.
#[derive(Clone, PartialEq, Message)]
pub struct BlockData {
    #[prost(bytes = "vec", repeated, tag = "1")]
    pub data: Vec<Vec<u8>>,
}

/// Indexed metadata blobs; see [`BlockMetadataIndex`] for the slot layout.
#[derive(Clone, PartialEq, Message)]
pub struct BlockMetadata {
    #[prost(bytes = "vec", repeated, tag = "1")]
    pub metadata: Vec<Vec<u8>>,
}

/// Slots of [`BlockMetadata::metadata`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum BlockMetadataIndex {
    Signatures = 0,
    LastConfig = 1,
    TransactionsFilter = 2,
    Orderer = 3,
}

impl BlockMetadataIndex {
    /// Number of metadata slots a freshly created block carries.
    pub const COUNT: usize = 4;

    /// Position of this slot inside [`BlockMetadata::metadata`].
    pub fn slot(self) -> usize {
        self as usize
    }
}

/// Contents of a metadata slot: an opaque value and the signatures over it.
#[derive(Clone, PartialEq, Message)]
pub struct Metadata {
    #[prost(bytes = "vec", tag = "1")]
    pub value: Vec<u8>,
    #[prost(message, repeated, tag = "2")]
    pub signatures: Vec<MetadataSignature>,
}

/// One signature of a metadata slot together with the marshaled signer header.
#[derive(Clone, PartialEq, Message)]
pub struct MetadataSignature {
    #[prost(bytes = "vec", tag = "1")]
    pub signature_header: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub signature: Vec<u8>,
}

impl Block {
    /// Creates a block with no data and one empty blob per metadata slot.
    pub fn new(number: u64, previous_hash: Vec<u8>) -> Self {
        Self {
            header: Some(BlockHeader {
                number,
                previous_hash,
                data_hash: Vec::new(),
            }),
            data: Some(BlockData::default()),
            metadata: Some(BlockMetadata {
                metadata: vec![Vec::new(); BlockMetadataIndex::COUNT],
            }),
        }
    }

    /// Number from the header, if the header is present.
    pub fn number(&self) -> Option<u64> {
        self.header.as_ref().map(|header| header.number)
    }

    /// Marshaled transactions of the block; empty when the data section is absent.
    pub fn transactions(&self) -> &[Vec<u8>] {
        self.data.as_ref().map(|data| data.data.as_slice()).unwrap_or(&[])
    }

    /// Raw blob stored in a metadata slot, if the slot exists.
    pub fn metadata_slot(&self, index: BlockMetadataIndex) -> Option<&[u8]> {
        self.metadata
            .as_ref()
            .and_then(|metadata| metadata.metadata.get(index.slot()))
            .map(Vec::as_slice)
    }
}
