//! # Domain Errors
//!
//! Error types for block validation and configuration extraction.
//!
//! ## Design Principles
//!
//! - Messages are stable strings; callers and tests match on them exactly
//! - Every integrity error names the block numbers and digests involved
//! - Errors from collaborators (policy evaluator, bundle builder) keep their
//!   own message when carried through

use crate::ports::outbound::{BundleError, PolicyError};
use thiserror::Error;

/// Structural errors: bytes that do not decode into the expected nesting.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BlockError {
    /// The block, or its data section, carries no transaction.
    #[error("empty block")]
    EmptyBlock,

    /// Requested envelope index is past the end of the block data.
    #[error("envelope index out of bounds")]
    EnvelopeIndexOutOfBounds { index: usize, len: usize },

    /// Protocol bytes failed to decode as `kind`.
    #[error("error unmarshaling {kind}: {reason}")]
    Unmarshal { kind: &'static str, reason: String },

    /// A payload decoded without its header.
    #[error("nil header in payload")]
    MissingPayloadHeader,

    /// A configuration transaction whose body is not a config envelope.
    #[error("invalid config envelope: {0}")]
    InvalidConfigEnvelope(String),
}

impl BlockError {
    pub(crate) fn unmarshal(kind: &'static str, err: prost::DecodeError) -> Self {
        BlockError::Unmarshal {
            kind,
            reason: err.to_string(),
        }
    }
}

/// Errors raised while verifying a block or a sequence of blocks.
///
/// Any of these rejects the whole batch under validation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VerificationError {
    #[error("buffer is empty")]
    EmptyBuffer,

    #[error("index {index} out of bounds (total {total} blocks)")]
    IndexOutOfBounds { index: usize, total: usize },

    #[error("missing block header")]
    MissingHeader,

    #[error("previous block header is nil")]
    MissingPreviousHeader,

    #[error("sequences {previous} and {current} were received consecutively")]
    NonConsecutive { previous: u64, current: u64 },

    #[error("computed hash of block ({number}) ({computed}) doesn't match claimed hash ({claimed})")]
    DataHashMismatch {
        number: u64,
        computed: String,
        claimed: String,
    },

    #[error("block {number}'s hash ({actual}) mismatches {previous}'s prev block hash ({claimed})")]
    PreviousHashMismatch {
        number: u64,
        previous: u64,
        actual: String,
        claimed: String,
    },

    #[error("no metadata in block")]
    NoMetadata,

    #[error("failed unmarshaling metadata for signatures: {0}")]
    BadSignatureMetadata(String),

    #[error("failed unmarshaling signature header: {0}")]
    BadSignatureHeader(String),

    /// A transaction could not be classified.
    #[error(transparent)]
    Malformed(#[from] BlockError),

    /// The policy evaluator rejected the signature set.
    #[error(transparent)]
    Policy(#[from] PolicyError),
}

/// Errors raised while extracting configuration from a config block.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ExtractionError {
    #[error("nil block")]
    NilBlock,

    #[error("block data is nil")]
    NilBlockData,

    #[error(transparent)]
    Block(#[from] BlockError),

    #[error("failed extracting bundle from envelope: {0}")]
    Bundle(#[from] BundleError),
}
