//! # Chain Verifier
//!
//! Hash-chain continuity of a block sequence, checked one index at a time.
//!
//! For every block the data hash must match its transactions. For every block
//! but the first, the number must follow the predecessor's and
//! `previous_hash` must equal the predecessor's header hash.

use super::codec::{block_data_hash, header_hash};
use super::errors::VerificationError;
use shared_types::Block;

/// Verifies the block at `index` of `blocks` against its own data and,
/// when it has one, its predecessor in the slice.
pub fn verify_block_hash(index: usize, blocks: &[Block]) -> Result<(), VerificationError> {
    let block = blocks.get(index).ok_or(VerificationError::IndexOutOfBounds {
        index,
        total: blocks.len(),
    })?;
    let header = block
        .header
        .as_ref()
        .ok_or(VerificationError::MissingHeader)?;

    let computed = block_data_hash(block);
    if computed.as_slice() != header.data_hash.as_slice() {
        return Err(VerificationError::DataHashMismatch {
            number: header.number,
            computed: hex::encode(computed),
            claimed: hex::encode(&header.data_hash),
        });
    }

    if index == 0 {
        return Ok(());
    }

    let previous = blocks[index - 1]
        .header
        .as_ref()
        .ok_or(VerificationError::MissingPreviousHeader)?;

    if previous.number.checked_add(1) != Some(header.number) {
        return Err(VerificationError::NonConsecutive {
            previous: previous.number,
            current: header.number,
        });
    }

    let actual = header_hash(previous);
    if actual.as_slice() != header.previous_hash.as_slice() {
        return Err(VerificationError::PreviousHashMismatch {
            number: header.number,
            previous: previous.number,
            actual: hex::encode(actual),
            claimed: hex::encode(&header.previous_hash),
        });
    }

    Ok(())
}
