//! # Sequence Validator
//!
//! Validates an inbound batch of blocks as a strict left-to-right fold.
//!
//! Each block is checked for hash-chain continuity, classified, and its
//! signatures evaluated against the configuration in force before it. A
//! config block's envelope becomes the active configuration for every block
//! after it, so a batch with two config blocks judges the second by the
//! first.

use super::chain::verify_block_hash;
use super::codec::classify_config_transaction;
use super::errors::VerificationError;
use super::signature::verify_block_signature;
use crate::ports::outbound::BlockVerifier;
use shared_types::{Block, ConfigEnvelope};
use tracing::{debug, warn};

/// Verifies every block of `blocks` or rejects the batch as a whole.
pub fn verify_blocks<V: BlockVerifier + ?Sized>(
    blocks: &[Block],
    verifier: &V,
) -> Result<(), VerificationError> {
    if blocks.is_empty() {
        return Err(VerificationError::EmptyBuffer);
    }

    let result = blocks
        .iter()
        .enumerate()
        .try_fold(None::<ConfigEnvelope>, |active_config, (index, block)| {
            verify_block_hash(index, blocks)?;
            let config_envelope = classify_config_transaction(block)?;
            verify_block_signature(block, verifier, active_config.as_ref())?;

            match config_envelope {
                Some(envelope) => {
                    debug!(
                        block = block.number(),
                        sequence = envelope.config.as_ref().map_or(0, |c| c.sequence),
                        "[cluster] Config block verified, switching active config"
                    );
                    Ok(Some(envelope))
                }
                None => Ok(active_config),
            }
        });

    match result {
        Ok(_) => {
            debug!(
                first = blocks[0].number(),
                count = blocks.len(),
                "[cluster] Block batch verified"
            );
            Ok(())
        }
        Err(err) => {
            warn!(
                first = blocks[0].number(),
                count = blocks.len(),
                error = %err,
                "[cluster] Block batch rejected"
            );
            Err(err)
        }
    }
}
