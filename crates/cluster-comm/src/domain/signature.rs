//! # Signature Verifier
//!
//! Extracts the signature set a block carries in its `SIGNATURES` metadata
//! slot and submits it to the channel policy evaluator.

use super::errors::VerificationError;
use crate::ports::outbound::BlockVerifier;
use prost::Message;
use shared_types::{Block, BlockMetadataIndex, ConfigEnvelope, Metadata, SignatureHeader, SignedData};

/// Signature set of a block, each entry signing `signatureHeader ++ signed_payload`.
///
/// `signed_payload` is empty for ordinary block signatures; a caller
/// re-verifying a configuration block's own update supplies the update bytes.
pub fn signature_set_over(
    block: &Block,
    signed_payload: &[u8],
) -> Result<Vec<SignedData>, VerificationError> {
    let raw = block
        .metadata_slot(BlockMetadataIndex::Signatures)
        .filter(|raw| !raw.is_empty())
        .ok_or(VerificationError::NoMetadata)?;

    let metadata = Metadata::decode(raw)
        .map_err(|e| VerificationError::BadSignatureMetadata(e.to_string()))?;

    metadata
        .signatures
        .into_iter()
        .map(|metadata_signature| {
            let signature_header =
                SignatureHeader::decode(metadata_signature.signature_header.as_slice())
                    .map_err(|e| VerificationError::BadSignatureHeader(e.to_string()))?;

            let mut data =
                Vec::with_capacity(metadata_signature.signature_header.len() + signed_payload.len());
            data.extend_from_slice(&metadata_signature.signature_header);
            data.extend_from_slice(signed_payload);

            Ok(SignedData {
                data,
                identity: signature_header.creator,
                signature: metadata_signature.signature,
            })
        })
        .collect()
}

/// Signature set of a block as carried in its metadata.
pub fn signature_set_from_block(block: &Block) -> Result<Vec<SignedData>, VerificationError> {
    signature_set_over(block, &[])
}

/// Checks the block's signatures against the policy in force before it.
///
/// `config` is the configuration preceding this block (`None` for the one
/// already committed), which lets a block that changes the policy be judged
/// by the policy it replaces. The evaluator's rejection is returned as is.
pub fn verify_block_signature<V: BlockVerifier + ?Sized>(
    block: &Block,
    verifier: &V,
    config: Option<&ConfigEnvelope>,
) -> Result<(), VerificationError> {
    let signature_set = signature_set_from_block(block)?;
    verifier.verify_block_signature(&signature_set, config)?;
    Ok(())
}
