//! # Signed Data
//!
//! The `(data, identity, signature)` triplet every policy evaluator checks.
//! How the triplet is assembled depends on what was signed: an envelope signs
//! its whole payload, a configuration update signs the signer's header
//! followed by the update bytes.

use crate::{ConfigUpdateEnvelope, Envelope, Payload, SignatureHeader};
use prost::Message;
use thiserror::Error;

/// A message, the identity that claims to have signed it, and the signature.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SignedData {
    pub data: Vec<u8>,
    pub identity: Vec<u8>,
    pub signature: Vec<u8>,
}

/// Why a structure could not be turned into signed data.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SignedDataError {
    #[error("missing header")]
    MissingHeader,

    #[error("error unmarshaling {kind}: {reason}")]
    Unmarshal { kind: &'static str, reason: String },
}

/// Structures that can enumerate their signatures as [`SignedData`].
pub trait Signable {
    fn as_signed_data(&self) -> Result<Vec<SignedData>, SignedDataError>;
}

impl Signable for Envelope {
    fn as_signed_data(&self) -> Result<Vec<SignedData>, SignedDataError> {
        let payload =
            Payload::decode(self.payload.as_slice()).map_err(|e| SignedDataError::Unmarshal {
                kind: "Payload",
                reason: e.to_string(),
            })?;
        let header = payload.header.ok_or(SignedDataError::MissingHeader)?;
        let signature_header = SignatureHeader::decode(header.signature_header.as_slice())
            .map_err(|e| SignedDataError::Unmarshal {
                kind: "SignatureHeader",
                reason: e.to_string(),
            })?;

        Ok(vec![SignedData {
            data: self.payload.clone(),
            identity: signature_header.creator,
            signature: self.signature.clone(),
        }])
    }
}

impl Signable for ConfigUpdateEnvelope {
    fn as_signed_data(&self) -> Result<Vec<SignedData>, SignedDataError> {
        self.signatures
            .iter()
            .map(|config_signature| {
                let signature_header =
                    SignatureHeader::decode(config_signature.signature_header.as_slice())
                        .map_err(|e| SignedDataError::Unmarshal {
                            kind: "SignatureHeader",
                            reason: e.to_string(),
                        })?;

                Ok(SignedData {
                    data: [
                        config_signature.signature_header.as_slice(),
                        self.config_update.as_slice(),
                    ]
                    .concat(),
                    identity: signature_header.creator,
                    signature: config_signature.signature.clone(),
                })
            })
            .collect()
    }
}
