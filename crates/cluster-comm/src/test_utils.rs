//! Block-chain builders, a recording policy evaluator and a counting stream
//! connector for tests.

use crate::adapters::TcpConnector;
use crate::domain::codec::{block_data_hash, header_hash};
use crate::ports::outbound::{BlockVerifier, PolicyError, StreamConnector};
use async_trait::async_trait;
use parking_lot::Mutex;
use prost::Message;
use shared_types::{
    Block, BlockData, BlockMetadataIndex, ChannelHeader, Config, ConfigEnvelope, ConfigGroup,
    ConfigValue, Envelope, FabricMspConfig, Header, HeaderType, Metadata, MetadataSignature,
    MspConfig, OrdererAddresses, Payload, SignatureHeader, SignedData, MSP_KEY,
    ORDERER_ADDRESSES_KEY, ORDERER_GROUP_KEY,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::net::TcpStream;

/// Creator every test block's signature claims.
pub const TEST_CREATOR: [u8; 3] = [1, 2, 3];

/// Links every block to its predecessor's header hash.
pub fn assign_hashes(blockchain: &mut [Block]) {
    for i in 1..blockchain.len() {
        let previous = blockchain[i - 1]
            .header
            .as_ref()
            .map(header_hash)
            .map(|hash| hash.to_vec())
            .unwrap_or_default();
        if let Some(header) = blockchain[i].header.as_mut() {
            header.previous_hash = previous;
        }
    }
}

/// Replaces a block's transactions and recomputes its data hash.
pub fn set_block_data(block: &mut Block, data: Vec<Vec<u8>>) {
    block.data = Some(BlockData { data });
    let hash = block_data_hash(block).to_vec();
    if let Some(header) = block.header.as_mut() {
        header.data_hash = hash;
    }
}

fn new_block(number: u64) -> Block {
    let signature_header = SignatureHeader {
        creator: TEST_CREATOR.to_vec(),
        nonce: vec![9, 5, 42, 66],
    };
    let mut block = Block::new(number, Vec::new());
    if let Some(metadata) = block.metadata.as_mut() {
        metadata.metadata[BlockMetadataIndex::Signatures.slot()] = Metadata {
            value: Vec::new(),
            signatures: vec![MetadataSignature {
                signature_header: signature_header.encode_to_vec(),
                signature: Vec::new(),
            }],
        }
        .encode_to_vec();
    }

    let txn = Envelope {
        payload: Payload {
            header: Some(Header::default()),
            data: Vec::new(),
        }
        .encode_to_vec(),
        signature: Vec::new(),
    };
    set_block_data(&mut block, vec![txn.encode_to_vec(), vec![0; 100]]);
    block
}

/// A valid chain of blocks numbered `start..=end`, each signed once by
/// [`TEST_CREATOR`] and carrying a regular transaction plus filler bytes.
pub fn create_block_chain(start: u64, end: u64) -> Vec<Block> {
    let mut blockchain: Vec<Block> = (start..=end).map(new_block).collect();
    assign_hashes(&mut blockchain);
    blockchain
}

/// A configuration transaction carrying `config_envelope`.
pub fn config_transaction(config_envelope: &ConfigEnvelope) -> Envelope {
    channel_config_transaction("", config_envelope)
}

/// A configuration transaction of `channel_id` carrying `config_envelope`.
pub fn channel_config_transaction(channel_id: &str, config_envelope: &ConfigEnvelope) -> Envelope {
    Envelope {
        payload: Payload {
            header: Some(Header {
                channel_header: ChannelHeader {
                    r#type: HeaderType::Config as i32,
                    channel_id: channel_id.to_string(),
                    ..Default::default()
                }
                .encode_to_vec(),
                signature_header: Vec::new(),
            }),
            data: config_envelope.encode_to_vec(),
        }
        .encode_to_vec(),
        signature: Vec::new(),
    }
}

/// Channel configuration declaring the ordering endpoints and, for each
/// `(name, msp)` pair, an orderer organization group holding that MSP.
pub fn orderer_channel_config(
    sequence: u64,
    addresses: &[&str],
    organizations: &[(&str, FabricMspConfig)],
) -> Config {
    let mut orderer = ConfigGroup::default();
    for (name, msp) in organizations {
        let mut org = ConfigGroup::default();
        org.values
            .insert(MSP_KEY.to_string(), ConfigValue::from_message(&MspConfig::fabric(msp)));
        orderer.groups.insert(name.to_string(), org);
    }

    let mut channel = ConfigGroup::default();
    channel.values.insert(
        ORDERER_ADDRESSES_KEY.to_string(),
        ConfigValue::from_message(&OrdererAddresses {
            addresses: addresses.iter().map(|a| a.to_string()).collect(),
        }),
    );
    channel.groups.insert(ORDERER_GROUP_KEY.to_string(), orderer);

    Config {
        sequence,
        channel_group: Some(channel),
    }
}

/// A signed config block of `channel_id` committing `config`.
pub fn config_block(number: u64, channel_id: &str, config: Config) -> Block {
    let mut block = new_block(number);
    let txn = channel_config_transaction(
        channel_id,
        &ConfigEnvelope {
            config: Some(config),
            last_update: None,
        },
    );
    set_block_data(&mut block, vec![txn.encode_to_vec()]);
    block
}

/// A call received by [`RecordingVerifier`].
#[derive(Debug, Clone, PartialEq)]
pub struct VerifierCall {
    pub signature_set: Vec<SignedData>,
    pub config: Option<ConfigEnvelope>,
}

type Decision = dyn Fn(&[SignedData], Option<&ConfigEnvelope>) -> Result<(), PolicyError> + Send + Sync;

/// Policy evaluator that records every call and answers with a closure.
pub struct RecordingVerifier {
    decide: Box<Decision>,
    calls: Mutex<Vec<VerifierCall>>,
}

impl RecordingVerifier {
    /// Accepts every signature set.
    pub fn accepting() -> Self {
        Self::with(|_, _| Ok(()))
    }

    /// Rejects every signature set with `reason`.
    pub fn rejecting(reason: &str) -> Self {
        let reason = reason.to_string();
        Self::with(move |_, _| Err(PolicyError::new(reason.clone())))
    }

    pub fn with<F>(decide: F) -> Self
    where
        F: Fn(&[SignedData], Option<&ConfigEnvelope>) -> Result<(), PolicyError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            decide: Box::new(decide),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<VerifierCall> {
        self.calls.lock().clone()
    }
}

impl BlockVerifier for RecordingVerifier {
    fn verify_block_signature(
        &self,
        signature_set: &[SignedData],
        config: Option<&ConfigEnvelope>,
    ) -> Result<(), PolicyError> {
        self.calls.lock().push(VerifierCall {
            signature_set: signature_set.to_vec(),
            config: config.cloned(),
        });
        (self.decide)(signature_set, config)
    }
}

/// Stream connector that counts connection attempts.
///
/// Connects over TCP, or never completes when built with [`CountingConnector::stalling`].
#[derive(Debug, Default)]
pub struct CountingConnector {
    attempts: AtomicUsize,
    stall: bool,
}

impl CountingConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// A connector whose connections never complete.
    pub fn stalling() -> Self {
        Self {
            attempts: AtomicUsize::new(0),
            stall: true,
        }
    }

    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StreamConnector for CountingConnector {
    async fn connect(&self, address: &str) -> std::io::Result<TcpStream> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.stall {
            return std::future::pending().await;
        }
        TcpConnector.connect(address).await
    }
}
