//! # Channel Configuration
//!
//! A configuration block carries a single envelope of type
//! [`HeaderType::Config`](crate::HeaderType::Config) whose payload data is a
//! [`ConfigEnvelope`]. The configuration itself is a tree of [`ConfigGroup`]s:
//!
//! ```text
//! Channel group
//!   +-- values["OrdererAddresses"]        -> OrdererAddresses
//!   +-- groups["Orderer"]
//!         +-- groups[<org>]
//!               +-- values["MSP"]         -> MspConfig { FabricMspConfig }
//! ```
//!
//! Maps are ordered by key, so walking organizations is deterministic.

use prost::Message;
use std::collections::BTreeMap;

/// Channel group key of the ordering service.
pub const ORDERER_GROUP_KEY: &str = "Orderer";

/// Channel value key listing the ordering service endpoints.
pub const ORDERER_ADDRESSES_KEY: &str = "OrdererAddresses";

/// Organization value key holding the membership service provider config.
pub const MSP_KEY: &str = "MSP";

/// The configuration committed by a config block, plus the update that produced it.
#[derive(Clone, PartialEq, Message)]
pub struct ConfigEnvelope {
    #[prost(message, optional, tag = "1")]
    pub config: Option<Config>,
    #[prost(message, optional, tag = "2")]
    pub last_update: Option<crate::Envelope>,
}

/// A full channel configuration at a given sequence.
#[derive(Clone, PartialEq, Message)]
pub struct Config {
    #[prost(uint64, tag = "1")]
    pub sequence: u64,
    #[prost(message, optional, tag = "2")]
    pub channel_group: Option<ConfigGroup>,
}

/// A node of the configuration tree.
#[derive(Clone, PartialEq, Message)]
pub struct ConfigGroup {
    #[prost(uint64, tag = "1")]
    pub version: u64,
    #[prost(btree_map = "string, message", tag = "2")]
    pub groups: BTreeMap<String, ConfigGroup>,
    #[prost(btree_map = "string, message", tag = "3")]
    pub values: BTreeMap<String, ConfigValue>,
    #[prost(string, tag = "5")]
    pub mod_policy: String,
}

/// A marshaled leaf value of the configuration tree.
#[derive(Clone, PartialEq, Message)]
pub struct ConfigValue {
    #[prost(uint64, tag = "1")]
    pub version: u64,
    #[prost(bytes = "vec", tag = "2")]
    pub value: Vec<u8>,
    #[prost(string, tag = "3")]
    pub mod_policy: String,
}

/// A proposed configuration update with the signatures endorsing it.
#[derive(Clone, PartialEq, Message)]
pub struct ConfigUpdateEnvelope {
    #[prost(bytes = "vec", tag = "1")]
    pub config_update: Vec<u8>,
    #[prost(message, repeated, tag = "2")]
    pub signatures: Vec<ConfigSignature>,
}

/// One endorsement of a configuration update.
#[derive(Clone, PartialEq, Message)]
pub struct ConfigSignature {
    #[prost(bytes = "vec", tag = "1")]
    pub signature_header: Vec<u8>,
    #[prost(bytes = "vec", tag = "2")]
    pub signature: Vec<u8>,
}

/// Endpoints of the ordering service, as `host:port` strings.
#[derive(Clone, PartialEq, Message)]
pub struct OrdererAddresses {
    #[prost(string, repeated, tag = "1")]
    pub addresses: Vec<String>,
}

/// Typed wrapper around an MSP configuration.
#[derive(Clone, PartialEq, Message)]
pub struct MspConfig {
    #[prost(int32, tag = "1")]
    pub r#type: i32,
    #[prost(bytes = "vec", tag = "2")]
    pub config: Vec<u8>,
}

/// MSP implementations a configuration can name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, prost::Enumeration)]
#[repr(i32)]
pub enum MspType {
    Fabric = 0,
    Idemix = 1,
}

/// X.509-based MSP: the trust material of one organization. Certificates are PEM.
#[derive(Clone, PartialEq, Message)]
pub struct FabricMspConfig {
    #[prost(string, tag = "1")]
    pub name: String,
    #[prost(bytes = "vec", repeated, tag = "2")]
    pub root_certs: Vec<Vec<u8>>,
    #[prost(bytes = "vec", repeated, tag = "3")]
    pub intermediate_certs: Vec<Vec<u8>>,
    #[prost(bytes = "vec", repeated, tag = "4")]
    pub admins: Vec<Vec<u8>>,
    #[prost(bytes = "vec", repeated, tag = "9")]
    pub tls_root_certs: Vec<Vec<u8>>,
    #[prost(bytes = "vec", repeated, tag = "10")]
    pub tls_intermediate_certs: Vec<Vec<u8>>,
}

impl ConfigValue {
    /// Wraps a message as a version-0 config value.
    pub fn from_message<M: Message>(message: &M) -> Self {
        Self {
            version: 0,
            value: message.encode_to_vec(),
            mod_policy: String::new(),
        }
    }
}

impl MspConfig {
    /// Wraps a Fabric MSP configuration.
    pub fn fabric(config: &FabricMspConfig) -> Self {
        Self {
            r#type: MspType::Fabric as i32,
            config: config.encode_to_vec(),
        }
    }
}
