//! # Domain Entities
//!
//! Membership and trust material derived from channel configuration.

/// Where the cluster members are and which TLS roots vouch for them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndpointConfig {
    /// Ordering service endpoints, `host:port`.
    pub endpoints: Vec<String>,
    /// PEM-encoded TLS root and intermediate certificates of every orderer
    /// organization, flattened in organization order. Duplicates are kept.
    pub tls_root_cas: Vec<Vec<u8>>,
}

/// One ordering organization and its TLS trust anchors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrdererOrganization {
    /// Key of the organization group in the config tree.
    pub name: String,
    /// Name declared by the organization's MSP.
    pub msp_id: String,
    pub tls_root_certs: Vec<Vec<u8>>,
    pub tls_intermediate_certs: Vec<Vec<u8>>,
}

/// Queryable view over a channel configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelBundle {
    pub channel_id: String,
    pub sequence: u64,
    pub orderer_addresses: Vec<String>,
    pub orderer_organizations: Vec<OrdererOrganization>,
}

impl ChannelBundle {
    /// TLS roots and intermediates of every orderer organization, in order.
    pub fn orderer_tls_certificates(&self) -> Vec<Vec<u8>> {
        self.orderer_organizations
            .iter()
            .flat_map(|org| {
                org.tls_root_certs
                    .iter()
                    .chain(org.tls_intermediate_certs.iter())
                    .cloned()
            })
            .collect()
    }
}
