//! Config Tree Bundle Builder
//!
//! Implements the `ChannelBundleBuilder` port by walking the channel config
//! tree directly: the channel's `OrdererAddresses` value, the `Orderer`
//! group, and each orderer organization's `MSP` value.

use crate::domain::entities::{ChannelBundle, OrdererOrganization};
use crate::ports::outbound::{BundleError, ChannelBundleBuilder};
use prost::Message;
use shared_types::{
    Config, ConfigGroup, FabricMspConfig, MspConfig, MspType, OrdererAddresses, MSP_KEY,
    ORDERER_ADDRESSES_KEY, ORDERER_GROUP_KEY,
};
use tracing::debug;

/// Builds bundles from the config tree without evaluating its policies.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConfigTreeBundleBuilder;

impl ConfigTreeBundleBuilder {
    pub fn new() -> Self {
        Self
    }

    fn orderer_addresses(channel: &ConfigGroup) -> Result<Vec<String>, BundleError> {
        let Some(value) = channel.values.get(ORDERER_ADDRESSES_KEY) else {
            return Ok(Vec::new());
        };
        OrdererAddresses::decode(value.value.as_slice())
            .map(|addresses| addresses.addresses)
            .map_err(|e| BundleError::InvalidValue {
                key: ORDERER_ADDRESSES_KEY,
                path: "Channel".to_string(),
                reason: e.to_string(),
            })
    }

    fn organization(name: &str, group: &ConfigGroup) -> Result<OrdererOrganization, BundleError> {
        let path = format!("Channel/{ORDERER_GROUP_KEY}/{name}");
        let invalid = |reason: String| BundleError::InvalidValue {
            key: MSP_KEY,
            path: path.clone(),
            reason,
        };

        let value = group
            .values
            .get(MSP_KEY)
            .ok_or_else(|| invalid("value is missing".to_string()))?;
        let msp = MspConfig::decode(value.value.as_slice()).map_err(|e| invalid(e.to_string()))?;
        if msp.r#type != MspType::Fabric as i32 {
            return Err(BundleError::UnsupportedMsp {
                organization: name.to_string(),
                msp_type: msp.r#type,
            });
        }
        let fabric =
            FabricMspConfig::decode(msp.config.as_slice()).map_err(|e| invalid(e.to_string()))?;

        Ok(OrdererOrganization {
            name: name.to_string(),
            msp_id: fabric.name,
            tls_root_certs: fabric.tls_root_certs,
            tls_intermediate_certs: fabric.tls_intermediate_certs,
        })
    }
}

impl ChannelBundleBuilder for ConfigTreeBundleBuilder {
    fn build(&self, channel_id: &str, config: &Config) -> Result<ChannelBundle, BundleError> {
        let channel = config
            .channel_group
            .as_ref()
            .ok_or(BundleError::MissingChannelGroup)?;
        let orderer = channel
            .groups
            .get(ORDERER_GROUP_KEY)
            .ok_or(BundleError::MissingGroup(ORDERER_GROUP_KEY))?;

        let orderer_organizations = orderer
            .groups
            .iter()
            .map(|(name, group)| Self::organization(name, group))
            .collect::<Result<Vec<_>, _>>()?;

        let bundle = ChannelBundle {
            channel_id: channel_id.to_string(),
            sequence: config.sequence,
            orderer_addresses: Self::orderer_addresses(channel)?,
            orderer_organizations,
        };

        debug!(
            "[cluster] Built bundle for channel {} at sequence {} ({} orderer orgs)",
            bundle.channel_id,
            bundle.sequence,
            bundle.orderer_organizations.len()
        );
        Ok(bundle)
    }
}
