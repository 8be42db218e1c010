//! # Config Rotation Tests
//!
//! Committed config blocks driving the cluster service:
//!
//! ```text
//! [Config Block] ──refresh──→ [EndpointConfig] ──server roots──→ [Dialer]
//!                                    │
//!                                    └──endpoints──→ [Stubs] (stale ones dropped)
//! ```
//!
//! Also checks that a batch containing a config block is judged by the
//! configuration in force at each block.

#[cfg(test)]
mod tests {
    use crate::fixtures::{
        init_tracing, round_trip, server_config, spawn_echo_server, tls_client_config, Identity,
        TestCa,
    };
    use cluster_comm::test_utils::{
        assign_hashes, config_block, create_block_chain, orderer_channel_config,
        RecordingVerifier,
    };
    use cluster_comm::{
        ClusterReplicationApi, ClusterService, DialError, PredicateDialer, VerificationError,
    };
    use shared_types::{Block, FabricMspConfig};
    use std::sync::Arc;

    const CHANNEL: &str = "system-channel";

    fn orderer_config_block(number: u64, sequence: u64, addresses: &[&str], ca: &TestCa) -> Block {
        let msp = FabricMspConfig {
            name: "OrdererMSP".to_string(),
            tls_root_certs: vec![ca.cert_pem()],
            ..Default::default()
        };
        config_block(
            number,
            CHANNEL,
            orderer_channel_config(sequence, addresses, &[("OrdererOrg", msp)]),
        )
    }

    /// A service whose dialer presents `client` and trusts nothing yet.
    fn untrusting_service(client: &Identity) -> ClusterService<RecordingVerifier> {
        let dialer = PredicateDialer::new_tls_pinning_dialer(tls_client_config(
            Vec::new(),
            Some(client),
        ));
        ClusterService::new(RecordingVerifier::accepting(), Arc::new(dialer))
    }

    // =========================================================================
    // TRUST ROOTS
    // =========================================================================

    #[tokio::test]
    async fn test_config_block_installs_trust_roots() {
        init_tracing();
        let ca = TestCa::new("tlsca.example.com");
        let client = ca.client("orderer2.example.com");
        let address = spawn_echo_server(server_config(&ca.server(), Some(&ca))).await;
        let service = untrusting_service(&client);

        let err = service.remote_context(&address).await.unwrap_err();
        assert!(matches!(err, DialError::TlsConfig(_)), "{err}");

        let endpoint_config = service
            .refresh_from_config_block(&orderer_config_block(0, 1, &[address.as_str()], &ca))
            .await
            .unwrap();
        assert_eq!(endpoint_config.endpoints, vec![address.clone()]);
        assert_eq!(endpoint_config.tls_root_cas, vec![ca.cert_pem()]);

        let context = service.remote_context(&address).await.unwrap();
        let mut connection = context.connection().await;
        assert!(connection.is_tls());
        assert_eq!(round_trip(&mut *connection, b"ping").await.unwrap(), b"ping");
    }

    #[tokio::test]
    async fn test_rotated_roots_reject_previous_ca() {
        init_tracing();
        let old_ca = TestCa::new("old-tlsca.example.com");
        let new_ca = TestCa::new("new-tlsca.example.com");
        let client = old_ca.client("orderer2.example.com");
        let address = spawn_echo_server(server_config(&old_ca.server(), Some(&old_ca))).await;
        let service = untrusting_service(&client);

        service
            .refresh_from_config_block(&orderer_config_block(0, 1, &[address.as_str()], &old_ca))
            .await
            .unwrap();
        let first = service.remote_context(&address).await.unwrap();

        service
            .refresh_from_config_block(&orderer_config_block(1, 2, &[address.as_str()], &new_ca))
            .await
            .unwrap();

        // The member is still listed, so its established connection survives.
        let still = service.remote_context(&address).await.unwrap();
        assert!(Arc::ptr_eq(&first, &still));

        // A fresh dial is judged by the new roots only.
        service.stub(&address).deactivate().await;
        let err = service.remote_context(&address).await.unwrap_err();
        assert!(matches!(err, DialError::Handshake { .. }), "{err}");
    }

    // =========================================================================
    // MEMBERSHIP
    // =========================================================================

    #[tokio::test]
    async fn test_removed_member_loses_its_stub() {
        init_tracing();
        let ca = TestCa::new("tlsca.example.com");
        let client = ca.client("orderer2.example.com");
        let address = spawn_echo_server(server_config(&ca.server(), Some(&ca))).await;
        let service = untrusting_service(&client);

        service
            .refresh_from_config_block(&orderer_config_block(0, 1, &[address.as_str()], &ca))
            .await
            .unwrap();
        let context = service.remote_context(&address).await.unwrap();

        service
            .refresh_from_config_block(&orderer_config_block(1, 2, &["orderer3:7050"], &ca))
            .await
            .unwrap();

        assert!(service.stub_endpoints().is_empty());
        assert!(!service.stub(&address).is_active().await);

        // Holders of the old context keep a working connection until they drop it.
        let mut connection = context.connection().await;
        assert_eq!(round_trip(&mut *connection, b"bye").await.unwrap(), b"bye");
    }

    #[tokio::test]
    async fn test_malformed_config_block_changes_nothing() {
        init_tracing();
        let ca = TestCa::new("tlsca.example.com");
        let service = untrusting_service(&ca.client("orderer2.example.com"));
        service
            .refresh_from_config_block(&orderer_config_block(0, 1, &["orderer1:7050"], &ca))
            .await
            .unwrap();
        service.stub("orderer1:7050");

        let mut truncated = orderer_config_block(1, 2, &["orderer9:7050"], &ca);
        truncated.data = None;
        let err = service
            .refresh_from_config_block(&truncated)
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "block data is nil");
        assert_eq!(service.stub_endpoints(), vec!["orderer1:7050"]);
        let sec_opts = service.dialer().client_config().unwrap().sec_opts.unwrap();
        assert_eq!(sec_opts.server_root_cas, vec![ca.cert_pem()]);
    }

    // =========================================================================
    // BLOCK VERIFICATION
    // =========================================================================

    fn chain_with_config_block(ca: &TestCa) -> Vec<Block> {
        let mut chain = create_block_chain(1, 3);
        chain.push(orderer_config_block(4, 7, &["orderer1:7050"], ca));
        chain.extend(create_block_chain(5, 6));
        assign_hashes(&mut chain);
        chain
    }

    #[test]
    fn test_blocks_after_config_block_use_its_policy() {
        let ca = TestCa::new("tlsca.example.com");
        let service = untrusting_service(&ca.client("orderer2.example.com"));

        service
            .verify_blocks(&chain_with_config_block(&ca))
            .unwrap();

        let sequences: Vec<_> = service
            .verifier()
            .calls()
            .iter()
            .map(|call| {
                call.config
                    .as_ref()
                    .and_then(|envelope| envelope.config.as_ref())
                    .map(|config| config.sequence)
            })
            .collect();
        assert_eq!(
            sequences,
            vec![None, None, None, None, Some(7), Some(7)]
        );
    }

    #[test]
    fn test_tampered_block_rejects_batch() {
        let ca = TestCa::new("tlsca.example.com");
        let service = untrusting_service(&ca.client("orderer2.example.com"));
        let mut chain = chain_with_config_block(&ca);
        if let Some(data) = chain[2].data.as_mut() {
            data.data[1] = vec![7; 100];
        }

        let err = service.verify_blocks(&chain).unwrap_err();

        assert!(
            matches!(err, VerificationError::DataHashMismatch { number: 3, .. }),
            "{err}"
        );
    }
}
