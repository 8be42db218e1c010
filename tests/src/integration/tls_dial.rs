//! # TLS Dial Tests
//!
//! The pinning dialer against a live TLS echo server:
//!
//! 1. **Mutual TLS**: client identity presented and accepted
//! 2. **Pinning**: caller verification layered on root validation
//! 3. **Root validation**: servers outside the configured roots are refused
//! 4. **Stub sharing**: concurrent activations share one connection

#[cfg(test)]
mod tests {
    use crate::fixtures::{
        init_tracing, round_trip, server_config, spawn_echo_server, tls_client_config, TestCa,
    };
    use cluster_comm::{
        der_to_pem, CertificatePin, CertificateRejected, DialError, PredicateDialer,
        RemoteContext, RemoteVerifier, StandardDialer, Stub,
    };
    use parking_lot::Mutex;
    use rustls::pki_types::CertificateDer;
    use std::sync::Arc;

    /// Records the leaf of every chain it is shown and accepts it.
    #[derive(Default)]
    struct RecordingRemote {
        leaves: Mutex<Vec<Vec<u8>>>,
    }

    impl RemoteVerifier for RecordingRemote {
        fn verify(&self, raw_certs: &[CertificateDer<'_>]) -> Result<(), CertificateRejected> {
            if let Some(leaf) = raw_certs.first() {
                self.leaves.lock().push(leaf.to_vec());
            }
            Ok(())
        }
    }

    // =========================================================================
    // MUTUAL TLS
    // =========================================================================

    #[tokio::test]
    async fn test_mutual_tls_round_trip() {
        init_tracing();
        let ca = TestCa::new("tlsca.example.com");
        let server = ca.server();
        let client = ca.client("orderer2.example.com");
        let address = spawn_echo_server(server_config(&server, Some(&ca))).await;

        let dialer = PredicateDialer::new_tls_pinning_dialer(tls_client_config(
            vec![ca.cert_pem()],
            Some(&client),
        ));
        let mut connection = dialer.dial(&address, None).await.unwrap();

        assert!(connection.is_tls());
        assert_eq!(
            connection.peer_certificates().unwrap()[0],
            server.cert_der()
        );
        assert_eq!(round_trip(&mut connection, b"ping").await.unwrap(), b"ping");
    }

    #[tokio::test]
    async fn test_server_refuses_client_without_identity() {
        init_tracing();
        let ca = TestCa::new("tlsca.example.com");
        let address = spawn_echo_server(server_config(&ca.server(), Some(&ca))).await;

        let dialer =
            PredicateDialer::new_tls_pinning_dialer(tls_client_config(vec![ca.cert_pem()], None));

        // Under TLS 1.3 the client may finish its side of the handshake
        // before the server rejects it; the refusal then shows on first read.
        match dialer.dial(&address, None).await {
            Ok(mut connection) => assert!(round_trip(&mut connection, b"ping").await.is_err()),
            Err(err) => assert!(matches!(err, DialError::Handshake { .. }), "{err}"),
        }
    }

    #[tokio::test]
    async fn test_standard_dialer_connects() {
        init_tracing();
        let ca = TestCa::new("tlsca.example.com");
        let address = spawn_echo_server(server_config(&ca.server(), None)).await;

        let dialer = StandardDialer::new(Arc::new(PredicateDialer::new_tls_pinning_dialer(
            tls_client_config(vec![ca.cert_pem()], None),
        )));
        let mut connection = dialer.dial(&address).await.unwrap();

        assert_eq!(round_trip(&mut connection, b"block").await.unwrap(), b"block");
    }

    #[tokio::test]
    async fn test_root_reencoded_from_der_is_trusted() {
        init_tracing();
        let ca = TestCa::new("tlsca.example.com");
        let address = spawn_echo_server(server_config(&ca.server(), None)).await;

        let root = der_to_pem(&ca.cert_der()).into_bytes();
        let dialer = PredicateDialer::new_tls_pinning_dialer(tls_client_config(vec![root], None));

        assert!(dialer.dial(&address, None).await.is_ok());
    }

    // =========================================================================
    // PINNING
    // =========================================================================

    #[tokio::test]
    async fn test_pinned_server_is_accepted() {
        init_tracing();
        let ca = TestCa::new("tlsca.example.com");
        let server = ca.server();
        let address = spawn_echo_server(server_config(&server, None)).await;

        let dialer =
            PredicateDialer::new_tls_pinning_dialer(tls_client_config(vec![ca.cert_pem()], None));
        let pin: Arc<dyn RemoteVerifier> = Arc::new(CertificatePin::new([server.cert_der().to_vec()]));
        let mut connection = dialer.dial(&address, Some(pin)).await.unwrap();

        assert_eq!(round_trip(&mut connection, b"ping").await.unwrap(), b"ping");
    }

    #[tokio::test]
    async fn test_unpinned_server_is_rejected() {
        init_tracing();
        let ca = TestCa::new("tlsca.example.com");
        let address = spawn_echo_server(server_config(&ca.server(), None)).await;
        let other_server = ca.server();

        let dialer =
            PredicateDialer::new_tls_pinning_dialer(tls_client_config(vec![ca.cert_pem()], None));
        let pin: Arc<dyn RemoteVerifier> =
            Arc::new(CertificatePin::new([other_server.cert_der().to_vec()]));
        let err = dialer.dial(&address, Some(pin)).await.unwrap_err();

        match err {
            DialError::Handshake { address: dialed, reason } => {
                assert_eq!(dialed, address);
                assert!(reason.contains("is not pinned"), "{reason}");
            }
            other => panic!("expected handshake failure, got {other}"),
        }
    }

    #[tokio::test]
    async fn test_verifier_sees_presented_leaf() {
        init_tracing();
        let ca = TestCa::new("tlsca.example.com");
        let server = ca.server();
        let address = spawn_echo_server(server_config(&server, None)).await;

        let remote = Arc::new(RecordingRemote::default());
        let dialer =
            PredicateDialer::new_tls_pinning_dialer(tls_client_config(vec![ca.cert_pem()], None));
        dialer
            .dial(&address, Some(Arc::clone(&remote) as Arc<dyn RemoteVerifier>))
            .await
            .unwrap();

        assert_eq!(*remote.leaves.lock(), vec![server.cert_der().to_vec()]);
    }

    // =========================================================================
    // ROOT VALIDATION
    // =========================================================================

    #[tokio::test]
    async fn test_untrusted_server_fails_before_verifier_runs() {
        init_tracing();
        let trusted = TestCa::new("tlsca.example.com");
        let rogue = TestCa::new("rogue.example.com");
        let address = spawn_echo_server(server_config(&rogue.server(), None)).await;

        let remote = Arc::new(RecordingRemote::default());
        let dialer = PredicateDialer::new_tls_pinning_dialer(tls_client_config(
            vec![trusted.cert_pem()],
            None,
        ));
        let err = dialer
            .dial(&address, Some(Arc::clone(&remote) as Arc<dyn RemoteVerifier>))
            .await
            .unwrap_err();

        assert!(matches!(err, DialError::Handshake { .. }), "{err}");
        assert!(remote.leaves.lock().is_empty());
    }

    #[tokio::test]
    async fn test_empty_root_set_fails_without_handshake() {
        init_tracing();
        let dialer = PredicateDialer::new_tls_pinning_dialer(tls_client_config(Vec::new(), None));

        let err = dialer.dial("127.0.0.1:1", None).await.unwrap_err();

        assert!(matches!(err, DialError::TlsConfig(_)), "{err}");
    }

    // =========================================================================
    // STUB SHARING
    // =========================================================================

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_activation_shares_one_context() {
        init_tracing();
        let ca = TestCa::new("tlsca.example.com");
        let address = spawn_echo_server(server_config(&ca.server(), None)).await;

        let dialer = StandardDialer::new(Arc::new(PredicateDialer::new_tls_pinning_dialer(
            tls_client_config(vec![ca.cert_pem()], None),
        )));
        let stub = Arc::new(Stub::<RemoteContext>::new(address.clone()));

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let stub = Arc::clone(&stub);
                let dialer = dialer.clone();
                tokio::spawn(async move { stub.activate_with(&dialer).await })
            })
            .collect();

        let mut contexts = Vec::new();
        for handle in handles {
            contexts.push(handle.await.unwrap().unwrap());
        }
        assert!(contexts.iter().all(|c| Arc::ptr_eq(c, &contexts[0])));
        assert_eq!(contexts[0].endpoint(), address);

        let mut connection = contexts[0].connection().await;
        assert_eq!(round_trip(&mut *connection, b"ping").await.unwrap(), b"ping");
    }
}
