//! # Test Fixtures
//!
//! A throwaway certificate authority, a TLS echo server standing in for a
//! remote cluster member, and dialer configurations trusting them.

use cluster_comm::{ClientConfig, SecureOptions};
use rcgen::{
    BasicConstraints, Certificate, CertificateParams, DnType, ExtendedKeyUsagePurpose, IsCa,
    KeyPair, KeyUsagePurpose,
};
use rustls::crypto::ring;
use rustls::pki_types::{CertificateDer, PrivateKeyDer, PrivatePkcs8KeyDer};
use rustls::server::WebPkiClientVerifier;
use rustls::{RootCertStore, ServerConfig};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio_rustls::TlsAcceptor;

/// Name every server certificate is issued for. Dials go to `127.0.0.1` and
/// override the expected server name with this one.
pub const SERVER_NAME: &str = "orderer.example.com";

/// Install a log subscriber honoring `RUST_LOG`. Safe to call from every test.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A certificate and the key it certifies.
pub struct Identity {
    pub cert: Certificate,
    pub key: KeyPair,
}

impl Identity {
    pub fn cert_pem(&self) -> Vec<u8> {
        self.cert.pem().into_bytes()
    }

    pub fn key_pem(&self) -> Vec<u8> {
        self.key.serialize_pem().into_bytes()
    }

    pub fn cert_der(&self) -> CertificateDer<'static> {
        self.cert.der().clone()
    }

    pub fn key_der(&self) -> PrivateKeyDer<'static> {
        PrivatePkcs8KeyDer::from(self.key.serialize_der()).into()
    }
}

/// Self-signed root issuing server and client certificates.
pub struct TestCa {
    root: Identity,
}

impl TestCa {
    pub fn new(common_name: &str) -> Self {
        let key = KeyPair::generate().expect("generate CA key");
        let mut params = CertificateParams::new(Vec::<String>::new()).expect("CA params");
        params.distinguished_name.push(DnType::CommonName, common_name);
        params.is_ca = IsCa::Ca(BasicConstraints::Unconstrained);
        params.key_usages = vec![
            KeyUsagePurpose::KeyCertSign,
            KeyUsagePurpose::CrlSign,
            KeyUsagePurpose::DigitalSignature,
        ];
        let cert = params.self_signed(&key).expect("self-sign CA");
        Self {
            root: Identity { cert, key },
        }
    }

    pub fn cert_pem(&self) -> Vec<u8> {
        self.root.cert_pem()
    }

    pub fn cert_der(&self) -> CertificateDer<'static> {
        self.root.cert_der()
    }

    /// A server certificate for [`SERVER_NAME`].
    pub fn server(&self) -> Identity {
        self.issue(SERVER_NAME, ExtendedKeyUsagePurpose::ServerAuth)
    }

    /// A client certificate for the member `name`.
    pub fn client(&self, name: &str) -> Identity {
        self.issue(name, ExtendedKeyUsagePurpose::ClientAuth)
    }

    fn issue(&self, name: &str, usage: ExtendedKeyUsagePurpose) -> Identity {
        let key = KeyPair::generate().expect("generate leaf key");
        let mut params = CertificateParams::new(vec![name.to_string()]).expect("leaf params");
        params.distinguished_name.push(DnType::CommonName, name);
        params.key_usages = vec![KeyUsagePurpose::DigitalSignature];
        params.extended_key_usages = vec![usage];
        let cert = params
            .signed_by(&key, &self.root.cert, &self.root.key)
            .expect("sign leaf");
        Identity { cert, key }
    }
}

/// Server side TLS configuration presenting `identity`. With `client_ca`,
/// clients must present a certificate issued by it.
pub fn server_config(identity: &Identity, client_ca: Option<&TestCa>) -> ServerConfig {
    let provider = Arc::new(ring::default_provider());
    let builder = ServerConfig::builder_with_provider(Arc::clone(&provider))
        .with_safe_default_protocol_versions()
        .expect("protocol versions");

    let builder = match client_ca {
        Some(ca) => {
            let mut roots = RootCertStore::empty();
            roots.add(ca.cert_der()).expect("client CA");
            let verifier = WebPkiClientVerifier::builder_with_provider(Arc::new(roots), provider)
                .build()
                .expect("client verifier");
            builder.with_client_cert_verifier(verifier)
        }
        None => builder.with_no_client_auth(),
    };

    builder
        .with_single_cert(vec![identity.cert_der()], identity.key_der())
        .expect("server certificate")
}

/// Serve TLS on an ephemeral local port, echoing every byte back.
/// Returns the `host:port` to dial.
pub async fn spawn_echo_server(config: ServerConfig) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let address = listener.local_addr().expect("local address").to_string();
    let acceptor = TlsAcceptor::from(Arc::new(config));

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let acceptor = acceptor.clone();
            tokio::spawn(async move {
                let Ok(mut tls) = acceptor.accept(stream).await else {
                    return;
                };
                let mut buf = [0u8; 1024];
                loop {
                    match tls.read(&mut buf).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => {
                            if tls.write_all(&buf[..n]).await.is_err() || tls.flush().await.is_err()
                            {
                                break;
                            }
                        }
                    }
                }
            });
        }
    });

    address
}

/// Write `message` and read back as many bytes.
pub async fn round_trip<S>(stream: &mut S, message: &[u8]) -> io::Result<Vec<u8>>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    stream.write_all(message).await?;
    stream.flush().await?;
    let mut reply = vec![0u8; message.len()];
    stream.read_exact(&mut reply).await?;
    Ok(reply)
}

/// Dialer configuration trusting `server_root_cas` and, when given,
/// authenticating with `identity`.
pub fn tls_client_config(server_root_cas: Vec<Vec<u8>>, identity: Option<&Identity>) -> ClientConfig {
    let mut sec_opts = SecureOptions {
        use_tls: true,
        server_root_cas,
        server_name_override: Some(SERVER_NAME.to_string()),
        ..Default::default()
    };
    if let Some(identity) = identity {
        sec_opts.require_client_cert = true;
        sec_opts.certificate = identity.cert_pem();
        sec_opts.key = identity.key_pem();
    }

    ClientConfig {
        timeout: Duration::from_secs(5),
        ka_opts: None,
        sec_opts: Some(sec_opts),
    }
}
