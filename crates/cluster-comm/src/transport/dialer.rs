//! # Pinning Dialer
//!
//! Dials cluster members over mutual TLS with the client configuration held
//! in an atomically swappable cell. A dial loads one snapshot of the cell, so
//! a concurrent configuration refresh is seen whole or not at all.
//!
//! Root certificates are parsed before any connection attempt; a root that
//! does not parse fails the dial without touching the network. A caller may
//! layer its own check (certificate pinning) on top of root-CA validation
//! through a [`RemoteVerifier`].

use super::config::{ClientConfig, SecureOptions};
use super::connection::ClusterConnection;
use crate::adapters::TcpConnector;
use crate::ports::outbound::StreamConnector;
use arc_swap::ArcSwapOption;
use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::client::WebPkiServerVerifier;
use rustls::crypto::{ring, CryptoProvider};
use rustls::pki_types::{CertificateDer, PrivateKeyDer, ServerName, UnixTime};
use rustls::{DigitallySignedStruct, RootCertStore, SignatureScheme};
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio_rustls::TlsConnector;
use tracing::{debug, info, warn};

/// Errors from configuring the dialer or dialing a member.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DialError {
    #[error("client config not initialized")]
    NotInitialized,

    #[error("SecOpts is nil")]
    MissingSecOpts,

    /// A configured server root CA did not parse.
    #[error("error adding root certificate: {0}")]
    RootCertificate(String),

    #[error("invalid address {address}: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("invalid client identity: {0}")]
    ClientIdentity(String),

    #[error("failed building TLS configuration: {0}")]
    TlsConfig(String),

    #[error("failed connecting to {address}: {reason}")]
    Connect { address: String, reason: String },

    #[error("TLS handshake with {address} failed: {reason}")]
    Handshake { address: String, reason: String },

    #[error("dial to {address} timed out after {timeout:?}")]
    Timeout { address: String, timeout: Duration },
}

/// Rejection of a server certificate chain by a [`RemoteVerifier`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{reason}")]
pub struct CertificateRejected {
    pub reason: String,
}

impl CertificateRejected {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Extra verification run on the server's certificates during the handshake.
///
/// Called only after the chain validated against the configured roots, with
/// the presented certificates in order, leaf first.
pub trait RemoteVerifier: Send + Sync {
    fn verify(&self, raw_certs: &[CertificateDer<'_>]) -> Result<(), CertificateRejected>;
}

impl<F> RemoteVerifier for F
where
    F: Fn(&[CertificateDer<'_>]) -> Result<(), CertificateRejected> + Send + Sync,
{
    fn verify(&self, raw_certs: &[CertificateDer<'_>]) -> Result<(), CertificateRejected> {
        self(raw_certs)
    }
}

/// Accepts a server only if its leaf certificate is one of a pinned set.
#[derive(Debug, Clone, Default)]
pub struct CertificatePin {
    pinned: HashSet<Vec<u8>>,
}

impl CertificatePin {
    /// Pins the given DER certificates.
    pub fn new<I, D>(certificates: I) -> Self
    where
        I: IntoIterator<Item = D>,
        D: Into<Vec<u8>>,
    {
        Self {
            pinned: certificates.into_iter().map(Into::into).collect(),
        }
    }
}

impl RemoteVerifier for CertificatePin {
    fn verify(&self, raw_certs: &[CertificateDer<'_>]) -> Result<(), CertificateRejected> {
        let leaf = raw_certs
            .first()
            .ok_or_else(|| CertificateRejected::new("no certificate presented"))?;
        if self.pinned.contains(leaf.as_ref()) {
            return Ok(());
        }
        Err(CertificateRejected::new(format!(
            "certificate {} is not pinned",
            hex::encode(Sha256::digest(leaf.as_ref()))
        )))
    }
}

/// Root-CA validation followed by a caller-supplied check.
struct PinningVerifier {
    inner: Arc<WebPkiServerVerifier>,
    remote: Arc<dyn RemoteVerifier>,
}

impl fmt::Debug for PinningVerifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PinningVerifier").finish_non_exhaustive()
    }
}

impl ServerCertVerifier for PinningVerifier {
    fn verify_server_cert(
        &self,
        end_entity: &CertificateDer<'_>,
        intermediates: &[CertificateDer<'_>],
        server_name: &ServerName<'_>,
        ocsp_response: &[u8],
        now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        let verified = self.inner.verify_server_cert(
            end_entity,
            intermediates,
            server_name,
            ocsp_response,
            now,
        )?;

        let mut raw_certs = Vec::with_capacity(1 + intermediates.len());
        raw_certs.push(end_entity.clone());
        raw_certs.extend(intermediates.iter().cloned());
        self.remote
            .verify(&raw_certs)
            .map_err(|e| rustls::Error::General(e.to_string()))?;

        Ok(verified)
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        self.inner.verify_tls12_signature(message, cert, dss)
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        self.inner.verify_tls13_signature(message, cert, dss)
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.inner.supported_verify_schemes()
    }
}

fn parse_certificates(pem: &[u8]) -> Result<Vec<CertificateDer<'static>>, String> {
    let certificates = rustls_pemfile::certs(&mut &pem[..])
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| e.to_string())?;
    if certificates.is_empty() {
        return Err("no certificate found in PEM block".to_string());
    }
    Ok(certificates)
}

fn root_store(server_root_cas: &[Vec<u8>]) -> Result<RootCertStore, DialError> {
    let mut roots = RootCertStore::empty();
    for pem in server_root_cas {
        for certificate in parse_certificates(pem).map_err(DialError::RootCertificate)? {
            roots
                .add(certificate)
                .map_err(|e| DialError::RootCertificate(e.to_string()))?;
        }
    }
    Ok(roots)
}

fn client_identity(
    sec_opts: &SecureOptions,
) -> Result<(Vec<CertificateDer<'static>>, PrivateKeyDer<'static>), DialError> {
    let chain = parse_certificates(&sec_opts.certificate).map_err(DialError::ClientIdentity)?;
    let key = rustls_pemfile::private_key(&mut sec_opts.key.as_slice())
        .map_err(|e| DialError::ClientIdentity(e.to_string()))?
        .ok_or_else(|| DialError::ClientIdentity("no private key found in PEM block".to_string()))?;
    Ok((chain, key))
}

fn server_name(address: &str, sec_opts: &SecureOptions) -> Result<ServerName<'static>, DialError> {
    let invalid = |reason: String| DialError::InvalidAddress {
        address: address.to_string(),
        reason,
    };

    let host = match sec_opts.server_name_override.as_deref() {
        Some(name) => name,
        None => {
            let (host, port) = address
                .rsplit_once(':')
                .ok_or_else(|| invalid("missing port".to_string()))?;
            port.parse::<u16>().map_err(|e| invalid(e.to_string()))?;
            host.trim_start_matches('[').trim_end_matches(']')
        }
    };

    ServerName::try_from(host)
        .map(|name| name.to_owned())
        .map_err(|e| invalid(e.to_string()))
}

/// Dialer holding a swappable client configuration.
///
/// Starts empty; dialing before a configuration is stored fails with
/// [`DialError::NotInitialized`].
pub struct PredicateDialer<C = TcpConnector> {
    config: ArcSwapOption<ClientConfig>,
    connector: C,
    provider: Arc<CryptoProvider>,
}

impl PredicateDialer<TcpConnector> {
    /// A dialer with no configuration yet.
    pub fn new() -> Self {
        Self::with_connector(TcpConnector)
    }

    /// A dialer initialized with `config`.
    pub fn new_tls_pinning_dialer(config: ClientConfig) -> Self {
        let dialer = Self::new();
        dialer.set_config(config);
        dialer
    }
}

impl Default for PredicateDialer<TcpConnector> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> PredicateDialer<C> {
    /// A dialer with no configuration that opens streams through `connector`.
    pub fn with_connector(connector: C) -> Self {
        Self {
            config: ArcSwapOption::empty(),
            connector,
            provider: Arc::new(ring::default_provider()),
        }
    }

    pub fn connector(&self) -> &C {
        &self.connector
    }

    /// Replaces the whole configuration.
    pub fn set_config(&self, config: ClientConfig) {
        info!(
            "[cluster] Dialer config replaced (tls: {}, {} server roots)",
            config.sec_opts.as_ref().is_some_and(|s| s.use_tls),
            config
                .sec_opts
                .as_ref()
                .map_or(0, |s| s.server_root_cas.len())
        );
        self.config.store(Some(Arc::new(config)));
    }

    /// Snapshot of the current configuration.
    pub fn client_config(&self) -> Result<ClientConfig, DialError> {
        let config = self.config.load_full().ok_or(DialError::NotInitialized)?;
        if config.sec_opts.is_none() {
            return Err(DialError::MissingSecOpts);
        }
        Ok(ClientConfig::clone(&config))
    }

    /// Replaces the server root CAs, keeping the rest of the configuration.
    pub fn update_server_root_cas(&self, server_root_cas: Vec<Vec<u8>>) -> Result<(), DialError> {
        let mut config = self.client_config()?;
        if let Some(sec_opts) = config.sec_opts.as_mut() {
            sec_opts.server_root_cas = server_root_cas;
        }
        self.set_config(config);
        Ok(())
    }

    fn tls_connector(
        &self,
        sec_opts: &SecureOptions,
        verifier: Option<Arc<dyn RemoteVerifier>>,
    ) -> Result<TlsConnector, DialError> {
        let roots = root_store(&sec_opts.server_root_cas)?;

        let builder = rustls::ClientConfig::builder_with_provider(self.provider.clone())
            .with_safe_default_protocol_versions()
            .map_err(|e| DialError::TlsConfig(e.to_string()))?;
        let webpki =
            WebPkiServerVerifier::builder_with_provider(Arc::new(roots), self.provider.clone())
                .build()
                .map_err(|e| DialError::TlsConfig(e.to_string()))?;
        let server_verifier: Arc<dyn ServerCertVerifier> = match verifier {
            Some(remote) => Arc::new(PinningVerifier {
                inner: webpki,
                remote,
            }),
            None => webpki as Arc<dyn ServerCertVerifier>,
        };
        let builder = builder
            .dangerous()
            .with_custom_certificate_verifier(server_verifier);

        let tls_config = if sec_opts.require_client_cert {
            let (chain, key) = client_identity(sec_opts)?;
            builder
                .with_client_auth_cert(chain, key)
                .map_err(|e| DialError::ClientIdentity(e.to_string()))?
        } else {
            builder.with_no_client_auth()
        };

        Ok(TlsConnector::from(Arc::new(tls_config)))
    }
}

impl<C: StreamConnector> PredicateDialer<C> {
    /// Connects to `address`, running `verifier` on the server's certificates
    /// after they validate against the configured roots.
    pub async fn dial(
        &self,
        address: &str,
        verifier: Option<Arc<dyn RemoteVerifier>>,
    ) -> Result<ClusterConnection, DialError> {
        let config = self.config.load_full().ok_or(DialError::NotInitialized)?;
        let sec_opts = config.sec_opts.as_ref().ok_or(DialError::MissingSecOpts)?;

        let tls = if sec_opts.use_tls {
            Some((
                self.tls_connector(sec_opts, verifier)?,
                server_name(address, sec_opts)?,
            ))
        } else {
            None
        };

        let connect = async {
            let stream = self
                .connector
                .connect(address)
                .await
                .map_err(|e| DialError::Connect {
                    address: address.to_string(),
                    reason: e.to_string(),
                })?;
            match tls {
                None => Ok(ClusterConnection::Plain(stream)),
                Some((connector, server_name)) => connector
                    .connect(server_name, stream)
                    .await
                    .map(|stream| ClusterConnection::Tls(Box::new(stream)))
                    .map_err(|e| DialError::Handshake {
                        address: address.to_string(),
                        reason: e.to_string(),
                    }),
            }
        };

        let result = tokio::time::timeout(config.timeout, connect)
            .await
            .unwrap_or_else(|_| {
                Err(DialError::Timeout {
                    address: address.to_string(),
                    timeout: config.timeout,
                })
            });

        match &result {
            Ok(connection) => info!(
                "[cluster] Connected to {} (tls: {})",
                address,
                connection.is_tls()
            ),
            Err(e) => warn!("[cluster] Dial to {} failed: {}", address, e),
        }
        result
    }
}

/// Dials with the root-CA check only, no extra verification.
pub struct StandardDialer<C = TcpConnector> {
    dialer: Arc<PredicateDialer<C>>,
}

impl<C> StandardDialer<C> {
    pub fn new(dialer: Arc<PredicateDialer<C>>) -> Self {
        Self { dialer }
    }

    pub fn dialer(&self) -> &Arc<PredicateDialer<C>> {
        &self.dialer
    }
}

impl<C> Clone for StandardDialer<C> {
    fn clone(&self) -> Self {
        Self {
            dialer: Arc::clone(&self.dialer),
        }
    }
}

impl<C: StreamConnector> StandardDialer<C> {
    pub async fn dial(&self, address: &str) -> Result<ClusterConnection, DialError> {
        debug!("[cluster] Standard dial to {}", address);
        self.dialer.dial(address, None).await
    }
}
