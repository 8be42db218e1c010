//! # Transport Layer
//!
//! Authenticated connections to cluster members: client configuration, the
//! pinning dialer, the connection type it yields, and the stub that shares
//! one connection per member.

pub mod config;
pub mod connection;
pub mod dialer;
pub mod pem;
pub mod stub;

pub use config::{ClientConfig, ConfigError, KeepaliveOptions, SecureOptions};
pub use connection::ClusterConnection;
pub use dialer::{
    CertificatePin, CertificateRejected, DialError, PredicateDialer, RemoteVerifier,
    StandardDialer,
};
pub use pem::der_to_pem;
pub use stub::{RemoteContext, Stub};
