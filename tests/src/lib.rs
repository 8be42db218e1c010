//! # Ordering-Cluster Test Suite
//!
//! Workspace-level tests that run the cluster communication core against
//! real sockets and real certificates.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! ├── fixtures.rs       # Throwaway PKI, TLS echo server, client configs
//! │
//! └── integration/
//!     ├── tls_dial.rs         # Mutual TLS, pinning, root validation
//!     └── config_rotation.rs  # Config blocks driving trust and membership
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p cluster-tests
//!
//! # By category
//! cargo test -p cluster-tests integration::tls_dial::
//! cargo test -p cluster-tests integration::config_rotation::
//!
//! # With dialer logs
//! RUST_LOG=cluster_comm=debug cargo test -p cluster-tests -- --nocapture
//! ```

pub mod fixtures;
