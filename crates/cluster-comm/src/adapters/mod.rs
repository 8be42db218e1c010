//! # Adapters Layer (Hexagonal Architecture)
//!
//! Default implementations of the outbound ports.

mod bundle;
mod connector;

pub use bundle::ConfigTreeBundleBuilder;
pub use connector::TcpConnector;
