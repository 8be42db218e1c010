//! # Ports Layer
//!
//! Trait definitions for the hexagonal architecture.
//! - **Inbound (Driving)**: API the replication driver calls
//! - **Outbound (Driven)**: Collaborators this crate depends on

pub mod inbound;
pub mod outbound;
