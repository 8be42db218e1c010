//! # Domain Layer
//!
//! Block validation and configuration extraction. Pure and synchronous; every
//! function here may run concurrently on independent inputs.

pub mod chain;
pub mod codec;
pub mod endpoint;
pub mod entities;
pub mod errors;
pub mod sequence;
pub mod signature;
