//! Keywarden Types
//!
//! Shared type definitions for trigger events, key specifications and the
//! published JWKS document used across all Keywarden crates.

pub mod events;
pub mod schemas;
pub mod error;

pub use events::*;
pub use schemas::*;
pub use error::*;
