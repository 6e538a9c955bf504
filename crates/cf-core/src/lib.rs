//! cf-core: shared types, IDs, errors, and configuration.
//!
//! This crate is the foundational dependency for all other cf-* crates,
//! providing the unified error taxonomy, typed identifiers, the media
//! operation model, the processing-service wire types, and application
//! configuration.

pub mod config;
pub mod error;
pub mod ids;
pub mod media;
pub mod wire;

// Re-export the most commonly used items at the crate root.
pub use error::{Error, ErrorKind, Result};
pub use ids::*;
pub use media::*;
