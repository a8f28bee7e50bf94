//! OTP crate: sub-modules.

pub mod types;
pub mod base32;
pub mod core;
pub mod uri;

// Re-export top-level items for convenience.
pub use types::*;
