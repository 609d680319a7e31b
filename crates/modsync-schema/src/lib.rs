//! Identity and wire types shared between the modsync engine and its frontends.
//!
//! Nothing in this crate performs I/O. The registry response shapes live in
//! [`types`]; the content identifier every local and remote package is keyed
//! by lives in [`hash`].

pub mod hash;
pub mod types;

// Re-exports
pub use hash::*;
pub use types::*;

/// File extension (without the dot) that marks an installable package.
pub const PACKAGE_EXTENSION: &str = "jar";
