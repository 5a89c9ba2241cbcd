//! Provider release resolution
//!
//! # Modules
//!
//! - [`types`]: Version records and registry response shapes
//! - [`manifest`]: Protocol manifest parsing
//! - [`shasums`]: SHA256SUMS parsing
//! - [`artifacts`]: Per-release artifact resolution
//! - [`versions`]: Concurrent aggregation and single-version lookup
//! - [`keys`]: Signing key lookup
//! - [`warnings`]: Static deprecation notices

pub mod artifacts;
pub mod keys;
pub mod manifest;
pub mod shasums;
pub mod types;
pub mod versions;
pub mod warnings;

pub use keys::{DirectoryKeyStore, KeyStore};
pub use types::{
    DownloadDetails, GpgPublicKey, ProviderVersionListing, SigningKeys, Version, VersionDetails,
    VersionRecord,
};
pub use versions::{get_version, get_versions};
pub use warnings::provider_warnings;
