//! Source-host access: release listings, existence probes and asset downloads
//!
//! # Modules
//!
//! - [`types`]: Release and asset records
//! - [`source`]: `ReleaseSource` trait the rest of the crate depends on
//! - [`client`]: GitHub GraphQL/REST implementation
//! - [`harvester`]: Paginated release harvesting

pub mod client;
pub mod harvester;
pub mod source;
pub mod types;

pub use client::GitHubClient;
pub use harvester::{fetch_releases, find_release};
pub use source::ReleaseSource;
pub use types::{Release, ReleaseAsset, ReleasePage};
