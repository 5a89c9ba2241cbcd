//! Module version listing and source locations

pub mod types;
pub mod versions;

pub use types::{ModuleLocation, ModuleVersion, ModuleVersionListing};
pub use versions::{download_location, get_versions};
