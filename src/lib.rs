pub mod cache;
pub mod config;
pub mod error;
pub mod github;
pub mod modules;
pub mod platform;
pub mod providers;
pub mod service;
pub mod versions;
