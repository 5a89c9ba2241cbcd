#![allow(dead_code)]

pub mod registry;
pub mod source;

pub use registry::*;
pub use source::*;
