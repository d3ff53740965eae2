//! Storage module
//!
//! Object-store access for inputs and outputs.
//!
//! # Overview
//!
//! - `StorageLocation` - a bucket/container/directory root parsed from a URL
//! - `GlobPattern` - wildcard matching over object keys for input discovery

mod glob;
mod location;

pub use glob::GlobPattern;
pub use location::StorageLocation;

#[cfg(test)]
mod tests;
