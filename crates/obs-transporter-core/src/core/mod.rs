//! OBS Scene Transporter Core Engine
//!
//! Asset resolution, path rewriting and device id translation for scene collections,
//! plus the archive export/import operations built on top of them.

pub mod assets;
pub mod collection;
pub mod device_ids;
pub mod fs;
pub mod paths;
pub mod registry;
pub mod settings;
pub mod tree;

mod error;
pub use error::*;

#[cfg(test)]
mod tests_roundtrip;
