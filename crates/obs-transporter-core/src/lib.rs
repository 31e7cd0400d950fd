//! OBS Scene Transporter Core Library
//!
//! Packs an OBS Studio scene collection together with every file it references
//! into a single zip archive, and installs such an archive on another machine.
//!
//! The interesting part lives in [`core`]: locating asset references inside the
//! collection document, expanding playlist directories, rewriting paths between
//! their on-disk and in-archive forms, and translating capture device ids
//! between operating systems.

pub mod core;

pub use crate::core::collection::{
    export_collection, import_collection, list_collections, ExportReport, ImportReport,
    SceneCollection, TransportOptions,
};
pub use crate::core::{CoreError, CoreResult};
