//! Asset Location Module
//!
//! Turns asset references (filesystem paths or archive member names) into
//! [`AssetToken`]s that separate a relocatable base from a stable remainder,
//! and expands playlist directories into their member files.

mod archive;
mod formatter;
mod token;

pub use archive::*;
pub use formatter::*;
pub use token::*;
