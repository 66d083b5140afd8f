//! calibre-backup: export a calibre library with `calibre-debug` and record a
//! SHA-1 manifest of the result.
//!
//! The library exposes each step of a run so they can be driven and tested
//! on their own; the `calibre-backup` binary wires them together.

pub mod commands;
pub mod config;
pub mod constants;
pub mod countdown;
pub mod error;
pub mod export;
pub mod locator;
pub mod logging;
pub mod manifest;
pub mod path_util;
pub mod preflight;
pub mod sysexits;

pub use error::{BackupError, Result};
