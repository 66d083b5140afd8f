/// Package name.
pub(crate) const PKG_NAME: &str = env!("CARGO_PKG_NAME");
/// Default configuration file name.
pub(crate) const CONFIG_NAME: &str = "config.toml";
/// File whose presence marks the root of a calibre library.
pub const LIBRARY_MARKER: &str = "metadata.db";
/// Checksum listing written at the root of every backup.
pub const MANIFEST_NAME: &str = "CalibreBackup.sha1";
/// The program that performs the actual export.
pub const EXPORT_TOOL: &str = "calibre-debug";
/// Instruction passed to the export tool.
pub(crate) const EXPORT_FLAG: &str = "--export-all-calibre-data";
/// Read size used while hashing.
pub(crate) const CHUNK_SIZE: usize = 4096;
/// Countdown length in seconds when neither `--wait` nor the config sets one.
pub const DEFAULT_WAIT: u64 = 5;
