use serde::Deserialize;

/// Lockfile format version written into the `__metadata` block
pub const LOCKFILE_VERSION: u32 = 5;

/// Cache key written into the `__metadata` block, yarn refuses to reuse its
/// cache across a different key
pub const CACHE_KEY: u32 = 8;

/// The comment yarn puts at the top of every lockfile it writes
pub const HEADER_COMMENT: &str = "# This file is generated by running \"yarn install\" inside your project.\n# Manual changes might be lost - proceed with caution!\n";

/// The start of the metadata block
/// Typically at the start of the file
/// e.g.
/// __metadata:
///   version: 5
///   cacheKey: 8
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
  pub version: String,
  #[serde(default)]
  pub cache_key: String,
}

impl Metadata {
  pub fn new(version: String, cache_key: String) -> Self {
    Self { version, cache_key }
  }
}

impl Default for Metadata {
  fn default() -> Self {
    Self::new(LOCKFILE_VERSION.to_string(), CACHE_KEY.to_string())
  }
}

/// The header written in front of every encoded lockfile, ending with the
/// last line of the `__metadata` block
pub(crate) fn header() -> String {
  format!("{HEADER_COMMENT}\n__metadata:\n  version: {LOCKFILE_VERSION}\n  cacheKey: {CACHE_KEY}\n")
}
