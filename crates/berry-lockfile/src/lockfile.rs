use std::collections::BTreeMap;
use std::io::Write;
use std::path::PathBuf;

use crate::error::EncodeError;
use crate::resolve::ResolvedPackage;

/// The operations pruning needs from a lockfile, whatever package manager
/// wrote it.
///
/// Lookups that miss return `None`: a dependency missing from the lockfile
/// is something a graph walk has to handle, not a failure.
pub trait Lockfile: Send + Sync {
  /// Given a package name and the range it was requested with, returns the
  /// key it is stored under and the version it resolved to
  fn resolve_package(&self, name: &str, version: &str) -> Option<ResolvedPackage>;

  /// Given a lockfile key, returns the regular and optional dependencies of
  /// that package
  fn all_dependencies(&self, key: &str) -> Option<BTreeMap<String, String>>;

  /// Returns a lockfile containing only the given keys. Keys that are not in
  /// this lockfile are skipped.
  fn subgraph(&self, keys: &[String]) -> Box<dyn Lockfile>;

  /// Writes the lockfile in the package manager's on-disk format
  fn encode(&self, writer: &mut dyn Write) -> Result<(), EncodeError>;

  /// Patch files referenced by the lockfile
  fn patches(&self) -> Vec<PathBuf>;
}
