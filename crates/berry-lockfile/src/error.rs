//! Error types for decoding and encoding lockfiles.

use miette::Diagnostic;
use thiserror::Error;

/// Appended to every decode failure
pub const CORRUPTION_HINT: &str = "This can happen if your lockfile contains merge conflicts or is somehow corrupted. Please report this if it occurs";

/// Errors that can occur while decoding a lockfile.
#[derive(Error, Debug, Diagnostic)]
pub enum DecodeError {
  /// An unresolved git merge conflict marker was found.
  #[error("lockfile contains a merge conflict marker on line {line}. {hint}", hint = CORRUPTION_HINT)]
  #[diagnostic(
    code(berry::decode::merge_conflict),
    help("Resolve the conflict, or re-run `yarn install` to regenerate the lockfile")
  )]
  MergeConflict {
    /// 1-based line number of the marker.
    line: usize,
  },

  /// The lockfile is not valid YAML.
  #[error("could not unmarshal lockfile: {source}. {hint}", hint = CORRUPTION_HINT)]
  #[diagnostic(
    code(berry::decode::syntax),
    help("Re-run `yarn install` to regenerate the lockfile")
  )]
  Syntax {
    #[source]
    source: serde_yaml::Error,
  },

  /// A package block does not have the expected shape.
  #[error("lockfile entry {key:?} is malformed: {source}. {hint}", hint = CORRUPTION_HINT)]
  #[diagnostic(
    code(berry::decode::entry),
    help("Every package block needs at least a `version` field")
  )]
  Entry {
    /// The raw (unsplit) key of the block.
    key: String,
    #[source]
    source: serde_yaml::Error,
  },
}

/// Errors that can occur while encoding a lockfile.
#[derive(Error, Debug, Diagnostic)]
pub enum EncodeError {
  /// The entries could not be serialized.
  #[error("failed to materialize sub-lockfile: {source}")]
  #[diagnostic(code(berry::encode::serialize))]
  Serialize {
    #[source]
    source: serde_yaml::Error,
  },

  /// Writing to the output failed. Anything already written is incomplete.
  #[error("failed to write lockfile: {source}")]
  #[diagnostic(
    code(berry::encode::io),
    help("The output is incomplete and should be discarded")
  )]
  Io {
    #[source]
    source: std::io::Error,
  },
}

impl From<std::io::Error> for EncodeError {
  fn from(source: std::io::Error) -> Self {
    Self::Io { source }
  }
}

impl From<serde_yaml::Error> for EncodeError {
  fn from(source: serde_yaml::Error) -> Self {
    Self::Serialize { source }
  }
}
