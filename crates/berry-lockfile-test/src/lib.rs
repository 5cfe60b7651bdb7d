#![deny(clippy::all)]
//! End-to-end tests for decoding, pruning and re-encoding berry lockfiles
//!
//! This crate holds the fixture helpers shared by the tests, benches and the
//! `berry-prune` binary, and runs every lockfile under `fixtures/` through
//! the full decode -> subgraph -> encode cycle.

use berry_lockfile::BerryLockfile;
use std::path::{Path, PathBuf};

/// The `fixtures/` directory at the root of the workspace
pub fn fixtures_dir() -> PathBuf {
  Path::new(env!("CARGO_MANIFEST_DIR"))
    .parent()
    .and_then(Path::parent)
    .expect("crate lives two levels below the workspace root")
    .join("fixtures")
}

/// Load a fixture file from the fixtures directory
pub fn load_fixture(filename: &str) -> String {
  load_fixture_from_path(&fixtures_dir().join(filename))
}

/// Load a fixture file from a path
pub fn load_fixture_from_path(fixture_path: &Path) -> String {
  std::fs::read_to_string(fixture_path).unwrap_or_else(|e| {
    panic!(
      "Failed to read fixture file {}: {}",
      fixture_path.display(),
      e
    )
  })
}

/// Load and decode a fixture, panicking with the decode error if it fails
pub fn decode_fixture(filename: &str) -> BerryLockfile {
  BerryLockfile::decode(load_fixture(filename).as_bytes())
    .unwrap_or_else(|e| panic!("Failed to decode fixture {filename}: {e}"))
}
