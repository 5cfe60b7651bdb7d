//! Shared setup for the lockfile benchmarks

use berry_lockfile::BerryLockfile;
use berry_lockfile_test::{fixtures_dir, load_fixture};
use std::fs;

/// A fixture loaded once up front, so benches only measure the work itself
pub struct BenchFixture {
  pub name: String,
  pub contents: String,
  pub lockfile: BerryLockfile,
  /// The keys reachable from every workspace, i.e. a "prune nothing" subgraph
  pub workspace_closure: Vec<String>,
}

/// Every `.lock` file in the fixtures directory, sorted by name
pub fn fixture_names() -> Vec<String> {
  let fixtures_dir = fixtures_dir();
  let mut fixtures: Vec<String> = fs::read_dir(&fixtures_dir)
    .unwrap_or_else(|e| {
      panic!(
        "Failed to read fixtures dir {}: {e}",
        fixtures_dir.display()
      )
    })
    .filter_map(|entry| {
      let path = entry.ok()?.path();
      if path.extension()?.to_str()? == "lock" {
        path.file_name()?.to_str().map(ToString::to_string)
      } else {
        None
      }
    })
    .collect();

  fixtures.sort();
  fixtures
}

pub fn load_bench_fixture(name: &str) -> BenchFixture {
  let contents = load_fixture(name);
  let lockfile = BerryLockfile::decode(contents.as_bytes())
    .unwrap_or_else(|e| panic!("Should decode {name}: {e}"));

  let workspaces: Vec<String> = lockfile
    .keys()
    .filter(|key| key.contains("@workspace:"))
    .map(ToString::to_string)
    .collect();
  let workspace_closure = berry_lockfile::transitive_closure(&lockfile, workspaces)
    .into_iter()
    .collect();

  BenchFixture {
    name: name.to_string(),
    contents,
    lockfile,
    workspace_closure,
  }
}

/// Criterion ids can't contain `.`
pub fn bench_label(name: &str) -> String {
  name.replace(['.', '-'], "_")
}
