use std::collections::BTreeSet;
use tracing::{debug, trace};

use crate::lockfile::Lockfile;

/// Every key reachable from `roots` by following dependencies, roots
/// included.
///
/// Roots that are not in the lockfile and dependencies that don't resolve
/// are skipped; a pruned workspace may well depend on packages the lockfile
/// doesn't know about yet.
pub fn transitive_closure<L, I, S>(lockfile: &L, roots: I) -> BTreeSet<String>
where
  L: Lockfile + ?Sized,
  I: IntoIterator<Item = S>,
  S: Into<String>,
{
  let mut seen = BTreeSet::new();
  let mut stack: Vec<String> = roots.into_iter().map(Into::into).collect();

  while let Some(key) = stack.pop() {
    if seen.contains(&key) {
      continue;
    }
    let Some(dependencies) = lockfile.all_dependencies(&key) else {
      trace!(key = key.as_str(), "root not in lockfile");
      continue;
    };

    for (name, range) in dependencies {
      match lockfile.resolve_package(&name, &range) {
        Some(resolved) if !seen.contains(&resolved.key) => stack.push(resolved.key),
        Some(_) => {}
        None => trace!(
          dependency = name.as_str(),
          range = range.as_str(),
          "unresolved dependency"
        ),
      }
    }
    seen.insert(key);
  }

  debug!(keys = seen.len(), "computed transitive closure");
  seen
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{BerryLockfile, Entry};
  use pretty_assertions::assert_eq;

  fn lockfile() -> BerryLockfile {
    BerryLockfile::from_entries([
      (
        "app@workspace:apps/app",
        Entry::new("0.0.0-use.local")
          .with_dependency("a", "^1.0.0")
          .with_dependency("ghost", "^1.0.0"),
      ),
      (
        "a@npm:^1.0.0",
        Entry::new("1.0.0")
          .with_dependency("b", "^2.0.0")
          .with_optional_dependency("c", "^3.0.0"),
      ),
      ("b@npm:^2.0.0", Entry::new("2.0.0").with_dependency("a", "^1.0.0")),
      ("c@npm:^3.0.0", Entry::new("3.0.0")),
      ("unused@npm:^1.0.0", Entry::new("1.0.0")),
    ])
  }

  fn closure(roots: &[&str]) -> Vec<String> {
    transitive_closure(&lockfile(), roots.iter().copied())
      .into_iter()
      .collect()
  }

  #[test]
  fn test_closure_follows_dependencies_through_cycles() {
    assert_eq!(
      closure(&["app@workspace:apps/app"]),
      vec![
        "a@npm:^1.0.0",
        "app@workspace:apps/app",
        "b@npm:^2.0.0",
        "c@npm:^3.0.0",
      ]
    );
  }

  #[test]
  fn test_closure_of_leaf() {
    assert_eq!(closure(&["c@npm:^3.0.0"]), vec!["c@npm:^3.0.0"]);
  }

  #[test]
  fn test_closure_skips_missing_roots() {
    assert!(closure(&["missing@npm:1.0.0"]).is_empty());
    assert!(closure(&[]).is_empty());
  }

  #[test]
  fn test_closure_over_trait_object() {
    let lockfile: Box<dyn Lockfile> = Box::new(lockfile());
    let keys = transitive_closure(lockfile.as_ref(), ["b@npm:^2.0.0"]);
    assert_eq!(keys.len(), 3);
  }
}
