/// Turns a dependency `(name, specifier)` pair into the lockfile keys it could
/// be stored under, most specific first. Resolution takes the first key that
/// exists, so the order is the whole ranking policy.
pub trait KeyPolicy {
  fn candidate_keys(&self, name: &str, specifier: &str) -> Vec<String>;
}

impl<F> KeyPolicy for F
where
  F: Fn(&str, &str) -> Vec<String>,
{
  fn candidate_keys(&self, name: &str, specifier: &str) -> Vec<String> {
    self(name, specifier)
  }
}

/// Protocols yarn berry prefixes onto a bare range when it writes the lockfile
const PROTOCOLS: [&str; 4] = ["npm", "file", "workspace", "yarn"];

/// The key policy for yarn berry lockfiles.
///
/// A dependency written as `ms: ^2.1.0` is stored as `ms@npm:^2.1.0` by berry
/// and as `ms@^2.1.0` by older lockfiles, so the verbatim key is tried before
/// each protocol-prefixed variant.
#[derive(Debug, Clone, Copy, Default)]
pub struct BerryKeyPolicy;

impl KeyPolicy for BerryKeyPolicy {
  fn candidate_keys(&self, name: &str, specifier: &str) -> Vec<String> {
    std::iter::once(format!("{name}@{specifier}"))
      .chain(
        PROTOCOLS
          .iter()
          .map(|protocol| format!("{name}@{protocol}:{specifier}")),
      )
      .collect()
  }
}

/// The outcome of resolving a dependency against a lockfile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPackage {
  /// The canonical key the package was found under
  pub key: String,
  /// The version the package resolved to
  pub version: String,
}
