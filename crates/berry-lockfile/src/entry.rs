use indexmap::IndexMap;
use serde::de::{Error as _, MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use serde_yaml::Value;
use std::collections::BTreeMap;
use std::fmt;

/// A single resolved package in the lockfile.
///
/// Entries are shared between every key that resolves to them and are never
/// mutated after decoding. Fields serialize in the order yarn writes them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
  /// Resolved version of the package, e.g. `1.2.3` or `0.0.0-use.local`
  pub version: String,

  /// Where the package was fetched from
  #[serde(skip_serializing_if = "String::is_empty")]
  pub resolved: String,

  /// Content hash of the fetched package
  #[serde(skip_serializing_if = "String::is_empty")]
  pub integrity: String,

  /// The locator the descriptor resolved to, e.g. `debug@npm:1.0.0`
  #[serde(skip_serializing_if = "String::is_empty")]
  pub resolution: String,

  /// The unresolved dependencies of this package (e.g. `type-detect: ^4.0.0`)
  #[serde(skip_serializing_if = "BTreeMap::is_empty")]
  pub dependencies: BTreeMap<String, String>,

  /// The unresolved optional dependencies of this package
  #[serde(skip_serializing_if = "BTreeMap::is_empty")]
  pub optional_dependencies: BTreeMap<String, String>,

  #[serde(skip_serializing_if = "BTreeMap::is_empty")]
  pub peer_dependencies: BTreeMap<String, String>,

  /// Every other field of the block (`dependenciesMeta`, `bin`, ...),
  /// re-emitted as-is
  #[serde(flatten)]
  pub extra: IndexMap<String, Value>,

  #[serde(skip_serializing_if = "String::is_empty")]
  pub checksum: String,

  /// Platform constraints, e.g. `os=darwin & cpu=arm64`
  #[serde(skip_serializing_if = "String::is_empty")]
  pub conditions: String,

  #[serde(skip_serializing_if = "String::is_empty")]
  pub language_name: String,

  #[serde(skip_serializing_if = "String::is_empty")]
  pub link_type: String,
}

impl Entry {
  pub fn new(version: impl Into<String>) -> Self {
    Self {
      version: version.into(),
      ..Self::default()
    }
  }

  #[must_use]
  pub fn with_resolved(mut self, resolved: impl Into<String>) -> Self {
    self.resolved = resolved.into();
    self
  }

  #[must_use]
  pub fn with_resolution(mut self, resolution: impl Into<String>) -> Self {
    self.resolution = resolution.into();
    self
  }

  #[must_use]
  pub fn with_integrity(mut self, integrity: impl Into<String>) -> Self {
    self.integrity = integrity.into();
    self
  }

  #[must_use]
  pub fn with_dependency(mut self, name: impl Into<String>, range: impl Into<String>) -> Self {
    self.dependencies.insert(name.into(), range.into());
    self
  }

  #[must_use]
  pub fn with_optional_dependency(
    mut self,
    name: impl Into<String>,
    range: impl Into<String>,
  ) -> Self {
    self.optional_dependencies.insert(name.into(), range.into());
    self
  }

  /// Regular and optional dependencies merged into one map.
  /// Optional dependencies win on a name collision.
  pub fn all_dependencies(&self) -> BTreeMap<String, String> {
    self
      .dependencies
      .iter()
      .chain(&self.optional_dependencies)
      .map(|(name, range)| (name.clone(), range.clone()))
      .collect()
  }
}

// Ranges like `2.10` are valid plain scalars that YAML's core schema reads
// as floats. Every modelled field goes through `String`, which serde_yaml
// fills with the scalar as written.
impl<'de> Deserialize<'de> for Entry {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    deserializer.deserialize_map(EntryVisitor)
  }
}

/// A plain `null`, `~` or empty value reads as the empty string
fn text<'de, A: MapAccess<'de>>(map: &mut A) -> Result<String, A::Error> {
  Ok(map.next_value::<Option<String>>()?.unwrap_or_default())
}

fn text_map<'de, A: MapAccess<'de>>(map: &mut A) -> Result<BTreeMap<String, String>, A::Error> {
  Ok(
    map
      .next_value::<Option<BTreeMap<String, Option<String>>>>()?
      .unwrap_or_default()
      .into_iter()
      .map(|(name, range)| (name, range.unwrap_or_default()))
      .collect(),
  )
}

struct EntryVisitor;

impl<'de> Visitor<'de> for EntryVisitor {
  type Value = Entry;

  fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
    formatter.write_str("a lockfile entry")
  }

  fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Entry, A::Error> {
    let mut entry = Entry::default();
    let mut version = None;

    while let Some(field) = map.next_key::<String>()? {
      match field.as_str() {
        "version" => version = map.next_value::<Option<String>>()?,
        "resolved" => entry.resolved = text(&mut map)?,
        "integrity" => entry.integrity = text(&mut map)?,
        "resolution" => entry.resolution = text(&mut map)?,
        "dependencies" => entry.dependencies = text_map(&mut map)?,
        "optionalDependencies" => entry.optional_dependencies = text_map(&mut map)?,
        "peerDependencies" => entry.peer_dependencies = text_map(&mut map)?,
        "checksum" => entry.checksum = text(&mut map)?,
        "conditions" => entry.conditions = text(&mut map)?,
        "languageName" => entry.language_name = text(&mut map)?,
        "linkType" => entry.link_type = text(&mut map)?,
        _ => {
          let value = map.next_value()?;
          entry.extra.insert(field, value);
        }
      }
    }

    entry.version = version.ok_or_else(|| A::Error::missing_field("version"))?;
    Ok(entry)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;

  #[test]
  fn test_all_dependencies_union() {
    let entry = Entry::new("1.0.0")
      .with_dependency("x", "^1.0.0")
      .with_optional_dependency("y", "^2.0.0");

    let expected: BTreeMap<String, String> = [("x", "^1.0.0"), ("y", "^2.0.0")]
      .into_iter()
      .map(|(k, v)| (k.to_string(), v.to_string()))
      .collect();
    assert_eq!(entry.all_dependencies(), expected);
  }

  #[test]
  fn test_all_dependencies_collision_prefers_optional() {
    let entry = Entry::new("1.0.0")
      .with_dependency("x", "^1.0.0")
      .with_optional_dependency("x", "^1.1.0");

    assert_eq!(entry.all_dependencies().get("x").map(String::as_str), Some("^1.1.0"));
  }

  #[test]
  fn test_deserialize_yarn_block() {
    let block = r#"
version: 1.0.0
resolution: "debug@npm:1.0.0"
dependencies:
  ms: 0.6.2
dependenciesMeta:
  fsevents:
    optional: true
bin:
  debug: ./bin/debug.js
checksum: edfec878
languageName: node
linkType: hard
"#;
    let entry: Entry = serde_yaml::from_str(block).unwrap();

    assert_eq!(entry.version, "1.0.0");
    assert_eq!(entry.resolved, "");
    assert_eq!(entry.resolution, "debug@npm:1.0.0");
    assert_eq!(entry.dependencies.get("ms").map(String::as_str), Some("0.6.2"));
    assert_eq!(entry.checksum, "edfec878");
    assert_eq!(entry.language_name, "node");
    assert_eq!(entry.link_type, "hard");
    assert_eq!(
      entry.extra.keys().map(String::as_str).collect::<Vec<_>>(),
      vec!["dependenciesMeta", "bin"]
    );
  }

  #[test]
  fn test_deserialize_keeps_scalars_as_written() {
    let block = r#"
version: 1.10
dependencies:
  b: 2.10
  c: 010
  d: 1e3
  e: true
  f:
peerDependencies:
  react: 16.10
checksum: 1234
"#;
    let entry: Entry = serde_yaml::from_str(block).unwrap();

    assert_eq!(entry.version, "1.10");
    let dependencies: Vec<(&str, &str)> = entry
      .dependencies
      .iter()
      .map(|(name, range)| (name.as_str(), range.as_str()))
      .collect();
    assert_eq!(
      dependencies,
      vec![("b", "2.10"), ("c", "010"), ("d", "1e3"), ("e", "true"), ("f", "")]
    );
    assert_eq!(
      entry.peer_dependencies.get("react").map(String::as_str),
      Some("16.10")
    );
    assert_eq!(entry.checksum, "1234");
  }

  #[test]
  fn test_deserialize_requires_version() {
    let result = serde_yaml::from_str::<Entry>("resolved: https://example.com/a.tgz\n");
    assert!(result.is_err());
  }

  #[test]
  fn test_serialize_skips_empty_fields() {
    let entry = Entry::new("1.0.0").with_dependency("ms", "^2.0.0");
    let yaml = serde_yaml::to_string(&entry).unwrap();
    assert_eq!(yaml, "version: 1.0.0\ndependencies:\n  ms: ^2.0.0\n");
  }

  #[test]
  fn test_serialize_in_yarn_field_order() {
    let mut entry = Entry::new("1.0.0")
      .with_resolution("debug@npm:1.0.0")
      .with_dependency("ms", "0.6.2");
    entry.checksum = "edfec878".to_string();
    entry.language_name = "node".to_string();
    entry.link_type = "hard".to_string();
    entry.extra.insert(
      "bin".to_string(),
      serde_yaml::from_str("debug: ./bin/debug.js").unwrap(),
    );

    let fields: Vec<String> = serde_yaml::to_string(&entry)
      .unwrap()
      .lines()
      .filter(|line| !line.starts_with(' '))
      .filter_map(|line| line.split(':').next().map(ToString::to_string))
      .collect();
    assert_eq!(
      fields,
      vec![
        "version",
        "resolution",
        "dependencies",
        "bin",
        "checksum",
        "languageName",
        "linkType",
      ]
    );
  }
}
