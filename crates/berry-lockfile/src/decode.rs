use indexmap::IndexMap;
use serde::Deserializer;
use serde::de::{DeserializeSeed, IgnoredAny, MapAccess, Visitor};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::entry::Entry;
use crate::error::DecodeError;
use crate::metadata::Metadata;

/// Separates the descriptors of a block that several ranges resolved to,
/// e.g. `"@babel/generator@^7.13.0, @babel/generator@^7.13.9":`
pub const ALIAS_DELIMITER: &str = ", ";

const METADATA_KEY: &str = "__metadata";

/// Returns the 1-based line of the first git conflict marker, if any
pub(crate) fn find_conflict_marker(contents: &[u8]) -> Option<usize> {
  contents
    .split(|b| *b == b'\n')
    .position(|line| {
      let line = line.strip_suffix(b"\r").unwrap_or(line);
      line.starts_with(b"<<<<<<<")
        || line.starts_with(b"|||||||")
        || line.starts_with(b">>>>>>>")
        || line == b"======="
    })
    .map(|index| index + 1)
}

/// A file with nothing but comments and blank lines, e.g. a lockfile that
/// was truncated right after the header
fn is_blank_document(contents: &[u8]) -> bool {
  contents.split(|b| *b == b'\n').all(|line| {
    let line = line.trim_ascii();
    line.is_empty() || line.starts_with(b"#")
  })
}

/// The top-level mapping: `__metadata` plus the raw (unsplit) blocks in
/// document order. Records the key of a block that fails to decode.
struct DocumentSeed<'a> {
  failed_key: &'a mut Option<String>,
}

impl<'de> DeserializeSeed<'de> for DocumentSeed<'_> {
  type Value = (Metadata, Vec<(String, Entry)>);

  fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
    deserializer.deserialize_map(self)
  }
}

impl<'de> Visitor<'de> for DocumentSeed<'_> {
  type Value = (Metadata, Vec<(String, Entry)>);

  fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
    formatter.write_str("a mapping of lockfile keys to entries")
  }

  fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
    let mut metadata = Metadata::default();
    let mut blocks = Vec::with_capacity(map.size_hint().unwrap_or_default());

    while let Some(key) = map.next_key::<String>()? {
      let result = if key == METADATA_KEY {
        map.next_value::<Metadata>().map(|value| metadata = value)
      } else {
        map.next_value::<Entry>().map(|entry| blocks.push((key.clone(), entry)))
      };
      if let Err(error) = result {
        *self.failed_key = Some(key);
        return Err(error);
      }
    }

    Ok((metadata, blocks))
  }
}

/// Parse the lockfile into its metadata and raw (unsplit) blocks, in document
/// order
pub(crate) fn decode_blocks(
  contents: &[u8],
) -> Result<(Metadata, Vec<(String, Entry)>), DecodeError> {
  if let Some(line) = find_conflict_marker(contents) {
    return Err(DecodeError::MergeConflict { line });
  }
  if is_blank_document(contents) {
    return Ok((Metadata::default(), Vec::new()));
  }

  let mut failed_key = None;
  let seed = DocumentSeed {
    failed_key: &mut failed_key,
  };
  seed
    .deserialize(serde_yaml::Deserializer::from_slice(contents))
    .map_err(|source| match failed_key {
      // a YAML error inside a block is still a syntax error
      Some(key) if serde_yaml::from_slice::<IgnoredAny>(contents).is_ok() => {
        DecodeError::Entry { key, source }
      }
      _ => DecodeError::Syntax { source },
    })
}

/// Split every combined key into its descriptors. All descriptors of one
/// block point at the same entry.
pub(crate) fn split_aliases<I, K>(blocks: I) -> IndexMap<String, Arc<Entry>>
where
  I: IntoIterator<Item = (K, Entry)>,
  K: AsRef<str>,
{
  let mut entries = IndexMap::new();
  let mut block_count = 0_usize;

  for (raw_key, entry) in blocks {
    block_count += 1;
    let entry = Arc::new(entry);
    for key in raw_key
      .as_ref()
      .split(ALIAS_DELIMITER)
      .map(str::trim)
      .filter(|key| !key.is_empty())
    {
      if entries.insert(key.to_string(), Arc::clone(&entry)).is_some() {
        warn!(key, "duplicate lockfile key, keeping the last entry");
      }
    }
  }

  debug!(
    blocks = block_count,
    keys = entries.len(),
    "split lockfile aliases"
  );
  entries
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;

  #[test]
  fn test_split_aliases_shares_entry() {
    let entries = split_aliases([("a@^1.0.0, a@^1.1.0", Entry::new("1.1.2"))]);

    assert_eq!(
      entries.keys().map(String::as_str).collect::<Vec<_>>(),
      vec!["a@^1.0.0", "a@^1.1.0"]
    );
    assert!(Arc::ptr_eq(&entries["a@^1.0.0"], &entries["a@^1.1.0"]));
    assert_eq!(entries["a@^1.0.0"].version, "1.1.2");
  }

  #[test]
  fn test_split_aliases_trims_and_skips_empty() {
    let entries = split_aliases([(" a@^1.0.0 ,  , a@^1.1.0", Entry::new("1.1.2"))]);
    assert_eq!(
      entries.keys().map(String::as_str).collect::<Vec<_>>(),
      vec!["a@^1.0.0", "a@^1.1.0"]
    );
  }

  #[test]
  fn test_split_aliases_duplicate_keeps_last() {
    let entries = split_aliases([
      ("a@^1.0.0", Entry::new("1.0.0")),
      ("b@^2.0.0", Entry::new("2.0.0")),
      ("a@^1.0.0, a@^1.2.0", Entry::new("1.2.0")),
    ]);

    assert_eq!(
      entries.keys().map(String::as_str).collect::<Vec<_>>(),
      vec!["a@^1.0.0", "b@^2.0.0", "a@^1.2.0"]
    );
    assert_eq!(entries["a@^1.0.0"].version, "1.2.0");
  }

  #[test]
  fn test_find_conflict_marker() {
    let contents = b"\"a@npm:1.0.0\":\n<<<<<<< HEAD\n  version: 1.0.0\n=======\n  version: 1.0.1\n>>>>>>> main\n";
    assert_eq!(find_conflict_marker(contents), Some(2));
    assert_eq!(find_conflict_marker(b"=======\r\n"), Some(1));
    assert_eq!(find_conflict_marker(b"  resolution: \"a=======b\"\n"), None);
  }

  #[test]
  fn test_decode_blocks_keeps_keys_and_order() {
    let contents = b"__metadata:\n  version: 6\n  cacheKey: 10c0\n\n\"b@npm:2.10\":\n  version: 2.10\n\n1:\n  version: 1.0.0\n";
    let (metadata, blocks) = decode_blocks(contents).unwrap();

    assert_eq!(metadata, Metadata::new("6".to_string(), "10c0".to_string()));
    assert_eq!(
      blocks
        .iter()
        .map(|(key, entry)| (key.as_str(), entry.version.as_str()))
        .collect::<Vec<_>>(),
      vec![("b@npm:2.10", "2.10"), ("1", "1.0.0")]
    );
  }

  #[test]
  fn test_decode_blocks_reports_failing_key() {
    let contents = b"\"a@npm:1.0.0\":\n  version: 1.0.0\n\"b@npm:1.0.0\":\n  resolution: b\n";
    let error = decode_blocks(contents).unwrap_err();
    assert!(
      matches!(&error, DecodeError::Entry { key, .. } if key == "b@npm:1.0.0"),
      "{error:?}"
    );

    let error = decode_blocks(b"- a\n- b\n").unwrap_err();
    assert!(matches!(error, DecodeError::Syntax { .. }), "{error:?}");

    let error = decode_blocks(b"\"a@npm:1.0.0\":\n  version: \"1.0.0\n").unwrap_err();
    assert!(matches!(error, DecodeError::Syntax { .. }), "{error:?}");
  }

  #[test]
  fn test_blank_document() {
    assert!(is_blank_document(b""));
    assert!(is_blank_document(b"# comment\n\n   \n"));
    assert!(!is_blank_document(b"# comment\na: b\n"));
  }
}
