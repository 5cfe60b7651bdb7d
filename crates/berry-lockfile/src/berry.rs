use indexmap::IndexMap;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, trace};

use crate::decode::{decode_blocks, split_aliases};
use crate::encode::encode_entries;
use crate::entry::Entry;
use crate::error::{DecodeError, EncodeError};
use crate::ident::Descriptor;
use crate::lockfile::Lockfile;
use crate::metadata::Metadata;
use crate::resolve::{BerryKeyPolicy, KeyPolicy, ResolvedPackage};

/// A decoded yarn berry lockfile.
///
/// Every key is a single descriptor: blocks stored under several
/// comma-separated descriptors are split on decode, with all of their keys
/// sharing one [`Entry`]. Keys keep the order they had in the file.
#[derive(Debug, Clone)]
pub struct BerryLockfile<P = BerryKeyPolicy> {
  metadata: Metadata,
  entries: IndexMap<String, Arc<Entry>>,
  policy: P,
}

impl BerryLockfile {
  /// Decode the contents of a `yarn.lock`
  pub fn decode(contents: &[u8]) -> Result<Self, DecodeError> {
    Self::decode_with_policy(contents, BerryKeyPolicy)
  }

  /// Build a lockfile from raw blocks, splitting combined keys
  pub fn from_entries<I, K>(blocks: I) -> Self
  where
    I: IntoIterator<Item = (K, Entry)>,
    K: AsRef<str>,
  {
    Self {
      metadata: Metadata::default(),
      entries: split_aliases(blocks),
      policy: BerryKeyPolicy,
    }
  }
}

impl<P> BerryLockfile<P> {
  /// Decode the contents of a `yarn.lock`, resolving packages with `policy`
  pub fn decode_with_policy(contents: &[u8], policy: P) -> Result<Self, DecodeError> {
    let (metadata, blocks) = decode_blocks(contents)?;
    debug!(
      version = metadata.version.as_str(),
      cache_key = metadata.cache_key.as_str(),
      "decoded lockfile metadata"
    );

    Ok(Self {
      metadata,
      entries: split_aliases(blocks),
      policy,
    })
  }

  #[must_use]
  pub fn with_policy<Q>(self, policy: Q) -> BerryLockfile<Q> {
    BerryLockfile {
      metadata: self.metadata,
      entries: self.entries,
      policy,
    }
  }

  /// The `__metadata` block of the decoded file
  pub fn metadata(&self) -> &Metadata {
    &self.metadata
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }

  pub fn get(&self, key: &str) -> Option<&Arc<Entry>> {
    self.entries.get(key)
  }

  pub fn keys(&self) -> impl Iterator<Item = &str> {
    self.entries.keys().map(String::as_str)
  }

  pub fn entries(&self) -> impl Iterator<Item = (&str, &Arc<Entry>)> {
    self.entries.iter().map(|(key, entry)| (key.as_str(), entry))
  }

  /// Probe `candidates` in order, returning the first one in the lockfile
  pub fn resolve_candidates<I, S>(&self, candidates: I) -> Option<ResolvedPackage>
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    candidates.into_iter().find_map(|candidate| {
      let key = candidate.as_ref();
      self.entries.get(key).map(|entry| ResolvedPackage {
        key: key.to_string(),
        version: entry.version.clone(),
      })
    })
  }

  /// Given a lockfile key return the regular and optional dependencies of
  /// that package
  pub fn all_dependencies(&self, key: &str) -> Option<BTreeMap<String, String>> {
    self.entries.get(key).map(|entry| entry.all_dependencies())
  }

  /// Given a list of lockfile keys returns a lockfile based off this one that
  /// only contains those keys, in the order given
  #[must_use]
  pub fn subgraph(&self, keys: &[String]) -> Self
  where
    P: Clone,
  {
    let mut entries = IndexMap::with_capacity(keys.len());
    for key in keys {
      match self.entries.get(key) {
        Some(entry) => {
          entries.insert(key.clone(), Arc::clone(entry));
        }
        None => trace!(key = key.as_str(), "skipping key missing from lockfile"),
      }
    }

    debug!(
      requested = keys.len(),
      kept = entries.len(),
      "built lockfile subgraph"
    );
    Self {
      metadata: self.metadata.clone(),
      entries,
      policy: self.policy.clone(),
    }
  }

  /// Write the lockfile as yarn would. Output already written when an error
  /// is returned is incomplete and should be thrown away.
  pub fn encode<W>(&self, writer: &mut W) -> Result<(), EncodeError>
  where
    W: Write + ?Sized,
  {
    encode_entries(&self.entries, writer)
  }

  /// The key of the workspace called `name`, e.g. `a@workspace:packages/a`
  pub fn workspace_key(&self, name: &str) -> Option<&str> {
    self.keys().find(|key| {
      Descriptor::parse(key).is_some_and(|descriptor| {
        descriptor.is_workspace() && descriptor.ident().full_name() == name
      })
    })
  }

  /// The key of the workspace at the root of the project
  pub fn root_workspace_key(&self) -> Option<&str> {
    self.keys().find(|key| {
      Descriptor::parse(key).is_some_and(|descriptor| descriptor.range() == "workspace:.")
    })
  }

  /// Every key sharing `key`'s entry, in file order. Empty if `key` is absent.
  pub fn aliases(&self, key: &str) -> Vec<&str> {
    let Some(entry) = self.entries.get(key) else {
      return Vec::new();
    };
    self
      .entries
      .iter()
      .filter(|(_, other)| Arc::ptr_eq(entry, other))
      .map(|(alias, _)| alias.as_str())
      .collect()
  }

  /// `keys` plus every alias of them. Keys not in the lockfile are dropped.
  pub fn expand_aliases<'a, I>(&self, keys: I) -> BTreeSet<String>
  where
    I: IntoIterator<Item = &'a str>,
  {
    let mut by_entry: HashMap<*const Entry, Vec<&str>> = HashMap::new();
    for (key, entry) in &self.entries {
      by_entry.entry(Arc::as_ptr(entry)).or_default().push(key);
    }

    keys
      .into_iter()
      .filter_map(|key| self.entries.get(key))
      .filter_map(|entry| by_entry.get(&Arc::as_ptr(entry)))
      .flatten()
      .map(|alias| (*alias).to_string())
      .collect()
  }
}

impl<P: KeyPolicy> BerryLockfile<P> {
  /// Given a package and the range it was requested with, returns the key and
  /// resolved version, if it is in the lockfile
  pub fn resolve_package(&self, name: &str, version: &str) -> Option<ResolvedPackage> {
    self.resolve_candidates(self.policy.candidate_keys(name, version))
  }
}

impl<P> Lockfile for BerryLockfile<P>
where
  P: KeyPolicy + Clone + Send + Sync + 'static,
{
  fn resolve_package(&self, name: &str, version: &str) -> Option<ResolvedPackage> {
    Self::resolve_package(self, name, version)
  }

  fn all_dependencies(&self, key: &str) -> Option<BTreeMap<String, String>> {
    Self::all_dependencies(self, key)
  }

  fn subgraph(&self, keys: &[String]) -> Box<dyn Lockfile> {
    Box::new(Self::subgraph(self, keys))
  }

  fn encode(&self, writer: &mut dyn Write) -> Result<(), EncodeError> {
    Self::encode(self, writer)
  }

  // berry patches are regular `patch:` descriptors, there are no patch files
  // to carry along
  fn patches(&self) -> Vec<PathBuf> {
    Vec::new()
  }
}
