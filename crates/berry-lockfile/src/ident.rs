// Types from
// https://github.com/yarnpkg/berry/blob/master/packages/yarnpkg-core/sources/types.ts#L19

use crate::parse::parse_descriptor;

/// Scope + name of the package
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Ident {
  /// The scope of the package, e.g. for `@scope/package`, this is `@scope`
  scope: Option<String>,
  /// The name of the package, e.g. for `@scope/package`, this is `package`
  name: String,
}

impl Ident {
  pub fn new(scope: Option<String>, name: String) -> Self {
    Self { scope, name }
  }

  pub fn scope(&self) -> Option<&str> {
    self.scope.as_deref()
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  /// The name as it appears in a `package.json`, e.g. `@babel/core` or `debug`
  pub fn full_name(&self) -> String {
    self
      .scope
      .as_ref()
      .map_or_else(|| self.name.clone(), |scope| format!("{scope}/{}", self.name))
  }
}

/// Descriptors are just like idents, except that they also contain a range.
///
/// In the canonical form of a berry lockfile every key is a descriptor, e.g.
/// `debug@npm:1.0.0`, `a@workspace:packages/a` or the protocol-less
/// `debug@^1.0.0` written by older lockfiles.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Descriptor {
  ident: Ident,
  /// The range, including the protocol if there is one, e.g. `npm:^1.2.3`
  range: String,
}

impl Descriptor {
  pub fn new(ident: Ident, range: String) -> Self {
    Self { ident, range }
  }

  /// Parse a canonical lockfile key, returning `None` unless the whole key
  /// is a well-formed descriptor.
  pub fn parse(key: &str) -> Option<Self> {
    match parse_descriptor(key) {
      Ok(("", descriptor)) => Some(descriptor),
      _ => None,
    }
  }

  pub fn ident(&self) -> &Ident {
    &self.ident
  }

  pub fn range(&self) -> &str {
    &self.range
  }

  /// The protocol part of the range, e.g. `npm` for `npm:^1.2.3`
  pub fn protocol(&self) -> Option<&str> {
    crate::parse::parse_protocol_prefix(&self.range)
      .ok()
      .map(|(_, protocol)| protocol)
  }

  pub fn is_workspace(&self) -> bool {
    self.protocol() == Some("workspace")
  }
}
