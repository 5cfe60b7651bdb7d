use nom::IResult;
use nom::{
  Parser,
  branch::alt,
  bytes::complete::take_while1,
  character::complete::char,
  combinator::recognize,
  sequence::terminated,
};

use crate::ident::{Descriptor, Ident};

/// Parse a canonical lockfile key like `debug@npm:1.0.0` into a descriptor
///
/// Examples:
/// - `debug@npm:1.0.0`
/// - `@babel/code-frame@npm:7.12.11`
/// - `a@workspace:packages/a`
/// - `debug@^1.0.0`
pub fn parse_descriptor(input: &str) -> IResult<&str, Descriptor> {
  let (rest, (name_part, _, range)) = (
    parse_package_name, // Can be scoped like @babel/code-frame or simple like debug
    char('@'),
    take_while1(|c: char| !c.is_control()), // protocol and range, kept together
  )
    .parse(input)?;

  let ident = match name_part.strip_prefix('@').and_then(|s| s.split_once('/')) {
    Some((scope, name)) => Ident::new(Some(format!("@{scope}")), name.to_string()),
    None => Ident::new(None, name_part.to_string()),
  };

  Ok((rest, Descriptor::new(ident, range.to_string())))
}

fn is_name_char(c: char) -> bool {
  c.is_alphanumeric() || matches!(c, '-' | '_' | '.' | '~')
}

/// Parse a package name, which can be scoped (@babel/code-frame) or simple (debug)
fn parse_package_name(input: &str) -> IResult<&str, &str> {
  alt((
    // Scoped package: @scope/name
    recognize((
      char('@'),
      take_while1(is_name_char),
      char('/'),
      take_while1(is_name_char),
    )),
    // Simple package name
    take_while1(is_name_char),
  ))
  .parse(input)
}

/// Parse the protocol at the start of a range, e.g. `npm` in `npm:^1.0.0`
/// or `git+https` in `git+https://github.com/a/b`
pub(crate) fn parse_protocol_prefix(input: &str) -> IResult<&str, &str> {
  terminated(
    take_while1(|c: char| c.is_alphanumeric() || matches!(c, '-' | '_' | '+')),
    char(':'),
  )
  .parse(input)
}

#[cfg(test)]
mod tests {
  use super::*;
  use rstest::rstest;

  #[test]
  fn test_parse_descriptor_simple() {
    let result = parse_descriptor("debug@npm:1.0.0");

    assert!(result.is_ok(), "Should successfully parse descriptor");
    let (remaining, descriptor) = result.unwrap();
    assert_eq!(remaining, "");

    assert_eq!(descriptor.ident().name(), "debug");
    assert_eq!(descriptor.ident().scope(), None);
    assert_eq!(descriptor.range(), "npm:1.0.0");
  }

  #[test]
  fn test_parse_descriptor_scoped_package() {
    let (remaining, descriptor) = parse_descriptor("@babel/code-frame@npm:7.12.11").unwrap();
    assert_eq!(remaining, "");

    assert_eq!(descriptor.ident().name(), "code-frame");
    assert_eq!(descriptor.ident().scope(), Some("@babel"));
    assert_eq!(descriptor.range(), "npm:7.12.11");
  }

  #[test]
  fn test_parse_descriptor_workspace() {
    let (remaining, descriptor) = parse_descriptor("a@workspace:packages/a").unwrap();
    assert_eq!(remaining, "");

    assert_eq!(descriptor.ident().name(), "a");
    assert_eq!(descriptor.ident().scope(), None);
    assert_eq!(descriptor.range(), "workspace:packages/a");
  }

  #[rstest]
  #[case("lodash.merge@npm:^4.6.2", "lodash.merge", "npm:^4.6.2")]
  #[case("debug@^1.0.0", "debug", "^1.0.0")]
  #[case("root@workspace:.", "root", "workspace:.")]
  #[case(
    "resolve@patch:resolve@npm%3A^1.20.0#~builtin<compat/resolve>",
    "resolve",
    "patch:resolve@npm%3A^1.20.0#~builtin<compat/resolve>"
  )]
  fn test_parse_descriptor_ranges(
    #[case] input: &str,
    #[case] name: &str,
    #[case] range: &str,
  ) {
    let (remaining, descriptor) = parse_descriptor(input).unwrap();
    assert_eq!(remaining, "");
    assert_eq!(descriptor.ident().full_name(), name);
    assert_eq!(descriptor.range(), range);
  }

  #[rstest]
  #[case("npm:^1.0.0", Some("npm"))]
  #[case("workspace:packages/a", Some("workspace"))]
  #[case("git+https://github.com/a/b", Some("git+https"))]
  #[case("^1.0.0", None)]
  #[case("1.0.0", None)]
  fn test_parse_protocol_prefix(#[case] range: &str, #[case] expected: Option<&str>) {
    assert_eq!(parse_protocol_prefix(range).ok().map(|(_, p)| p), expected);
  }

  #[test]
  fn test_parse_descriptor_missing_range() {
    assert!(parse_descriptor("debug@").is_err());
    assert!(parse_descriptor("@babel@npm:1.0.0").is_err());
  }
}
