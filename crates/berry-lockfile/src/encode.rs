use indexmap::IndexMap;
use std::io::{self, Write};
use std::sync::Arc;
use tracing::debug;

use crate::entry::Entry;
use crate::error::EncodeError;
use crate::metadata::header;

/// Encode the entries as a yarn lockfile, header included
pub(crate) fn encode_entries<W>(
  entries: &IndexMap<String, Arc<Entry>>,
  writer: &mut W,
) -> Result<(), EncodeError>
where
  W: Write + ?Sized,
{
  // An empty map would come out as `{}`
  let yaml = if entries.is_empty() {
    String::new()
  } else {
    let view: IndexMap<&str, &Entry> = entries
      .iter()
      .map(|(key, entry)| (key.as_str(), entry.as_ref()))
      .collect();
    serde_yaml::to_string(&view)?
  };

  writer.write_all(header().as_bytes())?;
  write_syml(&yaml, writer)?;
  writer.flush()?;

  debug!(keys = entries.len(), "encoded lockfile");
  Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Quote {
  None,
  Single,
  Double,
}

/// Whether a quote after `before` opens a scalar, rather than sitting in the
/// middle of a plain one
fn starts_scalar(before: &str) -> bool {
  before.trim_start().is_empty()
    || before.ends_with(": ")
    || before.ends_with("- ")
    || before.ends_with("? ")
}

/// Whether the line ends in a `|` or `>` block scalar header
fn opens_block_scalar(line: &str) -> bool {
  let header = line
    .trim_end()
    .trim_end_matches(|c: char| c == '-' || c == '+' || c.is_ascii_digit());
  [": |", ": >", "- |", "- >"]
    .iter()
    .any(|indicator| header.ends_with(indicator))
}

fn indentation(line: &str) -> usize {
  line.len() - line.trim_start_matches(' ').len()
}

/// Rewrite plain YAML into the layout yarn writes.
///
/// Because of yarn being yarn, every top-level block needs a blank line in
/// front of it and strings are only ever double quoted. Single-quoted
/// scalars are re-quoted in the same pass: `''` unescapes to `'`, and `"` or
/// `\` get a backslash. Double-quoted and block scalars pass through.
pub fn write_syml<W>(yaml: &str, writer: &mut W) -> io::Result<()>
where
  W: Write + ?Sized,
{
  let mut quote = Quote::None;
  let mut block_indent: Option<usize> = None;
  let mut out = String::new();

  for line in yaml.lines() {
    if let Some(indent) = block_indent {
      if line.is_empty() || indentation(line) > indent {
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        continue;
      }
      block_indent = None;
    }

    if quote == Quote::None && !line.is_empty() && !line.starts_with(' ') {
      writer.write_all(b"\n")?;
    }

    out.clear();
    let mut chars = line.char_indices().peekable();
    while let Some((index, c)) = chars.next() {
      match (quote, c) {
        (Quote::None, '\'') if starts_scalar(&line[..index]) => {
          quote = Quote::Single;
          out.push('"');
        }
        (Quote::None, '"') if starts_scalar(&line[..index]) => {
          quote = Quote::Double;
          out.push('"');
        }
        (Quote::Single, '\'') => {
          if chars.next_if(|&(_, next)| next == '\'').is_some() {
            out.push('\'');
          } else {
            quote = Quote::None;
            out.push('"');
          }
        }
        (Quote::Single, '"' | '\\') => {
          out.push('\\');
          out.push(c);
        }
        (Quote::Double, '\\') => {
          out.push(c);
          if let Some((_, escaped)) = chars.next() {
            out.push(escaped);
          }
        }
        (Quote::Double, '"') => {
          quote = Quote::None;
          out.push(c);
        }
        _ => out.push(c),
      }
    }

    if quote == Quote::None && opens_block_scalar(line) {
      block_indent = Some(indentation(line));
    }
    writer.write_all(out.as_bytes())?;
    writer.write_all(b"\n")?;
  }
  Ok(())
}
