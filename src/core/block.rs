//! Parser for nested, brace-delimited `key value` configuration files
//!
//! The format is the one used by multipath.conf and similar daemons:
//!
//! ```text
//! defaults {
//!     checker_timeout 5
//! }
//! devices {
//!     device {
//!         vendor "DATERA"
//!     }
//! }
//! ```
//!
//! Only full-line comments are recognised. A `#` after a value is kept as part
//! of the value, matching how the files are read by the tools that own them.

use crate::core::error::ParseError;

/// One node of a parsed block config
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigBlock {
  pub key: String,
  pub value: BlockValue,
}

/// Either a scalar value or a nested block body
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockValue {
  Scalar(String),
  Children(Vec<ConfigBlock>),
}

impl ConfigBlock {
  pub fn scalar(key: impl Into<String>, value: impl Into<String>) -> Self {
    Self {
      key: key.into(),
      value: BlockValue::Scalar(value.into()),
    }
  }

  pub fn block(key: impl Into<String>, children: Vec<ConfigBlock>) -> Self {
    Self {
      key: key.into(),
      value: BlockValue::Children(children),
    }
  }

  /// Scalar value, or None for a block node
  pub fn value(&self) -> Option<&str> {
    match &self.value {
      BlockValue::Scalar(v) => Some(v),
      BlockValue::Children(_) => None,
    }
  }

  /// Child nodes; empty for scalar nodes
  pub fn children(&self) -> &[ConfigBlock] {
    match &self.value {
      BlockValue::Scalar(_) => &[],
      BlockValue::Children(children) => children,
    }
  }

  /// Value of the first scalar child named `key`
  pub fn get(&self, key: &str) -> Option<&str> {
    self.children().iter().filter(|c| c.key == key).find_map(|c| c.value())
  }

  /// Whether any direct child is named `key`
  pub fn has(&self, key: &str) -> bool {
    self.children().iter().any(|c| c.key == key)
  }
}

/// First node named `key` in a sibling list
pub fn find<'a>(blocks: &'a [ConfigBlock], key: &str) -> Option<&'a ConfigBlock> {
  blocks.iter().find(|b| b.key == key)
}

/// Parse block config text into its top-level nodes
pub fn parse_blocks(text: &str) -> Result<Vec<ConfigBlock>, ParseError> {
  let mut lines = text.lines().enumerate();
  parse_level(&mut lines, None)
}

/// Consume lines from the shared cursor until the enclosing block closes.
///
/// `open` is the key and line number of the block being filled, or None at
/// top level, where running out of lines is the normal way to finish.
fn parse_level<'a, I>(lines: &mut I, open: Option<(&'a str, usize)>) -> Result<Vec<ConfigBlock>, ParseError>
where
  I: Iterator<Item = (usize, &'a str)>,
{
  let mut nodes = Vec::new();

  while let Some((index, raw)) = lines.next() {
    let line_no = index + 1;
    let line = raw.trim();
    let tokens: Vec<&'a str> = line.split_whitespace().collect();

    let Some(first) = tokens.first().copied() else {
      continue;
    };
    if first.starts_with('#') {
      continue;
    }

    if line == "}" {
      return match open {
        Some(_) => Ok(nodes),
        None => Err(ParseError::UnexpectedClose { line: line_no }),
      };
    }

    if line.ends_with('{') {
      let key = first.trim_end_matches('{');
      if key.is_empty() {
        return Err(ParseError::MissingKey { line: line_no });
      }
      let children = parse_level(lines, Some((key, line_no)))?;
      nodes.push(ConfigBlock::block(key, children));
      continue;
    }

    let value = tokens[1..].join(" ");
    nodes.push(ConfigBlock::scalar(first, strip_quotes(&value)));
  }

  match open {
    Some((key, line)) => Err(ParseError::UnclosedBlock {
      key: key.to_string(),
      line,
    }),
    None => Ok(nodes),
  }
}

fn strip_quotes(value: &str) -> &str {
  value.trim_matches(|c| c == '"' || c == '\'')
}
