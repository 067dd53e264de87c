//! Grid table rendering
//!
//! Layout:
//!
//! ```text
//! +------+----------+----------------------------+---------+-------+
//! | Test | Status   | Reasons                    | Code    | Tags  |
//! +======+==========+============================+=========+=======+
//! | OS   | FAIL     | ISSUE 3C47368: Unsupported | 3C47368 | basic |
//! |      |          | OS for hostcheck           |         | os    |
//! +------+----------+----------------------------+---------+-------+
//! ```
//!
//! Rows: failures, then warnings, then successes, each ascending by name.
//! A name with both failure and warning codes gets one row of each kind.

use super::{CheckIssues, Report, Snapshot, Status, strip_ansi};
use anstyle::{AnsiColor, Color, Style};
use serde_json::Value;

/// Column width reasons are wrapped to
pub const WRAP_WIDTH: usize = 60;

const HEADERS: [&str; 5] = ["Test", "Status", "Reasons", "Code", "Tags"];
const STATE_HEADERS: [&str; 2] = ["State", "Value"];

/// A table cell as its physical lines
pub(crate) type Cell = Vec<String>;

impl Report {
  /// Render the report as a grid table. When host state was recorded the
  /// output is `HOST: <host>`, the check table, then the host-state table.
  pub fn render_table(&self) -> String {
    let snapshot = self.snapshot();
    let settings = self.settings();

    let mut rows: Vec<Vec<Cell>> = Vec::new();
    for check in &snapshot.failures {
      rows.push(issue_row(check, Status::Failure, &snapshot, settings.wrap, settings.color));
    }
    for check in &snapshot.warnings {
      rows.push(issue_row(check, Status::Warning, &snapshot, settings.wrap, settings.color));
    }
    for name in &snapshot.success {
      rows.push(vec![
        vec![name.clone()],
        vec![status_label(Status::Success, settings.color)],
        vec![String::new()],
        vec![String::new()],
        tag_cell(&snapshot, name),
      ]);
    }

    let table = grid(&HEADERS, &rows);
    if snapshot.host_state.is_empty() {
      return table;
    }

    let state_rows: Vec<Vec<Cell>> = snapshot
      .host_state
      .iter()
      .map(|(key, value)| vec![vec![key.clone()], state_value_lines(value)])
      .collect();
    format!("HOST: {}\n{}\n{}", snapshot.host, table, grid(&STATE_HEADERS, &state_rows))
  }
}

fn issue_row(check: &CheckIssues, status: Status, snapshot: &Snapshot, wrap: bool, color: bool) -> Vec<Cell> {
  let mut reasons = Vec::new();
  let mut codes = Vec::new();

  for entry in &check.entries {
    let issue_lines = text_lines(&format!("ISSUE {}: {}", entry.code, entry.reason), wrap);
    for (i, line) in issue_lines.into_iter().enumerate() {
      codes.push(if i == 0 { entry.code.clone() } else { String::new() });
      reasons.push(line);
    }
    if let Some(fix) = &entry.fix {
      for line in text_lines(&format!("FIX {}: {}", entry.code, fix), wrap) {
        codes.push(String::new());
        reasons.push(line);
      }
    }
  }

  vec![
    vec![check.name.clone()],
    vec![status_label(status, color)],
    reasons,
    codes,
    tag_cell(snapshot, &check.name),
  ]
}

fn tag_cell(snapshot: &Snapshot, name: &str) -> Cell {
  snapshot
    .tags
    .get(name)
    .map(|tags| tags.iter().cloned().collect())
    .unwrap_or_default()
}

fn status_label(status: Status, color: bool) -> String {
  if !color {
    return status.label().to_string();
  }
  let color = match status {
    Status::Failure => AnsiColor::Red,
    Status::Warning => AnsiColor::Yellow,
    Status::Success => AnsiColor::Green,
  };
  let style = Style::new().fg_color(Some(Color::Ansi(color))).bold();
  format!("{}{}{}", style.render(), status.label(), style.render_reset())
}

/// Split text into cell lines, greedily word-wrapping when asked
fn text_lines(text: &str, wrap: bool) -> Vec<String> {
  if wrap {
    wrap_words(text, WRAP_WIDTH)
  } else {
    let lines: Vec<String> = text.lines().map(str::to_string).collect();
    if lines.is_empty() { vec![String::new()] } else { lines }
  }
}

/// Greedy word wrap. Whitespace runs collapse to one space; a word longer
/// than `width` gets a line of its own and overflows the column, so joining
/// the lines with single spaces gives back the collapsed text.
pub fn wrap_words(text: &str, width: usize) -> Vec<String> {
  let mut lines = Vec::new();
  let mut current = String::new();

  for word in text.split_whitespace() {
    let current_len = current.chars().count();
    if current_len > 0 && current_len + 1 + word.chars().count() > width {
      lines.push(std::mem::take(&mut current));
    }
    if !current.is_empty() {
      current.push(' ');
    }
    current.push_str(word);
  }

  if !current.is_empty() || lines.is_empty() {
    lines.push(current);
  }
  lines
}

fn scalar_text(value: &Value) -> String {
  match value {
    Value::String(s) => s.clone(),
    Value::Null => String::new(),
    other => other.to_string(),
  }
}

/// Host-state values: scalars inline, mappings as `key: value` lines with a
/// second indented level for nested mappings
fn state_value_lines(value: &Value) -> Cell {
  let Value::Object(map) = value else {
    return scalar_text(value).lines().map(str::to_string).collect();
  };

  let mut lines = Vec::new();
  for (key, inner) in map {
    match inner {
      Value::Object(nested) => {
        lines.push(format!("{}:", key));
        for (nested_key, leaf) in nested {
          lines.push(format!("  {}: {}", nested_key, scalar_text(leaf)));
        }
      }
      other => lines.push(format!("{}: {}", key, scalar_text(other))),
    }
  }
  lines
}

fn visible_width(text: &str) -> usize {
  strip_ansi(text).chars().count()
}

/// Draw a bordered grid with an `=` rule under the header
pub(crate) fn grid(headers: &[&str], rows: &[Vec<Cell>]) -> String {
  let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
  for row in rows {
    for (col, cell) in row.iter().enumerate() {
      for line in cell {
        widths[col] = widths[col].max(visible_width(line));
      }
    }
  }

  let rule = |fill: char| {
    let mut line = String::from("+");
    for w in &widths {
      line.extend(std::iter::repeat_n(fill, w + 2));
      line.push('+');
    }
    line
  };
  let content = |cells: &[&str]| {
    let mut line = String::from("|");
    for (text, w) in cells.iter().zip(&widths) {
      line.push(' ');
      line.push_str(text);
      line.extend(std::iter::repeat_n(' ', w - visible_width(text)));
      line.push_str(" |");
    }
    line
  };

  let mut out = vec![rule('-'), content(headers), rule('=')];
  for (i, row) in rows.iter().enumerate() {
    let height = row.iter().map(Vec::len).max().unwrap_or(0).max(1);
    for line_no in 0..height {
      let cells: Vec<&str> = row
        .iter()
        .map(|cell| cell.get(line_no).map(String::as_str).unwrap_or(""))
        .collect();
      out.push(content(&cells));
    }
    if i + 1 < rows.len() {
      out.push(rule('-'));
    }
  }
  if !rows.is_empty() {
    out.push(rule('-'));
  }
  out.join("\n")
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::report::ReportSettings;

  fn report(settings: ReportSettings) -> Report {
    Report::new(settings).with_host("node-1")
  }

  #[test]
  fn test_wrap_words() {
    assert_eq!(wrap_words("a b c", 3), vec!["a b", "c"]);
    assert_eq!(wrap_words("", 10), vec![""]);
    assert_eq!(wrap_words("abcdefg hi", 3), vec!["abcdefg", "hi"]);
    assert_eq!(wrap_words("ab abcdefg", 3), vec!["ab", "abcdefg"]);
    assert_eq!(wrap_words("  spaced\n\tout  ", 60), vec!["spaced out"]);
  }

  #[test]
  fn test_row_order_and_layout() {
    let r = report(ReportSettings::default());
    r.record_success("UDEV", ["udev"]);
    r.record_warning("VIP2", "No vip2 configured", "16EB208B", ["connection"], None);
    r.record_failure("OS", "Unsupported OS for hostcheck", "3C47368", ["basic", "os"], None);

    let out = r.render_table();
    let lines: Vec<&str> = out.lines().collect();
    assert!(lines[0].starts_with("+-"));
    assert!(lines[1].contains("| Test ") && lines[1].contains("| Tags "));
    assert!(lines[2].starts_with("+="));

    let os = out.find("| OS ").unwrap();
    let vip = out.find("| VIP2 ").unwrap();
    let udev = out.find("| UDEV ").unwrap();
    assert!(os < vip && vip < udev);
    assert!(out.contains("ISSUE 3C47368: Unsupported OS for hostcheck"));
    assert!(!out.contains("HOST:"));
  }

  #[test]
  fn test_every_line_has_same_width() {
    let r = report(ReportSettings::default());
    r.record_failure(
      "ISCSI",
      &"noop_out_timeout is not set to 2 in /etc/iscsi/iscsid.conf ".repeat(3),
      "F6A49337",
      ["iscsi"],
      Some("sed -i 's/noop_out_timeout = .*/noop_out_timeout = 2/' /etc/iscsi/iscsid.conf"),
    );
    let out = r.render_table();
    let width = out.lines().next().unwrap().chars().count();
    assert!(out.lines().all(|l| l.chars().count() == width));
    assert!(out.lines().any(|l| l.contains("| FIX F6A49337: ")));
  }

  #[test]
  fn test_wrapped_reason_fits_width() {
    let r = report(ReportSettings::default());
    r.record_failure("X", &"word ".repeat(40), "C1", ["t"], None);
    let out = r.render_table();
    let content: Vec<&str> = out.lines().filter(|l| l.starts_with('|')).skip(1).collect();
    assert!(content.len() >= 4);
    for line in content {
      let reason_col = line.split('|').nth(3).unwrap();
      assert!(reason_col.chars().count() <= WRAP_WIDTH + 2);
    }
  }

  #[test]
  fn test_long_word_overflows_instead_of_splitting() {
    let r = report(ReportSettings::default());
    let path = "/dev/disk/by-path/ip-172.28.0.10:3260-iscsi-iqn.2013-05.com.daterainc:tc:01:sn:a1b2c3d4-lun-0";
    r.record_failure("Block Devices", &format!("{} uses the wrong scheduler", path), "47BB5083", ["block_device"], None);
    let out = r.render_table();
    assert!(out.lines().any(|l| l.contains(&format!("| {} ", path))));
    let width = out.lines().next().unwrap().chars().count();
    assert!(out.lines().all(|l| l.chars().count() == width));
  }

  #[test]
  fn test_no_wrap_keeps_long_lines() {
    let r = report(ReportSettings {
      wrap: false,
      ..ReportSettings::default()
    });
    let reason = "x".repeat(90);
    r.record_failure("X", &reason, "C1", ["t"], None);
    assert!(r.render_table().contains(&format!("ISSUE C1: {}", reason)));
  }

  #[test]
  fn test_color_labels_do_not_break_alignment() {
    let r = report(ReportSettings {
      color: true,
      ..ReportSettings::default()
    });
    r.record_failure("A", "bad", "C1", ["t"], None);
    r.record_success("B", ["t"]);
    let out = r.render_table();
    assert!(out.contains('\x1b'));
    let plain = strip_ansi(&out);
    let width = plain.lines().next().unwrap().chars().count();
    assert!(plain.lines().all(|l| l.chars().count() == width));
  }

  #[test]
  fn test_host_state_table() {
    let r = report(ReportSettings::default());
    r.record_success("OS", ["basic"]);
    r.record_host_state("kernel", serde_json::json!("6.1.0-13-amd64"));
    r.record_host_state(
      "interfaces",
      serde_json::json!({"eth0": {"mtu": 9000, "state": "up"}, "count": 1}),
    );
    let out = r.render_table();
    assert!(out.starts_with("HOST: node-1\n"));
    assert!(out.contains("| State "));
    assert!(out.contains("| count: 1 "));
    assert!(out.contains("| eth0: "));
    assert!(out.contains("|   mtu: 9000 "));
    assert!(out.find("| Test ").unwrap() < out.find("| State ").unwrap());
    assert!(out.find("| OS ").unwrap() < out.find("| kernel ").unwrap());
  }

  #[test]
  fn test_empty_report_has_header_only() {
    let r = report(ReportSettings::default());
    assert_eq!(r.render_table().lines().count(), 3);
  }
}
