//! Print the issue codes recorded in a saved report

use std::path::Path;

use crate::core::error::HostcheckResult;
use crate::report::ReportSettings;
use crate::report::parse::read_report;

/// Print failure codes (then warning codes unless disabled), one per line
pub fn run_codes(input: &Path, disable_warnings: bool) -> HostcheckResult<()> {
  for code in report_codes(input, disable_warnings)? {
    println!("{}", code);
  }
  Ok(())
}

/// Codes of a saved table or JSON report
pub fn report_codes(input: &Path, disable_warnings: bool) -> HostcheckResult<Vec<String>> {
  let settings = ReportSettings {
    warnings: !disable_warnings,
    ..ReportSettings::default()
  };
  let report = read_report(input, settings)?;
  let codes = report.codes();
  tracing::debug!(path = %input.display(), codes = codes.len(), "codes extracted from report");
  Ok(codes)
}
