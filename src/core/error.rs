//! Error types for hostcheck with contextual messages and exit codes
//!
//! Every user-facing error carries an optional help message pointing at the
//! likely fix. Errors raised *inside* check bodies never reach this type: the
//! engine turns them into Failure outcomes on the report instead.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Exit codes for hostcheck
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
  /// User error (config, invalid args, missing files)
  User = 1,
  /// System error (I/O, worker pool)
  System = 2,
  /// Validation failure (checks reported failures)
  Validation = 3,
}

impl ExitCode {
  /// Convert to i32 for process exit
  pub fn as_i32(self) -> i32 {
    self as i32
  }
}

/// Main error type for hostcheck
#[derive(Debug)]
pub enum HostcheckError {
  /// Configuration errors
  Config(ConfigError),

  /// Parse errors (block config, saved reports)
  Parse(ParseError),

  /// Plugin lookup errors
  Plugin(PluginError),

  /// I/O errors
  Io(io::Error),

  /// Generic error with message and optional context
  Message {
    message: String,
    context: Option<String>,
    help: Option<String>,
  },
}

impl HostcheckError {
  /// Create a simple error message
  pub fn message(msg: impl Into<String>) -> Self {
    HostcheckError::Message {
      message: msg.into(),
      context: None,
      help: None,
    }
  }

  /// Create an error with help text
  pub fn with_help(msg: impl Into<String>, help: impl Into<String>) -> Self {
    HostcheckError::Message {
      message: msg.into(),
      context: None,
      help: Some(help.into()),
    }
  }

  /// Add context to an existing error
  pub fn context(self, ctx: impl Into<String>) -> Self {
    let ctx_str = ctx.into();
    match self {
      HostcheckError::Message { message, context, help } => HostcheckError::Message {
        message,
        context: Some(context.map(|c| format!("{}\n{}", ctx_str, c)).unwrap_or(ctx_str)),
        help,
      },
      HostcheckError::Io(err) => HostcheckError::Message {
        message: format!("{}: {}", ctx_str, err),
        context: None,
        help: None,
      },
      _ => self,
    }
  }

  /// Get the appropriate exit code for this error
  pub fn exit_code(&self) -> ExitCode {
    match self {
      HostcheckError::Config(_) => ExitCode::User,
      HostcheckError::Parse(_) => ExitCode::User,
      HostcheckError::Plugin(_) => ExitCode::User,
      HostcheckError::Io(_) => ExitCode::System,
      HostcheckError::Message { .. } => ExitCode::User,
    }
  }

  /// Get contextual help message for this error
  pub fn help_message(&self) -> Option<String> {
    match self {
      HostcheckError::Config(e) => e.help_message(),
      HostcheckError::Plugin(e) => e.help_message(),
      HostcheckError::Message { help, .. } => help.clone(),
      _ => None,
    }
  }
}

impl fmt::Display for HostcheckError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      HostcheckError::Config(e) => write!(f, "{}", e),
      HostcheckError::Parse(e) => write!(f, "{}", e),
      HostcheckError::Plugin(e) => write!(f, "{}", e),
      HostcheckError::Io(e) => write!(f, "I/O error: {}", e),
      HostcheckError::Message { message, context, .. } => {
        write!(f, "{}", message)?;
        if let Some(ctx) = context {
          write!(f, "\n{}", ctx)?;
        }
        Ok(())
      }
    }
  }
}

impl std::error::Error for HostcheckError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      HostcheckError::Io(e) => Some(e),
      HostcheckError::Parse(e) => Some(e),
      _ => None,
    }
  }
}

impl From<io::Error> for HostcheckError {
  fn from(err: io::Error) -> Self {
    HostcheckError::Io(err)
  }
}

impl From<String> for HostcheckError {
  fn from(msg: String) -> Self {
    HostcheckError::message(msg)
  }
}

impl From<&str> for HostcheckError {
  fn from(msg: &str) -> Self {
    HostcheckError::message(msg)
  }
}

impl From<ParseError> for HostcheckError {
  fn from(err: ParseError) -> Self {
    HostcheckError::Parse(err)
  }
}

impl From<ConfigError> for HostcheckError {
  fn from(err: ConfigError) -> Self {
    HostcheckError::Config(err)
  }
}

impl From<PluginError> for HostcheckError {
  fn from(err: PluginError) -> Self {
    HostcheckError::Plugin(err)
  }
}

impl From<toml_edit::de::Error> for HostcheckError {
  fn from(err: toml_edit::de::Error) -> Self {
    HostcheckError::message(format!("TOML deserialization error: {}", err))
  }
}

impl From<serde_json::Error> for HostcheckError {
  fn from(err: serde_json::Error) -> Self {
    HostcheckError::message(format!("JSON error: {}", err))
  }
}

impl From<rayon::ThreadPoolBuildError> for HostcheckError {
  fn from(err: rayon::ThreadPoolBuildError) -> Self {
    HostcheckError::message(format!("Failed to start check workers: {}", err))
  }
}

/// Configuration-related errors
#[derive(Debug)]
pub enum ConfigError {
  /// An explicitly requested config file does not exist
  NotFound { path: PathBuf },

  /// A field holds a value that cannot be used
  InvalidValue { field: String, value: String, reason: String },
}

impl ConfigError {
  fn help_message(&self) -> Option<String> {
    match self {
      ConfigError::NotFound { .. } => {
        Some("Drop the --config flag to use hostcheck.toml from the working directory, or create the file.".to_string())
      }
      ConfigError::InvalidValue { field, .. } => Some(format!("Fix '{}' in hostcheck.toml or override it on the command line.", field)),
    }
  }
}

impl fmt::Display for ConfigError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ConfigError::NotFound { path } => write!(f, "Config file not found: {}", path.display()),
      ConfigError::InvalidValue { field, value, reason } => {
        write!(f, "Invalid value '{}' for {}: {}", value, field, reason)
      }
    }
  }
}

/// Parse errors for block-structured config files and saved reports
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
  /// A block opened with `{` was never closed
  UnclosedBlock { key: String, line: usize },

  /// A `}` line without a matching open block
  UnexpectedClose { line: usize },

  /// A line opens a block but has no key in front of the brace
  MissingKey { line: usize },

  /// A rendered report line did not have the expected column shape
  ReportLine { line: usize, columns: usize },
}

impl ParseError {
  /// 1-based source line the error points at
  pub fn line(&self) -> usize {
    match self {
      ParseError::UnclosedBlock { line, .. }
      | ParseError::UnexpectedClose { line }
      | ParseError::MissingKey { line }
      | ParseError::ReportLine { line, .. } => *line,
    }
  }
}

impl fmt::Display for ParseError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ParseError::UnclosedBlock { key, line } => {
        write!(f, "block '{}' opened on line {} is never closed", key, line)
      }
      ParseError::UnexpectedClose { line } => write!(f, "unmatched '}}' on line {}", line),
      ParseError::MissingKey { line } => write!(f, "block opened without a key on line {}", line),
      ParseError::ReportLine { line, columns } => {
        write!(f, "report line {} has {} columns, expected 4 or 5", line, columns)
      }
    }
  }
}

impl std::error::Error for ParseError {}

/// Plugin lookup errors
#[derive(Debug)]
pub enum PluginError {
  /// Requested plugin is not in the catalog
  Unknown { name: String, available: Vec<String> },
}

impl PluginError {
  fn help_message(&self) -> Option<String> {
    match self {
      PluginError::Unknown { available, .. } => {
        if available.is_empty() {
          Some("No plugins are available in this build.".to_string())
        } else {
          Some(format!("Available plugins: {}", available.join(", ")))
        }
      }
    }
  }
}

impl fmt::Display for PluginError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      PluginError::Unknown { name, .. } => write!(f, "Unrecognized plugin requested: {}", name),
    }
  }
}

/// Result type alias for hostcheck
pub type HostcheckResult<T> = Result<T, HostcheckError>;

/// Helper trait to add context to Results
pub trait ResultExt<T> {
  /// Add context to an error result
  fn context(self, ctx: impl Into<String>) -> HostcheckResult<T>;

  /// Add context using a closure (lazy evaluation)
  fn with_context<F>(self, f: F) -> HostcheckResult<T>
  where
    F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
  E: Into<HostcheckError>,
{
  fn context(self, ctx: impl Into<String>) -> HostcheckResult<T> {
    self.map_err(|e| e.into().context(ctx))
  }

  fn with_context<F>(self, f: F) -> HostcheckResult<T>
  where
    F: FnOnce() -> String,
  {
    self.map_err(|e| e.into().context(f()))
  }
}

/// Pretty-print an error to stderr with help text
pub fn print_error(error: &HostcheckError) {
  eprintln!("\n❌ {}\n", error);

  if let Some(help) = error.help_message() {
    eprintln!("💡 Help: {}\n", help);
  }
}

/// Check bodies and fix actions use anyhow; surface them as plain messages
impl From<anyhow::Error> for HostcheckError {
  fn from(err: anyhow::Error) -> Self {
    HostcheckError::message(format!("{:#}", err))
  }
}
