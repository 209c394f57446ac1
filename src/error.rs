//! Error types for the scaffold.
//!
//! This module defines the error type shared by every component of the
//! scaffold, with one variant per failure domain so that callers can decide
//! whether to log-and-continue or abort a specific check.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// The main error type for scaffold operations.
///
/// Most helpers in this crate prefer returning an empty result plus a
/// `tracing` warning over failing; `ScaffoldError` is reserved for genuine
/// I/O, parse, git and prompt failures that the immediate caller must handle.
#[derive(Debug)]
pub enum ScaffoldError {
    /// An error occurred while loading, parsing or interpreting configuration.
    ConfigError {
        /// Description of the configuration issue.
        message: String,
        /// The config file path, if applicable.
        path: Option<PathBuf>,
        /// The underlying error.
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// An error occurred during file system operations.
    IoError {
        /// The operation being performed.
        operation: String,
        /// The path involved in the error.
        path: Option<PathBuf>,
        /// The underlying IO error.
        source: Option<io::Error>,
    },

    /// An error occurred during a Git operation.
    GitError {
        /// Context about what Git operation was being performed.
        operation: String,
        /// Additional context about the repository.
        repo_path: Option<PathBuf>,
        /// The underlying error.
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The interactive prompt could not be shown or answered.
    PromptError {
        /// Description of what went wrong.
        message: String,
        /// The underlying error.
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The external lint runner failed or produced an unreadable report.
    LintError {
        /// Description of what went wrong.
        message: String,
        /// The underlying error.
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// An error indicating an invalid argument or input.
    InvalidInput {
        /// Description of the invalid input.
        message: String,
        /// The argument or value that was invalid.
        argument: Option<String>,
    },
}

impl ScaffoldError {
    /// Creates a new `ConfigError` with the given message.
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
            path: None,
            source: None,
        }
    }

    /// Creates a new `ConfigError` with a file path.
    ///
    /// # Arguments
    /// * `message` - A description of the configuration issue.
    /// * `path` - The path to the config file.
    pub fn config_error_with_path(message: impl Into<String>, path: PathBuf) -> Self {
        Self::ConfigError {
            message: message.into(),
            path: Some(path),
            source: None,
        }
    }

    /// Creates a new `IoError` with the given operation description.
    pub fn io_error(operation: impl Into<String>) -> Self {
        Self::IoError {
            operation: operation.into(),
            path: None,
            source: None,
        }
    }

    /// Creates a new `IoError` with a path and underlying error.
    ///
    /// # Arguments
    /// * `operation` - A description of the IO operation being performed.
    /// * `path` - The path involved in the error.
    /// * `source` - The underlying IO error.
    pub fn io_error_with_source(
        operation: impl Into<String>,
        path: PathBuf,
        source: io::Error,
    ) -> Self {
        Self::IoError {
            operation: operation.into(),
            path: Some(path),
            source: Some(source),
        }
    }

    /// Creates a new `GitError` with the given operation description.
    pub fn git_error(operation: impl Into<String>) -> Self {
        Self::GitError {
            operation: operation.into(),
            repo_path: None,
            source: None,
        }
    }

    /// Creates a new `GitError` with a repository path.
    pub fn git_error_with_repo(operation: impl Into<String>, repo_path: PathBuf) -> Self {
        Self::GitError {
            operation: operation.into(),
            repo_path: Some(repo_path),
            source: None,
        }
    }

    /// Creates a new `PromptError`.
    pub fn prompt_error(message: impl Into<String>) -> Self {
        Self::PromptError {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new `LintError`.
    pub fn lint_error(message: impl Into<String>) -> Self {
        Self::LintError {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a new `InvalidInput` error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
            argument: None,
        }
    }

    /// Creates a new `InvalidInput` error with an argument name.
    pub fn invalid_input_with_arg(message: impl Into<String>, argument: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
            argument: Some(argument.into()),
        }
    }

    /// Returns the name of the error variant.
    pub fn name(&self) -> &'static str {
        match self {
            Self::ConfigError { .. } => "ConfigError",
            Self::IoError { .. } => "IoError",
            Self::GitError { .. } => "GitError",
            Self::PromptError { .. } => "PromptError",
            Self::LintError { .. } => "LintError",
            Self::InvalidInput { .. } => "InvalidInput",
        }
    }

    /// Returns suggested recovery actions for the error.
    pub fn suggestions(&self) -> Vec<String> {
        match self {
            Self::ConfigError { path, .. } => {
                let mut s = vec![
                    "Check the configuration file syntax".to_string(),
                    "Use a .toml, .json, .yaml or .yml extension".to_string(),
                ];
                if path.is_some() {
                    s.push("Run `scaffold inspect` to view the resolved configuration".to_string());
                }
                s
            }
            Self::IoError { operation, .. } => {
                let mut s = vec![
                    "Check that the path exists and is accessible".to_string(),
                    "Verify you have the necessary permissions".to_string(),
                ];
                if operation.contains("write") {
                    s.push("Ensure the log directory is writable".to_string());
                }
                s
            }
            Self::GitError { .. } => vec![
                "Ensure the path is a valid Git repository".to_string(),
                "Check the gitHooks.gitPath setting".to_string(),
                "Verify Git is installed and accessible".to_string(),
            ],
            Self::PromptError { .. } => vec![
                "Run the command from an interactive terminal".to_string(),
                "Pass entries explicitly with -e <names...> or -all".to_string(),
            ],
            Self::LintError { .. } => vec![
                "Check the gitHooks.eslintCommand setting".to_string(),
                "Ensure the linter prints its report as JSON".to_string(),
            ],
            Self::InvalidInput { .. } => vec![
                "Review the command-line arguments".to_string(),
                "Verify all required arguments are provided".to_string(),
            ],
        }
    }
}

impl fmt::Display for ScaffoldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigError { message, path, .. } => {
                if let Some(p) = path {
                    write!(f, "Configuration error in '{}': {}", p.display(), message)
                } else {
                    write!(f, "Configuration error: {}", message)
                }
            }
            Self::IoError {
                operation, path, ..
            } => {
                if let Some(p) = path {
                    write!(
                        f,
                        "IO error during '{}' at '{}': operation failed",
                        operation,
                        p.display()
                    )
                } else {
                    write!(f, "IO error during '{}': operation failed", operation)
                }
            }
            Self::GitError {
                operation,
                repo_path,
                ..
            } => {
                if let Some(path) = repo_path {
                    write!(
                        f,
                        "Git error during '{}' at '{}': operation failed",
                        operation,
                        path.display()
                    )
                } else {
                    write!(f, "Git error during '{}': operation failed", operation)
                }
            }
            Self::PromptError { message, .. } => write!(f, "Prompt error: {}", message),
            Self::LintError { message, .. } => write!(f, "Lint error: {}", message),
            Self::InvalidInput { message, argument } => {
                if let Some(arg) = argument {
                    write!(f, "Invalid input '{}': {}", arg, message)
                } else {
                    write!(f, "Invalid input: {}", message)
                }
            }
        }
    }
}

impl std::error::Error for ScaffoldError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ConfigError { source, .. } => source.as_ref().map(|s| s.as_ref() as _),
            Self::IoError { source, .. } => source.as_ref().map(|e| e as _),
            Self::GitError { source, .. } => source.as_ref().map(|s| s.as_ref() as _),
            Self::PromptError { source, .. } => source.as_ref().map(|s| s.as_ref() as _),
            Self::LintError { source, .. } => source.as_ref().map(|s| s.as_ref() as _),
            Self::InvalidInput { .. } => None,
        }
    }
}

impl From<io::Error> for ScaffoldError {
    fn from(err: io::Error) -> Self {
        Self::IoError {
            operation: "file operation".to_string(),
            path: None,
            source: Some(err),
        }
    }
}

impl From<toml::de::Error> for ScaffoldError {
    fn from(err: toml::de::Error) -> Self {
        Self::ConfigError {
            message: format!("Failed to parse TOML: {}", err),
            path: None,
            source: Some(Box::new(err)),
        }
    }
}

impl From<serde_json::Error> for ScaffoldError {
    fn from(err: serde_json::Error) -> Self {
        Self::ConfigError {
            message: format!("Failed to parse/serialize JSON: {}", err),
            path: None,
            source: Some(Box::new(err)),
        }
    }
}

impl From<serde_yaml::Error> for ScaffoldError {
    fn from(err: serde_yaml::Error) -> Self {
        Self::ConfigError {
            message: format!("Failed to parse YAML: {}", err),
            path: None,
            source: Some(Box::new(err)),
        }
    }
}

impl From<git2::Error> for ScaffoldError {
    fn from(err: git2::Error) -> Self {
        Self::GitError {
            operation: "git operation".to_string(),
            repo_path: None,
            source: Some(Box::new(err)),
        }
    }
}

impl From<walkdir::Error> for ScaffoldError {
    fn from(err: walkdir::Error) -> Self {
        Self::IoError {
            operation: "directory traversal".to_string(),
            path: err.path().map(PathBuf::from),
            source: None,
        }
    }
}

impl From<globset::Error> for ScaffoldError {
    fn from(err: globset::Error) -> Self {
        Self::ConfigError {
            message: format!("Invalid glob pattern: {}", err),
            path: None,
            source: Some(Box::new(err)),
        }
    }
}

impl From<regex_lite::Error> for ScaffoldError {
    fn from(err: regex_lite::Error) -> Self {
        Self::ConfigError {
            message: format!("Invalid regular expression: {}", err),
            path: None,
            source: Some(Box::new(err)),
        }
    }
}

impl From<dialoguer::Error> for ScaffoldError {
    fn from(err: dialoguer::Error) -> Self {
        Self::PromptError {
            message: format!("Interactive prompt failed: {}", err),
            source: Some(Box::new(err)),
        }
    }
}

/// A type alias for `Result<T, ScaffoldError>`.
pub type Result<T> = std::result::Result<T, ScaffoldError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_creates_basic_error() {
        let err = ScaffoldError::config_error("invalid format");
        assert!(matches!(err, ScaffoldError::ConfigError { .. }));
        assert_eq!(err.name(), "ConfigError");
    }

    #[test]
    fn test_config_error_with_path_displays_path() {
        let path = PathBuf::from("/scaffold.config.toml");
        let err = ScaffoldError::config_error_with_path("invalid", path.clone());
        assert!(matches!(&err, ScaffoldError::ConfigError { path: p, .. } if p == &Some(path)));
        let display = format!("{}", err);
        assert!(display.contains("Configuration error"));
        assert!(display.contains("scaffold.config.toml"));
    }

    #[test]
    fn test_io_error_with_source_keeps_path() {
        let path = PathBuf::from("/log/gitHooks.log.json");
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        let err = ScaffoldError::io_error_with_source("write audit log", path.clone(), io_err);
        assert!(matches!(&err, ScaffoldError::IoError { path: p, .. } if p == &Some(path)));
        assert!(std::error::Error::source(&err).is_some());
        assert!(err.suggestions().iter().any(|s| s.contains("writable")));
    }

    #[test]
    fn test_git_error_display_without_repo() {
        let err = ScaffoldError::git_error("open repository");
        let display = format!("{}", err);
        assert!(display.contains("Git error"));
        assert!(display.contains("open repository"));
        assert_eq!(err.name(), "GitError");
    }

    #[test]
    fn test_prompt_error_suggests_explicit_entries() {
        let err = ScaffoldError::prompt_error("not a terminal");
        assert_eq!(err.name(), "PromptError");
        assert!(format!("{}", err).contains("not a terminal"));
        assert!(err.suggestions().iter().any(|s| s.contains("-e")));
    }

    #[test]
    fn test_lint_error_display() {
        let err = ScaffoldError::lint_error("report is not JSON");
        assert_eq!(err.name(), "LintError");
        assert!(format!("{}", err).contains("report is not JSON"));
    }

    #[test]
    fn test_invalid_input_with_arg_displays_argument() {
        let err = ScaffoldError::invalid_input_with_arg("unknown mode", "staging");
        let display = format!("{}", err);
        assert!(display.contains("Invalid input"));
        assert!(display.contains("staging"));
    }

    #[test]
    fn test_from_io_error_creates_io_error() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: ScaffoldError = io_err.into();
        assert!(matches!(err, ScaffoldError::IoError { .. }));
    }

    #[test]
    fn test_from_toml_de_error_creates_config_error() {
        let toml_err = toml::from_str::<toml::Value>("invalid = [unclosed").unwrap_err();
        let err: ScaffoldError = toml_err.into();
        assert!(matches!(err, ScaffoldError::ConfigError { .. }));
        assert!(format!("{}", err).contains("TOML"));
    }

    #[test]
    fn test_from_serde_json_error_creates_config_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{invalid}").unwrap_err();
        let err: ScaffoldError = json_err.into();
        assert!(format!("{}", err).contains("JSON"));
    }

    #[test]
    fn test_from_serde_yaml_error_creates_config_error() {
        let yaml_err = serde_yaml::from_str::<serde_json::Value>("a: [b").unwrap_err();
        let err: ScaffoldError = yaml_err.into();
        assert!(format!("{}", err).contains("YAML"));
    }

    #[test]
    fn test_from_globset_error_creates_config_error() {
        let glob_err = globset::Glob::new("a[").unwrap_err();
        let err: ScaffoldError = glob_err.into();
        assert!(format!("{}", err).contains("glob"));
    }

    #[test]
    fn test_from_regex_error_creates_config_error() {
        let re_err = regex_lite::Regex::new("(").unwrap_err();
        let err: ScaffoldError = re_err.into();
        assert!(format!("{}", err).contains("regular expression"));
    }

    #[test]
    fn test_from_git2_error_creates_git_error() {
        let git_err = git2::Error::from_str("git operation failed");
        let err: ScaffoldError = git_err.into();
        assert!(matches!(err, ScaffoldError::GitError { .. }));
    }

    #[test]
    fn test_question_mark_operator_works_with_result() {
        fn may_fail(should_fail: bool) -> Result<i32> {
            if should_fail {
                Err(ScaffoldError::invalid_input("failed"))
            } else {
                Ok(42)
            }
        }

        fn uses_question_mark(should_fail: bool) -> Result<i32> {
            let val = may_fail(should_fail)?;
            Ok(val + 8)
        }

        assert!(matches!(uses_question_mark(false), Ok(50)));
        assert!(uses_question_mark(true).is_err());
    }
}
