//! Tool configuration and entry filtering.
//!
//! Configuration is read from a TOML file and controls the names of the
//! folders and output files the operations use, the markers that classify
//! log lines, and which directory entries the sort, parse and count
//! operations consider.
//!
//! # Configuration File Format
//!
//! ```toml
//! [layout]
//! logs_dir = "logs"
//! mail_dir = "mail"
//! errors_file = "errors.log"
//! warnings_file = "warnings.log"
//!
//! [parse]
//! error_marker = "ERROR"
//! warning_marker = "WARNING"
//!
//! [filters]
//! enable_hidden_files = true
//!
//! [filters.exclude]
//! filenames = ["Thumbs.db"]
//! patterns = ["*.tmp"]
//! regex = []
//! ```
//!
//! Every key is optional; an empty file yields the defaults shown above.

use crate::file_kind::FileKind;
use glob::Pattern;
use regex::{Regex, bytes};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Component, Path, PathBuf};

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// Configuration file not found at the specified path.
    ConfigNotFound(PathBuf),
    /// Invalid TOML syntax or structure.
    ConfigInvalid(String),
    /// A layout entry is not a plain file or folder name.
    InvalidLayoutName {
        /// The configuration key.
        key: &'static str,
        /// The rejected value.
        value: String,
    },
    /// Two layout entries share a name.
    DuplicateLayoutName {
        /// The first configuration key.
        first: &'static str,
        /// The second configuration key.
        second: &'static str,
        /// The shared value.
        value: String,
    },
    /// An output file name would be read back as a `.log.txt` input.
    OutputNamedAsLog {
        /// The configuration key.
        key: &'static str,
        /// The rejected value.
        value: String,
    },
    /// A line marker is empty.
    EmptyMarker(&'static str),
    /// Invalid glob pattern provided.
    InvalidGlobPattern(String),
    /// Invalid regex pattern provided with the actual error reason.
    InvalidRegexPattern {
        /// The regex pattern that failed to compile.
        pattern: String,
        /// The reason why the pattern is invalid.
        reason: String,
    },
    /// IO error while reading configuration.
    IoError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ConfigNotFound(path) => {
                write!(f, "Configuration file not found: {}", path.display())
            }
            ConfigError::ConfigInvalid(msg) => write!(f, "Invalid configuration: {}", msg),
            ConfigError::InvalidLayoutName { key, value } => {
                write!(
                    f,
                    "Invalid value '{}' for layout.{}: expected a single file or folder name",
                    value, key
                )
            }
            ConfigError::DuplicateLayoutName {
                first,
                second,
                value,
            } => {
                write!(
                    f,
                    "layout.{} and layout.{} must differ, both are '{}'",
                    first, second, value
                )
            }
            ConfigError::OutputNamedAsLog { key, value } => {
                write!(
                    f,
                    "Invalid value '{}' for layout.{}: output files must not end in .log.txt",
                    value, key
                )
            }
            ConfigError::EmptyMarker(key) => write!(f, "parse.{} must not be empty", key),
            ConfigError::InvalidGlobPattern(pattern) => {
                write!(f, "Invalid glob pattern '{}'", pattern)
            }
            ConfigError::InvalidRegexPattern { pattern, reason } => {
                write!(f, "Invalid regex pattern '{}': {}", pattern, reason)
            }
            ConfigError::IoError(msg) => write!(f, "IO error reading configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Top-level configuration, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ToolConfig {
    #[serde(default)]
    pub layout: LayoutConfig,
    #[serde(default)]
    pub parse: ParseConfig,
    #[serde(default)]
    pub filters: FilterRules,
}

/// Fixed names used inside the folders the tool operates on.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Subfolder that receives `.log.txt` files when sorting.
    pub logs_dir: String,
    /// Subfolder that receives `.mail` files when sorting.
    pub mail_dir: String,
    /// Output file for error lines.
    pub errors_file: String,
    /// Output file for warning lines.
    pub warnings_file: String,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            logs_dir: "logs".to_string(),
            mail_dir: "mail".to_string(),
            errors_file: "errors.log".to_string(),
            warnings_file: "warnings.log".to_string(),
        }
    }
}

/// Substrings that classify log lines. Matching is case-sensitive.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseConfig {
    pub error_marker: String,
    pub warning_marker: String,
}

impl Default for ParseConfig {
    fn default() -> Self {
        Self {
            error_marker: "ERROR".to_string(),
            warning_marker: "WARNING".to_string(),
        }
    }
}

/// Rules deciding which directory entries are considered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterRules {
    /// Whether to consider hidden files (starting with "."). Defaults to true.
    #[serde(default = "default_enable_hidden_files")]
    pub enable_hidden_files: bool,

    /// Rules for excluding files.
    #[serde(default)]
    pub exclude: ExcludeRules,
}

fn default_enable_hidden_files() -> bool {
    true
}

impl Default for FilterRules {
    fn default() -> Self {
        Self {
            enable_hidden_files: default_enable_hidden_files(),
            exclude: ExcludeRules::default(),
        }
    }
}

/// Rules for excluding entries from sort, parse and count.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExcludeRules {
    /// Exact filenames to exclude (e.g., "Thumbs.db").
    #[serde(default)]
    pub filenames: Vec<String>,

    /// Glob patterns matched against the file name (e.g., "*.tmp").
    #[serde(default)]
    pub patterns: Vec<String>,

    /// Regex patterns matched against the file name.
    #[serde(default)]
    pub regex: Vec<String>,
}

impl ToolConfig {
    /// Load configuration from a file, with fallback to defaults.
    ///
    /// Attempts to load configuration in the following order:
    /// 1. If `config_path` is provided, load from that file
    /// 2. Look for `.fileopsrc.toml` in the current directory
    /// 3. Look for `~/.config/fileops/config.toml` in home directory
    /// 4. Fall back to default configuration
    ///
    /// # Errors
    ///
    /// Returns an error if a configuration file is explicitly provided but
    /// cannot be read, or if any discovered file fails to parse.
    pub fn load(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = config_path {
            return Self::load_from_file(path);
        }

        let local_config = PathBuf::from(".fileopsrc.toml");
        if local_config.exists() {
            return Self::load_from_file(&local_config);
        }

        if let Ok(home) = std::env::var("HOME") {
            let home_config = PathBuf::from(home)
                .join(".config")
                .join("fileops")
                .join("config.toml");
            if home_config.exists() {
                return Self::load_from_file(&home_config);
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ConfigNotFound` if file does not exist.
    /// Returns `ConfigError::ConfigInvalid` if TOML parsing fails.
    /// Returns `ConfigError::IoError` if file cannot be read.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::ConfigNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::IoError(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|e| ConfigError::ConfigInvalid(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check layout names and markers.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let layout = [
            ("logs_dir", &self.layout.logs_dir),
            ("mail_dir", &self.layout.mail_dir),
            ("errors_file", &self.layout.errors_file),
            ("warnings_file", &self.layout.warnings_file),
        ];
        for (key, value) in layout {
            if !is_single_name(value) {
                return Err(ConfigError::InvalidLayoutName {
                    key,
                    value: value.clone(),
                });
            }
        }

        // Outputs and subfolders all live in the same folder.
        for (i, (first, value)) in layout.iter().enumerate() {
            if let Some((second, _)) = layout[i + 1..].iter().find(|(_, other)| other == value) {
                return Err(ConfigError::DuplicateLayoutName {
                    first: *first,
                    second: *second,
                    value: value.to_string(),
                });
            }
        }

        for (key, value) in &layout[2..] {
            if FileKind::from_name(value) == Some(FileKind::Log) {
                return Err(ConfigError::OutputNamedAsLog {
                    key: *key,
                    value: value.to_string(),
                });
            }
        }

        if self.parse.error_marker.is_empty() {
            return Err(ConfigError::EmptyMarker("error_marker"));
        }
        if self.parse.warning_marker.is_empty() {
            return Err(ConfigError::EmptyMarker("warning_marker"));
        }
        Ok(())
    }

    /// Compile the line markers for matching.
    ///
    /// # Errors
    ///
    /// Returns an error if a marker is too large to compile.
    pub fn compile_markers(&self) -> Result<CompiledMarkers, ConfigError> {
        CompiledMarkers::new(&self.parse)
    }

    /// Compile the filter rules for matching.
    ///
    /// # Errors
    ///
    /// Returns an error if any regex or glob patterns are invalid.
    pub fn compile_filters(&self) -> Result<CompiledFilters, ConfigError> {
        CompiledFilters::new(&self.filters)
    }
}

/// Line markers compiled into literal byte matchers.
///
/// Lines are matched as raw bytes, so logs need not be valid UTF-8.
#[derive(Debug, Clone)]
pub struct CompiledMarkers {
    error: bytes::Regex,
    warning: bytes::Regex,
}

impl CompiledMarkers {
    fn new(parse: &ParseConfig) -> Result<Self, ConfigError> {
        let literal = |marker: &str| {
            let pattern = regex::escape(marker);
            bytes::Regex::new(&pattern).map_err(|e| ConfigError::InvalidRegexPattern {
                pattern,
                reason: e.to_string(),
            })
        };
        Ok(Self {
            error: literal(&parse.error_marker)?,
            warning: literal(&parse.warning_marker)?,
        })
    }

    /// True when `line` contains the error marker.
    pub fn is_error(&self, line: &[u8]) -> bool {
        self.error.is_match(line)
    }

    /// True when `line` contains the warning marker.
    pub fn is_warning(&self, line: &[u8]) -> bool {
        self.warning.is_match(line)
    }
}

/// True when `value` is exactly one normal path component.
fn is_single_name(value: &str) -> bool {
    let mut components = Path::new(value).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

/// Filter rules with glob and regex patterns pre-compiled.
#[derive(Debug, Clone)]
pub struct CompiledFilters {
    enable_hidden_files: bool,
    exclude_filenames: HashSet<String>,
    exclude_patterns: Vec<Pattern>,
    exclude_regexes: Vec<Regex>,
}

impl Default for CompiledFilters {
    fn default() -> Self {
        Self {
            enable_hidden_files: true,
            exclude_filenames: HashSet::new(),
            exclude_patterns: Vec::new(),
            exclude_regexes: Vec::new(),
        }
    }
}

impl CompiledFilters {
    fn new(rules: &FilterRules) -> Result<Self, ConfigError> {
        let exclude_patterns = rules
            .exclude
            .patterns
            .iter()
            .map(|pattern| {
                Pattern::new(pattern).map_err(|_| ConfigError::InvalidGlobPattern(pattern.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let exclude_regexes = rules
            .exclude
            .regex
            .iter()
            .map(|pattern| {
                Regex::new(pattern).map_err(|e| ConfigError::InvalidRegexPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            enable_hidden_files: rules.enable_hidden_files,
            exclude_filenames: rules.exclude.filenames.iter().cloned().collect(),
            exclude_patterns,
            exclude_regexes,
        })
    }

    /// Check if an entry should be considered.
    ///
    /// Checks are performed in this order, with early termination:
    /// 1. Hidden file filter
    /// 2. Exact filename match
    /// 3. Glob pattern match
    /// 4. Regex pattern match
    pub fn should_include(&self, path: &Path) -> bool {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();

        if !self.enable_hidden_files && file_name.starts_with('.') {
            return false;
        }

        if self.exclude_filenames.contains(file_name.as_ref()) {
            return false;
        }

        if self
            .exclude_patterns
            .iter()
            .any(|pattern| pattern.matches(&file_name))
        {
            return false;
        }

        !self
            .exclude_regexes
            .iter()
            .any(|regex| regex.is_match(&file_name))
    }
}
