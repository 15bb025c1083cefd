//! fileops - menu-driven file-system housekeeping
//!
//! This library provides the operations behind the `fileops` tool: creating
//! folders, moving a user's documents to a holding folder, sorting logs and
//! mail into subfolders, splitting log lines into error and warning files,
//! and counting files by kind. Behaviour can be adjusted through a TOML
//! configuration file.

pub mod cli;
pub mod config;
pub mod file_kind;
pub mod file_ops;
pub mod output;
pub mod shell;

pub use config::{CompiledFilters, ConfigError, ToolConfig};
pub use file_kind::FileKind;
pub use file_ops::{
    CreateOutcome, FileOps, FileTypeCounts, MoveOutcome, MoveReport, OpsError, OpsResult,
    ParseReport, SortReport,
};
pub use shell::{MenuChoice, Shell};

pub use cli::{Cli, run_cli};
