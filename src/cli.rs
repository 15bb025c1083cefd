//! Command-line interface module for fileops.
//!
//! Without a subcommand the interactive menu runs. Each menu operation is also
//! available as a subcommand for scripted use; subcommands report through the
//! same messages as the menu and signal failure through the exit status.

use crate::config::ToolConfig;
use crate::file_ops::FileOps;
use crate::output::OutputFormatter;
use crate::shell::{self, Shell};
use clap::{Parser, Subcommand};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

#[derive(Debug, Parser)]
#[command(name = "fileops", version, about = "File-system housekeeping tasks")]
pub struct Cli {
    /// Configuration file (defaults to .fileopsrc.toml, then ~/.config/fileops/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Print debug diagnostics on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Create a folder, including missing parents
    Create { folder: PathBuf },
    /// Move every entry of a user's folder into a temporary folder
    Move {
        user_folder: PathBuf,
        temp_folder: PathBuf,
    },
    /// Sort .log.txt and .mail files into their subfolders
    Sort { folder: PathBuf },
    /// Split ERROR and WARNING lines of .log.txt files into separate files
    Parse { folder: PathBuf },
    /// Count .txt, .mail and .log.txt files
    Count {
        directory: PathBuf,
        /// Print the counts as a JSON object
        #[arg(long)]
        json: bool,
    },
}

/// Runs the CLI. Returns whether the requested work succeeded.
///
/// # Errors
///
/// Returns a message if the configuration cannot be loaded or the terminal
/// cannot be read or written.
pub fn run_cli(cli: Cli) -> Result<bool, String> {
    let config = ToolConfig::load(cli.config.as_deref())
        .map_err(|e| format!("Error loading configuration: {}", e))?;
    let ops = FileOps::new(&config).map_err(|e| format!("Error in configuration: {}", e))?;

    match cli.command {
        None => {
            let stdin = io::stdin();
            let mut shell = Shell::new(ops, stdin.lock(), io::stdout());
            shell.run().map_err(|e| format!("Terminal error: {}", e))?;
            Ok(true)
        }
        Some(command) => {
            let mut out = OutputFormatter::stdout();
            run_command(&ops, command, &mut out).map_err(|e| format!("Output error: {}", e))
        }
    }
}

/// Runs one subcommand, writing its report to `out`.
pub fn run_command<W: Write>(
    ops: &FileOps,
    command: Command,
    out: &mut OutputFormatter<W>,
) -> io::Result<bool> {
    match command {
        Command::Create { folder } => {
            shell::report_create(out, &display(&folder), ops.create_folder(&folder))
        }
        Command::Move {
            user_folder,
            temp_folder,
        } => shell::report_move(
            out,
            &display(&user_folder),
            &display(&temp_folder),
            ops.move_user_documents(&user_folder, &temp_folder),
        ),
        Command::Sort { folder } => shell::report_sort(
            out,
            ops.layout(),
            &display(&folder),
            ops.sort_documents(&folder),
        ),
        Command::Parse { folder } => shell::report_parse(
            out,
            ops.layout(),
            &display(&folder),
            ops.parse_log_files(&folder),
        ),
        Command::Count { directory, json } => {
            let result = ops.count_file_types(&directory);
            match result {
                Ok(counts) if json => {
                    let text = serde_json::to_string(&counts)
                        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
                    out.plain(&text)?;
                    Ok(true)
                }
                other => shell::report_count(out, other),
            }
        }
    }
}

fn display(path: &Path) -> String {
    path.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_no_subcommand_means_menu() {
        let cli = Cli::try_parse_from(["fileops", "--no-color"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.no_color);
    }

    #[test]
    fn test_parse_count_with_json() {
        let cli = Cli::try_parse_from(["fileops", "count", "/tmp", "--json"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Command::Count { json: true, .. })
        ));
    }

    #[test]
    fn test_count_json_output() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        fs::write(temp_dir.path().join("a.txt"), "").unwrap();
        fs::write(temp_dir.path().join("b.log.txt"), "").unwrap();

        let mut out = OutputFormatter::new(Vec::new());
        let ok = run_command(
            &FileOps::default(),
            Command::Count {
                directory: temp_dir.path().to_path_buf(),
                json: true,
            },
            &mut out,
        )
        .unwrap();

        assert!(ok);
        let text = String::from_utf8(out.into_inner()).unwrap();
        assert_eq!(text, "{\".txt\":1,\".mail\":0,\".log.txt\":1}\n");
    }

    #[test]
    fn test_failed_command_reports_false() {
        let mut out = OutputFormatter::new(Vec::new());
        let ok = run_command(
            &FileOps::default(),
            Command::Sort {
                folder: PathBuf::from("/non/existent/fileops/dir"),
            },
            &mut out,
        )
        .unwrap();
        assert!(!ok);
    }
}
