//! Interactive menu loop.
//!
//! The shell prints a numbered menu, reads one line per iteration, prompts for
//! whatever paths the chosen operation needs and reports the outcome. It never
//! stops on an operation failure, only on the exit choice or end of input.
//!
//! The `report_*` functions translate operation outcomes into printed messages
//! and are shared with the non-interactive subcommands.

use crate::config::LayoutConfig;
use crate::file_ops::{
    CreateOutcome, FileOps, FileTypeCounts, MoveOutcome, OpsResult, ParseReport, SortReport,
};
use crate::output::OutputFormatter;
use std::io::{self, BufRead, Write};
use std::path::Path;
use tracing::debug;

/// One entry of the menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    CreateFolder,
    MoveDocuments,
    SortDocuments,
    ParseLogs,
    CountFileTypes,
    Exit,
}

impl MenuChoice {
    /// Menu entries in display order; entry `i` is selected by `i + 1`.
    pub const ALL: [MenuChoice; 6] = [
        MenuChoice::CreateFolder,
        MenuChoice::MoveDocuments,
        MenuChoice::SortDocuments,
        MenuChoice::ParseLogs,
        MenuChoice::CountFileTypes,
        MenuChoice::Exit,
    ];

    /// Parses a menu selection (`"1"` to `"6"`, surrounding whitespace ignored).
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim() {
            "1" => Some(MenuChoice::CreateFolder),
            "2" => Some(MenuChoice::MoveDocuments),
            "3" => Some(MenuChoice::SortDocuments),
            "4" => Some(MenuChoice::ParseLogs),
            "5" => Some(MenuChoice::CountFileTypes),
            "6" => Some(MenuChoice::Exit),
            _ => None,
        }
    }

    /// Text shown for this entry in the menu.
    pub fn label(&self) -> &'static str {
        match self {
            MenuChoice::CreateFolder => "Create a new folder",
            MenuChoice::MoveDocuments => {
                "Move a deleted user's documents to a temporary folder"
            }
            MenuChoice::SortDocuments => "Sort documents into appropriate folders",
            MenuChoice::ParseLogs => "Parse log files for errors and warnings",
            MenuChoice::CountFileTypes => {
                "Count the number of specific file types in a directory"
            }
            MenuChoice::Exit => "Exit",
        }
    }
}

/// The interactive command loop.
pub struct Shell<R, W: Write> {
    ops: FileOps,
    input: R,
    output: OutputFormatter<W>,
}

impl<R: BufRead, W: Write> Shell<R, W> {
    /// Creates a shell reading choices from `input` and printing to `output`.
    pub fn new(ops: FileOps, input: R, output: W) -> Self {
        Self {
            ops,
            input,
            output: OutputFormatter::new(output),
        }
    }

    /// Runs the menu until the exit choice is selected or input ends.
    ///
    /// # Errors
    ///
    /// Only failures to read the terminal or write the menu are returned;
    /// operation failures are printed and the loop continues.
    pub fn run(&mut self) -> io::Result<()> {
        loop {
            self.print_menu()?;
            let Some(line) = self.read_line("Enter your choice (1-6): ")? else {
                self.output.plain("")?;
                break;
            };

            match MenuChoice::parse(&line) {
                Some(MenuChoice::Exit) => break,
                Some(choice) => self.dispatch(choice)?,
                None => self
                    .output
                    .error("Invalid choice. Please enter a number between 1 and 6.")?,
            }
        }
        self.output.plain("Exiting...")
    }

    /// Consumes the shell, returning the output writer.
    pub fn into_output(self) -> W {
        self.output.into_inner()
    }

    fn print_menu(&mut self) -> io::Result<()> {
        self.output.header("Automation Tasks:")?;
        for (index, choice) in MenuChoice::ALL.iter().enumerate() {
            self.output
                .plain(&format!("{}. {}", index + 1, choice.label()))?;
        }
        Ok(())
    }

    /// Prompts for and runs one operation.
    ///
    /// End of input while prompting abandons the operation; the next menu
    /// read then sees the end of input and exits.
    fn dispatch(&mut self, choice: MenuChoice) -> io::Result<()> {
        debug!(?choice, "menu dispatch");
        match choice {
            MenuChoice::CreateFolder => {
                let Some(folder) = self.read_line("Enter the name of the new folder: ")? else {
                    return Ok(());
                };
                let result = self.ops.create_folder(Path::new(&folder));
                report_create(&mut self.output, &folder, result)?;
            }
            MenuChoice::MoveDocuments => {
                let Some(user_folder) =
                    self.read_line("Enter the user's folder to move documents from: ")?
                else {
                    return Ok(());
                };
                let Some(temp_folder) = self.read_line("Enter the temporary folder name: ")?
                else {
                    return Ok(());
                };
                let result = self
                    .ops
                    .move_user_documents(Path::new(&user_folder), Path::new(&temp_folder));
                report_move(&mut self.output, &user_folder, &temp_folder, result)?;
            }
            MenuChoice::SortDocuments => {
                let Some(folder) =
                    self.read_line("Enter the path of the folder to sort documents in: ")?
                else {
                    return Ok(());
                };
                let result = self.ops.sort_documents(Path::new(&folder));
                report_sort(&mut self.output, self.ops.layout(), &folder, result)?;
            }
            MenuChoice::ParseLogs => {
                let Some(folder) = self.read_line("Enter the logs folder path to parse: ")? else {
                    return Ok(());
                };
                let result = self.ops.parse_log_files(Path::new(&folder));
                report_parse(&mut self.output, self.ops.layout(), &folder, result)?;
            }
            MenuChoice::CountFileTypes => {
                let Some(directory) =
                    self.read_line("Enter the directory to count file types in: ")?
                else {
                    return Ok(());
                };
                let result = self.ops.count_file_types(Path::new(&directory));
                report_count(&mut self.output, result)?;
            }
            MenuChoice::Exit => {}
        }
        Ok(())
    }

    /// Prints `prompt` and reads one line without its line ending.
    /// Returns `None` at end of input. Input need not be valid UTF-8.
    fn read_line(&mut self, prompt: &str) -> io::Result<Option<String>> {
        self.output.prompt(prompt)?;
        let mut line = Vec::new();
        if self.input.read_until(b'\n', &mut line)? == 0 {
            return Ok(None);
        }
        // Undecodable bytes become U+FFFD and fall through as invalid input.
        let line = String::from_utf8_lossy(&line);
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }
}

/// Prints the result of creating a folder. Returns true on success.
pub fn report_create<W: Write>(
    out: &mut OutputFormatter<W>,
    folder: &str,
    result: OpsResult<CreateOutcome>,
) -> io::Result<bool> {
    match result {
        Ok(CreateOutcome::Created) => out.success(&format!("Folder '{}' created.", folder))?,
        Ok(CreateOutcome::AlreadyExisted) => {
            out.info(&format!("Folder '{}' already exists.", folder))?
        }
        Err(e) => {
            out.error(&e.to_string())?;
            return Ok(false);
        }
    }
    Ok(true)
}

/// Prints the result of moving a user's documents. Returns true when every
/// entry was moved, or when there was nothing to move.
pub fn report_move<W: Write>(
    out: &mut OutputFormatter<W>,
    user_folder: &str,
    temp_folder: &str,
    result: OpsResult<MoveOutcome>,
) -> io::Result<bool> {
    let (destination_created, report) = match result {
        Ok(MoveOutcome::Moved(report)) => (report.destination_created, report),
        Ok(MoveOutcome::SourceMissing {
            destination_created,
        }) => {
            if destination_created {
                out.info(&format!("Folder '{}' created.", temp_folder))?;
            }
            out.warning(&format!("User folder '{}' does not exist.", user_folder))?;
            return Ok(true);
        }
        Err(e) => {
            out.error(&e.to_string())?;
            return Ok(false);
        }
    };

    if destination_created {
        out.info(&format!("Folder '{}' created.", temp_folder))?;
    }
    if report.is_complete_success() {
        out.success(&format!(
            "Documents from '{}' have been moved to '{}'.",
            user_folder, temp_folder
        ))?;
        return Ok(true);
    }

    out.warning(&format!(
        "Moved {} of {} entries from '{}' to '{}'.",
        report.moved.len(),
        report.moved.len() + report.failed.len(),
        user_folder,
        temp_folder
    ))?;
    for (path, reason) in &report.failed {
        out.error(&format!("{}: {}", path.display(), reason))?;
    }
    Ok(false)
}

/// Prints the result of sorting a folder. Returns true when nothing failed.
pub fn report_sort<W: Write>(
    out: &mut OutputFormatter<W>,
    layout: &LayoutConfig,
    folder: &str,
    result: OpsResult<SortReport>,
) -> io::Result<bool> {
    let report = match result {
        Ok(report) => report,
        Err(e) => {
            out.error(&e.to_string())?;
            return Ok(false);
        }
    };

    out.success(&format!(
        "Sorted '{}': {} to {}/, {} to {}/.",
        folder,
        plural(report.logs.len(), "log file"),
        layout.logs_dir,
        plural(report.mail.len(), "mail file"),
        layout.mail_dir
    ))?;
    for (path, reason) in &report.failed {
        out.error(&format!("{}: {}", path.display(), reason))?;
    }
    Ok(report.failed.is_empty())
}

/// Prints the result of parsing logs. Returns true on success.
pub fn report_parse<W: Write>(
    out: &mut OutputFormatter<W>,
    layout: &LayoutConfig,
    folder: &str,
    result: OpsResult<ParseReport>,
) -> io::Result<bool> {
    match result {
        Ok(report) => {
            out.success(&format!(
                "Parsed {} in '{}': {} to {}, {} to {}.",
                plural(report.files_scanned, "log file"),
                folder,
                plural(report.error_lines, "error line"),
                layout.errors_file,
                plural(report.warning_lines, "warning line"),
                layout.warnings_file
            ))?;
            Ok(true)
        }
        Err(e) => {
            out.error(&e.to_string())?;
            Ok(false)
        }
    }
}

/// Prints one row per file kind, zeros included. Returns true on success.
pub fn report_count<W: Write>(
    out: &mut OutputFormatter<W>,
    result: OpsResult<FileTypeCounts>,
) -> io::Result<bool> {
    match result {
        Ok(counts) => {
            for (kind, count) in counts.iter() {
                out.count_row(kind.suffix(), count)?;
            }
            Ok(true)
        }
        Err(e) => {
            out.error(&e.to_string())?;
            Ok(false)
        }
    }
}

fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("1 {}", noun)
    } else {
        format!("{} {}s", count, noun)
    }
}
