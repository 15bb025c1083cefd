/// File-system housekeeping operations.
///
/// This module provides the five operations the tool offers: creating a
/// folder, moving a user's documents to a holding folder, sorting logs and mail
/// into subfolders, splitting log lines into error and warning files, and
/// counting files by kind. Every operation returns an explicit outcome or an
/// [`OpsError`]; expected situations such as an existing folder are outcomes,
/// not errors.
use crate::config::{CompiledFilters, CompiledMarkers, ConfigError, LayoutConfig, ToolConfig};
use crate::file_kind::FileKind;
use crate::output::create_progress_bar;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Errors that can occur during file operations.
#[derive(Debug)]
pub enum OpsError {
    /// The folder an operation reads from does not exist.
    SourceNotFound { path: PathBuf },
    /// A path that must be a folder is something else.
    NotADirectory { path: PathBuf },
    /// Failed to create a folder.
    DirectoryCreationFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to list the entries of a folder.
    ReadDirFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    /// An entry with the same name is already present at the destination.
    DestinationOccupied { path: PathBuf },
    /// Failed to move an entry.
    EntryMoveFailed {
        source: PathBuf,
        destination: PathBuf,
        source_error: std::io::Error,
    },
    /// Failed to create or truncate an output file.
    OutputOpenFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to read a log file.
    LogReadFailed {
        path: PathBuf,
        source: std::io::Error,
    },
    /// Failed to write to an output file.
    OutputWriteFailed {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl std::fmt::Display for OpsError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SourceNotFound { path } => {
                write!(f, "Folder '{}' does not exist", path.display())
            }
            Self::NotADirectory { path } => {
                write!(f, "'{}' is not a folder", path.display())
            }
            Self::DirectoryCreationFailed { path, source } => {
                write!(
                    f,
                    "Failed to create folder '{}': {}",
                    path.display(),
                    source
                )
            }
            Self::ReadDirFailed { path, source } => {
                write!(f, "Failed to read folder '{}': {}", path.display(), source)
            }
            Self::DestinationOccupied { path } => {
                write!(f, "'{}' already exists, not overwriting", path.display())
            }
            Self::EntryMoveFailed {
                source,
                destination,
                source_error,
            } => {
                write!(
                    f,
                    "Failed to move {} to {}: {}",
                    source.display(),
                    destination.display(),
                    source_error
                )
            }
            Self::OutputOpenFailed { path, source } => {
                write!(f, "Failed to open '{}' for writing: {}", path.display(), source)
            }
            Self::LogReadFailed { path, source } => {
                write!(f, "Failed to read log '{}': {}", path.display(), source)
            }
            Self::OutputWriteFailed { path, source } => {
                write!(f, "Failed to write '{}': {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for OpsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::DirectoryCreationFailed { source, .. }
            | Self::ReadDirFailed { source, .. }
            | Self::OutputOpenFailed { source, .. }
            | Self::LogReadFailed { source, .. }
            | Self::OutputWriteFailed { source, .. } => Some(source),
            Self::EntryMoveFailed { source_error, .. } => Some(source_error),
            Self::SourceNotFound { .. }
            | Self::NotADirectory { .. }
            | Self::DestinationOccupied { .. } => None,
        }
    }
}

/// Result type for file operations.
pub type OpsResult<T> = Result<T, OpsError>;

/// Outcome of creating a folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    /// The folder (and any missing parents) was created.
    Created,
    /// The folder was already there; nothing changed.
    AlreadyExisted,
}

/// Entries relocated by a document move.
#[derive(Debug, Default)]
pub struct MoveReport {
    /// Whether the destination folder had to be created.
    pub destination_created: bool,
    /// New locations of the entries that were moved.
    pub moved: Vec<PathBuf>,
    /// Entries that stayed in the source, with the reason.
    pub failed: Vec<(PathBuf, String)>,
}

impl MoveReport {
    /// Returns true if every entry was moved.
    pub fn is_complete_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Outcome of moving a user's documents.
#[derive(Debug)]
pub enum MoveOutcome {
    /// The source existed and its entries were processed.
    Moved(MoveReport),
    /// The source folder does not exist; nothing was moved.
    SourceMissing {
        /// Whether the destination folder had to be created.
        destination_created: bool,
    },
}

/// Files relocated by a sort.
#[derive(Debug, Default)]
pub struct SortReport {
    /// Log files now in the logs folder.
    pub logs: Vec<PathBuf>,
    /// Mail files now in the mail folder.
    pub mail: Vec<PathBuf>,
    /// Files that could not be moved, with the reason.
    pub failed: Vec<(PathBuf, String)>,
}

/// Totals from splitting log files.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ParseReport {
    /// Number of log files read.
    pub files_scanned: usize,
    /// Lines written to the errors file.
    pub error_lines: usize,
    /// Lines written to the warnings file.
    pub warning_lines: usize,
}

/// Per-kind file counts for one directory.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FileTypeCounts {
    pub text: usize,
    pub mail: usize,
    pub log: usize,
}

impl FileTypeCounts {
    /// Returns the count for one kind.
    pub fn get(&self, kind: FileKind) -> usize {
        match kind {
            FileKind::Text => self.text,
            FileKind::Mail => self.mail,
            FileKind::Log => self.log,
        }
    }

    fn increment(&mut self, kind: FileKind) {
        match kind {
            FileKind::Text => self.text += 1,
            FileKind::Mail => self.mail += 1,
            FileKind::Log => self.log += 1,
        }
    }

    /// Iterates `(kind, count)` pairs in reporting order, zeros included.
    pub fn iter(&self) -> impl Iterator<Item = (FileKind, usize)> + '_ {
        FileKind::ALL.into_iter().map(|kind| (kind, self.get(kind)))
    }
}

impl Serialize for FileTypeCounts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(FileKind::ALL.len()))?;
        for (kind, count) in self.iter() {
            map.serialize_entry(kind.suffix(), &count)?;
        }
        map.end()
    }
}

/// Runs the housekeeping operations with a given configuration.
///
/// # Examples
///
/// ```no_run
/// use fileops::file_ops::{CreateOutcome, FileOps};
/// use std::path::Path;
///
/// let ops = FileOps::default();
/// match ops.create_folder(Path::new("archive/2024")) {
///     Ok(CreateOutcome::Created) => println!("created"),
///     Ok(CreateOutcome::AlreadyExisted) => println!("already there"),
///     Err(e) => eprintln!("{}", e),
/// }
/// ```
#[derive(Debug, Clone)]
pub struct FileOps {
    layout: LayoutConfig,
    markers: CompiledMarkers,
    filters: CompiledFilters,
}

impl Default for FileOps {
    fn default() -> Self {
        Self::new(&ToolConfig::default()).expect("default configuration is valid")
    }
}

impl FileOps {
    /// Builds the operations from a loaded configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or its markers or
    /// filter patterns fail to compile.
    pub fn new(config: &ToolConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            layout: config.layout.clone(),
            markers: config.compile_markers()?,
            filters: config.compile_filters()?,
        })
    }

    /// Folder and output file names in effect.
    pub fn layout(&self) -> &LayoutConfig {
        &self.layout
    }

    /// Creates a folder and any missing parents.
    ///
    /// Returns [`CreateOutcome::AlreadyExisted`] without touching the file
    /// system when the folder is already present.
    pub fn create_folder(&self, path: &Path) -> OpsResult<CreateOutcome> {
        if path.is_dir() {
            debug!(path = %path.display(), "folder already exists");
            return Ok(CreateOutcome::AlreadyExisted);
        }
        if path.exists() {
            return Err(OpsError::NotADirectory {
                path: path.to_path_buf(),
            });
        }

        fs::create_dir_all(path).map_err(|e| OpsError::DirectoryCreationFailed {
            path: path.to_path_buf(),
            source: e,
        })?;
        info!(path = %path.display(), "folder created");
        Ok(CreateOutcome::Created)
    }

    /// Moves every direct entry of `user_folder` into `temp_folder`.
    ///
    /// The destination is created first if needed, even when the source turns
    /// out to be missing. Subfolders move as whole units. An entry whose name
    /// is already taken at the destination is left in place and reported in
    /// [`MoveReport::failed`]; the remaining entries are still moved.
    ///
    /// # Errors
    ///
    /// Fails only when the destination cannot be created, the source is not a
    /// folder, or the source cannot be listed.
    pub fn move_user_documents(
        &self,
        user_folder: &Path,
        temp_folder: &Path,
    ) -> OpsResult<MoveOutcome> {
        let destination_created = self.create_folder(temp_folder)? == CreateOutcome::Created;

        if !user_folder.exists() {
            info!(source = %user_folder.display(), "user folder missing, nothing to move");
            return Ok(MoveOutcome::SourceMissing {
                destination_created,
            });
        }
        if !user_folder.is_dir() {
            return Err(OpsError::NotADirectory {
                path: user_folder.to_path_buf(),
            });
        }

        let entries = list_entries(user_folder)?;
        // The destination may itself live inside the source.
        let destination_in_source = fs::canonicalize(temp_folder).ok().and_then(|dest| {
            let parent = fs::canonicalize(user_folder).ok()?;
            let name = dest.file_name()?.to_os_string();
            (dest.parent() == Some(parent.as_path())).then_some(name)
        });

        let mut report = MoveReport {
            destination_created,
            ..Default::default()
        };
        let pb = create_progress_bar(entries.len() as u64);

        for entry in entries {
            if destination_in_source.as_deref() == entry.file_name() {
                debug!(entry = %entry.display(), "skipping destination folder");
                pb.inc(1);
                continue;
            }
            match move_entry(&entry, temp_folder) {
                Ok(new_path) => report.moved.push(new_path),
                Err(e) => {
                    warn!(entry = %entry.display(), error = %e, "entry not moved");
                    report.failed.push((entry, e.to_string()));
                }
            }
            pb.inc(1);
        }
        pb.finish_and_clear();

        info!(
            source = %user_folder.display(),
            destination = %temp_folder.display(),
            moved = report.moved.len(),
            failed = report.failed.len(),
            "user documents moved"
        );
        Ok(MoveOutcome::Moved(report))
    }

    /// Moves `.log.txt` files into the logs subfolder and `.mail` files into
    /// the mail subfolder of `folder`.
    ///
    /// Both subfolders are created even when nothing matches. Only direct
    /// children that are files are considered; everything else stays put.
    pub fn sort_documents(&self, folder: &Path) -> OpsResult<SortReport> {
        ensure_source_dir(folder)?;

        let logs_path = folder.join(&self.layout.logs_dir);
        let mail_path = folder.join(&self.layout.mail_dir);
        for path in [&logs_path, &mail_path] {
            self.create_folder(path)?;
        }

        let mut report = SortReport::default();
        for entry in self.candidate_files(folder)? {
            let (target, moved) = match FileKind::from_path(&entry) {
                Some(FileKind::Log) => (&logs_path, &mut report.logs),
                Some(FileKind::Mail) => (&mail_path, &mut report.mail),
                _ => continue,
            };
            match move_entry(&entry, target) {
                Ok(new_path) => {
                    debug!(from = %entry.display(), to = %new_path.display(), "sorted");
                    moved.push(new_path);
                }
                Err(e) => {
                    warn!(entry = %entry.display(), error = %e, "file not sorted");
                    report.failed.push((entry, e.to_string()));
                }
            }
        }

        info!(
            folder = %folder.display(),
            logs = report.logs.len(),
            mail = report.mail.len(),
            "documents sorted"
        );
        Ok(report)
    }

    /// Splits the lines of every `.log.txt` file in `folder` into the errors
    /// and warnings output files inside the same folder.
    ///
    /// Both outputs are truncated first, so the result depends only on the
    /// current logs. A line containing the error marker goes to the errors
    /// file even if it also contains the warning marker; lines with neither
    /// marker are dropped. Logs are read in name order.
    ///
    /// # Errors
    ///
    /// Any failure opening, reading or writing aborts the whole operation.
    pub fn parse_log_files(&self, folder: &Path) -> OpsResult<ParseReport> {
        ensure_source_dir(folder)?;

        let errors_path = folder.join(&self.layout.errors_file);
        let warnings_path = folder.join(&self.layout.warnings_file);
        let mut errors = open_output(&errors_path)?;
        let mut warnings = open_output(&warnings_path)?;

        let mut report = ParseReport::default();

        for log_file in self.candidate_files(folder)? {
            // Output names never classify as logs; validation rejects them.
            if FileKind::from_path(&log_file) != Some(FileKind::Log) {
                continue;
            }
            debug!(log = %log_file.display(), "scanning log");

            let read_err = |e| OpsError::LogReadFailed {
                path: log_file.clone(),
                source: e,
            };
            let mut reader = BufReader::new(File::open(&log_file).map_err(read_err)?);
            let mut line = Vec::new();
            loop {
                line.clear();
                if reader.read_until(b'\n', &mut line).map_err(read_err)? == 0 {
                    break;
                }
                if !line.ends_with(b"\n") {
                    line.push(b'\n');
                }

                if self.markers.is_error(&line) {
                    write_line(&mut errors, &errors_path, &line)?;
                    report.error_lines += 1;
                } else if self.markers.is_warning(&line) {
                    write_line(&mut warnings, &warnings_path, &line)?;
                    report.warning_lines += 1;
                }
            }
            report.files_scanned += 1;
        }

        flush_output(&mut errors, &errors_path)?;
        flush_output(&mut warnings, &warnings_path)?;

        info!(
            folder = %folder.display(),
            files = report.files_scanned,
            errors = report.error_lines,
            warnings = report.warning_lines,
            "log files parsed"
        );
        Ok(report)
    }

    /// Counts the direct child files of `directory` by kind.
    ///
    /// Each file lands in at most one bucket, chosen by its most specific
    /// suffix, so `a.log.txt` counts as a log and not as text.
    pub fn count_file_types(&self, directory: &Path) -> OpsResult<FileTypeCounts> {
        ensure_source_dir(directory)?;

        let mut counts = FileTypeCounts::default();
        for file in self.candidate_files(directory)? {
            if let Some(kind) = FileKind::from_path(&file) {
                counts.increment(kind);
            }
        }
        debug!(directory = %directory.display(), ?counts, "file types counted");
        Ok(counts)
    }

    /// Direct child files of `folder` that pass the configured filters.
    fn candidate_files(&self, folder: &Path) -> OpsResult<Vec<PathBuf>> {
        Ok(list_entries(folder)?
            .into_iter()
            .filter(|path| path.is_file() && self.filters.should_include(path))
            .collect())
    }
}

/// Fails unless `folder` exists and is a folder.
fn ensure_source_dir(folder: &Path) -> OpsResult<()> {
    if !folder.exists() {
        return Err(OpsError::SourceNotFound {
            path: folder.to_path_buf(),
        });
    }
    if !folder.is_dir() {
        return Err(OpsError::NotADirectory {
            path: folder.to_path_buf(),
        });
    }
    Ok(())
}

/// Lists the direct entries of a folder, sorted by name.
fn list_entries(folder: &Path) -> OpsResult<Vec<PathBuf>> {
    let entries = fs::read_dir(folder).map_err(|e| OpsError::ReadDirFailed {
        path: folder.to_path_buf(),
        source: e,
    })?;
    let mut paths = entries
        .map(|entry| entry.map(|entry| entry.path()))
        .collect::<io::Result<Vec<PathBuf>>>()
        .map_err(|e| OpsError::ReadDirFailed {
            path: folder.to_path_buf(),
            source: e,
        })?;
    paths.sort();
    Ok(paths)
}

/// Moves one entry into `destination_dir`, keeping its name.
///
/// Never replaces an existing entry. Falls back to copy-then-remove when a
/// plain rename cannot cross file systems.
fn move_entry(entry: &Path, destination_dir: &Path) -> OpsResult<PathBuf> {
    let file_name = entry.file_name().ok_or_else(|| OpsError::EntryMoveFailed {
        source: entry.to_path_buf(),
        destination: destination_dir.to_path_buf(),
        source_error: io::Error::new(io::ErrorKind::InvalidInput, "entry has no name component"),
    })?;
    let destination = destination_dir.join(file_name);

    if fs::symlink_metadata(&destination).is_ok() {
        return Err(OpsError::DestinationOccupied { path: destination });
    }

    let moved = match fs::rename(entry, &destination) {
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            debug!(entry = %entry.display(), "rename crosses devices, copying");
            copy_then_remove(entry, &destination)
        }
        other => other,
    };
    moved.map_err(|e| OpsError::EntryMoveFailed {
        source: entry.to_path_buf(),
        destination: destination.clone(),
        source_error: e,
    })?;

    Ok(destination)
}

fn copy_then_remove(source: &Path, destination: &Path) -> io::Result<()> {
    if fs::symlink_metadata(source)?.is_dir() {
        copy_dir(source, destination)?;
        fs::remove_dir_all(source)
    } else {
        fs::copy(source, destination)?;
        fs::remove_file(source)
    }
}

fn copy_dir(source: &Path, destination: &Path) -> io::Result<()> {
    fs::create_dir(destination)?;
    for entry in fs::read_dir(source)? {
        let entry = entry?;
        let target = destination.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_dir(&entry.path(), &target)?;
        } else {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

fn open_output(path: &Path) -> OpsResult<BufWriter<File>> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(|e| OpsError::OutputOpenFailed {
            path: path.to_path_buf(),
            source: e,
        })
}

fn write_line(out: &mut BufWriter<File>, path: &Path, line: &[u8]) -> OpsResult<()> {
    out.write_all(line).map_err(|e| OpsError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    })
}

fn flush_output(out: &mut BufWriter<File>, path: &Path) -> OpsResult<()> {
    out.flush().map_err(|e| OpsError::OutputWriteFailed {
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_create_folder_nested_then_idempotent() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let nested = temp_dir.path().join("a").join("b").join("c");
        let ops = FileOps::default();

        assert_eq!(ops.create_folder(&nested).unwrap(), CreateOutcome::Created);
        assert!(nested.is_dir());
        assert_eq!(
            ops.create_folder(&nested).unwrap(),
            CreateOutcome::AlreadyExisted
        );
    }

    #[test]
    fn test_create_folder_over_file_fails() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let file_path = temp_dir.path().join("taken");
        fs::write(&file_path, "x").unwrap();

        let result = FileOps::default().create_folder(&file_path);
        assert!(matches!(result, Err(OpsError::NotADirectory { .. })));
    }

    #[test]
    fn test_move_entry_refuses_to_overwrite() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let dest = temp_dir.path().join("dest");
        fs::create_dir(&dest).unwrap();
        fs::write(dest.join("a.txt"), "old").unwrap();
        let source = temp_dir.path().join("a.txt");
        fs::write(&source, "new").unwrap();

        let result = move_entry(&source, &dest);
        assert!(matches!(result, Err(OpsError::DestinationOccupied { .. })));
        assert_eq!(fs::read_to_string(dest.join("a.txt")).unwrap(), "old");
        assert_eq!(fs::read_to_string(&source).unwrap(), "new");
    }

    #[test]
    fn test_copy_then_remove_directory() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let source = temp_dir.path().join("src");
        fs::create_dir_all(source.join("inner")).unwrap();
        fs::write(source.join("inner").join("deep.txt"), "deep").unwrap();
        fs::write(source.join("top.mail"), "top").unwrap();
        let destination = temp_dir.path().join("dst");

        copy_then_remove(&source, &destination).unwrap();

        assert!(!source.exists());
        assert_eq!(
            fs::read_to_string(destination.join("inner").join("deep.txt")).unwrap(),
            "deep"
        );
        assert_eq!(
            fs::read_to_string(destination.join("top.mail")).unwrap(),
            "top"
        );
    }

    #[test]
    fn test_list_entries_sorted_and_errors_propagate() {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        fs::write(temp_dir.path().join("b.mail"), "").unwrap();
        fs::write(temp_dir.path().join("a.txt"), "").unwrap();

        let entries = list_entries(temp_dir.path()).unwrap();
        assert_eq!(
            entries,
            vec![temp_dir.path().join("a.txt"), temp_dir.path().join("b.mail")]
        );

        let result = list_entries(&temp_dir.path().join("a.txt"));
        assert!(matches!(result, Err(OpsError::ReadDirFailed { .. })));
    }

    #[test]
    fn test_counts_serialize_in_reporting_order() {
        let counts = FileTypeCounts {
            text: 2,
            mail: 1,
            log: 0,
        };
        let json = serde_json::to_string(&counts).unwrap();
        assert_eq!(json, r#"{".txt":2,".mail":1,".log.txt":0}"#);
    }

    #[test]
    fn test_source_missing_errors() {
        let ops = FileOps::default();
        let missing = Path::new("/non/existent/fileops/path");
        assert!(matches!(
            ops.sort_documents(missing),
            Err(OpsError::SourceNotFound { .. })
        ));
        assert!(matches!(
            ops.parse_log_files(missing),
            Err(OpsError::SourceNotFound { .. })
        ));
        assert!(matches!(
            ops.count_file_types(missing),
            Err(OpsError::SourceNotFound { .. })
        ));
    }
}
