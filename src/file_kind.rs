/// File classification by literal name suffix.
///
/// Three kinds of file are recognised: compound `.log.txt` logs, `.mail`
/// messages, and plain `.txt` text. Matching is case-sensitive and always picks
/// the most specific suffix, so `a.log.txt` is a log and never plain text.
///
/// # Examples
///
/// ```
/// use fileops::file_kind::FileKind;
///
/// assert_eq!(FileKind::from_name("a.log.txt"), Some(FileKind::Log));
/// assert_eq!(FileKind::from_name("b.mail"), Some(FileKind::Mail));
/// assert_eq!(FileKind::from_name("c.txt"), Some(FileKind::Text));
/// assert_eq!(FileKind::from_name("d.LOG.TXT"), None);
/// ```
use std::path::Path;

/// A recognised file kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    /// Plain text files (`.txt`, but not `.log.txt`)
    Text,
    /// Mail files (`.mail`)
    Mail,
    /// Log files (`.log.txt`)
    Log,
}

impl FileKind {
    /// All kinds in reporting order.
    pub const ALL: [FileKind; 3] = [FileKind::Text, FileKind::Mail, FileKind::Log];

    /// Candidates checked when classifying, most specific suffix first.
    const BY_SPECIFICITY: [FileKind; 3] = [FileKind::Log, FileKind::Mail, FileKind::Text];

    /// Returns the literal suffix for this kind, including the leading dot.
    ///
    /// ```
    /// use fileops::file_kind::FileKind;
    ///
    /// assert_eq!(FileKind::Log.suffix(), ".log.txt");
    /// ```
    pub fn suffix(&self) -> &'static str {
        match self {
            FileKind::Text => ".txt",
            FileKind::Mail => ".mail",
            FileKind::Log => ".log.txt",
        }
    }

    /// Classifies a file name.
    ///
    /// A suffix only counts when a non-empty stem precedes it, so a bare
    /// `.mail` is a hidden file without an extension.
    pub fn from_name(name: &str) -> Option<FileKind> {
        Self::BY_SPECIFICITY.into_iter().find(|kind| {
            name.strip_suffix(kind.suffix())
                .is_some_and(|stem| !stem.is_empty())
        })
    }

    /// Classifies the final component of a path.
    ///
    /// Names that are not valid UTF-8 are never recognised.
    pub fn from_path(path: &Path) -> Option<FileKind> {
        path.file_name()
            .and_then(|name| name.to_str())
            .and_then(Self::from_name)
    }
}

impl std::fmt::Display for FileKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.suffix())
    }
}
