use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of a directory entry, mapped from each provider's own vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    File,
    Directory,
    Symlink,
    Submodule,
}

impl EntryType {
    /// Map a contents-API `type` field (Gitea, GitHub).
    ///
    /// Unknown values are treated as files.
    pub fn from_contents_type(value: &str) -> Self {
        match value {
            "dir" => EntryType::Directory,
            "symlink" => EntryType::Symlink,
            "submodule" => EntryType::Submodule,
            _ => EntryType::File,
        }
    }

    /// Map a git tree entry (`blob`/`tree`/`commit`) and its file mode.
    pub fn from_git_tree(kind: &str, mode: &str) -> Self {
        match kind {
            "tree" => EntryType::Directory,
            "commit" => EntryType::Submodule,
            _ if mode == "120000" => EntryType::Symlink,
            _ => EntryType::File,
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryType::File => write!(f, "file"),
            EntryType::Directory => write!(f, "dir"),
            EntryType::Symlink => write!(f, "symlink"),
            EntryType::Submodule => write!(f, "submodule"),
        }
    }
}

/// One immediate child of a listed directory at a given commit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileListingEntry {
    /// Full repo-relative path
    pub path: String,
    /// Base name
    pub name: String,
    #[serde(rename = "type")]
    pub entry_type: EntryType,
}

impl FileListingEntry {
    pub fn new(path: impl Into<String>, name: impl Into<String>, entry_type: EntryType) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
            entry_type,
        }
    }

    /// Build an entry whose name is the last segment of `path`.
    pub fn from_path(path: impl Into<String>, entry_type: EntryType) -> Self {
        let path = path.into();
        let trimmed = path.trim_end_matches('/');
        let name = trimmed.rsplit('/').next().unwrap_or(trimmed).to_string();
        let path = trimmed.to_string();
        Self {
            path,
            name,
            entry_type,
        }
    }

    pub fn is_directory(&self) -> bool {
        self.entry_type == EntryType::Directory
    }
}
