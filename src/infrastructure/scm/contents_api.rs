//! Handling for the `contents` endpoint shape Gitea and GitHub share: a JSON
//! object for a single entry, a JSON array for a directory.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Deserialize;

use crate::common::error::ScmClientError;
use crate::common::result::ScmResult;
use crate::domain::entities::{EntryType, FileListingEntry};

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum ContentsResponse {
    Directory(Vec<ContentEntry>),
    Entry(ContentEntry),
}

#[derive(Debug, Deserialize)]
pub(crate) struct ContentEntry {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub encoding: Option<String>,
}

impl ContentsResponse {
    /// Text of a file entry; directories and submodules are rejected.
    pub fn into_file_contents(self, path: &str) -> ScmResult<String> {
        match self {
            ContentsResponse::Directory(_) => Err(ScmClientError::not_a_file(path)),
            ContentsResponse::Entry(entry) => match EntryType::from_contents_type(&entry.kind) {
                EntryType::Directory | EntryType::Submodule => {
                    Err(ScmClientError::not_a_file(path))
                }
                EntryType::File | EntryType::Symlink => {
                    decode_content(entry.content.as_deref(), entry.encoding.as_deref())
                }
            },
        }
    }

    /// Children of a directory response; a single entry means `path` is
    /// not a directory.
    pub fn into_listing(self, path: &str) -> ScmResult<Vec<FileListingEntry>> {
        match self {
            ContentsResponse::Directory(entries) => Ok(entries
                .into_iter()
                .map(|entry| {
                    FileListingEntry::new(
                        entry.path,
                        entry.name,
                        EntryType::from_contents_type(&entry.kind),
                    )
                })
                .collect()),
            ContentsResponse::Entry(entry) if entry.kind == "dir" => Ok(Vec::new()),
            ContentsResponse::Entry(_) => Err(ScmClientError::not_a_directory(path)),
        }
    }
}

/// Decode file content delivered in a transport encoding.
///
/// Missing content yields an empty string. Base64 payloads may contain line
/// breaks. Bytes that are not valid UTF-8 are replaced.
pub(crate) fn decode_content(content: Option<&str>, encoding: Option<&str>) -> ScmResult<String> {
    let content = match content {
        Some(content) => content,
        None => return Ok(String::new()),
    };

    match encoding.map(str::to_ascii_lowercase).as_deref() {
        Some("base64") => {
            let compact: String = content.chars().filter(|c| !c.is_whitespace()).collect();
            let bytes = STANDARD.decode(compact.as_bytes())?;
            Ok(String::from_utf8_lossy(&bytes).into_owned())
        }
        _ => Ok(content.to_string()),
    }
}
