//! Folder snippet manifests (`snippet.json`) and their actions.
//!
//! Required fields are checked when the manifest is read, so a missing field
//! fails before any action runs. An unknown `type` is kept and only fails when
//! the composer reaches it.

use std::path::{Path, PathBuf};

use log::debug;
use serde::Deserialize;

use crate::document::Document;
use crate::error::{Error, Result};

/// Content for a build-script insertion: literal text or a snippet-relative file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnippetContent {
    Inline(String),
    File(PathBuf),
}

/// One step of a folder snippet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnippetAction {
    /// Merge the snippet-relative `source` document into the project-relative `target`.
    MergeManifest { source: PathBuf, target: PathBuf },
    /// Copy the snippet-relative script into the definition and run it from the build script.
    CopyAndRun { source: PathBuf },
    /// Insert content into the build script at the snippet marker.
    InsertBuildSnippet(SnippetContent),
    /// An action type this tool does not know; applying it is an error.
    Unknown(String),
}

/// The `snippet.json` of a folder snippet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnippetManifest {
    pub actions: Vec<SnippetAction>,
}

#[derive(Debug, Deserialize)]
struct RawSnippetManifest {
    #[serde(default)]
    actions: Vec<RawAction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAction {
    #[serde(rename = "type")]
    kind: String,
    source: Option<String>,
    target: Option<String>,
    content: Option<String>,
    content_path: Option<String>,
}

fn required(value: Option<String>, field: &str, kind: &str, source_name: &str) -> Result<PathBuf> {
    value
        .filter(|value| !value.is_empty())
        .map(PathBuf::from)
        .ok_or_else(|| Error::malformed(source_name, format!("'{kind}' action requires '{field}'")))
}

impl RawAction {
    fn into_action(self, source_name: &str) -> Result<SnippetAction> {
        match self.kind.as_str() {
            "mergeJSON" => Ok(SnippetAction::MergeManifest {
                source: required(self.source, "source", &self.kind, source_name)?,
                target: required(self.target, "target", &self.kind, source_name)?,
            }),
            "copyAndRun" => Ok(SnippetAction::CopyAndRun {
                source: required(self.source, "source", &self.kind, source_name)?,
            }),
            "dockerfileSnippet" => match (self.content, self.content_path) {
                (Some(content), None) => Ok(SnippetAction::InsertBuildSnippet(SnippetContent::Inline(content))),
                (None, Some(path)) => {
                    Ok(SnippetAction::InsertBuildSnippet(SnippetContent::File(PathBuf::from(path))))
                }
                _ => Err(Error::malformed(
                    source_name,
                    "'dockerfileSnippet' action requires exactly one of 'content' and 'contentPath'",
                )),
            },
            _ => Ok(SnippetAction::Unknown(self.kind)),
        }
    }
}

impl SnippetManifest {
    /// Parses snippet manifest text; comments and trailing commas are allowed.
    pub fn parse(text: &str, source_name: &str) -> Result<Self> {
        let value = Document::parse_named(text, source_name)?.to_json()?;
        let raw: RawSnippetManifest = serde_json::from_value(value)
            .map_err(|e| Error::malformed(source_name, e.to_string()))?;
        let actions = raw
            .actions
            .into_iter()
            .map(|action| action.into_action(source_name))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { actions })
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading snippet manifest from {}", path.display());
        let text = std::fs::read_to_string(path).map_err(Error::IoError)?;
        Self::parse(&text, &path.display().to_string())
    }
}
