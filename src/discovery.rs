//! Resolution of configured search paths into named templates and snippets.
//!
//! Each search path is scanned without recursion. When a name appears in more
//! than one search path the earliest path wins and later ones are dropped.

use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use log::debug;

use crate::config::Config;
use crate::constants::{DEFINITION_FOLDER, MANIFEST_FILE, SNIPPET_MANIFEST_FILE, SNIPPET_SCRIPT_EXTENSION};
use crate::error::{Error, Result};

/// A template found in a search path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateDescriptor {
    pub name: String,
    /// Folder whose contents become the project's definition folder.
    pub path: PathBuf,
}

/// Shape of a snippet on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnippetKind {
    /// A single `*.sh` script.
    SingleFile,
    /// A folder with a `snippet.json` action list.
    Folder,
}

/// A snippet found in a search path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnippetDescriptor {
    pub name: String,
    pub kind: SnippetKind,
    /// The script for single file snippets, the snippet folder otherwise.
    pub path: PathBuf,
}

impl std::fmt::Display for SnippetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SnippetKind::SingleFile => write!(f, "file"),
            SnippetKind::Folder => write!(f, "folder"),
        }
    }
}

/// Names starting with `.` or `_` are never templates or snippets.
fn is_hidden(name: &str) -> bool {
    name.starts_with('.') || name.starts_with('_')
}

/// Directory entries of `folder` as `(name, path)` pairs sorted by name.
///
/// A search path that does not exist contributes nothing.
fn folder_entries(folder: &Path) -> Result<Vec<(String, PathBuf)>> {
    if !folder.is_dir() {
        debug!("Skipping missing search path '{}'", folder.display());
        return Ok(Vec::new());
    }
    let mut entries = Vec::new();
    for entry in fs::read_dir(folder).map_err(Error::IoError)? {
        let entry = entry.map_err(Error::IoError)?;
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        if is_hidden(&name) {
            continue;
        }
        entries.push((name, entry.path()));
    }
    entries.sort();
    Ok(entries)
}

fn template_at(name: String, path: &Path) -> Option<TemplateDescriptor> {
    if !path.is_dir() {
        return None;
    }
    let definition = path.join(DEFINITION_FOLDER);
    if definition.join(MANIFEST_FILE).is_file() {
        Some(TemplateDescriptor { name, path: definition })
    } else if path.join(MANIFEST_FILE).is_file() {
        Some(TemplateDescriptor { name, path: path.to_path_buf() })
    } else {
        None
    }
}

fn snippet_at(name: String, path: &Path) -> Option<SnippetDescriptor> {
    if path.is_dir() {
        return path.join(SNIPPET_MANIFEST_FILE).is_file().then(|| SnippetDescriptor {
            name,
            kind: SnippetKind::Folder,
            path: path.to_path_buf(),
        });
    }
    let stem = name.strip_suffix(SNIPPET_SCRIPT_EXTENSION)?.strip_suffix('.')?;
    if stem.is_empty() || !path.is_file() {
        return None;
    }
    Some(SnippetDescriptor {
        name: stem.to_string(),
        kind: SnippetKind::SingleFile,
        path: path.to_path_buf(),
    })
}

/// Scans `folders` in order, keeping the first descriptor found per name.
fn discover<T, F, N>(folders: &[PathBuf], describe: F, name_of: N) -> Result<Vec<T>>
where
    F: Fn(String, &Path) -> Option<T>,
    N: Fn(&T) -> &str,
{
    if folders.is_empty() {
        return Err(Error::NotFoundError("No search paths configured".to_string()));
    }
    let mut found: IndexMap<String, T> = IndexMap::new();
    for folder in folders {
        for (name, path) in folder_entries(folder)? {
            let Some(descriptor) = describe(name, &path) else {
                continue;
            };
            let name = name_of(&descriptor).to_string();
            if found.contains_key(&name) {
                debug!("Ignoring '{}': '{}' takes priority", path.display(), name);
                continue;
            }
            found.insert(name, descriptor);
        }
    }
    found.sort_keys();
    Ok(found.into_values().collect())
}

/// Templates found in `folders`, sorted by name.
///
/// # Errors
/// * `Error::NotFoundError` if `folders` is empty
pub fn templates_from_folders(folders: &[PathBuf]) -> Result<Vec<TemplateDescriptor>> {
    discover(folders, template_at, |template: &TemplateDescriptor| template.name.as_str())
}

/// Snippets found in `folders`, sorted by name.
///
/// # Errors
/// * `Error::NotFoundError` if `folders` is empty
pub fn snippets_from_folders(folders: &[PathBuf]) -> Result<Vec<SnippetDescriptor>> {
    discover(folders, snippet_at, |snippet: &SnippetDescriptor| snippet.name.as_str())
}

/// Looks up templates and snippets in the search paths of a [`Config`].
pub struct Discovery<'a> {
    config: &'a Config,
}

impl<'a> Discovery<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self { config }
    }

    pub fn templates(&self) -> Result<Vec<TemplateDescriptor>> {
        templates_from_folders(&self.config.template_search_paths()?)
    }

    /// Finds a template by name.
    ///
    /// # Errors
    /// * `Error::NotFoundError` if no search path holds a template called `name`
    pub fn template(&self, name: &str) -> Result<TemplateDescriptor> {
        self.templates()?
            .into_iter()
            .find(|template| template.name == name)
            .ok_or_else(|| Error::NotFoundError(format!("Template '{name}' not found")))
    }

    pub fn snippets(&self) -> Result<Vec<SnippetDescriptor>> {
        snippets_from_folders(&self.config.snippet_search_paths()?)
    }

    /// Finds a snippet by name.
    ///
    /// # Errors
    /// * `Error::NotFoundError` if no search path holds a snippet called `name`
    pub fn snippet(&self, name: &str) -> Result<SnippetDescriptor> {
        self.snippets()?
            .into_iter()
            .find(|snippet| snippet.name == name)
            .ok_or_else(|| Error::NotFoundError(format!("Snippet '{name}' not found")))
    }
}
