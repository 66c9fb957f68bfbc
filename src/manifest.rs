//! Reading and editing the fields of a definition manifest.

use std::fs;
use std::path::{Path, PathBuf};

use log::debug;

use crate::constants::{DEFINITION_FOLDER, MANIFEST_FILE, ROOT_MANIFEST_FILE};
use crate::document::{Document, Value};
use crate::error::{Error, Result};

/// Returns the manifest `name`, if set to a string.
pub fn read_name(manifest: &Document) -> Option<String> {
    manifest.root_object()?.get("name")?.as_str()
}

/// Returns the manifest `remoteUser`, if set to a string.
///
/// A commented-out `remoteUser` line is trivia and never matches.
pub fn read_remote_user(manifest: &Document) -> Option<String> {
    manifest.root_object()?.get("remoteUser")?.as_str()
}

/// Sets the manifest `name` without touching anything else in the document.
pub fn set_name(manifest: &mut Document, name: &str) -> Result<()> {
    let root = manifest
        .root_object_mut()
        .ok_or_else(|| Error::malformed("manifest", "root value is not an object"))?;
    root.set("name", Value::string(name), "");
    Ok(())
}

/// Sets the `name` of the manifest file at `path` in place.
pub fn set_name_in_file<P: AsRef<Path>>(path: P, name: &str) -> Result<()> {
    let path = path.as_ref();
    let mut manifest = Document::load(path)?;
    set_name(&mut manifest, name)?;
    debug!("Setting name of '{}' to '{}'", path.display(), name);
    fs::write(path, manifest.to_string()).map_err(Error::IoError)
}

/// Locates the manifest of a project: `.devcontainer/devcontainer.json`, or
/// `.devcontainer.json` at the project root.
pub fn find_manifest<P: AsRef<Path>>(project_folder: P) -> Result<PathBuf> {
    let project_folder = project_folder.as_ref();
    let candidates = [
        project_folder.join(DEFINITION_FOLDER).join(MANIFEST_FILE),
        project_folder.join(ROOT_MANIFEST_FILE),
    ];
    candidates.iter().find(|path| path.is_file()).cloned().ok_or_else(|| {
        Error::NotFoundError(format!(
            "{MANIFEST_FILE} not found in '{}' (looked for {DEFINITION_FOLDER}/{MANIFEST_FILE}, {ROOT_MANIFEST_FILE})",
            project_folder.display()
        ))
    })
}
