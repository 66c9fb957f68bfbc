//! File system helpers used while composing definitions.

use std::fs;
use std::path::Path;

use log::debug;
use walkdir::WalkDir;

use crate::error::{Error, Result};

pub fn write_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(Error::IoError)?;
    }
    fs::write(path, content).map_err(Error::IoError)
}

/// Copies a single file, creating the destination's parent folders.
pub fn copy_file<P: AsRef<Path>, Q: AsRef<Path>>(source: P, dest: Q) -> Result<()> {
    let dest = dest.as_ref();
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(Error::IoError)?;
    }
    debug!("Copying '{}' to '{}'", source.as_ref().display(), dest.display());
    fs::copy(source, dest).map(|_| ()).map_err(Error::IoError)
}

/// Marks a copied script as executable by everyone.
#[cfg(unix)]
pub fn make_executable<P: AsRef<Path>>(path: P) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o755)).map_err(Error::IoError)
}

#[cfg(not(unix))]
pub fn make_executable<P: AsRef<Path>>(_path: P) -> Result<()> {
    Ok(())
}

/// Recreates the tree below `source` at `dest`, calling `place` for each file.
fn mirror_tree<F>(source: &Path, dest: &Path, place: F) -> Result<()>
where
    F: Fn(&Path, &Path) -> Result<()>,
{
    for entry in WalkDir::new(source) {
        let entry = entry?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|e| Error::IoError(std::io::Error::other(e.to_string())))?;
        let target = dest.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(Error::IoError)?;
        } else {
            place(entry.path(), &target)?;
        }
    }
    Ok(())
}

/// Copies every file below `source` into `dest`.
pub fn copy_tree<P: AsRef<Path>, Q: AsRef<Path>>(source: P, dest: Q) -> Result<()> {
    mirror_tree(source.as_ref(), dest.as_ref(), |from, to| copy_file(from, to))
}

/// Recreates the folders below `source` in `dest` and symlinks every file.
#[cfg(unix)]
pub fn link_tree<P: AsRef<Path>, Q: AsRef<Path>>(source: P, dest: Q) -> Result<()> {
    let source = fs::canonicalize(source.as_ref()).map_err(Error::IoError)?;
    mirror_tree(&source, dest.as_ref(), |from, to| {
        debug!("Linking '{}' to '{}'", to.display(), from.display());
        std::os::unix::fs::symlink(from, to).map_err(Error::IoError)
    })
}

#[cfg(not(unix))]
pub fn link_tree<P: AsRef<Path>, Q: AsRef<Path>>(_source: P, _dest: Q) -> Result<()> {
    Err(Error::UnsupportedError("linking templates needs symlink support".to_string()))
}
