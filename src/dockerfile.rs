//! Line-level insertion of snippet content into the build script.

use std::fs;
use std::path::Path;

use log::debug;

use crate::constants::SNIPPET_INSERT_MARKER;
use crate::error::{Error, Result};

/// Inserts `content` above the first line containing `marker`.
///
/// The marker line stays in place, so repeated insertions stack up above it
/// in the order they were made. Without a marker the content is appended,
/// separated from the existing text by one blank line.
pub fn insert_snippet(script: &str, marker: &str, content: &str) -> String {
    let mut block = content.to_string();
    if !block.ends_with('\n') {
        block.push('\n');
    }

    let mut offset = 0;
    for line in script.split_inclusive('\n') {
        if line.contains(marker) {
            let (before, after) = script.split_at(offset);
            return format!("{before}{block}\n{after}");
        }
        offset += line.len();
    }

    let existing = script.trim_end_matches(&['\r', '\n'][..]);
    if existing.is_empty() {
        block
    } else {
        format!("{existing}\n\n{block}")
    }
}

/// Reads the build script at `path`, inserts `content` at the snippet marker
/// and writes it back.
pub fn insert_snippet_into_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
    let path = path.as_ref();
    let script = fs::read_to_string(path).map_err(Error::IoError)?;
    debug!("Inserting snippet content into '{}'", path.display());
    fs::write(path, insert_snippet(&script, SNIPPET_INSERT_MARKER, content)).map_err(Error::IoError)
}

/// Build script block that copies a snippet script into the image and runs it.
pub fn copy_and_run_block(snippet_name: &str, script_file_name: &str) -> String {
    format!("# {snippet_name}\nCOPY scripts/{script_file_name} /tmp/\nRUN /tmp/{script_file_name}\n")
}
