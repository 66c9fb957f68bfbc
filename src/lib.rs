//! devcontainer composes dev container definitions.
//! It creates a definition from a reusable template and layers snippets onto
//! existing definitions, keeping comments and formatting of the files it edits.

/// Command-line interface module
pub mod cli;

/// Composition of templates and snippets into a project
pub mod compose;

/// Tool configuration: template and snippet search paths
pub mod config;

/// Common constants: file names, marker and substitution tokens
pub mod constants;

/// Template and snippet lookup across the configured search paths
pub mod discovery;

/// Build script marker insertion
pub mod dockerfile;

/// Lossless parser and writer for JSON with `//` comments and trailing commas
pub mod document;

/// Error types and handling
pub mod error;

/// File copy, link and write helpers
pub mod files;

/// Manifest field access and editing
pub mod manifest;

/// Structural merge of two documents
pub mod merge;

/// Folder snippet manifests and their actions
pub mod snippet;

/// Placeholder substitution in written files
pub mod substitute;
