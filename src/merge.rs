//! Structural merge of two documents.
//!
//! Objects are unioned key by key, arrays are concatenated and any other
//! pairing lets the overlay's value win. The base document's layout and
//! comments are kept; overlay content is re-indented to fit the base.

use std::path::Path;

use log::debug;

use crate::document::{Array, Container, Document, Entry, Object, Reindent, Value};
use crate::error::{Error, Result};

/// Merges `overlay` into a copy of `base`.
///
/// # Errors
/// * `Error::MalformedError` if the root of either document is not an object
pub fn merge(base: &Document, overlay: &Document) -> Result<Document> {
    let overlay_root = overlay
        .root_object()
        .ok_or_else(|| Error::malformed("merge overlay", "root value is not an object"))?;
    let mut result = base.clone();
    let base_root = result
        .root_object_mut()
        .ok_or_else(|| Error::malformed("merge base", "root value is not an object"))?;
    merge_objects(base_root, overlay_root, "", "");
    Ok(result)
}

/// Loads both files and merges `overlay_path` into `base_path`'s document.
pub fn merge_files<P: AsRef<Path>, Q: AsRef<Path>>(base_path: P, overlay_path: Q) -> Result<Document> {
    let base = Document::load(base_path.as_ref())?;
    let overlay = Document::load(overlay_path.as_ref())?;
    debug!(
        "Merging '{}' into '{}'",
        overlay_path.as_ref().display(),
        base_path.as_ref().display()
    );
    merge(&base, &overlay)
}

/// Indentation of the line an entry starts on, or the container's own line
/// indentation when the entry shares a line with its opening bracket.
fn entry_indent<'a, E: Entry>(entry: &'a E, container_indent: &'a str) -> &'a str {
    entry.leading().line_indent().unwrap_or(container_indent)
}

/// What an entry nested one level below `container_indent` adds to it.
fn indent_unit<'a>(indent: &'a str, container_indent: &str) -> &'a str {
    indent.strip_prefix(container_indent).unwrap_or("")
}

/// Mapping from an overlay entry's indentation to where it lands in `base`.
fn reindent_for<E: Entry>(
    base: &Container<E>,
    base_indent: &str,
    overlay_indent: &str,
    overlay_entry_indent: &str,
) -> Reindent {
    let from_unit = indent_unit(overlay_entry_indent, overlay_indent);
    let target = match base.entries.last().and_then(|last| last.leading().line_indent()) {
        Some(indent) => indent.to_string(),
        None => format!("{base_indent}{from_unit}"),
    };
    let to_unit = indent_unit(&target, base_indent).to_string();
    Reindent::new(overlay_entry_indent, target).with_units(from_unit, to_unit)
}

/// Copies an overlay entry, re-indented and stripped of anything after its
/// own line, ready to be pushed onto a base container.
fn adopt<E: Entry>(entry: &E, reindent: &Reindent) -> E {
    let mut entry = entry.clone();
    entry.reindent(reindent);
    let (same_line, _) = std::mem::take(entry.trailing_mut()).split_line();
    *entry.trailing_mut() = same_line;
    entry
}

fn merge_objects(base: &mut Object, overlay: &Object, base_indent: &str, overlay_indent: &str) {
    for member in &overlay.entries {
        let member_overlay_indent = entry_indent(member, overlay_indent);
        match base.position(member.key()) {
            Some(index) => {
                let existing = &mut base.entries[index];
                let member_base_indent =
                    existing.leading.line_indent().unwrap_or(base_indent).to_string();
                match (&mut existing.value, &member.value) {
                    (Value::Object(base_object), Value::Object(overlay_object)) => {
                        merge_objects(
                            base_object,
                            overlay_object,
                            &member_base_indent,
                            member_overlay_indent,
                        );
                    }
                    (Value::Array(base_array), Value::Array(overlay_array)) => {
                        concat_arrays(
                            base_array,
                            overlay_array,
                            &member_base_indent,
                            member_overlay_indent,
                        );
                    }
                    (slot, value) => {
                        debug!("Replacing value of '{}'", member.key());
                        let reindent = Reindent::new(member_overlay_indent, member_base_indent.as_str())
                            .with_units(
                                indent_unit(member_overlay_indent, overlay_indent),
                                indent_unit(&member_base_indent, base_indent),
                            );
                        let mut value = value.clone();
                        value.reindent(&reindent);
                        *slot = value;
                    }
                }
            }
            None => {
                debug!("Adding member '{}'", member.key());
                let reindent = reindent_for(base, base_indent, overlay_indent, member_overlay_indent);
                base.push_entry(adopt(member, &reindent), base_indent);
            }
        }
    }
}

fn concat_arrays(base: &mut Array, overlay: &Array, base_indent: &str, overlay_indent: &str) {
    for element in &overlay.entries {
        let reindent =
            reindent_for(base, base_indent, overlay_indent, entry_indent(element, overlay_indent));
        base.push_entry(adopt(element, &reindent), base_indent);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn merged(base: &str, overlay: &str) -> Document {
        merge(&Document::parse(base).unwrap(), &Document::parse(overlay).unwrap()).unwrap()
    }

    #[test]
    fn test_union_keeps_base_key_order() {
        let result = merged(r#"{"a": 1}"#, r#"{"b": 2}"#);
        assert_eq!(result.to_string(), r#"{"a": 1, "b": 2}"#);
        let keys: Vec<_> = result.root_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[test]
    fn test_arrays_are_concatenated() {
        let result = merged(r#"{"xs": [1, 2]}"#, r#"{"xs": [3]}"#);
        assert_eq!(result.to_json().unwrap(), json!({"xs": [1, 2, 3]}));
        assert_eq!(result.to_string(), r#"{"xs": [1, 2, 3]}"#);
    }

    #[test]
    fn test_arrays_keep_duplicates() {
        let result = merged(r#"{"xs": ["a"]}"#, r#"{"xs": ["a"]}"#);
        assert_eq!(result.to_json().unwrap(), json!({"xs": ["a", "a"]}));
    }

    #[test]
    fn test_objects_are_merged_recursively() {
        let result = merged(r#"{"s": {"x": 1}}"#, r#"{"s": {"y": 2}}"#);
        assert_eq!(result.to_json().unwrap(), json!({"s": {"x": 1, "y": 2}}));
    }

    #[test]
    fn test_overlay_scalar_replaces_base() {
        let result = merged(r#"{"a": 1, "b": "keep"}"#, r#"{"a": "two"}"#);
        assert_eq!(result.to_string(), r#"{"a": "two", "b": "keep"}"#);
    }

    #[test]
    fn test_mismatched_kinds_take_overlay() {
        let result = merged(r#"{"a": [1]}"#, r#"{"a": {"b": 1}}"#);
        assert_eq!(result.to_json().unwrap(), json!({"a": {"b": 1}}));
    }

    #[test]
    fn test_multiline_merge_keeps_comments_and_layout() {
        let base = "{\n\t\"name\": \"go\",\n\t// editor settings\n\t\"settings\": {\n\t\t\"a\": 1\n\t},\n\t\"extensions\": [\n\t\t\"golang.Go\"\n\t]\n}\n";
        let overlay = "{\n  \"settings\": {\n    // formatter\n    \"b\": true\n  },\n  \"extensions\": [\n    \"ms-azuretools.vscode-docker\"\n  ],\n  \"forwardPorts\": [\n    8080\n  ]\n}\n";
        let expected = "{\n\t\"name\": \"go\",\n\t// editor settings\n\t\"settings\": {\n\t\t\"a\": 1,\n\t\t// formatter\n\t\t\"b\": true\n\t},\n\t\"extensions\": [\n\t\t\"golang.Go\",\n\t\t\"ms-azuretools.vscode-docker\"\n\t],\n\t\"forwardPorts\": [\n\t\t8080\n\t]\n}\n";

        let result = merged(base, overlay);
        assert_eq!(result.to_string(), expected);
    }

    #[test]
    fn test_reindents_when_indent_units_match() {
        let base = "{\n\t\"build\": {\n\t\t\"args\": {\n\t\t\t\"A\": \"1\"\n\t\t}\n\t}\n}";
        let overlay = "{\n\t\"build\": {\n\t\t\"target\": {\n\t\t\t\"stage\": \"dev\"\n\t\t}\n\t}\n}";
        let expected = "{\n\t\"build\": {\n\t\t\"args\": {\n\t\t\t\"A\": \"1\"\n\t\t},\n\t\t\"target\": {\n\t\t\t\"stage\": \"dev\"\n\t\t}\n\t}\n}";

        assert_eq!(merged(base, overlay).to_string(), expected);
    }

    #[test]
    fn test_trailing_comma_style_is_kept() {
        let base = "{\n\t\"a\": 1,\n}";
        let overlay = "{\"b\": 2}";
        assert_eq!(merged(base, overlay).to_string(), "{\n\t\"a\": 1,\n\t\"b\": 2,\n}");
    }

    #[test]
    fn test_empty_base_object_takes_overlay_layout() {
        let base = "{\n\t\"settings\": {}\n}";
        let overlay = "{\n\t\"settings\": {\n\t\t\"a\": 1\n\t}\n}";
        assert_eq!(
            merged(base, overlay).to_string(),
            "{\n\t\"settings\": {\n\t\t\"a\": 1\n\t}\n}"
        );
    }

    #[test]
    fn test_unmodified_regions_are_byte_identical() {
        let base = "// header\n{\n    \"a\" : [ 1 ,2 ],   // odd spacing\n    \"b\": {}\n}\n";
        let result = merged(base, "{}");
        assert_eq!(result.to_string(), base);
    }

    #[test]
    fn test_same_line_comment_stays_before_appended_key() {
        let result = merged("{\"a\": 1 // c\n}", "{\"b\": 2}");
        assert_eq!(result.to_string(), "{\"a\": 1, // c\n\"b\": 2\n}");

        let result = merged("{\"s\": {\"x\": 1 // c\n}}", "{\"s\": {\"y\": 2}}");
        assert_eq!(result.to_json().unwrap(), json!({"s": {"x": 1, "y": 2}}));
    }

    #[test]
    fn test_overlay_trailing_comment_does_not_swallow_close() {
        let result = merged("{\"a\": 1}", "{\n  // lead\n  \"b\": 2 // trail\n}");
        assert_eq!(result.to_string(), "{\"a\": 1,\n  // lead\n  \"b\": 2 // trail\n}");
    }

    #[test]
    fn test_trailing_comment_moves_after_trailing_comma() {
        let result = merged("{\"a\": 1,}", "{\n\t\"b\": 2 // trail\n}");
        assert_eq!(result.to_string(), "{\"a\": 1,\n\t\"b\": 2, // trail\n}");
    }

    /// Plain JSON merge used to check the lossless one.
    fn union(base: &serde_json::Value, overlay: &serde_json::Value) -> serde_json::Value {
        use serde_json::Value as Json;
        match (base, overlay) {
            (Json::Object(base), Json::Object(overlay)) => {
                let mut result = base.clone();
                for (key, value) in overlay {
                    let merged = match base.get(key) {
                        Some(existing) => union(existing, value),
                        None => value.clone(),
                    };
                    result.insert(key.clone(), merged);
                }
                Json::Object(result)
            }
            (Json::Array(base), Json::Array(overlay)) => {
                Json::Array(base.iter().chain(overlay).cloned().collect())
            }
            (_, overlay) => overlay.clone(),
        }
    }

    #[test]
    fn test_merged_layouts_reparse_to_union() {
        let bases = [
            "{}",
            "{\"a\": 1}",
            "{\"a\": 1 // c\n}",
            "{\"a\": 1, // c\n}",
            "{\"a\": 1,}",
            "{ // open\n\"a\": [1 // one\n], \"s\": {\"x\": 1 // x\n}}",
            "{\n\t\"a\": 1, // c\n\t\"s\": {\"x\": 1}\n}",
            "{\n  \"a\": [\n    1, // one\n  ],\n  \"s\": {}\n}",
        ];
        let overlays = [
            "{\"b\": 2}",
            "{\"b\": 2 // trail\n}",
            "{\n  // lead\n  \"b\": 2, // after comma\n  \"a\": [3 // three\n  ]\n}",
            "{\"s\": {\"y\": [1, 2] // ys\n}, \"a\": {\"z\": true}}",
            "{\n\t\"s\": {\n\t\t// nested\n\t\t\"y\": 2\n\t}\n}",
        ];
        for base in bases {
            for overlay in overlays {
                let base_doc = Document::parse(base).unwrap();
                let overlay_doc = Document::parse(overlay).unwrap();
                let text = merge(&base_doc, &overlay_doc).unwrap().to_string();
                let reparsed = Document::parse(&text)
                    .unwrap_or_else(|e| panic!("{base:?} + {overlay:?} gave {text:?}: {e}"));
                assert_eq!(
                    reparsed.to_json().unwrap(),
                    union(&base_doc.to_json().unwrap(), &overlay_doc.to_json().unwrap()),
                    "{base:?} + {overlay:?} gave {text:?}"
                );
            }
        }
    }

    #[test]
    fn test_non_object_root_is_malformed() {
        let base = Document::parse("[1]").unwrap();
        let overlay = Document::parse("{}").unwrap();
        assert!(matches!(merge(&base, &overlay), Err(Error::MalformedError { .. })));
        assert!(matches!(merge(&overlay, &base), Err(Error::MalformedError { .. })));
    }
}
