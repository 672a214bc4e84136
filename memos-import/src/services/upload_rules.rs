//! Per-kind upload rules and path sanitization
//!
//! Incoming multipart file names are client-controlled. They are reduced to a
//! relative path made only of plain segments before anything touches disk.

use std::path::{Component, Path, PathBuf};

use crate::models::UploadKind;

/// Whether a file may be part of an upload of the given kind
///
/// Flomo exports carry arbitrary resource files next to the HTML, so every
/// extension is accepted. WeChat Reading uploads must be `.txt`.
pub fn is_supported_file_for_kind(kind: UploadKind, relative_path: &str) -> bool {
    match kind {
        UploadKind::Flomo => true,
        UploadKind::Weixin => has_extension(relative_path, &["txt"]),
    }
}

/// Reduce a client-supplied file name to a safe relative path
///
/// Splits on both `/` and `\`, then drops empty, `.`, `..` and drive-prefix
/// segments. Returns `None` if nothing usable remains or a segment holds a NUL.
pub fn sanitize_relative_path(incoming: &str) -> Option<String> {
    let mut segments = Vec::new();
    for segment in incoming.split(['/', '\\']) {
        let segment = segment.trim();
        if segment.is_empty() || segment == "." || segment == ".." || is_drive_prefix(segment) {
            continue;
        }
        if segment.contains('\0') {
            return None;
        }
        segments.push(segment);
    }

    if segments.is_empty() {
        None
    } else {
        Some(segments.join("/"))
    }
}

/// Join a sanitized relative path onto a root, re-checking confinement
///
/// Returns `None` if the joined path is not strictly inside `root`.
pub fn confine(root: &Path, relative: &str) -> Option<PathBuf> {
    let relative = Path::new(relative);
    if !relative
        .components()
        .all(|c| matches!(c, Component::Normal(_)))
    {
        return None;
    }

    let joined = root.join(relative);
    if joined.starts_with(root) && joined != root {
        Some(joined)
    } else {
        None
    }
}

/// Pick the entry HTML file of a Flomo export
///
/// Only `.html` / `.htm` files qualify. Files named `index.html` or
/// `index.htm` (any case) come first, then shorter paths. Equal candidates
/// keep upload order.
pub fn resolve_entry_html(relative_paths: &[String]) -> Option<String> {
    let mut candidates: Vec<&String> = relative_paths
        .iter()
        .filter(|p| has_extension(p, &["html", "htm"]))
        .collect();

    candidates.sort_by_key(|p| (!is_index_file(p), p.chars().count()));
    candidates.first().map(|p| (*p).clone())
}

fn is_index_file(relative_path: &str) -> bool {
    let name = relative_path
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(relative_path)
        .to_ascii_lowercase();
    name == "index.html" || name == "index.htm"
}

fn has_extension(relative_path: &str, extensions: &[&str]) -> bool {
    Path::new(relative_path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| extensions.iter().any(|want| e.eq_ignore_ascii_case(want)))
        .unwrap_or(false)
}

fn is_drive_prefix(segment: &str) -> bool {
    let bytes = segment.as_bytes();
    bytes.len() == 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}
