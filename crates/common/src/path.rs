//! Canonical path handling.
//!
//! Every path stored in the metadata index is in canonical form: absolute,
//! `/`-separated, no empty segments, no trailing separator (except the root
//! itself), and with `.`/`..` segments already applied. Two paths name the
//! same node iff their canonical strings are equal, so everything downstream
//! compares plain strings.
//!
//! These functions never fail: anything that can't be made sense of
//! collapses to the root.

/// The root directory.
pub const ROOT: &str = "/";

const SEPARATOR: char = '/';

/// Normalize a path string into canonical form.
///
/// ```
/// use common::path::normalize;
///
/// assert_eq!(normalize("/a//b/"), "/a/b");
/// assert_eq!(normalize(""), "/");
/// assert_eq!(normalize("a/b"), "/a/b");
/// ```
pub fn normalize(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();
    for segment in path.split(SEPARATOR) {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }

    if segments.is_empty() {
        return ROOT.to_string();
    }

    let mut out = String::with_capacity(path.len() + 1);
    for segment in segments {
        out.push(SEPARATOR);
        out.push_str(segment);
    }
    out
}

/// Join a relative path onto a base and normalize the result.
pub fn join(base: &str, relative: &str) -> String {
    normalize(&format!("{}{}{}", base, SEPARATOR, relative))
}

/// Resolve `path` against the working directory `cwd`.
///
/// Absolute inputs ignore `cwd`.
pub fn resolve(cwd: &str, path: &str) -> String {
    if is_absolute(path) {
        normalize(path)
    } else {
        join(cwd, path)
    }
}

pub fn is_absolute(path: &str) -> bool {
    path.starts_with(SEPARATOR)
}

pub fn is_root(path: &str) -> bool {
    normalize(path) == ROOT
}

/// Parent of a path. The root and single-segment paths have the root as parent.
pub fn dirname(path: &str) -> String {
    let normalized = normalize(path);
    match normalized.rfind(SEPARATOR) {
        Some(0) | None => ROOT.to_string(),
        Some(idx) => normalized[..idx].to_string(),
    }
}

/// Last segment of a path; the root's basename is `/`.
pub fn basename(path: &str) -> String {
    let normalized = normalize(path);
    if normalized == ROOT {
        return ROOT.to_string();
    }
    match normalized.rfind(SEPARATOR) {
        Some(idx) => normalized[idx + 1..].to_string(),
        None => normalized,
    }
}

/// True iff `descendant` lies strictly inside `ancestor`.
///
/// ```
/// use common::path::is_ancestor;
///
/// assert!(is_ancestor("/", "/x"));
/// assert!(is_ancestor("/a", "/a/b/c"));
/// assert!(!is_ancestor("/a", "/a"));
/// assert!(!is_ancestor("/a", "/ab"));
/// ```
pub fn is_ancestor(ancestor: &str, descendant: &str) -> bool {
    let ancestor = normalize(ancestor);
    let descendant = normalize(descendant);
    if ancestor == ROOT {
        return descendant != ROOT;
    }
    descendant
        .strip_prefix(ancestor.as_str())
        .is_some_and(|rest| rest.starts_with(SEPARATOR))
}

/// Every proper ancestor of `path`, nearest first, ending with the root.
pub fn ancestors(path: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = normalize(path);
    while current != ROOT {
        current = dirname(&current);
        out.push(current.clone());
    }
    out
}

/// Re-root `path`, which must be `from` or lie inside it, under `to`.
///
/// Returns `None` when `path` is outside `from`.
pub fn rebase(path: &str, from: &str, to: &str) -> Option<String> {
    let path = normalize(path);
    let from = normalize(from);
    if path == from {
        return Some(normalize(to));
    }
    if !is_ancestor(&from, &path) {
        return None;
    }
    let relative = if from == ROOT {
        &path[1..]
    } else {
        &path[from.len() + 1..]
    };
    Some(join(to, relative))
}

/// Half-open string range `[lo, hi)` covering every strict descendant of
/// `path` under byte-wise ordering.
///
/// `lo` is the path plus a trailing separator and `hi` replaces that
/// separator with the next byte (`'0'`), so a range scan over canonical
/// paths picks up exactly the subtree. For the root the range also contains
/// `/` itself, which callers exclude explicitly.
pub(crate) fn descendant_bounds(path: &str) -> (String, String) {
    let path = normalize(path);
    if path == ROOT {
        (ROOT.to_string(), "0".to_string())
    } else {
        (format!("{}/", path), format!("{}0", path))
    }
}
