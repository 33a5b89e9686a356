//! Id path decomposition
//!
//! Node id paths are plain strings joined by the active separator. Grouping
//! by component layers a synthetic separator (`>`) over real filesystem
//! paths, so both the active separator and [`SECONDARY_SEPARATOR`] are
//! honoured: whichever occurs later in the path decides the cut point.

/// Separator that is always recognised in addition to the active one.
pub const SECONDARY_SEPARATOR: &str = "/";

/// Locate the cut point: `(start, len)` of the last separator occurrence.
fn cut_point(path: &str, sep: &str) -> Option<(usize, usize)> {
    let primary = path.rfind(sep).map(|idx| (idx, sep.len()));
    let secondary = path
        .rfind(SECONDARY_SEPARATOR)
        .map(|idx| (idx, SECONDARY_SEPARATOR.len()));

    match (primary, secondary) {
        (Some(a), Some(b)) => Some(if a.0 >= b.0 { a } else { b }),
        (a, b) => a.or(b),
    }
}

/// Returns the last component of `path`.
///
/// For a file path this is the file name, for a folder path the folder
/// name. A path without separators is returned whole.
///
/// ```
/// use symtree_domain::path::basename;
///
/// assert_eq!(basename("base/strings/string_util.cc", "/"), "string_util.cc");
/// assert_eq!(basename("Blink>third_party/blink", ">"), "blink");
/// assert_eq!(basename("README", "/"), "README");
/// ```
pub fn basename<'a>(path: &'a str, sep: &str) -> &'a str {
    match cut_point(path, sep) {
        Some((idx, len)) => &path[idx + len..],
        None => path,
    }
}

/// Returns everything before the last separator of `path`.
///
/// An empty result means the path hangs directly off the root.
///
/// ```
/// use symtree_domain::path::dirname;
///
/// assert_eq!(dirname("base/strings/string_util.cc", "/"), "base/strings");
/// assert_eq!(dirname("Blink>third_party", ">"), "Blink");
/// assert_eq!(dirname("README", "/"), "");
/// ```
pub fn dirname<'a>(path: &'a str, sep: &str) -> &'a str {
    match cut_point(path, sep) {
        Some((idx, _)) => &path[..idx],
        None => "",
    }
}

/// True when the cut point of `path` is the active separator and it sits
/// after the last real path separator.
///
/// Ancestors created across such a cut are component groups rather than
/// directories.
pub fn cut_is_synthetic(path: &str, sep: &str) -> bool {
    if sep == SECONDARY_SEPARATOR {
        return false;
    }
    match (path.rfind(sep), path.rfind(SECONDARY_SEPARATOR)) {
        (Some(primary), Some(secondary)) => primary > secondary,
        (Some(_), None) => true,
        _ => false,
    }
}
