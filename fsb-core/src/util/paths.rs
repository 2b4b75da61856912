//! src/util/paths.rs
//!
//! String-level path helpers shared by the list, manifest and session code.
//! Entry paths are composed as text (directory, name, extension), so these
//! helpers work on `&str` and only touch `Path` where the OS is involved.

use std::path::{MAIN_SEPARATOR, Path, PathBuf};

/// Name of the synthetic "up one directory" entry.
pub const PARENT_ENTRY: &str = "..";

/// Splits `name` at its last `.` into `(stem, extension)`.
///
/// A leading dot does not start an extension, so `.bashrc` has none.
#[must_use]
pub fn split_extension(name: &str) -> (&str, Option<&str>) {
    match name.rfind('.') {
        Some(idx) if idx > 0 => (&name[..idx], Some(&name[idx + 1..])),
        _ => (name, None),
    }
}

/// Dot-prefixed names are hidden, except the parent marker.
#[inline]
#[must_use]
pub fn is_hidden_name(name: &str) -> bool {
    name.starts_with('.') && name != PARENT_ENTRY
}

#[inline]
#[must_use]
pub fn is_separator(c: char) -> bool {
    c == '/' || c == MAIN_SEPARATOR
}

/// Strips trailing separators but never reduces a root path to nothing.
#[must_use]
pub fn trim_trailing_separators(path: &str) -> &str {
    let trimmed = path.trim_end_matches(is_separator);
    if trimmed.is_empty() && !path.is_empty() {
        &path[..1]
    } else {
        trimmed
    }
}

/// Appends a separator unless `buf` is empty or already ends with one.
pub fn ensure_trailing_separator(buf: &mut String) {
    if !buf.is_empty() && !buf.ends_with(is_separator) {
        buf.push(MAIN_SEPARATOR);
    }
}

/// Separates a full path into its directory (with trailing separator) and
/// its final component. `"/a/b/c.png"` gives `("/a/b/", "c.png")` and
/// `"/a/sub/"` gives `("/a/", "sub")`.
#[must_use]
pub fn split_name_path(full: &str) -> (&str, &str) {
    let trimmed = trim_trailing_separators(full);
    match trimmed.rfind(is_separator) {
        Some(idx) if idx + 1 < trimmed.len() => (&trimmed[..=idx], &trimmed[idx + 1..]),
        Some(_) => (trimmed, ""),
        None => ("", trimmed),
    }
}

/// The directory one level up, or `None` when `path` is a root.
#[must_use]
pub fn parent_directory(path: &Path) -> Option<PathBuf> {
    path.parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .map(Path::to_path_buf)
}

/// Makes `path` absolute against the process working directory without
/// resolving symlinks.
pub fn absolute(path: &Path) -> std::io::Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        std::path::absolute(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_split_uses_last_dot() {
        assert_eq!(split_extension("song.mp3"), ("song", Some("mp3")));
        assert_eq!(split_extension("archive.tar.gz"), ("archive.tar", Some("gz")));
        assert_eq!(split_extension("README"), ("README", None));
        assert_eq!(split_extension(".bashrc"), (".bashrc", None));
        assert_eq!(split_extension("trailing."), ("trailing", Some("")));
    }

    #[test]
    fn parent_marker_is_not_hidden() {
        assert!(is_hidden_name(".hidden.txt"));
        assert!(!is_hidden_name(".."));
        assert!(!is_hidden_name("visible"));
    }

    #[test]
    fn name_path_split_handles_directories() {
        assert_eq!(split_name_path("/a/b/c.png"), ("/a/b/", "c.png"));
        assert_eq!(split_name_path("/a/sub/"), ("/a/", "sub"));
        assert_eq!(split_name_path("plain.txt"), ("", "plain.txt"));
        assert_eq!(split_name_path("/"), ("/", ""));
    }

    #[test]
    fn trailing_separators() {
        assert_eq!(trim_trailing_separators("/a/b//"), "/a/b");
        assert_eq!(trim_trailing_separators("/"), "/");

        let mut buf = String::from("/a");
        ensure_trailing_separator(&mut buf);
        assert_eq!(buf, "/a/");
        ensure_trailing_separator(&mut buf);
        assert_eq!(buf, "/a/");

        let mut empty = String::new();
        ensure_trailing_separator(&mut empty);
        assert!(empty.is_empty());
    }

    #[test]
    fn root_has_no_parent() {
        assert_eq!(parent_directory(Path::new("/")), None);
        assert_eq!(parent_directory(Path::new("/a/b")), Some(PathBuf::from("/a")));
        assert_eq!(parent_directory(Path::new("a")), None);
    }
}
