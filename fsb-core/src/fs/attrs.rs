//! `src/fs/attrs.rs`
//!
//! Hidden attribute of a filesystem object.
//!
//! Unix filesystems have no hidden bit, so the attribute is an extended
//! attribute in the `user.` namespace. The dot-prefix convention is handled
//! by the listing code and is never written here.

use std::io;
use std::path::Path;

#[cfg(unix)]
use tracing::debug;

use crate::error::{BrowseError, BrowseResult};

#[cfg(unix)]
const HIDDEN_ATTR: &str = "user.fsb.hidden";

/// Whether `path` carries the hidden attribute. Filesystems without extended
/// attribute support report `false`.
#[cfg(unix)]
#[must_use]
pub fn has_hidden_attribute(path: &Path) -> bool {
    match xattr::get(path, HIDDEN_ATTR) {
        Ok(value) => value.is_some(),
        Err(e) => {
            debug!(path = %path.display(), error = %e, "hidden attribute unreadable");
            false
        }
    }
}

#[cfg(not(unix))]
#[must_use]
pub fn has_hidden_attribute(_path: &Path) -> bool {
    false
}

/// Sets (`hide == true`) or clears the hidden attribute.
#[cfg(unix)]
pub fn set_hidden(path: &Path, hide: bool) -> BrowseResult<()> {
    if hide {
        xattr::set(path, HIDDEN_ATTR, b"1").map_err(|e| BrowseError::file_system(path, e))
    } else if has_hidden_attribute(path) {
        xattr::remove(path, HIDDEN_ATTR).map_err(|e| BrowseError::file_system(path, e))
    } else {
        Ok(())
    }
}

#[cfg(not(unix))]
pub fn set_hidden(path: &Path, _hide: bool) -> BrowseResult<()> {
    Err(BrowseError::file_system(
        path,
        io::Error::new(io::ErrorKind::Unsupported, "hidden attribute not supported"),
    ))
}

/// `true` when an error only says the filesystem cannot store the attribute.
#[must_use]
pub fn is_unsupported(err: &BrowseError) -> bool {
    match err {
        BrowseError::FileSystem { kind, source, .. } => {
            matches!(kind, io::ErrorKind::Unsupported | io::ErrorKind::PermissionDenied)
                || is_unsupported_os_error(source)
        }
        _ => false,
    }
}

#[cfg(unix)]
fn is_unsupported_os_error(err: &io::Error) -> bool {
    err.raw_os_error()
        .is_some_and(|code| code == libc::EOPNOTSUPP || code == libc::ENOTSUP)
}

#[cfg(not(unix))]
fn is_unsupported_os_error(_err: &io::Error) -> bool {
    false
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn toggling_round_trips_when_supported() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("song.mp3");
        std::fs::write(&file, b"x").unwrap();

        assert!(!has_hidden_attribute(&file));

        match set_hidden(&file, true) {
            Ok(()) => {}
            Err(e) if is_unsupported(&e) => return,
            Err(e) => panic!("unexpected error: {e}"),
        }
        assert!(has_hidden_attribute(&file));

        set_hidden(&file, false).unwrap();
        assert!(!has_hidden_attribute(&file));
    }

    #[test]
    fn clearing_an_unset_attribute_is_a_no_op() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("plain.txt");
        std::fs::write(&file, b"x").unwrap();

        assert!(set_hidden(&file, false).is_ok());
    }
}
