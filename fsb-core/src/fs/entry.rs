//! `src/fs/entry.rs`
//! ============================================================
//! One directory or file record of a listing.
//!
//! Files carry their extension separately from the stem, directories carry
//! none. Entries listed from a manifest or a walk remember the folder they
//! actually live in; entries of a plain folder listing inherit the list's
//! current directory.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use bitflags::bitflags;
use compact_str::{CompactString, format_compact};
use serde::Serialize;

use crate::util::paths::{
    PARENT_ENTRY, ensure_trailing_separator, split_extension, trim_trailing_separators,
};

// ------------------------------------------------------------
// EntryFormat: which components a formatted entry string holds.
// ------------------------------------------------------------

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct EntryFormat: u8 {
        /// Containing directory.
        const PATH = 1 << 0;
        /// Stem (file) or full name (directory).
        const NAME = 1 << 1;
        /// File extension.
        const EXT = 1 << 2;
        /// Path separators and the extension dot.
        const SYMBOLS = 1 << 3;

        const FULL = Self::PATH.bits()
            | Self::NAME.bits()
            | Self::EXT.bits()
            | Self::SYMBOLS.bits();
    }
}

// ------------------------------------------------------------
// Entry
// ------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    name: CompactString,

    // None for directories; Some("") for a file without extension.
    extension: Option<CompactString>,

    // The on-disk name has a dot before `extension`, even an empty one
    // (`notes.`).
    dotted: bool,

    explicit_directory: Option<PathBuf>,

    is_directory: bool,

    // Dead manifest line: the path no longer exists.
    missing: bool,
}

impl Entry {
    #[must_use]
    pub fn directory(name: &str, explicit_directory: Option<PathBuf>) -> Self {
        Self {
            name: CompactString::new(name),
            extension: None,
            dotted: false,
            explicit_directory,
            is_directory: true,
            missing: false,
        }
    }

    /// A file entry; an empty `extension` means the name has no dot.
    #[must_use]
    pub fn file(
        stem: &str,
        extension: &str,
        explicit_directory: Option<PathBuf>,
        missing: bool,
    ) -> Self {
        let extension = Some(extension).filter(|ext| !ext.is_empty());
        Self::split_file(stem, extension, explicit_directory, missing)
    }

    fn split_file(
        stem: &str,
        extension: Option<&str>,
        explicit_directory: Option<PathBuf>,
        missing: bool,
    ) -> Self {
        Self {
            name: CompactString::new(stem),
            extension: Some(CompactString::new(extension.unwrap_or(""))),
            dotted: extension.is_some(),
            explicit_directory,
            is_directory: false,
            missing,
        }
    }

    /// Builds a file entry from an on-disk file name, splitting the extension.
    #[must_use]
    pub fn from_file_name(
        file_name: &str,
        explicit_directory: Option<PathBuf>,
        missing: bool,
    ) -> Self {
        let (stem, ext) = split_extension(file_name);
        Self::split_file(stem, ext, explicit_directory, missing)
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub fn extension(&self) -> Option<&str> {
        self.extension.as_deref()
    }

    /// Whether the on-disk name carries an extension dot.
    #[inline]
    #[must_use]
    pub const fn has_extension_dot(&self) -> bool {
        self.dotted
    }

    #[inline]
    #[must_use]
    pub fn explicit_directory(&self) -> Option<&Path> {
        self.explicit_directory.as_deref()
    }

    #[inline]
    #[must_use]
    pub const fn is_directory(&self) -> bool {
        self.is_directory
    }

    #[inline]
    #[must_use]
    pub const fn has_custom_directory(&self) -> bool {
        self.explicit_directory.is_some()
    }

    #[inline]
    #[must_use]
    pub const fn is_missing(&self) -> bool {
        self.missing
    }

    /// The synthetic "up one directory" entry.
    #[inline]
    #[must_use]
    pub fn is_parent(&self) -> bool {
        self.is_directory && self.name == PARENT_ENTRY
    }

    /// Name as it appears on disk: `name[.ext]`.
    #[must_use]
    pub fn display_name(&self) -> String {
        self.file_name().into_owned()
    }

    pub(crate) fn file_name(&self) -> Cow<'_, str> {
        match self.extension() {
            Some(ext) if self.dotted => {
                Cow::Owned(format_compact!("{}.{}", self.name, ext).into_string())
            }
            _ => Cow::Borrowed(self.name.as_str()),
        }
    }

    /// Folder the entry lives in, given the list's current directory.
    #[must_use]
    pub fn location<'a>(&'a self, current_directory: &'a Path) -> &'a Path {
        self.explicit_directory().unwrap_or(current_directory)
    }

    /// Filesystem path of the entry.
    #[must_use]
    pub fn full_path(&self, current_directory: &Path) -> PathBuf {
        self.location(current_directory).join(self.file_name().as_ref())
    }

    /// Composes a display string from the components selected by `format`.
    ///
    /// Without [`EntryFormat::SYMBOLS`] the directory loses its trailing
    /// separator, directories get no trailing `/`, and the extension is
    /// appended without its dot.
    #[must_use]
    pub fn format(&self, current_directory: &Path, format: EntryFormat) -> String {
        let symbols = format.contains(EntryFormat::SYMBOLS);
        let mut out = String::new();

        if format.contains(EntryFormat::PATH) {
            let dir = self.location(current_directory).to_string_lossy();
            if symbols {
                out.push_str(&dir);
                ensure_trailing_separator(&mut out);
            } else {
                out.push_str(trim_trailing_separators(&dir));
            }
        }

        if format.contains(EntryFormat::NAME) {
            out.push_str(&self.name);
            if self.is_directory && symbols {
                out.push(std::path::MAIN_SEPARATOR);
            }
        }

        if format.contains(EntryFormat::EXT) {
            if let Some(ext) = self.extension().filter(|_| self.dotted) {
                if symbols {
                    out.push('.');
                }
                out.push_str(ext);
            }
        }

        out
    }
}
