//! `src/fs/ext_set.rs`
//!
//! Whitelist of file extensions a listing accepts.
//!
//! The set is searched with a case-insensitive binary search and is never
//! re-sorted: callers must hand it an alphabetically sorted list
//! (case-insensitive), otherwise lookups silently miss. The wildcard `"*"`
//! means "accept everything" and is represented by having no set at all.

use compact_str::CompactString;
use smallvec::SmallVec;

use crate::error::{BrowseError, BrowseResult};
use crate::fs::ordering::cmp_ignore_case;

/// Token that disables extension filtering.
pub const WILDCARD: &str = "*";

pub const AUDIO: &[&str] = &["mp3", "ogg", "raw", "wav"];
pub const IMAGE: &[&str] = &["bmp", "jpg", "png"];
pub const BINARY: &[&str] = &["nds", "nzip", "plg"];
/// Union of the audio, image and binary presets, kept sorted.
pub const INTERNAL: &[&str] = &[
    "bmp", "jpg", "mp3", "nds", "nzip", "ogg", "plg", "png", "raw", "wav",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionSet {
    extensions: SmallVec<[CompactString; 16]>,
}

impl ExtensionSet {
    /// Copies `extensions` into a new set.
    ///
    /// Returns `Ok(None)` when the wildcard appears anywhere in the list.
    pub fn build<I, S>(extensions: I) -> BrowseResult<Option<Self>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let iter = extensions.into_iter();
        let mut stored: SmallVec<[CompactString; 16]> = SmallVec::new();
        stored
            .try_reserve(iter.size_hint().0)
            .map_err(|_| BrowseError::allocation("extension set", iter.size_hint().0))?;

        for ext in iter {
            let ext = ext.as_ref();
            if ext == WILDCARD {
                return Ok(None);
            }
            stored
                .try_reserve(1)
                .map_err(|_| BrowseError::allocation("extension set", 1))?;
            stored.push(CompactString::new(ext.to_ascii_lowercase()));
        }

        Ok(Some(Self { extensions: stored }))
    }

    /// Resolves a named preset (`audio`, `image`, `binary`, `internal`).
    #[must_use]
    pub fn preset(name: &str) -> Option<&'static [&'static str]> {
        match name.to_ascii_lowercase().as_str() {
            "audio" => Some(AUDIO),
            "image" => Some(IMAGE),
            "binary" => Some(BINARY),
            "internal" => Some(INTERNAL),
            _ => None,
        }
    }

    #[must_use]
    pub fn audio() -> Self {
        Self::from_static(AUDIO)
    }

    #[must_use]
    pub fn image() -> Self {
        Self::from_static(IMAGE)
    }

    #[must_use]
    pub fn binary() -> Self {
        Self::from_static(BINARY)
    }

    #[must_use]
    pub fn internal() -> Self {
        Self::from_static(INTERNAL)
    }

    fn from_static(list: &'static [&'static str]) -> Self {
        Self {
            extensions: list.iter().map(|&ext| CompactString::const_new(ext)).collect(),
        }
    }

    /// Index of `ext` in the set.
    ///
    /// Misses are `NotFound`; searching a set with no members is
    /// `EmptyCollection`.
    pub fn contains(&self, ext: &str) -> BrowseResult<usize> {
        if self.extensions.is_empty() {
            return Err(BrowseError::EmptyCollection);
        }

        self.extensions
            .binary_search_by(|probe| cmp_ignore_case(probe, ext))
            .map_err(|_| BrowseError::not_found(ext))
    }

    #[inline]
    #[must_use]
    pub fn accepts(&self, ext: &str) -> bool {
        self.contains(ext).is_ok()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.extensions.iter().map(CompactString::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_member_is_found_at_its_index() {
        let set = ExtensionSet::internal();
        for (idx, ext) in INTERNAL.iter().enumerate() {
            assert_eq!(set.contains(ext).unwrap(), idx);
            assert_eq!(set.contains(&ext.to_uppercase()).unwrap(), idx);
        }
    }

    #[test]
    fn non_members_are_not_found() {
        let set = ExtensionSet::build(["gif", "png", "txt"]).unwrap().unwrap();
        for miss in ["", "a", "bmp", "jpeg", "pn", "pngx", "zip"] {
            assert!(matches!(set.contains(miss), Err(BrowseError::NotFound(_))), "{miss}");
        }
    }

    #[test]
    fn empty_set_is_distinguished() {
        let set = ExtensionSet::build(Vec::<String>::new()).unwrap().unwrap();
        assert!(set.is_empty());
        assert!(matches!(set.contains("png"), Err(BrowseError::EmptyCollection)));
    }

    #[test]
    fn wildcard_means_no_set() {
        assert!(ExtensionSet::build(["png", "*"]).unwrap().is_none());
        assert!(ExtensionSet::build(["*"]).unwrap().is_none());
    }

    #[test]
    fn build_lowercases_members() {
        let set = ExtensionSet::build(["MP3", "Ogg"]).unwrap().unwrap();
        assert_eq!(set.iter().collect::<Vec<_>>(), ["mp3", "ogg"]);
        assert!(set.accepts("OGG"));
    }

    #[test]
    fn presets_resolve_by_name() {
        assert_eq!(ExtensionSet::preset("Audio"), Some(AUDIO));
        assert_eq!(ExtensionSet::preset("video"), None);
        assert_eq!(ExtensionSet::image().len(), 3);
        assert!(ExtensionSet::binary().accepts("nzip"));
        assert!(ExtensionSet::audio().accepts("wav"));
    }
}
