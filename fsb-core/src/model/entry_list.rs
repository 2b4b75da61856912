//! ``src/model/entry_list.rs``
//! ============================================================================
//! # `EntryList`: sorted, capacity-bounded listing of one source
//!
//! Directories and files live in two separately sorted collections. Callers
//! address entries through one logical index: `0..directory_count()` are the
//! directories, the rest are files.

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, trace};

use crate::error::{BrowseError, BrowseResult};
use crate::fs::backend::{DirectoryBackend, ListKind, RawEntry, RawRecord};
use crate::fs::entry::{Entry, EntryFormat};
use crate::fs::ext_set::ExtensionSet;
use crate::fs::manifest::write_manifest;
use crate::fs::ordering::{NameKey, sort_entries};
use crate::fs::walker::WalkStats;
use crate::model::flags::BrowseFlags;
use crate::util::paths::{PARENT_ENTRY, is_hidden_name, split_extension};

/// Files kept per list; the rest of a source is not read.
pub const MAX_FILES: usize = 1024;
/// Directories kept per list; later ones are dropped.
pub const MAX_DIRS: usize = 64;

/// Where a logical index points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntrySlot {
    Directory(usize),
    File(usize),
    None,
}

#[derive(Debug, Clone, Serialize)]
pub struct EntryList {
    directories: Vec<Entry>,
    files: Vec<Entry>,
    current_directory: PathBuf,
    kind: ListKind,
    walked: bool,
    walk_stats: Option<WalkStats>,
}

impl EntryList {
    /// An empty list rooted at `current_directory`.
    #[must_use]
    pub fn new(current_directory: PathBuf, kind: ListKind) -> Self {
        Self {
            directories: Vec::new(),
            files: Vec::new(),
            current_directory,
            kind,
            walked: false,
            walk_stats: None,
        }
    }

    /// Reads `path` through the matching backend, filters with `extensions`
    /// and `flags`, then sorts both collections.
    pub fn scan(
        path: &Path,
        extensions: Option<&ExtensionSet>,
        flags: BrowseFlags,
    ) -> BrowseResult<Self> {
        let mut backend = DirectoryBackend::open(path, flags.contains(BrowseFlags::WALK))?;
        let mut list = Self::new(path.to_path_buf(), backend.kind());
        list.walked = backend.is_walk();

        let mut skipped = 0usize;
        while list.files.len() < MAX_FILES {
            let Some(raw) = backend.next()? else {
                break;
            };
            if !list.admit(raw, extensions, flags)? {
                skipped += 1;
            }
        }

        list.walk_stats = backend.walk_stats();
        list.sort();

        debug!(
            marker = "LIST_SCAN",
            operation_type = "list_scan",
            path = %path.display(),
            backend = backend.name(),
            directories = list.directories.len(),
            files = list.files.len(),
            skipped,
            "Directory list populated"
        );

        Ok(list)
    }

    /// Applies the filters to one raw entry and appends it when accepted.
    /// Returns whether the entry was kept.
    pub fn admit(
        &mut self,
        raw: RawEntry,
        extensions: Option<&ExtensionSet>,
        flags: BrowseFlags,
    ) -> BrowseResult<bool> {
        match raw {
            RawEntry::Absent => Ok(false),
            RawEntry::Parent { location } => {
                if flags.intersects(BrowseFlags::SKIP_PARENT | BrowseFlags::HIDE_DIRS) {
                    return Ok(false);
                }
                self.push_directory(Entry::directory(PARENT_ENTRY, location))
            }
            RawEntry::Present(record) => self.admit_record(record, false, extensions, flags),
            RawEntry::Dead(record) => {
                if !flags.contains(BrowseFlags::LIST_DEAD) {
                    return Ok(false);
                }
                self.admit_record(record, true, extensions, flags)
            }
        }
    }

    fn admit_record(
        &mut self,
        record: RawRecord,
        dead: bool,
        extensions: Option<&ExtensionSet>,
        flags: BrowseFlags,
    ) -> BrowseResult<bool> {
        let hidden = is_hidden_name(&record.name) || record.hidden_attr;
        if hidden && !flags.contains(BrowseFlags::SHOW_HIDDEN) {
            trace!(name = %record.name, "hidden entry skipped");
            return Ok(false);
        }

        if record.is_dir {
            if flags.contains(BrowseFlags::HIDE_DIRS) {
                return Ok(false);
            }
            return self.push_directory(Entry::directory(&record.name, record.location));
        }

        if flags.contains(BrowseFlags::HIDE_FILES) {
            return Ok(false);
        }

        if let Some(set) = extensions {
            match split_extension(&record.name).1 {
                Some(ext) if !ext.is_empty() && set.accepts(ext) => {}
                _ => return Ok(false),
            }
        }

        self.push_file(Entry::from_file_name(&record.name, record.location, dead))
    }

    fn push_directory(&mut self, entry: Entry) -> BrowseResult<bool> {
        if self.directories.len() >= MAX_DIRS {
            trace!(name = entry.name(), "directory capacity reached");
            return Ok(false);
        }
        self.directories.try_reserve(1)?;
        self.directories.push(entry);
        Ok(true)
    }

    fn push_file(&mut self, entry: Entry) -> BrowseResult<bool> {
        if self.files.len() >= MAX_FILES {
            return Ok(false);
        }
        self.files.try_reserve(1)?;
        self.files.push(entry);
        Ok(true)
    }

    /// Sorts both collections; sorting a sorted list changes nothing.
    pub fn sort(&mut self) {
        sort_entries(&mut self.directories);
        sort_entries(&mut self.files);
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.directories.len() + self.files.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    #[must_use]
    pub fn directory_count(&self) -> usize {
        self.directories.len()
    }

    #[inline]
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    #[must_use]
    pub fn directories(&self) -> &[Entry] {
        &self.directories
    }

    #[must_use]
    pub fn files(&self) -> &[Entry] {
        &self.files
    }

    #[must_use]
    pub fn current_directory(&self) -> &Path {
        &self.current_directory
    }

    #[must_use]
    pub const fn kind(&self) -> ListKind {
        self.kind
    }

    /// Whether the list came from a recursive walk.
    #[must_use]
    pub const fn is_walk(&self) -> bool {
        self.walked
    }

    #[must_use]
    pub const fn walk_stats(&self) -> Option<WalkStats> {
        self.walk_stats
    }

    #[must_use]
    pub fn slot(&self, index: usize) -> EntrySlot {
        let dirs = self.directories.len();
        if index < dirs {
            EntrySlot::Directory(index)
        } else if index - dirs < self.files.len() {
            EntrySlot::File(index - dirs)
        } else {
            EntrySlot::None
        }
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Entry> {
        match self.slot(index) {
            EntrySlot::Directory(i) => self.directories.get(i),
            EntrySlot::File(i) => self.files.get(i),
            EntrySlot::None => None,
        }
    }

    /// Like [`get`](Self::get), with a typed error for out-of-range indices.
    pub fn entry(&self, index: usize) -> BrowseResult<&Entry> {
        self.get(index).ok_or(BrowseError::IndexOutOfRange {
            index,
            count: self.len(),
        })
    }

    /// All entries in logical-index order.
    pub fn iter(&self) -> impl Iterator<Item = &Entry> {
        self.directories.iter().chain(self.files.iter())
    }

    // ------------------------------------------------------------------------
    // Lookup and mutation
    // ------------------------------------------------------------------------

    /// Logical index of `name` (`stem[.ext]` for files) in the directory or
    /// file collection. An exact match wins; otherwise the first
    /// case-insensitive match is returned.
    pub fn find(&self, name: &str, is_directory: bool) -> BrowseResult<usize> {
        let (collection, offset, probe) = if is_directory {
            (
                &self.directories,
                0,
                NameKey {
                    name,
                    extension: "",
                    dotted: false,
                },
            )
        } else {
            (
                &self.files,
                self.directories.len(),
                NameKey::of_file_name(name),
            )
        };

        if collection.is_empty() {
            return Err(BrowseError::EmptyCollection);
        }

        let exact = collection.partition_point(|e| NameKey::of(e).cmp_exact(&probe).is_lt());
        if collection
            .get(exact)
            .is_some_and(|e| NameKey::of(e).cmp_exact(&probe).is_eq())
        {
            return Ok(offset + exact);
        }

        let folded = collection.partition_point(|e| NameKey::of(e).cmp_folded(&probe).is_lt());
        if collection
            .get(folded)
            .is_some_and(|e| NameKey::of(e).cmp_folded(&probe).is_eq())
        {
            return Ok(offset + folded);
        }

        Err(BrowseError::not_found(name))
    }

    /// Removes and returns the entry at a logical index. Order is kept.
    pub fn remove_at(&mut self, index: usize) -> BrowseResult<Entry> {
        match self.slot(index) {
            EntrySlot::Directory(i) => Ok(self.directories.remove(i)),
            EntrySlot::File(i) => Ok(self.files.remove(i)),
            EntrySlot::None => Err(BrowseError::IndexOutOfRange {
                index,
                count: self.len(),
            }),
        }
    }

    /// Full paths of every real entry, in list order: the manifest form of
    /// this list.
    pub fn manifest_lines(&self) -> impl Iterator<Item = String> + '_ {
        self.iter()
            .filter(|entry| !entry.is_parent())
            .map(|entry| entry.format(&self.current_directory, EntryFormat::FULL))
    }

    /// Writes [`manifest_lines`](Self::manifest_lines) to `dest`.
    pub fn dump(&self, dest: &Path) -> BrowseResult<usize> {
        write_manifest(dest, self.manifest_lines())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn names(entries: &[Entry]) -> Vec<String> {
        entries.iter().map(Entry::display_name).collect()
    }

    fn record(name: &str, is_dir: bool) -> RawEntry {
        RawEntry::Present(RawRecord {
            name: name.to_string(),
            location: None,
            is_dir,
            size: 0,
            hidden_attr: false,
        })
    }

    #[test]
    fn folder_scan_sorts_and_splits() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("b.txt"), b"").unwrap();
        fs::write(tmp.path().join("A.TXT"), b"").unwrap();
        fs::write(tmp.path().join(".hidden"), b"").unwrap();
        fs::create_dir(tmp.path().join("sub")).unwrap();

        let list = EntryList::scan(tmp.path(), None, BrowseFlags::empty()).unwrap();
        assert_eq!(list.kind(), ListKind::RealFolder);
        assert_eq!(names(list.files()), ["A.TXT", "b.txt"]);
        assert_eq!(names(list.directories()), ["sub", ".."]);

        let plain = EntryList::scan(tmp.path(), None, BrowseFlags::SKIP_PARENT).unwrap();
        assert_eq!(names(plain.directories()), ["sub"]);

        let all = EntryList::scan(tmp.path(), None, BrowseFlags::SHOW_HIDDEN).unwrap();
        assert_eq!(names(all.files()), ["A.TXT", "b.txt", ".hidden"]);
    }

    #[test]
    fn hide_flags_drop_whole_classes() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("f.txt"), b"").unwrap();
        fs::create_dir(tmp.path().join("d")).unwrap();

        let no_dirs = EntryList::scan(tmp.path(), None, BrowseFlags::HIDE_DIRS).unwrap();
        assert_eq!(no_dirs.directory_count(), 0);
        assert_eq!(no_dirs.file_count(), 1);

        let no_files = EntryList::scan(tmp.path(), None, BrowseFlags::HIDE_FILES).unwrap();
        assert_eq!(no_files.file_count(), 0);
        assert_eq!(names(no_files.directories()), ["d", ".."]);
    }

    #[test]
    fn extension_filter_applies_to_files_only() {
        let tmp = TempDir::new().unwrap();
        for name in ["song.MP3", "pic.png", "notes.txt", "README"] {
            fs::write(tmp.path().join(name), b"").unwrap();
        }
        fs::create_dir(tmp.path().join("albums.mp3d")).unwrap();

        let set = ExtensionSet::build(["mp3", "png"]).unwrap().unwrap();
        let list = EntryList::scan(tmp.path(), Some(&set), BrowseFlags::SKIP_PARENT).unwrap();
        assert_eq!(names(list.files()), ["pic.png", "song.MP3"]);
        assert_eq!(names(list.directories()), ["albums.mp3d"]);
    }

    #[test]
    fn capacities_are_enforced() {
        let mut list = EntryList::new(PathBuf::from("/"), ListKind::RealFolder);
        for i in 0..MAX_DIRS + 5 {
            list.admit(record(&format!("d{i}"), true), None, BrowseFlags::empty())
                .unwrap();
        }
        for i in 0..MAX_FILES + 5 {
            list.admit(record(&format!("f{i}.bin"), false), None, BrowseFlags::empty())
                .unwrap();
        }
        assert_eq!(list.directory_count(), MAX_DIRS);
        assert_eq!(list.file_count(), MAX_FILES);
    }

    #[test]
    fn logical_index_resolution() {
        let mut list = EntryList::new(PathBuf::from("/x"), ListKind::RealFolder);
        list.admit(record("dir", true), None, BrowseFlags::empty()).unwrap();
        list.admit(record("a.txt", false), None, BrowseFlags::empty()).unwrap();
        list.admit(record("b.txt", false), None, BrowseFlags::empty()).unwrap();

        assert_eq!(list.slot(0), EntrySlot::Directory(0));
        assert_eq!(list.slot(2), EntrySlot::File(1));
        assert_eq!(list.slot(3), EntrySlot::None);
        assert!(matches!(
            list.entry(3),
            Err(BrowseError::IndexOutOfRange { index: 3, count: 3 })
        ));
    }

    #[test]
    fn find_agrees_with_iteration() {
        let mut list = EntryList::new(PathBuf::from("/x"), ListKind::RealFolder);
        for name in ["zeta.txt", "Alpha.txt", "alpha.TXT", ".dot", "mid", "mid.", "b.tar.gz"] {
            list.admit(record(name, false), None, BrowseFlags::SHOW_HIDDEN)
                .unwrap();
        }
        for name in ["Music", "art"] {
            list.admit(record(name, true), None, BrowseFlags::empty()).unwrap();
        }
        list.sort();

        for (idx, entry) in list.iter().enumerate() {
            let found = list.find(&entry.display_name(), entry.is_directory()).unwrap();
            assert_eq!(found, idx, "{}", entry.display_name());
        }

        let folded = list.find("ZETA.TXT", false).unwrap();
        assert_eq!(list.get(folded).unwrap().display_name(), "zeta.txt");
        assert!(matches!(list.find("nope.txt", false), Err(BrowseError::NotFound(_))));
    }

    #[test]
    fn find_in_empty_collection() {
        let list = EntryList::new(PathBuf::from("/x"), ListKind::RealFolder);
        assert!(matches!(list.find("a", true), Err(BrowseError::EmptyCollection)));
        assert!(matches!(list.find("a.txt", false), Err(BrowseError::EmptyCollection)));
    }

    #[test]
    fn dead_lines_need_the_flag() {
        let dead = || {
            RawEntry::Dead(RawRecord {
                name: "gone.png".into(),
                location: Some(PathBuf::from("/a/")),
                is_dir: false,
                size: 0,
                hidden_attr: false,
            })
        };
        let mut list = EntryList::new(PathBuf::from("/a/list.txt"), ListKind::TextManifest);
        assert!(!list.admit(dead(), None, BrowseFlags::empty()).unwrap());
        assert!(list.admit(dead(), None, BrowseFlags::LIST_DEAD).unwrap());
        assert!(list.files()[0].is_missing());
    }

    #[test]
    fn remove_keeps_order() {
        let mut list = EntryList::new(PathBuf::from("/x"), ListKind::RealFolder);
        for name in ["c.txt", "a.txt", "b.txt"] {
            list.admit(record(name, false), None, BrowseFlags::empty()).unwrap();
        }
        list.sort();

        let removed = list.remove_at(1).unwrap();
        assert_eq!(removed.display_name(), "b.txt");
        assert_eq!(names(list.files()), ["a.txt", "c.txt"]);
        assert!(list.remove_at(5).is_err());
    }

    #[test]
    fn manifest_lines_skip_parent() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("one.png"), b"").unwrap();
        fs::create_dir(tmp.path().join("sub")).unwrap();

        let list = EntryList::scan(tmp.path(), None, BrowseFlags::empty()).unwrap();
        let lines: Vec<String> = list.manifest_lines().collect();
        let base = tmp.path().to_string_lossy();
        assert_eq!(lines, [format!("{base}/sub/"), format!("{base}/one.png")]);
    }
}
