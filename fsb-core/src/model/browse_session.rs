//! ``src/model/browse_session.rs``
//! ============================================================================
//! # `BrowseSession`: navigation and entry management over one live list
//!
//! A session owns at most one [`EntryList`] together with the extension
//! filter and the behaviour flags every (re)scan uses. Navigation replaces
//! the list; `remove` and `hide` act on the filesystem object behind an
//! entry and keep the in-memory list (and a manifest file, if that is what
//! the list was read from) in step.

use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::sync::Arc;

use tracing::info;

use crate::error::{BrowseError, BrowseResult};
use crate::fs::attrs::set_hidden;
use crate::fs::backend::ListKind;
use crate::fs::entry::{Entry, EntryFormat};
use crate::fs::ext_set::ExtensionSet;
use crate::fs::walker::{DirectoryWalker, WalkStats};
use crate::model::entry_list::EntryList;
use crate::model::flags::BrowseFlags;
use crate::util::paths::{PARENT_ENTRY, absolute, parent_directory, split_name_path};

#[derive(Debug, Default)]
pub struct BrowseSession {
    list: Option<EntryList>,
    extensions: Option<Arc<ExtensionSet>>,
    flags: BrowseFlags,
    last_walk_stats: Option<WalkStats>,
}

impl BrowseSession {
    /// A session with no open list. `extensions == None` accepts every file.
    #[must_use]
    pub fn new(extensions: Option<Arc<ExtensionSet>>, flags: BrowseFlags) -> Self {
        Self {
            list: None,
            extensions,
            flags,
            last_walk_stats: None,
        }
    }

    // ------------------------------------------------------------------------
    // Settings
    // ------------------------------------------------------------------------

    #[inline]
    #[must_use]
    pub const fn flags(&self) -> BrowseFlags {
        self.flags
    }

    /// Flags used by the next scan; the open list is not rebuilt.
    #[inline]
    pub fn flags_mut(&mut self) -> &mut BrowseFlags {
        &mut self.flags
    }

    #[inline]
    pub fn set_flags(&mut self, flags: BrowseFlags) {
        self.flags = flags;
    }

    #[must_use]
    pub fn extensions(&self) -> Option<&ExtensionSet> {
        self.extensions.as_deref()
    }

    pub fn set_extensions(&mut self, extensions: Option<Arc<ExtensionSet>>) {
        self.extensions = extensions;
    }

    // ------------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------------

    /// Replaces the current list with a scan of `path`.
    ///
    /// A folder is listed as is, any other file is read as a manifest, and
    /// `walk` lists everything below `path` instead.
    pub fn open(&mut self, path: &Path, walk: bool) -> BrowseResult<&EntryList> {
        self.close();

        let path = absolute(path).map_err(|e| BrowseError::open_failure(path, e))?;
        self.flags.set(BrowseFlags::WALK, walk);

        let list = EntryList::scan(&path, self.extensions.as_deref(), self.flags)
            .map_err(BrowseError::trace)?;

        if let Some(stats) = list.walk_stats() {
            self.last_walk_stats = Some(stats);
        }

        info!(
            marker = "SESSION_OPEN",
            operation_type = "session_open",
            path = %path.display(),
            walk,
            entries = list.len(),
            "Directory opened"
        );

        Ok(self.list.insert(list))
    }

    /// Drops the current list. Calling it again does nothing.
    pub fn close(&mut self) {
        if let Some(list) = self.list.take() {
            info!(
                marker = "SESSION_CLOSE",
                operation_type = "session_close",
                path = %list.current_directory().display(),
                "Directory closed"
            );
        }
    }

    pub fn change_directory(&mut self, path: &Path) -> BrowseResult<&EntryList> {
        self.close();
        self.open(path, false)
    }

    /// Moves to the parent of the current directory.
    pub fn back(&mut self) -> BrowseResult<&EntryList> {
        let current = self.active()?.current_directory();
        let Some(parent) = parent_directory(current) else {
            return Err(BrowseError::AtRoot(current.to_path_buf()));
        };
        self.change_directory(&parent)
    }

    // ------------------------------------------------------------------------
    // Inspection
    // ------------------------------------------------------------------------

    #[must_use]
    pub fn list(&self) -> Option<&EntryList> {
        self.list.as_ref()
    }

    #[must_use]
    pub fn current_directory(&self) -> Option<&Path> {
        self.list.as_ref().map(EntryList::current_directory)
    }

    /// Counters of the most recent walk, whether a walk listing or a
    /// recursive removal.
    #[must_use]
    pub const fn last_walk_stats(&self) -> Option<WalkStats> {
        self.last_walk_stats
    }

    /// Directories plus files; 0 without a list.
    #[must_use]
    pub fn entry_count(&self) -> usize {
        self.list.as_ref().map_or(0, EntryList::len)
    }

    #[must_use]
    pub fn entry_at(&self, index: usize) -> Option<&Entry> {
        self.list.as_ref()?.get(index)
    }

    #[must_use]
    pub fn is_directory(&self, index: usize) -> bool {
        self.entry_at(index).is_some_and(Entry::is_directory)
    }

    /// Logical index of the entry called `name`.
    ///
    /// The name is looked up in the directory or file collection depending
    /// on what it refers to on disk; names that do not exist on disk are
    /// tried as files first.
    pub fn find_index(&self, name: &str) -> BrowseResult<usize> {
        let list = self.active()?;

        let base = match list.kind() {
            ListKind::TextManifest => parent_directory(list.current_directory())
                .unwrap_or_else(|| list.current_directory().to_path_buf()),
            ListKind::RealFolder => list.current_directory().to_path_buf(),
        };
        let target = base.join(name);
        let (_, leaf) = split_name_path(name);
        let leaf = if leaf.is_empty() { name } else { leaf };

        match fs::metadata(&target) {
            Ok(metadata) => list.find(leaf, metadata.is_dir()),
            Err(_) if leaf == PARENT_ENTRY => list.find(leaf, true),
            Err(_) => match list.find(leaf, false) {
                Err(BrowseError::NotFound(_) | BrowseError::EmptyCollection) => {
                    list.find(leaf, true)
                }
                found => found,
            },
        }
    }

    /// Formats `entry` relative to the current list.
    pub fn format_entry_path(&self, entry: &Entry, format: EntryFormat) -> BrowseResult<String> {
        Ok(entry.format(self.active()?.current_directory(), format))
    }

    pub fn entry_string(&self, index: usize, format: EntryFormat) -> BrowseResult<String> {
        let list = self.active()?;
        Ok(list.entry(index)?.format(list.current_directory(), format))
    }

    // ------------------------------------------------------------------------
    // Mutation
    // ------------------------------------------------------------------------

    /// Sets or clears the hidden attribute of the object behind `entry`.
    pub fn hide(&self, entry: &Entry, hide: bool) -> BrowseResult<()> {
        let path = entry.full_path(self.active()?.current_directory());
        set_hidden(&path, hide).map_err(BrowseError::trace)
    }

    pub fn hide_at(&self, index: usize, hide: bool) -> BrowseResult<()> {
        let entry = self.active()?.entry(index)?;
        self.hide(entry, hide)
    }

    /// Deletes the object at `index` (recursively for directories) and drops
    /// it from the list. Manifest lists are written back to their file.
    pub fn remove(&mut self, index: usize) -> BrowseResult<Entry> {
        let list = self.list.as_ref().ok_or(BrowseError::NoActiveList)?;
        let entry = list.entry(index)?;
        if entry.is_parent() {
            return Err(BrowseError::ProtectedEntry(PARENT_ENTRY.into()));
        }

        let path = entry.full_path(list.current_directory());
        if entry.is_directory() {
            self.remove_directory(&path)?;
        } else {
            Self::remove_file(&path, entry.is_missing())?;
        }

        let list = self.list.as_mut().ok_or(BrowseError::NoActiveList)?;
        let removed = list.remove_at(index)?;

        if list.kind() == ListKind::TextManifest {
            let manifest = list.current_directory().to_path_buf();
            list.dump(&manifest).map_err(BrowseError::trace)?;
        }

        info!(
            marker = "ENTRY_REMOVE",
            operation_type = "entry_remove",
            path = %path.display(),
            is_directory = removed.is_directory(),
            "Entry removed"
        );

        Ok(removed)
    }

    fn remove_directory(&mut self, path: &Path) -> BrowseResult<()> {
        let metadata =
            fs::symlink_metadata(path).map_err(|e| BrowseError::file_system(path, e).trace())?;
        if metadata.file_type().is_symlink() {
            // the link goes, its target stays
            return Self::remove_file(path, false);
        }
        let stats = DirectoryWalker::remove_tree(path).map_err(BrowseError::trace)?;
        self.last_walk_stats = Some(stats);
        Ok(())
    }

    /// Only a dead manifest entry may already be gone.
    fn remove_file(path: &Path, missing: bool) -> BrowseResult<()> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if missing && e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(BrowseError::file_system(path, e).trace()),
        }
    }

    /// Writes the current list to `dest` in manifest form.
    pub fn dump_to_text(&self, dest: &Path) -> BrowseResult<usize> {
        self.active()?.dump(dest)
    }

    fn active(&self) -> BrowseResult<&EntryList> {
        self.list.as_ref().ok_or(BrowseError::NoActiveList)
    }
}

impl Drop for BrowseSession {
    fn drop(&mut self) {
        self.close();
    }
}
