//! ``src/fs/walker.rs``
//!
//! # `DirectoryWalker`: bounded recursive traversal
//!
//! Visits every file and folder below a root, one entry per step, holding a
//! single open directory at a time. Each nesting level keeps a resume cursor
//! (the number of entries already consumed there that still exist on disk);
//! when the walk climbs back into a parent it reopens the parent and skips
//! that many entries instead of starting over.
//!
//! In [`WalkMode::Delete`] every file is removed when visited and every
//! folder is removed on the way back up, root included, which makes the walk
//! a recursive delete. Removed entries do not advance the cursor.
//!
//! Nesting is capped at [`MAX_DEPTH`] levels (root = depth 0). Descending any
//! further aborts the walk with [`BrowseError::DepthExceeded`].

use std::ffi::OsString;
use std::fmt;
use std::fs::{self, Metadata, ReadDir};
use std::io;
use std::path::{Path, PathBuf};

use bytesize::ByteSize;
use serde::Serialize;
use smallvec::SmallVec;
use tracing::{debug, info, warn};

use crate::error::{BrowseError, BrowseResult};

/// Maximum number of nested levels, root included.
pub const MAX_DEPTH: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkMode {
    /// Read-only traversal.
    Inspect,
    /// Remove files on visit and folders on ascent.
    Delete,
}

/// Aggregate counters of a walk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WalkStats {
    pub folders: u64,
    pub files: u64,
    pub total_bytes: u64,
    /// Deepest level opened (root = 0).
    pub max_depth: usize,
}

impl fmt::Display for WalkStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} folders, {} files, {}",
            self.folders,
            self.files,
            ByteSize::b(self.total_bytes)
        )
    }
}

/// One visited entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalkItem {
    /// Folder containing the entry.
    pub parent: PathBuf,
    /// Final component as stored on disk; not necessarily UTF-8.
    pub name: OsString,
    pub is_dir: bool,
    pub size: u64,
    /// Level of `parent` (root = 0).
    pub depth: usize,
}

impl WalkItem {
    #[must_use]
    pub fn path(&self) -> PathBuf {
        self.parent.join(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum WalkState {
    Scanning,
    Descending(PathBuf),
    Ascending,
    Done,
}

enum Step {
    Item(WalkItem),
    Continue,
    Done,
}

#[derive(Debug)]
struct Level {
    path: PathBuf,
    cursor: usize,
}

#[derive(Debug)]
pub struct DirectoryWalker {
    root: PathBuf,
    mode: WalkMode,
    levels: SmallVec<[Level; 8]>,
    reader: Option<ReadDir>,
    // entries seen in the current pass over the open directory
    position: usize,
    state: WalkState,
    stats: WalkStats,
}

impl DirectoryWalker {
    /// Opens `root` and positions the walk at its first entry.
    ///
    /// A delete walk never starts at a symbolic link: reading it would list
    /// and remove the target's contents.
    pub fn new(root: &Path, mode: WalkMode) -> BrowseResult<Self> {
        if mode == WalkMode::Delete
            && fs::symlink_metadata(root).is_ok_and(|m| m.file_type().is_symlink())
        {
            return Err(BrowseError::file_system(
                root,
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "refusing to delete through a symbolic link",
                ),
            )
            .trace());
        }

        let reader = fs::read_dir(root).map_err(|e| BrowseError::open_failure(root, e))?;

        let mut levels = SmallVec::new();
        levels.push(Level {
            path: root.to_path_buf(),
            cursor: 0,
        });

        debug!(
            marker = "DIR_WALK",
            operation_type = "walk_start",
            root = %root.display(),
            mode = ?mode,
            "Starting directory walk"
        );

        Ok(Self {
            root: root.to_path_buf(),
            mode,
            levels,
            reader: Some(reader),
            position: 0,
            state: WalkState::Scanning,
            stats: WalkStats::default(),
        })
    }

    /// Read-only walk returning the totals for `root`.
    pub fn measure(root: &Path) -> BrowseResult<WalkStats> {
        Self::new(root, WalkMode::Inspect)?.run()
    }

    /// Deletes `root` and everything below it.
    pub fn remove_tree(root: &Path) -> BrowseResult<WalkStats> {
        let stats = Self::new(root, WalkMode::Delete)?.run()?;

        if fs::symlink_metadata(root).is_ok() {
            return Err(BrowseError::file_system(
                root,
                io::Error::new(
                    io::ErrorKind::DirectoryNotEmpty,
                    "directory could not be fully removed",
                ),
            ));
        }

        Ok(stats)
    }

    /// Drives the walk to completion.
    pub fn run(mut self) -> BrowseResult<WalkStats> {
        while self.next_item()?.is_some() {}
        Ok(self.stats)
    }

    #[inline]
    #[must_use]
    pub const fn stats(&self) -> WalkStats {
        self.stats
    }

    /// Current nesting level (root = 0).
    #[inline]
    #[must_use]
    pub fn depth(&self) -> usize {
        self.levels.len().saturating_sub(1)
    }

    #[inline]
    #[must_use]
    pub fn is_done(&self) -> bool {
        self.state == WalkState::Done
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Advances until the next visited entry; `None` once the walk is done.
    pub fn next_item(&mut self) -> BrowseResult<Option<WalkItem>> {
        loop {
            match self.step()? {
                Step::Item(item) => return Ok(Some(item)),
                Step::Continue => {}
                Step::Done => return Ok(None),
            }
        }
    }

    fn step(&mut self) -> BrowseResult<Step> {
        match std::mem::replace(&mut self.state, WalkState::Scanning) {
            WalkState::Scanning => self.scan(),
            WalkState::Descending(child) => {
                self.descend(child);
                Ok(Step::Continue)
            }
            WalkState::Ascending => Ok(self.ascend()),
            WalkState::Done => {
                self.state = WalkState::Done;
                Ok(Step::Done)
            }
        }
    }

    fn scan(&mut self) -> BrowseResult<Step> {
        let Some(level) = self.levels.last() else {
            self.state = WalkState::Done;
            return Ok(Step::Done);
        };
        let level_path = level.path.clone();
        let cursor = level.cursor;
        let depth = self.depth();

        if self.reader.is_none() {
            match fs::read_dir(&level_path) {
                Ok(reader) => self.reader = Some(reader),
                Err(e) => {
                    warn!(
                        marker = "DIR_WALK",
                        path = %level_path.display(),
                        error = %e,
                        "Cannot open directory, leaving it"
                    );
                    self.state = WalkState::Ascending;
                    return Ok(Step::Continue);
                }
            }
        }

        let next = self.reader.as_mut().and_then(Iterator::next);
        let entry = match next {
            None => {
                self.state = WalkState::Ascending;
                return Ok(Step::Continue);
            }
            Some(Err(e)) => {
                warn!(marker = "DIR_WALK", path = %level_path.display(), error = %e, "Unreadable entry skipped");
                return Ok(Step::Continue);
            }
            Some(Ok(entry)) => entry,
        };

        // already handled in an earlier pass over this directory
        if self.position < cursor {
            self.position += 1;
            return Ok(Step::Continue);
        }

        let name = entry.file_name();
        if name == "." || name == ".." {
            return Ok(Step::Continue);
        }

        let metadata: Metadata = match entry.metadata() {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!(marker = "DIR_WALK", path = %entry.path().display(), error = %e, "Stat failed, entry skipped");
                self.advance_cursor();
                return Ok(Step::Continue);
            }
        };

        if metadata.is_dir() {
            let child = entry.path();
            if self.levels.len() >= MAX_DEPTH {
                self.abort();
                return Err(BrowseError::DepthExceeded {
                    path: child,
                    limit: MAX_DEPTH,
                }
                .trace());
            }

            self.stats.folders += 1;
            self.state = WalkState::Descending(child);

            return Ok(Step::Item(WalkItem {
                parent: level_path,
                name,
                is_dir: true,
                size: 0,
                depth,
            }));
        }

        self.stats.files += 1;
        self.stats.total_bytes += metadata.len();

        let removed = self.mode == WalkMode::Delete && Self::remove_file(&entry.path());
        if !removed {
            self.advance_cursor();
        }

        Ok(Step::Item(WalkItem {
            parent: level_path,
            name,
            is_dir: false,
            size: metadata.len(),
            depth,
        }))
    }

    fn descend(&mut self, child: PathBuf) {
        self.reader = None;
        self.position = 0;
        self.levels.push(Level {
            path: child,
            cursor: 0,
        });
        self.stats.max_depth = self.stats.max_depth.max(self.depth());
    }

    fn ascend(&mut self) -> Step {
        self.reader = None;
        self.position = 0;

        let Some(finished) = self.levels.pop() else {
            self.state = WalkState::Done;
            return Step::Done;
        };

        let removed = self.mode == WalkMode::Delete && Self::remove_dir(&finished.path);

        match self.levels.last_mut() {
            Some(parent) => {
                if !removed {
                    parent.cursor += 1;
                }
                self.state = WalkState::Scanning;
                Step::Continue
            }
            None => {
                info!(
                    marker = "DIR_WALK",
                    operation_type = "walk_complete",
                    root = %self.root.display(),
                    folders = self.stats.folders,
                    files = self.stats.files,
                    total_bytes = self.stats.total_bytes,
                    "Directory walk finished"
                );
                self.state = WalkState::Done;
                Step::Done
            }
        }
    }

    fn advance_cursor(&mut self) {
        if let Some(level) = self.levels.last_mut() {
            level.cursor += 1;
        }
        self.position += 1;
    }

    fn abort(&mut self) {
        self.reader = None;
        self.state = WalkState::Done;
    }

    fn remove_file(path: &Path) -> bool {
        match fs::remove_file(path) {
            Ok(()) => true,
            Err(e) => {
                warn!(marker = "DIR_WALK", path = %path.display(), error = %e, "File removal failed");
                false
            }
        }
    }

    fn remove_dir(path: &Path) -> bool {
        match fs::remove_dir(path) {
            Ok(()) => true,
            Err(e) => {
                warn!(marker = "DIR_WALK", path = %path.display(), error = %e, "Folder removal failed");
                false
            }
        }
    }
}

impl Iterator for DirectoryWalker {
    type Item = BrowseResult<WalkItem>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_item().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use tempfile::TempDir;
    use walkdir::WalkDir;

    fn build_tree(root: &Path) {
        fs::create_dir_all(root.join("a/b/c")).unwrap();
        fs::create_dir_all(root.join("d")).unwrap();
        fs::write(root.join("top.txt"), b"12345").unwrap();
        fs::write(root.join("a/one.bin"), b"1").unwrap();
        fs::write(root.join("a/b/two.bin"), b"22").unwrap();
        fs::write(root.join("a/b/c/three.bin"), b"333").unwrap();
        fs::write(root.join("d/four.bin"), b"4444").unwrap();
        fs::write(root.join("zz.txt"), b"").unwrap();
    }

    fn nested_chain(root: &Path, levels: usize) -> PathBuf {
        let mut path = root.to_path_buf();
        for i in 0..levels {
            path.push(format!("n{i}"));
        }
        fs::create_dir_all(&path).unwrap();
        fs::write(path.join("leaf.txt"), b"leaf").unwrap();
        path
    }

    #[test]
    fn visits_every_entry_exactly_once() {
        let tmp = TempDir::new().unwrap();
        build_tree(tmp.path());

        let walker = DirectoryWalker::new(tmp.path(), WalkMode::Inspect).unwrap();
        let visited: Vec<PathBuf> = walker.map(|item| item.unwrap().path()).collect();

        let expected: BTreeSet<PathBuf> = WalkDir::new(tmp.path())
            .min_depth(1)
            .into_iter()
            .map(|e| e.unwrap().path().to_path_buf())
            .collect();

        assert_eq!(visited.len(), expected.len());
        assert_eq!(visited.into_iter().collect::<BTreeSet<_>>(), expected);
    }

    #[test]
    fn counters_match_tree() {
        let tmp = TempDir::new().unwrap();
        build_tree(tmp.path());

        let stats = DirectoryWalker::measure(tmp.path()).unwrap();
        assert_eq!(stats.folders, 4);
        assert_eq!(stats.files, 6);
        assert_eq!(stats.total_bytes, 15);
        assert_eq!(stats.max_depth, 3);
    }

    #[test]
    fn items_report_their_real_parent() {
        let tmp = TempDir::new().unwrap();
        build_tree(tmp.path());

        for item in DirectoryWalker::new(tmp.path(), WalkMode::Inspect).unwrap() {
            let item = item.unwrap();
            assert!(item.path().starts_with(tmp.path()));
            assert_eq!(item.path().parent().unwrap(), item.parent.as_path());
            assert_eq!(item.is_dir, item.path().is_dir());
        }
    }

    #[test]
    fn delete_mode_removes_everything() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("victim");
        build_tree(&root);

        let stats = DirectoryWalker::remove_tree(&root).unwrap();
        assert_eq!(stats.files, 6);
        assert_eq!(stats.folders, 4);
        assert!(!root.exists());
        assert_eq!(WalkDir::new(tmp.path()).min_depth(1).into_iter().count(), 0);
    }

    #[cfg(unix)]
    #[test]
    fn delete_walk_refuses_a_linked_root() {
        let tmp = TempDir::new().unwrap();
        let target = tmp.path().join("target");
        build_tree(&target);
        let link = tmp.path().join("link");
        std::os::unix::fs::symlink(&target, &link).unwrap();

        let err = DirectoryWalker::remove_tree(&link).unwrap_err();
        assert!(matches!(err, BrowseError::FileSystem { .. }));
        assert_eq!(DirectoryWalker::measure(&target).unwrap().files, 6);
        assert!(link.exists());
    }

    #[cfg(unix)]
    #[test]
    fn delete_walk_unlinks_nested_links_only() {
        let tmp = TempDir::new().unwrap();
        let outside = tmp.path().join("outside");
        fs::create_dir(&outside).unwrap();
        fs::write(outside.join("precious.txt"), b"keep").unwrap();

        let root = tmp.path().join("victim");
        fs::create_dir(&root).unwrap();
        std::os::unix::fs::symlink(&outside, root.join("link")).unwrap();

        DirectoryWalker::remove_tree(&root).unwrap();
        assert!(!root.exists());
        assert!(outside.join("precious.txt").exists());
    }

    #[test]
    fn depth_bound_is_reachable() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("deep");
        nested_chain(&root, MAX_DEPTH - 1);

        let stats = DirectoryWalker::measure(&root).unwrap();
        assert_eq!(stats.max_depth, MAX_DEPTH - 1);
        assert_eq!(stats.files, 1);

        let removed = DirectoryWalker::remove_tree(&root).unwrap();
        assert!(removed.max_depth < MAX_DEPTH);
        assert!(!root.exists());
    }

    #[test]
    fn depth_past_bound_fails() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("deeper");
        nested_chain(&root, MAX_DEPTH);

        let err = DirectoryWalker::measure(&root).unwrap_err();
        assert!(matches!(err, BrowseError::DepthExceeded { limit: MAX_DEPTH, .. }));
    }

    #[test]
    fn aborted_walk_stays_done() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().join("deeper");
        nested_chain(&root, MAX_DEPTH);

        let mut walker = DirectoryWalker::new(&root, WalkMode::Inspect).unwrap();
        let mut failed = false;
        while let Some(item) = walker.next() {
            if item.is_err() {
                failed = true;
            }
        }
        assert!(failed);
        assert!(walker.is_done());
        assert!(walker.next().is_none());
    }

    #[test]
    fn missing_root_is_an_open_failure() {
        let tmp = TempDir::new().unwrap();
        let err = DirectoryWalker::new(&tmp.path().join("nope"), WalkMode::Inspect).unwrap_err();
        assert!(matches!(err, BrowseError::OpenFailure { .. }));
    }

    #[test]
    fn stats_display_is_human_readable() {
        let stats = WalkStats {
            folders: 2,
            files: 3,
            total_bytes: 0,
            max_depth: 1,
        };
        assert_eq!(stats.to_string(), "2 folders, 3 files, 0 B");
    }
}
