//! ``src/fs/backend.rs``
//!
//! # `DirectoryBackend`: the three sources a listing can be built from
//!
//! * `RealFolder` - the entries of one folder, with a synthetic `..` first
//!   unless the folder is a filesystem root.
//! * `TextManifest` - a text file of paths. The first record is the
//!   synthetic `..`; each later record is one line: blank, present or dead.
//! * `RecursiveWalk` - every object below a root, through [`DirectoryWalker`].
//!
//! All three hand out [`RawEntry`] values one at a time; classification and
//! filtering happen in the list that consumes them.

use std::fs::{self, Metadata, ReadDir};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{BrowseError, BrowseResult};
use crate::fs::attrs::has_hidden_attribute;
use crate::fs::manifest::{ManifestLine, ManifestReader};
use crate::fs::walker::{DirectoryWalker, WalkMode, WalkStats};
use crate::util::paths::{parent_directory, split_name_path};

/// Kind of source a list was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum ListKind {
    RealFolder,
    TextManifest,
}

/// A named object produced by a backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    /// Final path component as found on disk (or in the manifest).
    pub name: String,
    /// Folder the object lives in, when it differs from the list directory.
    pub location: Option<PathBuf>,
    pub is_dir: bool,
    pub size: u64,
    pub hidden_attr: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawEntry {
    /// Nothing usable (blank manifest line).
    Absent,
    /// The synthetic `..` entry.
    Parent { location: Option<PathBuf> },
    Present(RawRecord),
    /// Manifest line naming a path that no longer exists.
    Dead(RawRecord),
}

#[derive(Debug)]
pub struct FolderReader {
    path: PathBuf,
    entries: ReadDir,
    parent_pending: bool,
}

#[derive(Debug)]
pub struct ManifestSource {
    reader: ManifestReader,
    parent_pending: bool,
}

#[derive(Debug)]
pub enum DirectoryBackend {
    RealFolder(FolderReader),
    TextManifest(ManifestSource),
    RecursiveWalk(DirectoryWalker),
}

impl DirectoryBackend {
    /// Opens the backend matching `path`: a walk when `walk` is set, a folder
    /// for directories, a manifest for anything else.
    pub fn open(path: &Path, walk: bool) -> BrowseResult<Self> {
        let metadata = fs::metadata(path).map_err(|e| BrowseError::open_failure(path, e))?;

        let backend = if walk {
            Self::RecursiveWalk(DirectoryWalker::new(path, WalkMode::Inspect)?)
        } else if metadata.is_dir() {
            let entries = fs::read_dir(path).map_err(|e| BrowseError::open_failure(path, e))?;
            Self::RealFolder(FolderReader {
                path: path.to_path_buf(),
                entries,
                parent_pending: parent_directory(path).is_some(),
            })
        } else {
            Self::TextManifest(ManifestSource {
                reader: ManifestReader::open(path)?,
                parent_pending: true,
            })
        };

        debug!(
            marker = "BACKEND_OPEN",
            operation_type = "backend_open",
            path = %path.display(),
            backend = backend.name(),
            "Directory backend opened"
        );

        Ok(backend)
    }

    /// Kind of the list this backend produces. Walks list like folders.
    #[must_use]
    pub const fn kind(&self) -> ListKind {
        match self {
            Self::RealFolder(_) | Self::RecursiveWalk(_) => ListKind::RealFolder,
            Self::TextManifest(_) => ListKind::TextManifest,
        }
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::RealFolder(_) => "real_folder",
            Self::TextManifest(_) => "text_manifest",
            Self::RecursiveWalk(_) => "recursive_walk",
        }
    }

    #[must_use]
    pub const fn is_walk(&self) -> bool {
        matches!(self, Self::RecursiveWalk(_))
    }

    /// Counters of a walk backend.
    #[must_use]
    pub fn walk_stats(&self) -> Option<WalkStats> {
        match self {
            Self::RecursiveWalk(walker) => Some(walker.stats()),
            _ => None,
        }
    }

    /// Next raw entry; `Ok(None)` once the source is exhausted.
    pub fn next(&mut self) -> BrowseResult<Option<RawEntry>> {
        match self {
            Self::RealFolder(folder) => Ok(folder.next_entry()),
            Self::TextManifest(manifest) => manifest.next_entry(),
            Self::RecursiveWalk(walker) => Ok(walker.next_item()?.map(|item| {
                let path = item.path();
                match item.name.into_string() {
                    Ok(name) => RawEntry::Present(RawRecord {
                        hidden_attr: has_hidden_attribute(&path),
                        name,
                        location: Some(item.parent),
                        is_dir: item.is_dir,
                        size: item.size,
                    }),
                    Err(_) => {
                        warn!(marker = "DIR_WALK", path = %path.display(), "Non-UTF-8 name skipped");
                        RawEntry::Absent
                    }
                }
            })),
        }
    }
}

impl FolderReader {
    fn next_entry(&mut self) -> Option<RawEntry> {
        if std::mem::take(&mut self.parent_pending) {
            return Some(RawEntry::Parent { location: None });
        }

        loop {
            let entry = match self.entries.next()? {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(marker = "DIR_SCAN", path = %self.path.display(), error = %e, "Unreadable entry skipped");
                    continue;
                }
            };

            let path = entry.path();
            let Ok(name) = entry.file_name().into_string() else {
                warn!(marker = "DIR_SCAN", path = %path.display(), "Non-UTF-8 name skipped");
                continue;
            };
            // Links are classified by their target, dangling ones as files.
            let metadata: Metadata = match fs::metadata(&path).or_else(|_| entry.metadata()) {
                Ok(metadata) => metadata,
                Err(e) => {
                    warn!(marker = "DIR_SCAN", path = %path.display(), error = %e, "Stat failed, entry skipped");
                    continue;
                }
            };

            return Some(RawEntry::Present(RawRecord {
                name,
                location: None,
                is_dir: metadata.is_dir(),
                size: if metadata.is_dir() { 0 } else { metadata.len() },
                hidden_attr: has_hidden_attribute(&path),
            }));
        }
    }
}

impl ManifestSource {
    fn next_entry(&mut self) -> BrowseResult<Option<RawEntry>> {
        if std::mem::take(&mut self.parent_pending) {
            return Ok(Some(RawEntry::Parent {
                location: Some(self.reader.folder().to_path_buf()),
            }));
        }

        let line = match self.reader.read_line()? {
            None => return Ok(None),
            Some(ManifestLine::Blank) => return Ok(Some(RawEntry::Absent)),
            Some(ManifestLine::Path(line)) => line.to_owned(),
        };

        let resolved = self.reader.resolve(&line);
        let Some(resolved_text) = resolved.to_str() else {
            warn!(marker = "MANIFEST_READ", path = %resolved.display(), "Non-UTF-8 path skipped");
            return Ok(Some(RawEntry::Absent));
        };
        let (folder, name) = split_name_path(resolved_text);
        if name.is_empty() {
            return Ok(Some(RawEntry::Absent));
        }

        let location = Some(PathBuf::from(folder));
        let name = name.to_owned();

        Ok(Some(match fs::metadata(&resolved).or_else(|_| fs::symlink_metadata(&resolved)) {
            Ok(metadata) => RawEntry::Present(RawRecord {
                name,
                location,
                is_dir: metadata.is_dir(),
                size: if metadata.is_dir() { 0 } else { metadata.len() },
                hidden_attr: has_hidden_attribute(&resolved),
            }),
            Err(_) => RawEntry::Dead(RawRecord {
                name,
                location,
                is_dir: false,
                size: 0,
                hidden_attr: false,
            }),
        }))
    }
}
