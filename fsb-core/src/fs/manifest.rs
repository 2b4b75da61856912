//! `src/fs/manifest.rs`
//!
//! Plain-text manifests: one path per line.
//!
//! Reading strips `\r`/`\n` and reports whitespace-only lines as blank.
//! Lines that are not valid UTF-8 are treated as blank as well. Writing goes
//! through a sibling temp file and a rename so a failed dump never leaves a
//! half-written manifest behind.

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{BrowseError, BrowseResult};

/// One line of a manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifestLine<'a> {
    Blank,
    Path(&'a str),
}

#[derive(Debug)]
pub struct ManifestReader {
    reader: BufReader<File>,
    path: PathBuf,
    folder: PathBuf,
    buf: Vec<u8>,
    line: String,
    line_no: usize,
}

impl ManifestReader {
    pub fn open(path: &Path) -> BrowseResult<Self> {
        let file = File::open(path).map_err(|e| BrowseError::open_failure(path, e))?;
        let folder = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);

        Ok(Self {
            reader: BufReader::new(file),
            path: path.to_path_buf(),
            folder,
            buf: Vec::new(),
            line: String::new(),
            line_no: 0,
        })
    }

    /// Folder holding the manifest; relative lines resolve against it.
    #[must_use]
    pub fn folder(&self) -> &Path {
        &self.folder
    }

    /// Resolves a manifest line to a filesystem path.
    #[must_use]
    pub fn resolve(&self, line: &str) -> PathBuf {
        let candidate = Path::new(line);
        if candidate.is_absolute() {
            candidate.to_path_buf()
        } else {
            self.folder.join(candidate)
        }
    }

    /// Reads the next line; `None` at end of file.
    pub fn read_line(&mut self) -> BrowseResult<Option<ManifestLine<'_>>> {
        self.buf.clear();
        let read = self
            .reader
            .read_until(b'\n', &mut self.buf)
            .map_err(|e| BrowseError::file_system(&self.path, e))?;
        if read == 0 {
            return Ok(None);
        }
        self.line_no += 1;

        while matches!(self.buf.last(), Some(b'\n' | b'\r')) {
            self.buf.pop();
        }

        self.line.clear();
        match std::str::from_utf8(&self.buf) {
            Ok(text) => self.line.push_str(text),
            Err(_) => {
                warn!(
                    marker = "MANIFEST_READ",
                    path = %self.path.display(),
                    line = self.line_no,
                    "Line is not valid UTF-8, skipped"
                );
                return Ok(Some(ManifestLine::Blank));
            }
        }

        if self.line.trim().is_empty() {
            Ok(Some(ManifestLine::Blank))
        } else {
            Ok(Some(ManifestLine::Path(&self.line)))
        }
    }
}

/// Writes `lines` to `dest`, one per line, replacing any previous content.
/// Returns the number of lines written.
pub fn write_manifest<I, S>(dest: &Path, lines: I) -> BrowseResult<usize>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut tmp_name: OsString = dest.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp = PathBuf::from(tmp_name);

    let written = write_lines(&tmp, lines).inspect_err(|_| {
        let _ = fs::remove_file(&tmp);
    })?;

    fs::rename(&tmp, dest).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        BrowseError::file_system(dest, e)
    })?;

    debug!(
        marker = "MANIFEST_WRITE",
        operation_type = "manifest_write",
        path = %dest.display(),
        lines = written,
        "Manifest written"
    );

    Ok(written)
}

fn write_lines<I, S>(path: &Path, lines: I) -> BrowseResult<usize>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let file = File::create(path).map_err(|e| BrowseError::file_system(path, e))?;
    let mut out = BufWriter::new(file);
    let mut count = 0;

    for line in lines {
        out.write_all(line.as_ref().as_bytes())
            .and_then(|()| out.write_all(b"\n"))
            .map_err(|e| BrowseError::file_system(path, e))?;
        count += 1;
    }

    out.into_inner()
        .map_err(|e| BrowseError::file_system(path, e.into_error()))?
        .sync_all()
        .map_err(|e| BrowseError::file_system(path, e))?;

    Ok(count)
}
