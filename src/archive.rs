//! Downloaded subtitle archives
//!
//! Catalogs ship subtitles as zip archives. `SubtitleArchive` exposes the
//! entries of such an archive and reads single files out of it.

use std::io::{Cursor, Read};
use thiserror::Error;

/// Extension of the subtitle files picked from archives
pub const SUBTITLE_EXTENSION: &str = ".srt";

/// Errors that can occur while reading an archive
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// The downloaded bytes are not a supported archive
    #[error("Downloaded content is not a zip archive")]
    UnsupportedFormat,

    /// The archive could not be read
    #[error("Corrupt archive: {0}")]
    Corrupt(String),
}

impl From<zip::result::ZipError> for ArchiveError {
    fn from(err: zip::result::ZipError) -> Self {
        ArchiveError::Corrupt(err.to_string())
    }
}

/// An in-memory zip archive.
pub struct SubtitleArchive {
    archive: zip::ZipArchive<Cursor<Vec<u8>>>,
}

impl SubtitleArchive {
    /// Opens an archive from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns `ArchiveError::UnsupportedFormat` if the bytes are not a zip
    /// archive and `ArchiveError::Corrupt` if it cannot be read.
    pub fn open(bytes: Vec<u8>) -> Result<Self, ArchiveError> {
        if !infer::archive::is_zip(&bytes) {
            return Err(ArchiveError::UnsupportedFormat);
        }

        let archive = zip::ZipArchive::new(Cursor::new(bytes))?;
        Ok(Self { archive })
    }

    /// Names of all entries, in archive order.
    pub fn list_entries(&self) -> Vec<String> {
        self.archive.file_names().map(str::to_string).collect()
    }

    /// Reads the content of a single entry.
    ///
    /// # Errors
    ///
    /// Returns `ArchiveError::Corrupt` if the entry is missing or unreadable.
    pub fn read(&mut self, entry: &str) -> Result<Vec<u8>, ArchiveError> {
        let mut file = self.archive.by_name(entry)?;
        let mut content = Vec::new();
        file.read_to_end(&mut content)
            .map_err(|e| ArchiveError::Corrupt(e.to_string()))?;
        Ok(content)
    }

    /// Name of the first entry that is a subtitle file.
    pub fn first_subtitle_entry(&self) -> Option<String> {
        self.archive
            .file_names()
            .find(|name| name.ends_with(SUBTITLE_EXTENSION))
            .map(str::to_string)
    }
}

/// Normalizes Windows line endings to `\n`.
pub fn fix_line_ending(content: &[u8]) -> Vec<u8> {
    let mut fixed = Vec::with_capacity(content.len());
    let mut bytes = content.iter().peekable();
    while let Some(&byte) = bytes.next() {
        if byte == b'\r' && bytes.peek() == Some(&&b'\n') {
            continue;
        }
        fixed.push(byte);
    }
    fixed
}
