//! Append-only frame log.
//!
//! One JSON object per line, no enclosing array. Each append is flushed so a
//! crash loses at most the line being written; readers skip that partial tail.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use super::model::Frame;

/// Error type for frame log writes.
#[derive(Debug)]
pub enum FrameLogError {
    /// Open, write, or flush failed.
    Io(std::io::Error),
    /// Frame could not be encoded as JSON.
    Encode(serde_json::Error),
}

impl std::fmt::Display for FrameLogError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FrameLogError::Io(e) => write!(f, "frame log I/O error: {}", e),
            FrameLogError::Encode(e) => write!(f, "frame log encode error: {}", e),
        }
    }
}

impl std::error::Error for FrameLogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FrameLogError::Io(e) => Some(e),
            FrameLogError::Encode(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for FrameLogError {
    fn from(e: std::io::Error) -> Self {
        FrameLogError::Io(e)
    }
}

impl From<serde_json::Error> for FrameLogError {
    fn from(e: serde_json::Error) -> Self {
        FrameLogError::Encode(e)
    }
}

/// Writer appending frames to a JSON-lines file.
pub struct FrameLog {
    path: PathBuf,
    writer: BufWriter<File>,
    frames_written: u64,
}

impl FrameLog {
    /// Opens `path` for appending, creating it and its parent directories.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, FrameLogError> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            writer: BufWriter::new(file),
            frames_written: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Frames appended through this handle.
    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    /// Serializes `frame` as one line and flushes it.
    pub fn append(&mut self, frame: &Frame) -> Result<(), FrameLogError> {
        let mut line = serde_json::to_vec(frame)?;
        line.push(b'\n');
        self.writer.write_all(&line)?;
        self.writer.flush()?;
        self.frames_written += 1;
        Ok(())
    }
}
