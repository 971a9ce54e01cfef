// 💬 Comment Store - a small persisted comment board
//
// File format: one JSON array of display strings, e.g. ["Ada: nice tool"].
// The whole file is rewritten on every mutation. There is no locking, so two
// writers racing on the same file lose updates (last writer wins).

use crate::error::{CommentError, CommentResult};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Default location of the comment file (relative to the working directory)
pub const DEFAULT_COMMENTS_FILE: &str = "comments.json";

#[derive(Debug)]
pub struct CommentStore {
    path: PathBuf,
    comments: Vec<String>,
}

impl CommentStore {
    /// Load the board from `path`; a missing file is an empty board
    pub fn open<P: AsRef<Path>>(path: P) -> CommentResult<Self> {
        let path = path.as_ref().to_path_buf();
        let comments = load(&path)?;

        Ok(CommentStore { path, comments })
    }

    /// Like `open`, but a corrupt file is reset to an empty board instead of failing
    pub fn open_or_reset<P: AsRef<Path>>(path: P) -> CommentResult<Self> {
        match Self::open(&path) {
            Err(err) if err.is_corrupt_state() => {
                warn!("{}; resetting to an empty board", err);
                let mut store = CommentStore {
                    path: path.as_ref().to_path_buf(),
                    comments: Vec::new(),
                };
                store.reset()?;
                Ok(store)
            }
            other => other,
        }
    }

    /// Re-read the file, replacing the in-memory board
    pub fn reload(&mut self) -> CommentResult<&[String]> {
        self.comments = load(&self.path)?;
        Ok(&self.comments)
    }

    /// Append "{name}: {text}" and persist.
    ///
    /// Blank name or text is rejected and leaves the board untouched.
    pub fn add(&mut self, name: &str, text: &str) -> CommentResult<&str> {
        let name = name.trim();
        let text = text.trim();

        if name.is_empty() {
            return Err(CommentError::Validation { field: "name" });
        }
        if text.is_empty() {
            return Err(CommentError::Validation { field: "comment" });
        }

        self.comments.push(format!("{}: {}", name, text));
        if let Err(err) = self.save() {
            self.comments.pop();
            return Err(err);
        }

        info!(count = self.comments.len(), "comment added");
        Ok(self.comments.last().map(String::as_str).unwrap_or_default())
    }

    /// Delete the comment at `index` (0-based, display order) and persist
    pub fn remove(&mut self, index: usize) -> CommentResult<String> {
        if index >= self.comments.len() {
            return Err(CommentError::IndexOutOfRange {
                index,
                len: self.comments.len(),
            });
        }

        let removed = self.comments.remove(index);
        if let Err(err) = self.save() {
            self.comments.insert(index, removed);
            return Err(err);
        }

        info!(index, count = self.comments.len(), "comment removed");
        Ok(removed)
    }

    /// Drop every comment and rewrite the file as an empty array
    pub fn reset(&mut self) -> CommentResult<()> {
        self.comments.clear();
        self.save()?;
        info!(path = ?self.path, "comment board reset");
        Ok(())
    }

    pub fn comments(&self) -> &[String] {
        &self.comments
    }

    pub fn len(&self) -> usize {
        self.comments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.comments.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Overwrite the whole file with the current board
    fn save(&self) -> CommentResult<()> {
        let io_err = |source: std::io::Error| CommentError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        let json = serde_json::to_string(&self.comments).map_err(|source| CommentError::Encode {
            path: self.path.clone(),
            source,
        })?;
        fs::write(&self.path, json).map_err(io_err)
    }
}

/// Read the comment file: absent means empty, anything but a JSON array of strings is corrupt
pub fn load(path: &Path) -> CommentResult<Vec<String>> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(CommentError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    serde_json::from_str::<Vec<String>>(&content).map_err(|source| {
        warn!(?path, "comment file is not a JSON array of strings");
        CommentError::CorruptState {
            path: path.to_path_buf(),
            source,
        }
    })
}
