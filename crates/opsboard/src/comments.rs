use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Free-text comments per agent, persisted as a flat JSON object keyed by
/// agent name. Multiple dashboard sessions may share the file; writes are
/// last-write-wins but must never corrupt entries they do not touch, so every
/// save is a full read-modify-write persisted via temp file + rename.
#[derive(Debug, Clone)]
pub struct CommentStore {
    path: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum CommentStoreError {
    #[error("unable to access comment file: {0}")]
    Io(#[from] std::io::Error),
    #[error("comment file is not a JSON object: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl CommentStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the full map. A missing file is an empty store, not an error.
    pub fn load(&self) -> Result<BTreeMap<String, String>, CommentStoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Ok(BTreeMap::new());
            }
            Err(err) => return Err(err.into()),
        };

        let map: BTreeMap<String, String> = serde_json::from_str(&raw)?;
        Ok(map)
    }

    /// Create-or-overwrite the comment for one agent, leaving every other
    /// entry exactly as it was on disk.
    pub fn save(&self, agent: &str, comment: &str) -> Result<(), CommentStoreError> {
        let mut comments = self.load()?;
        comments.insert(agent.to_string(), comment.to_string());
        self.persist(&comments)
    }

    pub fn get(&self, agent: &str) -> Result<Option<String>, CommentStoreError> {
        Ok(self.load()?.remove(agent))
    }

    fn persist(&self, comments: &BTreeMap<String, String>) -> Result<(), CommentStoreError> {
        let parent = self
            .path
            .parent()
            .filter(|dir| !dir.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));

        // Each writer stages into its own uniquely named temp file in the
        // target directory, then renames it into place. Racing sessions can
        // overwrite each other (last-write-wins) but can never publish a
        // half-written file.
        let mut staged = tempfile::NamedTempFile::new_in(parent)?;
        let body = serde_json::to_string_pretty(comments)?;
        staged.write_all(body.as_bytes())?;
        staged.as_file().sync_all()?;
        staged
            .persist(&self.path)
            .map_err(|err| CommentStoreError::Io(err.error))?;
        Ok(())
    }
}
