use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tempfile::{Builder, NamedTempFile};

use crate::profile::Profile;
use crate::{lock, CacheError, Result};

/// The cache file: a pretty-printed JSON array of `{ "id", "name" }`
/// objects, sorted by name.
pub struct ProfileStore {
    label: String,
    path: PathBuf,
    /// Serializes writes of this store
    writing: Mutex<()>,
}

impl ProfileStore {
    /// Create a new profile store with a diagnostic label and file path
    pub fn new(label: String, path: &Path) -> Self {
        Self {
            label,
            path: PathBuf::from(path),
            writing: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read all profiles from disk.
    ///
    /// A missing or blank file holds no profiles. Content that does not
    /// parse is reported as [`CacheError::PersistenceCorrupt`].
    pub fn read_fs(&self) -> Result<Vec<Profile>> {
        if !self.path.exists() {
            log::info!(
                "{}: {} does not exist yet",
                self.label,
                self.path.display()
            );
            return Ok(Vec::new());
        }

        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        let profiles: Vec<Profile> =
            serde_json::from_str(&content).map_err(|err| {
                CacheError::PersistenceCorrupt(
                    self.label.clone(),
                    err.to_string(),
                )
            })?;

        log::info!(
            "{}: {} entries have been read",
            self.label,
            profiles.len()
        );
        Ok(profiles)
    }

    /// Write `profiles` sorted by name, replacing the previous file.
    ///
    /// Every write goes to its own temporary sibling, which is moved over
    /// the target once complete. On failure the last written file stays
    /// intact and the temporary file is removed.
    pub fn write_fs(
        &self,
        profiles: impl IntoIterator<Item = Profile>,
    ) -> Result<usize> {
        let mut profiles: Vec<Profile> = profiles.into_iter().collect();
        profiles.sort_by(|a, b| a.name.cmp(&b.name));

        let _writing = lock(&self.writing);
        let tmp = self
            .write_tmp(&profiles)
            .map_err(|err| self.write_failure(err))?;
        tmp.persist(&self.path)
            .map_err(|err| self.write_failure(err.error.into()))?;

        log::info!(
            "{}: {} entries have been written",
            self.label,
            profiles.len()
        );
        Ok(profiles.len())
    }

    /// Erase the cache file from disk
    pub fn erase(&self) -> Result<()> {
        let _writing = lock(&self.writing);
        fs::remove_file(&self.path).map_err(|err| {
            CacheError::PersistenceWriteFailure(
                self.label.clone(),
                err.to_string(),
            )
        })
    }

    fn write_tmp(&self, profiles: &[Profile]) -> Result<NamedTempFile> {
        let file_name = self.path.file_name().ok_or_else(|| {
            CacheError::PersistenceWriteFailure(
                self.label.clone(),
                "Path does not name a file".to_owned(),
            )
        })?;
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent)?;

        let mut prefix = std::ffi::OsString::from(".");
        prefix.push(file_name);
        let tmp = Builder::new()
            .prefix(&prefix)
            .suffix(".tmp")
            .tempfile_in(parent)?;

        let mut writer = BufWriter::new(tmp);
        serde_json::to_writer_pretty(&mut writer, profiles)?;
        writer.flush()?;
        let tmp = writer
            .into_inner()
            .map_err(|err| CacheError::Io(err.into_error()))?;
        tmp.as_file().sync_all()?;
        Ok(tmp)
    }

    fn write_failure(&self, err: CacheError) -> CacheError {
        CacheError::PersistenceWriteFailure(self.label.clone(), err.to_string())
    }
}
