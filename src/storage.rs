use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::collections::HashMap;
use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

pub const PROJECT_DIR_NAME: &str = ".planner";
pub const DATA_DIR_ENV: &str = "PLANNER_DATA_DIR";

#[derive(thiserror::Error, Debug)]
pub enum StorageError {
    #[error("reading {path:?}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("writing {path:?}: {source}")]
    Write { path: PathBuf, source: io::Error },
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// String-valued key-value substrate the typed store is layered on.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// One `<key>.json` file per key inside a data directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| StorageError::Write {
            path: dir.clone(),
            source,
        })?;
        debug!(dir = %dir.display(), "opened file store");
        Ok(FileStore { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(data) => Ok(Some(data)),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Read { path, source }),
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.path_for(key);
        let write_err = |source: io::Error| StorageError::Write {
            path: path.clone(),
            source,
        };
        let mut temp = NamedTempFile::new_in(&self.dir).map_err(write_err)?;
        temp.write_all(value.as_bytes()).map_err(write_err)?;
        temp.flush().map_err(write_err)?;
        temp.persist(&path).map_err(|err| write_err(err.error))?;
        debug!(file = %path.display(), bytes = value.len(), "wrote key");
        Ok(())
    }
}

/// In-process substrate. Nothing survives the process.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataScope {
    Project,
    Global,
    Explicit,
}

#[derive(Debug, Clone)]
pub struct DataLocation {
    pub dir: PathBuf,
    pub scope: DataScope,
}

impl DataScope {
    pub fn label(self) -> &'static str {
        match self {
            DataScope::Project => "project",
            DataScope::Global => "global",
            DataScope::Explicit => "explicit",
        }
    }
}

pub fn init_project_dir(start: &Path) -> Result<DataLocation> {
    let dir = start.join(PROJECT_DIR_NAME);
    fs::create_dir_all(&dir).context("failed to create .planner directory")?;
    info!(dir = %dir.display(), "initialized project data directory");
    Ok(DataLocation {
        dir,
        scope: DataScope::Project,
    })
}

/// Picks the data directory: an explicit override (flag, then environment),
/// else the nearest `.planner/` above `start`, else the per-user data dir.
pub fn locate_data_dir(start: &Path, explicit: Option<&Path>) -> Result<DataLocation> {
    if let Some(dir) = explicit {
        return Ok(DataLocation {
            dir: dir.to_path_buf(),
            scope: DataScope::Explicit,
        });
    }
    if let Ok(raw) = env::var(DATA_DIR_ENV) {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            return Ok(DataLocation {
                dir: PathBuf::from(trimmed),
                scope: DataScope::Explicit,
            });
        }
    }
    if let Some(dir) = find_project_dir(start) {
        return Ok(DataLocation {
            dir,
            scope: DataScope::Project,
        });
    }
    Ok(DataLocation {
        dir: global_data_dir()?,
        scope: DataScope::Global,
    })
}

fn find_project_dir(start: &Path) -> Option<PathBuf> {
    let mut dir = Some(start);
    while let Some(current) = dir {
        let candidate = current.join(PROJECT_DIR_NAME);
        if candidate.is_dir() {
            return Some(candidate);
        }
        dir = current.parent();
    }
    None
}

fn global_data_dir() -> Result<PathBuf> {
    let dirs = ProjectDirs::from("", "", "planner").context("locating data directory")?;
    Ok(dirs.data_dir().to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn file_store_reports_missing_keys_as_none() {
        let temp = tempdir().unwrap();
        let store = FileStore::open(temp.path()).unwrap();
        assert!(store.get("calendar_events").unwrap().is_none());
    }

    #[test]
    fn file_store_overwrites_whole_values() {
        let temp = tempdir().unwrap();
        let mut store = FileStore::open(temp.path().join("data")).unwrap();
        store.set("calendar_tasks", "[1,2,3]").unwrap();
        store.set("calendar_tasks", "[]").unwrap();
        assert_eq!(store.get("calendar_tasks").unwrap().as_deref(), Some("[]"));
        assert!(temp.path().join("data/calendar_tasks.json").exists());
    }

    #[test]
    fn project_dir_is_found_from_a_nested_directory() {
        let temp = tempdir().unwrap();
        let nested = temp.path().join("a/b/c");
        fs::create_dir_all(&nested).unwrap();
        let created = init_project_dir(temp.path()).unwrap();
        let found = locate_data_dir(&nested, None).unwrap();
        if found.scope == DataScope::Project {
            assert_eq!(found.dir, created.dir);
        }
    }

    #[test]
    fn explicit_dir_wins() {
        let temp = tempdir().unwrap();
        let found = locate_data_dir(temp.path(), Some(Path::new("/tmp/elsewhere"))).unwrap();
        assert_eq!(found.scope, DataScope::Explicit);
        assert_eq!(found.dir, PathBuf::from("/tmp/elsewhere"));
    }
}
