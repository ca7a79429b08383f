//! In-memory mock filesystem for testing adapters without a real sysfs.
//!
//! `MockFs` simulates a filesystem in memory so the IIO adapters and the
//! status-file display can be exercised on any machine. Clones share the
//! same state, which lets a test keep a handle after moving the filesystem
//! into a driver.

use crate::collector::traits::FileSystem;
use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

#[derive(Debug, Default)]
struct Tree {
    /// Map from path to file contents.
    files: HashMap<PathBuf, String>,
    /// Set of directories (for read_dir support).
    directories: HashSet<PathBuf>,
    /// Reads of these paths fail with the given error kind.
    errors: HashMap<PathBuf, io::ErrorKind>,
}

impl Tree {
    fn add_parents(&mut self, path: &Path) {
        let mut parent = path.parent();
        while let Some(p) = parent {
            if !p.as_os_str().is_empty() {
                self.directories.insert(p.to_path_buf());
            }
            parent = p.parent();
        }
    }
}

/// In-memory filesystem for testing.
#[derive(Debug, Clone, Default)]
pub struct MockFs {
    tree: Arc<RwLock<Tree>>,
    /// Every `write` call in order.
    writes: Arc<Mutex<Vec<(PathBuf, String)>>>,
}

impl MockFs {
    /// Creates a new empty mock filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file with the given content.
    ///
    /// Parent directories are automatically created.
    pub fn add_file(&mut self, path: impl AsRef<Path>, content: impl Into<String>) {
        let path = path.as_ref().to_path_buf();
        let mut tree = self.tree.write().unwrap_or_else(PoisonError::into_inner);
        tree.add_parents(&path);
        tree.files.insert(path, content.into());
    }

    /// Adds an empty directory.
    pub fn add_dir(&mut self, path: impl AsRef<Path>) {
        let path = path.as_ref().to_path_buf();
        let mut tree = self.tree.write().unwrap_or_else(PoisonError::into_inner);
        tree.add_parents(&path);
        tree.directories.insert(path);
    }

    /// Makes reads of `path` fail with `kind` (e.g. `TimedOut` for a stalled sensor).
    pub fn fail_reads(&mut self, path: impl AsRef<Path>, kind: io::ErrorKind) {
        let mut tree = self.tree.write().unwrap_or_else(PoisonError::into_inner);
        tree.errors.insert(path.as_ref().to_path_buf(), kind);
    }

    /// Clears a failure set by [`MockFs::fail_reads`].
    pub fn heal_reads(&mut self, path: impl AsRef<Path>) {
        let mut tree = self.tree.write().unwrap_or_else(PoisonError::into_inner);
        tree.errors.remove(path.as_ref());
    }

    /// Adds an IIO device directory with a `name` file and channel attributes.
    pub fn add_iio_device(&mut self, dir: impl AsRef<Path>, name: &str, attrs: &[(&str, &str)]) {
        let dir = dir.as_ref();
        self.add_file(dir.join("name"), format!("{}\n", name));
        for (attr, value) in attrs {
            self.add_file(dir.join(attr), format!("{}\n", value));
        }
    }

    /// All writes so far, in order.
    pub fn writes(&self) -> Vec<(PathBuf, String)> {
        self.writes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl FileSystem for MockFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        let tree = self.tree.read().unwrap_or_else(PoisonError::into_inner);
        if let Some(kind) = tree.errors.get(path) {
            return Err(io::Error::new(*kind, format!("read failed: {:?}", path)));
        }
        tree.files.get(path).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("file not found: {:?}", path),
            )
        })
    }

    fn exists(&self, path: &Path) -> bool {
        let tree = self.tree.read().unwrap_or_else(PoisonError::into_inner);
        tree.files.contains_key(path) || tree.directories.contains(path)
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        let tree = self.tree.read().unwrap_or_else(PoisonError::into_inner);
        if !tree.directories.contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("directory not found: {:?}", path),
            ));
        }

        let mut entries = HashSet::new();

        for file_path in tree.files.keys() {
            if file_path.parent().is_some_and(|parent| parent == path) {
                entries.insert(file_path.clone());
            }
        }

        for dir_path in &tree.directories {
            if dir_path.parent().is_some_and(|parent| parent == path) && dir_path != path {
                entries.insert(dir_path.clone());
            }
        }

        Ok(entries.into_iter().collect())
    }

    fn write(&self, path: &Path, contents: &str) -> io::Result<()> {
        let mut tree = self.tree.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !tree.directories.contains(parent)
        {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("directory not found: {:?}", parent),
            ));
        }
        tree.files.insert(path.to_path_buf(), contents.to_string());
        self.writes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((path.to_path_buf(), contents.to_string()));
        Ok(())
    }
}
