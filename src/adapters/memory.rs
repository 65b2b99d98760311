//! In-memory filesystem for tests that should never touch disk.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::{Error, Result};
use crate::ports::filesystem::{DirEntry, EntryKind, FileSystem, SkipEntry, WalkItem};

#[derive(Debug, Clone)]
enum Node {
    File(Vec<u8>),
    Dir,
    Symlink,
}

impl Node {
    fn kind(&self) -> EntryKind {
        match self {
            Self::File(_) => EntryKind::File,
            Self::Dir => EntryKind::Dir,
            Self::Symlink => EntryKind::Symlink,
        }
    }
}

fn not_found(path: &Path) -> Error {
    Error::io(path, std::io::Error::from(ErrorKind::NotFound))
}

/// A tree of absolute paths held in a map. Parents are created implicitly.
#[derive(Debug, Default)]
pub struct MemoryFileSystem {
    nodes: Mutex<BTreeMap<PathBuf, Node>>,
}

impl MemoryFileSystem {
    /// Empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file with `contents`, creating its parents.
    pub fn add_file(&self, path: impl AsRef<Path>, contents: &str) {
        self.insert(path.as_ref(), Node::File(contents.as_bytes().to_vec()));
    }

    /// Adds an empty directory, creating its parents.
    pub fn add_dir(&self, path: impl AsRef<Path>) {
        self.insert(path.as_ref(), Node::Dir);
    }

    /// Adds a dangling symlink, creating its parents.
    pub fn add_symlink(&self, path: impl AsRef<Path>) {
        self.insert(path.as_ref(), Node::Symlink);
    }

    /// Contents of a file, if present.
    pub fn contents(&self, path: impl AsRef<Path>) -> Option<String> {
        match self.nodes.lock().unwrap().get(path.as_ref()) {
            Some(Node::File(bytes)) => Some(String::from_utf8_lossy(bytes).into_owned()),
            _ => None,
        }
    }

    /// Every path beneath `root`, sorted.
    pub fn paths_under(&self, root: impl AsRef<Path>) -> Vec<PathBuf> {
        let root = root.as_ref();
        self.nodes
            .lock()
            .unwrap()
            .keys()
            .filter(|p| p.starts_with(root) && p.as_path() != root)
            .cloned()
            .collect()
    }

    fn insert(&self, path: &Path, node: Node) {
        let mut nodes = self.nodes.lock().unwrap();
        for ancestor in path.ancestors().skip(1) {
            if ancestor.as_os_str().is_empty() {
                break;
            }
            nodes.entry(ancestor.to_path_buf()).or_insert(Node::Dir);
        }
        nodes.insert(path.to_path_buf(), node);
    }

    fn node(&self, path: &Path) -> Option<Node> {
        self.nodes.lock().unwrap().get(path).cloned()
    }
}

impl FileSystem for MemoryFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        let bytes = self.read_bytes(path)?;
        String::from_utf8(bytes)
            .map_err(|e| Error::io(path, std::io::Error::new(ErrorKind::InvalidData, e)))
    }

    fn read_bytes(&self, path: &Path) -> Result<Vec<u8>> {
        match self.node(path) {
            Some(Node::File(bytes)) => Ok(bytes),
            _ => Err(not_found(path)),
        }
    }

    fn write(&self, path: &Path, contents: &str) -> Result<()> {
        self.add_file(path, contents);
        Ok(())
    }

    fn exists(&self, path: &Path) -> bool {
        self.node(path).is_some()
    }

    fn entry_kind(&self, path: &Path) -> Option<EntryKind> {
        self.node(path).map(|n| n.kind())
    }

    fn list_dir(&self, path: &Path) -> Result<Vec<DirEntry>> {
        let nodes = self.nodes.lock().unwrap();
        if !matches!(nodes.get(path), Some(Node::Dir)) {
            return Err(not_found(path));
        }
        Ok(nodes
            .iter()
            .filter(|(p, _)| p.parent() == Some(path))
            .map(|(p, node)| DirEntry { path: p.clone(), kind: node.kind() })
            .collect())
    }

    fn walk(&self, root: &Path, skip: SkipEntry<'_>) -> Result<Vec<WalkItem>> {
        fn visit(
            fs: &MemoryFileSystem,
            dir: &Path,
            skip: SkipEntry<'_>,
            items: &mut Vec<WalkItem>,
        ) -> Result<()> {
            for entry in fs.list_dir(dir)? {
                if skip(&entry) {
                    continue;
                }
                let descend = entry.kind == EntryKind::Dir;
                let path = entry.path.clone();
                items.push(WalkItem::Entry(entry));
                if descend {
                    visit(fs, &path, skip, items)?;
                }
            }
            Ok(())
        }

        let mut items = Vec::new();
        visit(self, root, skip, &mut items)?;
        Ok(items)
    }

    fn copy_file(&self, from: &Path, to: &Path) -> Result<()> {
        let bytes = self.read_bytes(from)?;
        self.insert(to, Node::File(bytes));
        Ok(())
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        let mut nodes = self.nodes.lock().unwrap();
        match nodes.get(path) {
            Some(Node::File(_) | Node::Symlink) => {
                nodes.remove(path);
                Ok(())
            }
            _ => Err(not_found(path)),
        }
    }

    fn remove_dir(&self, path: &Path) -> Result<()> {
        let mut nodes = self.nodes.lock().unwrap();
        if !matches!(nodes.get(path), Some(Node::Dir)) {
            return Err(not_found(path));
        }
        if nodes.keys().any(|p| p.parent() == Some(path)) {
            return Err(Error::io(path, std::io::Error::other("directory not empty")));
        }
        nodes.remove(path);
        Ok(())
    }

    fn remove_dir_all(&self, path: &Path) -> Result<()> {
        let mut nodes = self.nodes.lock().unwrap();
        if nodes.remove(path).is_none() {
            return Err(not_found(path));
        }
        nodes.retain(|p, _| !p.starts_with(path));
        Ok(())
    }
}
