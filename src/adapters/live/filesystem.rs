//! Live filesystem adapter using `std::fs` and `walkdir`.

use std::fs;
use std::io::Write;
use std::path::Path;

use uuid::Uuid;
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::ports::filesystem::{DirEntry, EntryKind, FileSystem, SkipEntry, WalkItem};

/// Live filesystem adapter backed by real disk I/O.
pub struct LiveFileSystem;

fn kind_of(file_type: fs::FileType) -> EntryKind {
    if file_type.is_symlink() {
        EntryKind::Symlink
    } else if file_type.is_dir() {
        EntryKind::Dir
    } else if file_type.is_file() {
        EntryKind::File
    } else {
        EntryKind::Other
    }
}

fn create_parent(path: &Path) -> Result<()> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))
}

impl FileSystem for LiveFileSystem {
    fn read_to_string(&self, path: &Path) -> Result<String> {
        fs::read_to_string(path).map_err(|e| Error::io(path, e))
    }

    fn read_bytes(&self, path: &Path) -> Result<Vec<u8>> {
        fs::read(path).map_err(|e| Error::io(path, e))
    }

    fn write(&self, path: &Path, contents: &str) -> Result<()> {
        create_parent(path)?;
        let parent = path.parent().unwrap_or_else(|| Path::new("."));

        let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or("artifact");
        let tmp = parent.join(format!(".{file_name}.tmp-{}", Uuid::new_v4().simple()));
        {
            let mut file = fs::File::create(&tmp).map_err(|e| Error::io(&tmp, e))?;
            file.write_all(contents.as_bytes()).map_err(|e| Error::io(&tmp, e))?;
            file.sync_all().map_err(|e| Error::io(&tmp, e))?;
        }
        fs::rename(&tmp, path).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            Error::io(path, e)
        })
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn entry_kind(&self, path: &Path) -> Option<EntryKind> {
        fs::symlink_metadata(path).ok().map(|m| kind_of(m.file_type()))
    }

    fn list_dir(&self, path: &Path) -> Result<Vec<DirEntry>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(path).map_err(|e| Error::io(path, e))? {
            let entry = entry.map_err(|e| Error::io(path, e))?;
            let file_type = entry.file_type().map_err(|e| Error::io(entry.path(), e))?;
            entries.push(DirEntry { path: entry.path(), kind: kind_of(file_type) });
        }
        entries.sort_by(|a, b| a.path.file_name().cmp(&b.path.file_name()));
        Ok(entries)
    }

    fn walk(&self, root: &Path, skip: SkipEntry<'_>) -> Result<Vec<WalkItem>> {
        fs::read_dir(root).map_err(|e| Error::io(root, e))?;

        let walker = WalkDir::new(root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                entry.depth() == 0
                    || !skip(&DirEntry {
                        path: entry.path().to_path_buf(),
                        kind: kind_of(entry.file_type()),
                    })
            });

        let mut items = Vec::new();
        for entry in walker {
            match entry {
                Ok(entry) if entry.depth() == 0 => {}
                Ok(entry) => items.push(WalkItem::Entry(DirEntry {
                    path: entry.path().to_path_buf(),
                    kind: kind_of(entry.file_type()),
                })),
                Err(err) if err.depth() == 0 => {
                    let reason = err.to_string();
                    let source =
                        err.into_io_error().unwrap_or_else(|| std::io::Error::other(reason));
                    return Err(Error::io(root, source));
                }
                Err(err) => items.push(WalkItem::Unreadable {
                    path: err.path().unwrap_or(root).to_path_buf(),
                    reason: err.to_string(),
                }),
            }
        }
        Ok(items)
    }

    fn copy_file(&self, from: &Path, to: &Path) -> Result<()> {
        create_parent(to)?;
        fs::copy(from, to).map(|_| ()).map_err(|e| Error::io(to, e))
    }

    fn remove_file(&self, path: &Path) -> Result<()> {
        fs::remove_file(path).map_err(|e| Error::io(path, e))
    }

    fn remove_dir(&self, path: &Path) -> Result<()> {
        fs::remove_dir(path).map_err(|e| Error::io(path, e))
    }

    fn remove_dir_all(&self, path: &Path) -> Result<()> {
        fs::remove_dir_all(path).map_err(|e| Error::io(path, e))
    }
}
