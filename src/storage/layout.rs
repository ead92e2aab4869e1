use std::fs;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use crate::core::error::Result;

/// Flat index directory. Every file of a segment is keyed by
/// `segment.<id>.<field>.<suffix>`; the commit manifest and deletion
/// generations live next to them.
#[derive(Debug, Clone)]
pub struct IndexLayout {
    dir: PathBuf,
}

impl IndexLayout {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(IndexLayout { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn commit_path(&self) -> PathBuf {
        self.dir.join("commit")
    }

    /// Staging file the commit is written to before the atomic rename.
    pub fn pending_commit_path(&self) -> PathBuf {
        self.dir.join(".commit")
    }

    pub fn segment_file(&self, segment_id: u32, field: &str, suffix: &str) -> PathBuf {
        self.dir.join(format!("segment.{}.{}.{}", segment_id, field, suffix))
    }

    /// Base path of a segment KV store (`.data`/`.index` get appended).
    pub fn segment_kv_base(&self, segment_id: u32, field: &str, suffix: &str) -> PathBuf {
        self.segment_file(segment_id, field, suffix)
    }

    /// Base path of a deletion generation KV store.
    pub fn deleted_kv_base(&self, generation: u32) -> PathBuf {
        self.dir.join(format!("deleted.{}", generation))
    }
}

/// Segment files are written exactly once; exclusive create turns an id
/// collision or a re-run into an error instead of silent truncation.
pub fn create_file(path: &Path) -> Result<File> {
    let file = OpenOptions::new().write(true).create_new(true).open(path)?;
    Ok(file)
}

/// Appends a suffix to a full path, `base` → `base.data` style.
pub fn path_with_suffix(base: &Path, suffix: &str) -> PathBuf {
    let mut name = base.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}
