use std::fs;
use std::io::ErrorKind as IoErrorKind;

use serde::{Deserialize, Serialize};

use crate::core::error::Result;
use crate::storage::layout::IndexLayout;

/// The commit manifest is the sole source of truth for which segments and
/// which deletion generation are live. Segment files not referenced here
/// are orphans and are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Commit {
    #[serde(rename = "segmentIds")]
    pub segment_ids: Vec<u32>,

    #[serde(rename = "deletedId", default, skip_serializing_if = "Option::is_none")]
    pub deleted_id: Option<u32>,
}

impl Commit {
    pub fn empty() -> Self {
        Commit::default()
    }
}

/// A directory without a commit file is an empty index.
pub fn read_commit(layout: &IndexLayout) -> Result<Commit> {
    let bytes = match fs::read(layout.commit_path()) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == IoErrorKind::NotFound => return Ok(Commit::empty()),
        Err(err) => return Err(err.into()),
    };

    let commit = serde_json::from_slice(&bytes)?;
    Ok(commit)
}

/// Writes to `.commit`, then renames over `commit`. The rename is the
/// linearization point: readers either see the old manifest or the new
/// one, never a partial write.
pub fn write_commit(layout: &IndexLayout, commit: &Commit) -> Result<()> {
    let pending = layout.pending_commit_path();
    fs::write(&pending, serde_json::to_vec(commit)?)?;
    fs::rename(&pending, layout.commit_path())?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_commit_reads_as_empty() {
        let dir = TempDir::new().unwrap();
        let layout = IndexLayout::new(dir.path()).unwrap();
        let commit = read_commit(&layout).unwrap();
        assert!(commit.segment_ids.is_empty());
        assert!(commit.deleted_id.is_none());
    }

    #[test]
    fn write_then_read_round_trip() {
        let dir = TempDir::new().unwrap();
        let layout = IndexLayout::new(dir.path()).unwrap();

        let commit = Commit {
            segment_ids: vec![7, 42],
            deleted_id: Some(3),
        };
        write_commit(&layout, &commit).unwrap();

        let read = read_commit(&layout).unwrap();
        assert_eq!(read.segment_ids, vec![7, 42]);
        assert_eq!(read.deleted_id, Some(3));
        assert!(!layout.pending_commit_path().exists());
    }

    #[test]
    fn deleted_id_is_omitted_when_absent() {
        let dir = TempDir::new().unwrap();
        let layout = IndexLayout::new(dir.path()).unwrap();

        write_commit(
            &layout,
            &Commit {
                segment_ids: vec![1],
                deleted_id: None,
            },
        )
        .unwrap();

        let json = std::fs::read_to_string(layout.commit_path()).unwrap();
        assert!(json.contains("\"segmentIds\":[1]"));
        assert!(!json.contains("deletedId"));
    }
}
