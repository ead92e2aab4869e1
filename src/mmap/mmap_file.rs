use memmap2::{Mmap, MmapOptions};
use std::fs::File;
use std::path::Path;

use crate::core::error::Result;

/// Read-only memory-mapped file for zero-copy reads.
///
/// Empty files are common (a field with no terms produces empty dictionary
/// and frequencies files) and cannot be mapped, so `mmap` is optional.
#[derive(Debug)]
pub struct MmapFile {
    mmap: Option<Mmap>,
    len: usize,
}

impl MmapFile {
    pub fn open_read_only<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(&path)?;
        let len = file.metadata()?.len() as usize;

        let mmap = if len == 0 {
            None
        } else {
            Some(unsafe { MmapOptions::new().len(len).map(&file)? })
        };

        Ok(MmapFile { mmap, len })
    }

    pub fn data(&self) -> &[u8] {
        match &self.mmap {
            Some(mmap) => &mmap[..],
            None => &[],
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
