use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::core::error::{Error, ErrorKind, Result};
use crate::mmap::mmap_file::MmapFile;
use crate::storage::layout::create_file;

/// Fixed-width record file addressed by ordinal position.
pub struct ArrayStoreWriter {
    writer: BufWriter<File>,
}

impl ArrayStoreWriter {
    pub fn create(path: &Path) -> Result<Self> {
        let file = create_file(path)?;
        Ok(ArrayStoreWriter {
            writer: BufWriter::new(file),
        })
    }

    pub fn append(&mut self, value: &[u8]) -> Result<()> {
        self.writer.write_all(value)?;
        Ok(())
    }

    pub fn finish(mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

#[derive(Debug)]
pub struct ArrayStoreReader {
    data: MmapFile,
    element_size: u32,
}

impl ArrayStoreReader {
    pub fn open(path: &Path, element_size: u32) -> Result<Self> {
        let data = MmapFile::open_read_only(path)?;

        if data.len() % element_size as usize != 0 {
            return Err(Error::new(ErrorKind::Format, "truncated array store file"));
        }

        Ok(ArrayStoreReader { data, element_size })
    }

    pub fn num_elements(&self) -> u32 {
        (self.data.len() / self.element_size as usize) as u32
    }

    pub fn get(&self, position: u32) -> Option<&[u8]> {
        let start = position as usize * self.element_size as usize;
        self.data.data().get(start..start + self.element_size as usize)
    }
}
