use std::cmp::Ordering;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::core::error::{Error, ErrorKind, Result};
use crate::mmap::mmap_file::MmapFile;
use crate::storage::layout::{create_file, path_with_suffix};

/// Record layout in the data file:
///
///   [0..4)  key length   (u32 BE)
///   [4..8)  value length (u32 BE)
///   [8..)   key bytes, then value bytes
///
/// The index file is a dense array of u64 BE offsets, one per record,
/// pointing at the record header. Keys must be appended in strictly
/// ascending byte order; the reader's binary search depends on it.
pub struct KVStoreWriter {
    data_writer: BufWriter<File>,
    index_writer: BufWriter<File>,
    offset: u64,
    last_key: Option<Vec<u8>>,
}

impl KVStoreWriter {
    pub fn create(base: &Path) -> Result<Self> {
        let data_file = create_file(&path_with_suffix(base, ".data"))?;
        let index_file = create_file(&path_with_suffix(base, ".index"))?;

        Ok(KVStoreWriter {
            data_writer: BufWriter::new(data_file),
            index_writer: BufWriter::new(index_file),
            offset: 0,
            last_key: None,
        })
    }

    pub fn append(&mut self, key: &[u8], value: &[u8]) -> Result<()> {
        if let Some(last) = &self.last_key {
            if last.as_slice() >= key {
                return Err(Error::new(
                    ErrorKind::OrderingViolation,
                    format!("key {:?} not above previous {:?}", key, last),
                ));
            }
        }

        self.data_writer.write_all(&(key.len() as u32).to_be_bytes())?;
        self.data_writer.write_all(&(value.len() as u32).to_be_bytes())?;
        self.data_writer.write_all(key)?;
        self.data_writer.write_all(value)?;

        self.index_writer.write_all(&self.offset.to_be_bytes())?;

        self.offset += 8 + key.len() as u64 + value.len() as u64;
        self.last_key = Some(key.to_vec());

        Ok(())
    }

    pub fn finish(mut self) -> Result<()> {
        self.data_writer.flush()?;
        self.index_writer.flush()?;
        Ok(())
    }
}

#[derive(Debug)]
pub struct KVStoreReader {
    data: MmapFile,
    index: MmapFile,
}

impl KVStoreReader {
    pub fn open(base: &Path) -> Result<Self> {
        let data = MmapFile::open_read_only(path_with_suffix(base, ".data"))?;
        let index = MmapFile::open_read_only(path_with_suffix(base, ".index"))?;

        if index.len() % 8 != 0 {
            return Err(Error::new(ErrorKind::Format, "truncated KV index file"));
        }

        Ok(KVStoreReader { data, index })
    }

    pub fn num_records(&self) -> usize {
        self.index.len() / 8
    }

    /// Binary search over the offset index. The returned slice borrows
    /// from the memory map and lives as long as this reader.
    pub fn get(&self, key: &[u8]) -> Result<Option<&[u8]>> {
        let num_records = self.num_records();
        if num_records == 0 {
            return Ok(None);
        }

        let mut left = 0usize;
        let mut right = num_records - 1;

        while left <= right {
            let mid = left + (right - left) / 2;
            let (record_key, value) = self.record(mid)?;

            match record_key.cmp(key) {
                Ordering::Less => left = mid + 1,
                Ordering::Equal => return Ok(Some(value)),
                Ordering::Greater => {
                    if mid == 0 {
                        return Ok(None);
                    }
                    right = mid - 1;
                }
            }
        }

        Ok(None)
    }

    fn record(&self, position: usize) -> Result<(&[u8], &[u8])> {
        let index_bytes = self
            .index
            .data()
            .get(position * 8..position * 8 + 8)
            .ok_or_else(|| Error::new(ErrorKind::Format, "KV index entry out of range"))?;
        let offset = u64::from_be_bytes(index_bytes.try_into().unwrap()) as usize;

        let data = self.data.data();
        let header = data
            .get(offset..offset + 8)
            .ok_or_else(|| Error::new(ErrorKind::Format, "KV record header out of range"))?;
        let key_len = u32::from_be_bytes(header[0..4].try_into().unwrap()) as usize;
        let value_len = u32::from_be_bytes(header[4..8].try_into().unwrap()) as usize;

        let key = data
            .get(offset + 8..offset + 8 + key_len)
            .ok_or_else(|| Error::new(ErrorKind::Format, "KV record key out of range"))?;
        let value = data
            .get(offset + 8 + key_len..offset + 8 + key_len + value_len)
            .ok_or_else(|| Error::new(ErrorKind::Format, "KV record value out of range"))?;

        Ok((key, value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn base(dir: &TempDir) -> std::path::PathBuf {
        dir.path().join("store")
    }

    #[test]
    fn write_then_get() {
        let dir = TempDir::new().unwrap();
        let mut writer = KVStoreWriter::create(&base(&dir)).unwrap();
        writer.append(b"apple", b"1").unwrap();
        writer.append(b"banana", b"22").unwrap();
        writer.append(b"cherry", b"333").unwrap();
        writer.finish().unwrap();

        let reader = KVStoreReader::open(&base(&dir)).unwrap();
        assert_eq!(reader.num_records(), 3);
        assert_eq!(reader.get(b"apple").unwrap(), Some(b"1".as_ref()));
        assert_eq!(reader.get(b"banana").unwrap(), Some(b"22".as_ref()));
        assert_eq!(reader.get(b"cherry").unwrap(), Some(b"333".as_ref()));
        assert_eq!(reader.get(b"aardvark").unwrap(), None);
        assert_eq!(reader.get(b"blueberry").unwrap(), None);
        assert_eq!(reader.get(b"durian").unwrap(), None);
    }

    #[test]
    fn empty_store() {
        let dir = TempDir::new().unwrap();
        let writer = KVStoreWriter::create(&base(&dir)).unwrap();
        writer.finish().unwrap();

        let reader = KVStoreReader::open(&base(&dir)).unwrap();
        assert_eq!(reader.num_records(), 0);
        assert_eq!(reader.get(b"anything").unwrap(), None);
    }

    #[test]
    fn out_of_order_keys_are_rejected() {
        let dir = TempDir::new().unwrap();
        let mut writer = KVStoreWriter::create(&base(&dir)).unwrap();
        writer.append(b"banana", b"1").unwrap();
        let err = writer.append(b"apple", b"2").unwrap_err();
        assert_eq!(err.kind, ErrorKind::OrderingViolation);

        let mut writer2 = KVStoreWriter::create(&dir.path().join("dup")).unwrap();
        writer2.append(b"same", b"1").unwrap();
        assert_eq!(
            writer2.append(b"same", b"2").unwrap_err().kind,
            ErrorKind::OrderingViolation
        );
    }

    #[test]
    fn exclusive_create_refuses_to_overwrite() {
        let dir = TempDir::new().unwrap();
        let writer = KVStoreWriter::create(&base(&dir)).unwrap();
        writer.finish().unwrap();
        assert!(KVStoreWriter::create(&base(&dir)).is_err());
    }

    #[test]
    fn missing_file_fails_to_open() {
        let dir = TempDir::new().unwrap();
        assert!(KVStoreReader::open(&dir.path().join("absent")).is_err());
    }

    #[test]
    fn truncated_index_is_a_format_error() {
        let dir = TempDir::new().unwrap();
        let mut writer = KVStoreWriter::create(&base(&dir)).unwrap();
        writer.append(b"key", b"value").unwrap();
        writer.finish().unwrap();

        let index_path = path_with_suffix(&base(&dir), ".index");
        let bytes = std::fs::read(&index_path).unwrap();
        std::fs::write(&index_path, &bytes[..bytes.len() - 3]).unwrap();

        let err = KVStoreReader::open(&base(&dir)).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Format);
    }
}
