use std::path::Path;

use crate::core::error::{Error, ErrorKind, Result};
use crate::storage::kv_store::{KVStoreReader, KVStoreWriter};

/// Where a term's postings live in the field's frequencies file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TermInfo {
    pub doc_freq: u32,
    pub freqs_start_offset: u64,
    pub freqs_end_offset: u64,
}

const TERM_INFO_SIZE: usize = 20;

/// Term dictionary atop a KV store: key = term bytes, value = 20 bytes of
/// `doc_freq (u32 BE) ‖ start_offset (u64 BE) ‖ end_offset (u64 BE)`.
/// Terms must be appended in ascending byte order.
pub struct DictionaryWriter {
    kv_writer: KVStoreWriter,
    buffer: [u8; TERM_INFO_SIZE],
}

impl DictionaryWriter {
    pub fn create(base: &Path) -> Result<Self> {
        Ok(DictionaryWriter {
            kv_writer: KVStoreWriter::create(base)?,
            buffer: [0; TERM_INFO_SIZE],
        })
    }

    pub fn write(&mut self, term: &[u8], term_info: &TermInfo) -> Result<()> {
        self.buffer[0..4].copy_from_slice(&term_info.doc_freq.to_be_bytes());
        self.buffer[4..12].copy_from_slice(&term_info.freqs_start_offset.to_be_bytes());
        self.buffer[12..20].copy_from_slice(&term_info.freqs_end_offset.to_be_bytes());
        self.kv_writer.append(term, &self.buffer)
    }

    pub fn finish(self) -> Result<()> {
        self.kv_writer.finish()
    }
}

pub struct DictionaryReader {
    kv_reader: KVStoreReader,
}

impl DictionaryReader {
    pub fn open(base: &Path) -> Result<Self> {
        Ok(DictionaryReader {
            kv_reader: KVStoreReader::open(base)?,
        })
    }

    pub fn get(&self, term: &[u8]) -> Result<Option<TermInfo>> {
        let Some(value) = self.kv_reader.get(term)? else {
            return Ok(None);
        };

        if value.len() != TERM_INFO_SIZE {
            return Err(Error::new(ErrorKind::Format, "malformed dictionary entry"));
        }

        Ok(Some(TermInfo {
            doc_freq: u32::from_be_bytes(value[0..4].try_into().unwrap()),
            freqs_start_offset: u64::from_be_bytes(value[4..12].try_into().unwrap()),
            freqs_end_offset: u64::from_be_bytes(value[12..20].try_into().unwrap()),
        }))
    }
}
