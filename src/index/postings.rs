use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use crate::compression::vbyte::VByte;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::LocalDocId;
use crate::index::dictionary::TermInfo;
use crate::index::term_freqs_iterator::TermFreqsIterator;
use crate::mmap::mmap_file::MmapFile;
use crate::storage::layout::create_file;

/// A term's postings are split into self-delimiting blocks of up to 128
/// doc ids:
///
///   Header (22 bytes):
///     [0]      num docs            (u8)
///     [1..5)   first doc id        (u32 BE)
///     [5..9)   last doc id         (u32 BE)
///     [9..17)  max term freq       (u64 BE)
///     [17]     min field length id (u8)
///     [18..22) total byte length   (u32 BE, header + payload)
///   Payload:
///     num-docs varints: doc id deltas (first delta is the absolute id)
///     num-docs varints: term frequencies
pub const BLOCK_HEADER_SIZE: usize = 22;

pub const MAX_DOCS_PER_BLOCK: usize = 128;

#[derive(Debug, Clone, Copy)]
pub struct BlockHeader {
    pub num_docs: u8,
    pub first_doc_id: u32,
    pub last_doc_id: u32,
    pub max_freq: u64,
    pub min_length_id: u8,
    pub byte_length: u32,
}

impl BlockHeader {
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < BLOCK_HEADER_SIZE {
            return Err(Error::new(ErrorKind::Format, "truncated posting block header"));
        }

        let header = BlockHeader {
            num_docs: bytes[0],
            first_doc_id: u32::from_be_bytes(bytes[1..5].try_into().unwrap()),
            last_doc_id: u32::from_be_bytes(bytes[5..9].try_into().unwrap()),
            max_freq: u64::from_be_bytes(bytes[9..17].try_into().unwrap()),
            min_length_id: bytes[17],
            byte_length: u32::from_be_bytes(bytes[18..22].try_into().unwrap()),
        };

        if header.num_docs == 0 || (header.byte_length as usize) < BLOCK_HEADER_SIZE {
            return Err(Error::new(ErrorKind::Format, "invalid posting block header"));
        }

        Ok(header)
    }
}

/// Appends posting blocks for one field's frequencies file and tracks the
/// byte offsets that end up in the dictionary.
pub struct FreqsWriter {
    writer: BufWriter<File>,
    offset: u64,
}

impl FreqsWriter {
    pub fn create(path: &Path) -> Result<Self> {
        let file = create_file(path)?;
        Ok(FreqsWriter {
            writer: BufWriter::new(file),
            offset: 0,
        })
    }

    /// Writes one block, returns its (start, end) byte range.
    pub fn write_block(
        &mut self,
        doc_ids: &[u32],
        term_freqs: &[u64],
        min_length_id: u8,
    ) -> Result<(u64, u64)> {
        debug_assert!(!doc_ids.is_empty() && doc_ids.len() <= MAX_DOCS_PER_BLOCK);
        debug_assert_eq!(doc_ids.len(), term_freqs.len());

        let start = self.offset;

        let mut buffer = Vec::with_capacity(BLOCK_HEADER_SIZE + doc_ids.len() * 8);
        buffer.push(doc_ids.len() as u8);
        buffer.extend_from_slice(&doc_ids[0].to_be_bytes());
        buffer.extend_from_slice(&doc_ids[doc_ids.len() - 1].to_be_bytes());
        // max freq, min length id and byte length are patched below
        buffer.extend_from_slice(&[0u8; 13]);

        let mut previous = 0u32;
        for (i, &doc_id) in doc_ids.iter().enumerate() {
            let delta = if i == 0 { doc_id } else { doc_id - previous };
            VByte::encode_u64(&mut buffer, delta as u64);
            previous = doc_id;
        }

        let mut max_freq = 0u64;
        for &freq in term_freqs {
            VByte::encode_u64(&mut buffer, freq);
            max_freq = max_freq.max(freq);
        }

        buffer[9..17].copy_from_slice(&max_freq.to_be_bytes());
        buffer[17] = min_length_id;
        let byte_length = buffer.len() as u32;
        buffer[18..22].copy_from_slice(&byte_length.to_be_bytes());

        self.writer.write_all(&buffer)?;
        self.offset = start + byte_length as u64;

        Ok((start, self.offset))
    }

    pub fn finish(mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Memory-mapped frequencies file of one (segment, field).
pub struct FreqsReader {
    file: MmapFile,
}

impl FreqsReader {
    pub fn open(path: &Path) -> Result<Self> {
        Ok(FreqsReader {
            file: MmapFile::open_read_only(path)?,
        })
    }

    pub fn slice(&self, start: u64, end: u64) -> Result<&[u8]> {
        self.file
            .data()
            .get(start as usize..end as usize)
            .ok_or_else(|| Error::new(ErrorKind::Format, "posting range out of bounds"))
    }

    pub fn term_freqs_iterator(self: &Arc<Self>, term_info: &TermInfo) -> TermFreqsIterator {
        TermFreqsIterator::new(Arc::clone(self), term_info)
    }
}

/// Decodes one block's payload into absolute doc ids and frequencies.
pub fn decode_block_payload(
    header: &BlockHeader,
    payload: &[u8],
    doc_ids: &mut Vec<LocalDocId>,
    freqs: &mut Vec<u64>,
) -> Result<()> {
    doc_ids.clear();
    freqs.clear();

    let mut cursor = 0usize;
    let mut current = 0u32;

    for i in 0..header.num_docs as usize {
        let (delta, consumed) = VByte::decode_u64(&payload[cursor..])?;
        cursor += consumed;
        current = if i == 0 {
            delta as u32
        } else {
            current
                .checked_add(delta as u32)
                .ok_or_else(|| Error::new(ErrorKind::Format, "doc id delta overflow"))?
        };
        doc_ids.push(LocalDocId(current));
    }

    for _ in 0..header.num_docs {
        let (freq, consumed) = VByte::decode_u64(&payload[cursor..])?;
        cursor += consumed;
        freqs.push(freq);
    }

    Ok(())
}
