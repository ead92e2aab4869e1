use std::sync::Arc;

use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::LocalDocId;
use crate::index::dictionary::TermInfo;
use crate::index::postings::{decode_block_payload, BlockHeader, FreqsReader, BLOCK_HEADER_SIZE};

/// Block-skipping iterator over one term's posting blocks.
///
/// `next_shallow` advances block by block decoding only the fixed header,
/// so callers can check `last_doc_id` and the block's score upper bound
/// before paying for `next`, which decodes the payload and positions on a
/// doc id. Both are monotone: once they return false they stay false, and
/// neither rewinds.
pub struct TermFreqsIterator {
    reader: Arc<FreqsReader>,
    end: u64,

    // Current block
    block_start: u64,
    header: Option<BlockHeader>,
    payload_decoded: bool,
    index_in_block: usize,
    block_doc_ids: Vec<LocalDocId>,
    block_freqs: Vec<u64>,
}

impl TermFreqsIterator {
    pub fn new(reader: Arc<FreqsReader>, term_info: &TermInfo) -> Self {
        TermFreqsIterator {
            reader,
            end: term_info.freqs_end_offset,
            block_start: term_info.freqs_start_offset,
            header: None,
            payload_decoded: false,
            index_in_block: 0,
            block_doc_ids: Vec::with_capacity(128),
            block_freqs: Vec::with_capacity(128),
        }
    }

    /// Advances to the first block whose `last_doc_id >= target`, decoding
    /// headers only. Returns false when the posting range is exhausted.
    pub fn next_shallow(&mut self, target: LocalDocId) -> Result<bool> {
        loop {
            let header = match self.header {
                Some(header) => header,
                None => self.decode_header()?,
            };

            if target.0 <= header.last_doc_id {
                return Ok(true);
            }

            let next_block = self.block_start + header.byte_length as u64;
            if next_block >= self.end {
                return Ok(false);
            }

            self.block_start = next_block;
            self.header = None;
        }
    }

    /// Positions on the first doc id `>= target`. Requires the monotone
    /// call pattern of `next_shallow`; decodes the current block's payload
    /// on first use.
    pub fn next(&mut self, target: LocalDocId) -> Result<bool> {
        if !self.next_shallow(target)? {
            return Ok(false);
        }

        if !self.payload_decoded {
            self.decode_payload()?;
        }

        while self.index_in_block < self.block_doc_ids.len()
            && self.block_doc_ids[self.index_in_block] < target
        {
            self.index_in_block += 1;
        }

        if self.index_in_block < self.block_doc_ids.len() {
            return Ok(true);
        }

        // Target is past this block's docs; land on the next block's
        // header. The caller observes its first doc id via doc_id().
        let last = self.header.as_ref().map(|h| h.last_doc_id).unwrap_or(0);
        self.next_shallow(LocalDocId(last.saturating_add(1)))
    }

    /// Valid after a successful `next_shallow`. Before the payload is
    /// decoded this is the block's first doc id, a real posting.
    pub fn doc_id(&self) -> LocalDocId {
        if self.payload_decoded {
            self.block_doc_ids[self.index_in_block]
        } else {
            LocalDocId(self.header.as_ref().map(|h| h.first_doc_id).unwrap_or(0))
        }
    }

    /// Valid only after `next` positioned on a doc within a decoded block.
    pub fn term_freq(&self) -> u64 {
        debug_assert!(self.payload_decoded);
        self.block_freqs[self.index_in_block]
    }

    /// Current block's last doc id, the skip boundary.
    pub fn last_doc_id(&self) -> LocalDocId {
        LocalDocId(self.header.as_ref().map(|h| h.last_doc_id).unwrap_or(0))
    }

    /// Header fields driving the block upper-bound computation.
    pub fn block_max_freq_min_length_id(&self) -> (u64, u8) {
        match &self.header {
            Some(header) => (header.max_freq, header.min_length_id),
            None => (0, 0),
        }
    }

    fn decode_header(&mut self) -> Result<BlockHeader> {
        let bytes = self.reader.slice(self.block_start, self.end)?;
        let header = BlockHeader::parse(bytes)?;
        self.header = Some(header);
        self.payload_decoded = false;
        Ok(header)
    }

    fn decode_payload(&mut self) -> Result<()> {
        let header = self
            .header
            .ok_or_else(|| Error::new(ErrorKind::Internal, "payload requested before header"))?;
        let block_end = self.block_start + header.byte_length as u64;
        let payload = &self
            .reader
            .slice(self.block_start, block_end.min(self.end))?[BLOCK_HEADER_SIZE..];

        let mut doc_ids = std::mem::take(&mut self.block_doc_ids);
        let mut freqs = std::mem::take(&mut self.block_freqs);
        decode_block_payload(&header, payload, &mut doc_ids, &mut freqs)?;
        self.block_doc_ids = doc_ids;
        self.block_freqs = freqs;

        self.index_in_block = 0;
        self.payload_decoded = true;
        Ok(())
    }
}
