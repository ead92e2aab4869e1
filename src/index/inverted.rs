use std::collections::HashMap;

use roaring::RoaringBitmap;

use crate::core::error::Result;
use crate::core::types::LocalDocId;
use crate::index::accumulator::SegmentComponentWriter;
use crate::index::dictionary::{DictionaryWriter, TermInfo};
use crate::index::field_length::field_length_to_id;
use crate::index::field_stats::write_field_stats;
use crate::index::postings::{FreqsWriter, MAX_DOCS_PER_BLOCK};
use crate::storage::array_store::ArrayStoreWriter;
use crate::storage::layout::IndexLayout;

struct Posting {
    doc_id: LocalDocId,
    #[allow(dead_code)]
    position: u64,
}

/// In-memory inverted index for one batch. Postings accumulate per
/// (field, term) in insertion order, which is ascending doc-id order
/// because the writer feeds documents sequentially.
pub struct InvertedIndexAccumulator {
    current_doc: LocalDocId,
    current_field: usize,
    position: u64,
    doc_count: u32,

    field_ids: HashMap<String, usize>,
    field_names: Vec<String>,
    // postings[field_id][term]
    postings: Vec<HashMap<Vec<u8>, Vec<Posting>>>,
    // field_lengths[field_id][local_doc_id], padded with 0 for docs
    // missing the field
    field_lengths: Vec<Vec<u64>>,
}

impl InvertedIndexAccumulator {
    pub fn new() -> Self {
        InvertedIndexAccumulator {
            current_doc: LocalDocId(0),
            current_field: 0,
            position: 0,
            doc_count: 0,
            field_ids: HashMap::new(),
            field_names: Vec::new(),
            postings: Vec::new(),
            field_lengths: Vec::new(),
        }
    }

    fn write_field(
        &self,
        layout: &IndexLayout,
        segment_id: u32,
        field_id: usize,
    ) -> Result<()> {
        let field_name = &self.field_names[field_id];
        let field_postings = &self.postings[field_id];
        let lengths = &self.field_lengths[field_id];

        let mut freqs_writer =
            FreqsWriter::create(&layout.segment_file(segment_id, field_name, "frequencies"))?;
        let mut dictionary_writer =
            DictionaryWriter::create(&layout.segment_kv_base(segment_id, field_name, "dictionary"))?;
        let mut lengths_writer =
            ArrayStoreWriter::create(&layout.segment_file(segment_id, field_name, "lengths"))?;

        let mut sorted_terms: Vec<&Vec<u8>> = field_postings.keys().collect();
        sorted_terms.sort_unstable();

        let mut field_doc_ids = RoaringBitmap::new();
        let mut field_sum_term_freq = 0u64;

        let mut term_doc_ids: Vec<u32> = Vec::with_capacity(128);
        let mut term_freqs: Vec<u64> = Vec::with_capacity(128);

        for term in sorted_terms {
            term_doc_ids.clear();
            term_freqs.clear();

            // Group postings by doc id; they are already in doc-id order.
            for posting in &field_postings[term] {
                field_doc_ids.insert(posting.doc_id.0);
                field_sum_term_freq += 1;

                if term_doc_ids.last() == Some(&posting.doc_id.0) {
                    *term_freqs.last_mut().unwrap() += 1;
                } else {
                    term_doc_ids.push(posting.doc_id.0);
                    term_freqs.push(1);
                }
            }

            let mut start_offset = None;
            let mut end_offset = 0u64;

            for (doc_ids, freqs) in term_doc_ids
                .chunks(MAX_DOCS_PER_BLOCK)
                .zip(term_freqs.chunks(MAX_DOCS_PER_BLOCK))
            {
                let min_length = doc_ids
                    .iter()
                    .map(|&doc_id| lengths[doc_id as usize])
                    .min()
                    .unwrap_or(0);

                let (block_start, block_end) =
                    freqs_writer.write_block(doc_ids, freqs, field_length_to_id(min_length))?;
                start_offset.get_or_insert(block_start);
                end_offset = block_end;
            }

            dictionary_writer.write(
                term,
                &TermInfo {
                    doc_freq: term_doc_ids.len() as u32,
                    freqs_start_offset: start_offset.unwrap_or(0),
                    freqs_end_offset: end_offset,
                },
            )?;
        }

        write_field_stats(
            &layout.segment_file(segment_id, field_name, "stats"),
            field_doc_ids.len() as u32,
            field_sum_term_freq,
        )?;

        // One quantized byte per local doc id, including docs without the
        // field (length 0).
        let mut length_ids = vec![0u8; self.doc_count as usize];
        for (doc_id, &length) in lengths.iter().enumerate() {
            length_ids[doc_id] = field_length_to_id(length);
        }
        lengths_writer.append(&length_ids)?;

        freqs_writer.finish()?;
        dictionary_writer.finish()?;
        lengths_writer.finish()?;

        Ok(())
    }
}

impl SegmentComponentWriter for InvertedIndexAccumulator {
    fn doc(&mut self, doc_id: LocalDocId) {
        self.current_doc = doc_id;
        self.doc_count = doc_id.0 + 1;
    }

    fn field(&mut self, name: &str, _value: &[u8]) {
        self.position = 0;

        let field_id = match self.field_ids.get(name) {
            Some(&field_id) => field_id,
            None => {
                let field_id = self.field_names.len();
                self.field_ids.insert(name.to_string(), field_id);
                self.field_names.push(name.to_string());
                self.postings.push(HashMap::new());
                self.field_lengths.push(Vec::new());
                field_id
            }
        };

        self.current_field = field_id;
    }

    fn term(&mut self, term: &[u8]) {
        let posting = Posting {
            doc_id: self.current_doc,
            position: self.position,
        };

        self.postings[self.current_field]
            .entry(term.to_vec())
            .or_default()
            .push(posting);
        self.position += 1;
    }

    fn end_field(&mut self) {
        let lengths = &mut self.field_lengths[self.current_field];
        let doc_index = self.current_doc.0 as usize;

        if lengths.len() == doc_index + 1 {
            // Second instance of the field on the same doc.
            lengths[doc_index] += self.position;
        } else {
            lengths.resize(doc_index, 0);
            lengths.push(self.position);
        }
    }

    fn write(&mut self, layout: &IndexLayout, segment_id: u32) -> Result<()> {
        for field_id in 0..self.field_names.len() {
            self.field_lengths[field_id].resize(self.doc_count as usize, 0);
            self.write_field(layout, segment_id, field_id)?;
        }
        Ok(())
    }
}
