use crate::core::error::Result;
use crate::core::types::LocalDocId;
use crate::index::term_freqs_iterator::TermFreqsIterator;
use crate::query::execution::FieldLengthNorms;
use crate::scoring::bm25::{bm25_score, BM25_K1};

/// Skippable, upper-bound-aware iterator over one term's postings, the
/// leaf the WAND and leapfrog combinators drive.
pub struct ChildTermIterator<'a> {
    field_index: usize,
    freqs: TermFreqsIterator,
    term_idf: f32,
    global_upper_bound: f32,
    // precomputed norms of this term's field, indexed by length id
    norms: &'a [f32],
}

impl<'a> ChildTermIterator<'a> {
    pub fn new(
        field_index: usize,
        freqs: TermFreqsIterator,
        term_idf: f32,
        norms: &'a [f32],
    ) -> Self {
        ChildTermIterator {
            field_index,
            freqs,
            term_idf,
            // Supremum of the tf factor over any posting.
            global_upper_bound: term_idf * (BM25_K1 + 1.0),
            norms,
        }
    }

    pub fn doc_id(&self) -> LocalDocId {
        self.freqs.doc_id()
    }

    pub fn next(&mut self, target: LocalDocId) -> Result<bool> {
        self.freqs.next(target)
    }

    pub fn next_shallow(&mut self, target: LocalDocId) -> Result<bool> {
        self.freqs.next_shallow(target)
    }

    pub fn idf(&self) -> f32 {
        self.term_idf
    }

    pub fn global_upper_bound(&self) -> f32 {
        self.global_upper_bound
    }

    /// Best score any doc in the current block can reach, from the block
    /// header's max frequency and min length id.
    pub fn block_upper_bound(&self) -> f32 {
        let (max_freq, min_length_id) = self.freqs.block_max_freq_min_length_id();
        bm25_score(
            self.term_idf,
            max_freq as f32,
            self.norms[min_length_id as usize],
        )
    }

    pub fn block_max_doc_id(&self) -> LocalDocId {
        self.freqs.last_doc_id()
    }

    pub fn score(&self, length_norms: &mut FieldLengthNorms) -> Result<f32> {
        let term_freq = self.freqs.term_freq() as f32;
        let norm = length_norms.get(self.field_index)?;
        Ok(bm25_score(self.term_idf, term_freq, norm))
    }
}

/// A term query compiled as the query root: no combinator above it, so it
/// prunes blocks directly against the collector's lower bound.
pub struct RootTermIterator<'a> {
    field_index: usize,
    freqs: TermFreqsIterator,
    term_idf: f32,
    norms: &'a [f32],
    cursor: LocalDocId,
    scored_block: Option<LocalDocId>,
}

impl<'a> RootTermIterator<'a> {
    pub fn new(
        field_index: usize,
        freqs: TermFreqsIterator,
        term_idf: f32,
        norms: &'a [f32],
    ) -> Self {
        RootTermIterator {
            field_index,
            freqs,
            term_idf,
            norms,
            cursor: LocalDocId(0),
            scored_block: None,
        }
    }

    pub fn next(
        &mut self,
        length_norms: &mut FieldLengthNorms,
        lower_bound: f32,
    ) -> Result<Option<(LocalDocId, f32)>> {
        loop {
            if !self.freqs.next_shallow(self.cursor)? {
                return Ok(None);
            }

            let block_last = self.freqs.last_doc_id();
            if self.scored_block != Some(block_last) {
                let (max_freq, min_length_id) = self.freqs.block_max_freq_min_length_id();
                let upper_bound = bm25_score(
                    self.term_idf,
                    max_freq as f32,
                    self.norms[min_length_id as usize],
                );

                if upper_bound < lower_bound {
                    // The whole block is beaten; skip it.
                    self.cursor = LocalDocId(block_last.0.saturating_add(1));
                    continue;
                }

                self.scored_block = Some(block_last);
            }

            if !self.freqs.next(self.cursor)? {
                return Ok(None);
            }

            let doc_id = self.freqs.doc_id();
            self.cursor = LocalDocId(doc_id.0.saturating_add(1));

            length_norms.set_doc(doc_id);
            let score = bm25_score(
                self.term_idf,
                self.freqs.term_freq() as f32,
                length_norms.get(self.field_index)?,
            );

            return Ok(Some((doc_id, score)));
        }
    }
}
