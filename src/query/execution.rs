use std::sync::Arc;

use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::LocalDocId;
use crate::index::dictionary::TermInfo;
use crate::index::field_length::FieldLengthReader;
use crate::index::postings::FreqsReader;
use crate::index::segment_reader::SegmentReader;
use crate::query::context::QueryContext;
use crate::scoring::bm25;

/// Everything a query needs per (segment, field, term), resolved once
/// before iteration starts. IDFs aggregate doc counts and doc freqs over
/// all live segments; a segment without the field contributes zero.
pub struct ExecutionContext {
    // [segment][field]
    pub freqs_readers: Vec<Vec<Option<Arc<FreqsReader>>>>,
    // [segment][field]
    pub length_readers: Vec<Vec<Option<Arc<FieldLengthReader>>>>,
    // [field][length_id]
    pub precomputed_norms: Vec<Vec<f32>>,
    // [field][term]
    pub term_idfs: Vec<Vec<f32>>,
    // [segment][field][term]
    pub term_infos: Vec<Vec<Vec<Option<TermInfo>>>>,
}

pub fn generate_execution_context(
    query_context: &QueryContext,
    segments: &[SegmentReader],
) -> Result<ExecutionContext> {
    let num_fields = query_context.fields.len();

    let mut freqs_readers = Vec::with_capacity(segments.len());
    let mut length_readers = Vec::with_capacity(segments.len());
    let mut term_infos = Vec::with_capacity(segments.len());
    // (doc_count, sum_term_freq) per field, summed over segments
    let mut field_stats = vec![(0u64, 0u64); num_fields];

    for segment in segments {
        let mut segment_freqs = Vec::with_capacity(num_fields);
        let mut segment_lengths = Vec::with_capacity(num_fields);
        let mut segment_infos = Vec::with_capacity(num_fields);

        for (field_index, field) in query_context.fields.iter().enumerate() {
            segment_freqs.push(segment.freqs(&field.name)?);
            segment_lengths.push(segment.field_lengths(&field.name)?);

            let (doc_count, sum_term_freq) = segment.field_stats(&field.name)?;
            field_stats[field_index].0 += doc_count as u64;
            field_stats[field_index].1 += sum_term_freq;

            let dictionary = segment.dictionary(&field.name)?;
            let mut infos = Vec::with_capacity(field.terms.len());
            for term in &field.terms {
                infos.push(match &dictionary {
                    Some(dictionary) => dictionary.get(term)?,
                    None => None,
                });
            }
            segment_infos.push(infos);
        }

        freqs_readers.push(segment_freqs);
        length_readers.push(segment_lengths);
        term_infos.push(segment_infos);
    }

    let mut term_idfs = Vec::with_capacity(num_fields);
    for (field_index, field) in query_context.fields.iter().enumerate() {
        let doc_count = field_stats[field_index].0;
        let mut idfs = Vec::with_capacity(field.terms.len());

        for term_index in 0..field.terms.len() {
            let mut doc_freq = 0u64;
            for segment_infos in &term_infos {
                if let Some(info) = &segment_infos[field_index][term_index] {
                    doc_freq += info.doc_freq as u64;
                }
            }
            idfs.push(bm25::idf(doc_count, doc_freq));
        }

        term_idfs.push(idfs);
    }

    let mut precomputed_norms = Vec::with_capacity(num_fields);
    for &(doc_count, sum_term_freq) in &field_stats {
        // A field absent everywhere has no postings to score; any finite
        // average keeps the norms well-defined.
        let average = if doc_count == 0 {
            1.0
        } else {
            sum_term_freq as f32 / doc_count as f32
        };
        precomputed_norms.push(bm25::precompute_length_norms(average));
    }

    Ok(ExecutionContext {
        freqs_readers,
        length_readers,
        precomputed_norms,
        term_idfs,
        term_infos,
    })
}

/// Length norms of the doc currently under scoring, computed lazily per
/// field and reset per candidate doc.
pub struct FieldLengthNorms<'a> {
    doc_id: LocalDocId,
    computed: Vec<bool>,
    norms: Vec<f32>,
    length_readers: &'a [Option<Arc<FieldLengthReader>>],
    precomputed_norms: &'a [Vec<f32>],
}

impl<'a> FieldLengthNorms<'a> {
    pub fn new(
        length_readers: &'a [Option<Arc<FieldLengthReader>>],
        precomputed_norms: &'a [Vec<f32>],
    ) -> Self {
        let num_fields = length_readers.len();
        FieldLengthNorms {
            doc_id: LocalDocId(0),
            computed: vec![false; num_fields],
            norms: vec![0.0; num_fields],
            length_readers,
            precomputed_norms,
        }
    }

    pub fn set_doc(&mut self, doc_id: LocalDocId) {
        self.computed.fill(false);
        self.doc_id = doc_id;
    }

    pub fn get(&mut self, field_index: usize) -> Result<f32> {
        if self.computed[field_index] {
            return Ok(self.norms[field_index]);
        }

        // A posting for this doc exists, so the lengths file must too;
        // anything else is structural corruption.
        let reader = self.length_readers[field_index].as_ref().ok_or_else(|| {
            Error::new(ErrorKind::NotFound, "field lengths missing for scored doc")
        })?;
        let length_id = reader.length_id(self.doc_id)?;
        let norm = self.precomputed_norms[field_index][length_id as usize];

        self.computed[field_index] = true;
        self.norms[field_index] = norm;
        Ok(norm)
    }
}
