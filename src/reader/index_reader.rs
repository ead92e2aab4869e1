use std::path::Path;

use roaring::RoaringBitmap;

use crate::core::error::Result;
use crate::core::types::{local_doc_id_of, segment_id_of, to_global_doc_id, GlobalDocId, LocalDocId};
use crate::index::segment_reader::SegmentReader;
use crate::storage::commit::read_commit;
use crate::storage::deleted::DeletedReader;
use crate::storage::layout::IndexLayout;

/// Read-only snapshot of the index: the segment set and deletion
/// generation referenced by the commit manifest at open time. Segments
/// committed later are invisible until a new reader is opened.
pub struct IndexReader {
    segment_readers: Vec<SegmentReader>,
}

impl IndexReader {
    pub fn open(directory: impl AsRef<Path>) -> Result<Self> {
        let layout = IndexLayout::new(directory.as_ref())?;
        let commit = read_commit(&layout)?;
        let deleted_reader = DeletedReader::open(&layout, commit.deleted_id)?;

        let mut segment_readers = Vec::with_capacity(commit.segment_ids.len());
        for segment_id in commit.segment_ids {
            let deleted_docs = deleted_reader
                .deleted_docs_for_segment(segment_id)?
                .unwrap_or_else(RoaringBitmap::new);
            segment_readers.push(SegmentReader::new(layout.clone(), segment_id, deleted_docs));
        }

        Ok(IndexReader { segment_readers })
    }

    pub fn segment_readers(&self) -> &[SegmentReader] {
        &self.segment_readers
    }

    /// Global ids of every document whose `field` holds one of `values`
    /// exactly (byte-wise, against the indexed terms). Tombstones are not
    /// applied here; deletion itself relies on that to union correctly.
    pub fn search_by_exact_values(
        &self,
        field_name: &str,
        values: &[Vec<u8>],
    ) -> Result<Vec<GlobalDocId>> {
        let mut results = Vec::new();

        for segment in &self.segment_readers {
            let Some(dictionary) = segment.dictionary(field_name)? else {
                continue;
            };
            let Some(freqs_reader) = segment.freqs(field_name)? else {
                continue;
            };

            let mut segment_doc_ids = RoaringBitmap::new();

            for value in values {
                let Some(term_info) = dictionary.get(value)? else {
                    continue;
                };

                let mut iterator = freqs_reader.term_freqs_iterator(&term_info);
                let mut target = LocalDocId(0);
                if !iterator.next_shallow(target)? {
                    continue;
                }

                while iterator.next(target)? {
                    let doc_id = iterator.doc_id();
                    segment_doc_ids.insert(doc_id.0);
                    target = LocalDocId(doc_id.0.saturating_add(1));
                }
            }

            for doc_id in &segment_doc_ids {
                results.push(to_global_doc_id(segment.id, LocalDocId(doc_id)));
            }
        }

        Ok(results)
    }

    /// Stored raw value of one field of one document, or `None` when the
    /// document's segment is not live or never stored the field.
    pub fn value(&self, field_name: &str, doc_id: GlobalDocId) -> Result<Option<Vec<u8>>> {
        let segment_id = segment_id_of(doc_id);

        for segment in &self.segment_readers {
            if segment.id != segment_id {
                continue;
            }

            let Some(store) = segment.store(field_name)? else {
                return Ok(None);
            };

            return Ok(store.value(local_doc_id_of(doc_id))?.map(|value| value.to_vec()));
        }

        Ok(None)
    }
}
