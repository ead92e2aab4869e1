use std::collections::BTreeMap;
use std::path::Path;

use log::debug;
use parking_lot::Mutex;
use roaring::RoaringBitmap;

use crate::analysis::tokenizer::{StandardTokenizer, Tokenizer};
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::{local_doc_id_of, segment_id_of, Document, FieldType, LocalDocId};
use crate::index::accumulator::SegmentComponentWriter;
use crate::index::inverted::InvertedIndexAccumulator;
use crate::index::store::StoreAccumulator;
use crate::reader::index_reader::IndexReader;
use crate::storage::commit::{read_commit, write_commit};
use crate::storage::deleted::{write_deleted, DeletedReader};
use crate::storage::layout::IndexLayout;

/// Single writer over one index directory. The lock makes every mutating
/// call exclusive within this process; two writer instances on the same
/// directory are not supported (the commit rename would race).
pub struct IndexWriter {
    layout: IndexLayout,
    tokenizer: StandardTokenizer,
    lock: Mutex<()>,
}

impl IndexWriter {
    pub fn open(directory: impl AsRef<Path>) -> Result<Self> {
        Ok(IndexWriter {
            layout: IndexLayout::new(directory.as_ref())?,
            tokenizer: StandardTokenizer::default(),
            lock: Mutex::new(()),
        })
    }

    /// Writes one batch as one new immutable segment, then publishes it
    /// through the commit manifest. A failure before the commit leaves
    /// orphan segment files behind; they stay invisible because the
    /// manifest still references the old segment set.
    pub fn add_documents(&self, documents: &[Document]) -> Result<()> {
        let _guard = self.lock.lock();

        if documents.is_empty() {
            return Ok(());
        }

        let mut inverted = InvertedIndexAccumulator::new();
        let mut store = StoreAccumulator::new();

        {
            let mut accumulators: [&mut dyn SegmentComponentWriter; 2] =
                [&mut inverted, &mut store];

            for (doc_index, document) in documents.iter().enumerate() {
                let doc_id = LocalDocId(doc_index as u32);
                for accumulator in accumulators.iter_mut() {
                    accumulator.doc(doc_id);
                }

                for field in &document.fields {
                    for accumulator in accumulators.iter_mut() {
                        accumulator.field(&field.name, &field.value);
                    }

                    match field.field_type {
                        FieldType::Text => {
                            for token in self.tokenizer.tokenize(&field.value) {
                                for accumulator in accumulators.iter_mut() {
                                    accumulator.term(token.text.as_bytes());
                                }
                            }
                        }
                        FieldType::Byte => {
                            for accumulator in accumulators.iter_mut() {
                                accumulator.term(&field.value);
                            }
                        }
                    }

                    for accumulator in accumulators.iter_mut() {
                        accumulator.end_field();
                    }
                }
            }
        }

        let segment_id: u32 = rand::random();

        inverted.write(&self.layout, segment_id)?;
        store.write(&self.layout, segment_id)?;

        let mut commit = read_commit(&self.layout)?;
        commit.segment_ids.push(segment_id);
        write_commit(&self.layout, &commit)?;

        debug!(
            "committed segment {} with {} documents",
            segment_id,
            documents.len()
        );
        Ok(())
    }

    /// Tombstones every document whose `field` holds one of `values`
    /// exactly, by writing a new deletion generation. All previous
    /// tombstones of live segments are carried into the new generation,
    /// so deletion is monotone. No matches means no new generation.
    pub fn delete_documents(&self, field_name: &str, values: &[Vec<u8>]) -> Result<()> {
        let _guard = self.lock.lock();

        let reader = IndexReader::open(self.layout.dir())?;
        let matches = reader.search_by_exact_values(field_name, values)?;
        if matches.is_empty() {
            return Ok(());
        }

        let commit = read_commit(&self.layout)?;
        let previous = DeletedReader::open(&self.layout, commit.deleted_id)?;
        let next_generation = match commit.deleted_id {
            Some(generation) => generation.checked_add(1).ok_or_else(|| {
                Error::new(ErrorKind::Internal, "deletion generation id overflow")
            })?,
            None => 0,
        };

        let mut deleted_by_segment: BTreeMap<u32, RoaringBitmap> = BTreeMap::new();
        for &segment_id in &commit.segment_ids {
            if let Some(bitmap) = previous.deleted_docs_for_segment(segment_id)? {
                deleted_by_segment.insert(segment_id, bitmap);
            }
        }

        for doc_id in &matches {
            deleted_by_segment
                .entry(segment_id_of(*doc_id))
                .or_default()
                .insert(local_doc_id_of(*doc_id).0);
        }

        write_deleted(&self.layout, next_generation, &deleted_by_segment)?;

        let mut commit = commit;
        commit.deleted_id = Some(next_generation);
        write_commit(&self.layout, &commit)?;

        debug!(
            "committed deletion generation {} covering {} documents",
            next_generation,
            matches.len()
        );
        Ok(())
    }
}
