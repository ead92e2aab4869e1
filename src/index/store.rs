use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use crate::core::error::Result;
use crate::core::types::LocalDocId;
use crate::index::accumulator::SegmentComponentWriter;
use crate::storage::kv_store::{KVStoreReader, KVStoreWriter};
use crate::storage::layout::IndexLayout;

/// Retains the last written raw value per (field, doc) and flushes one KV
/// store per field, keyed by the doc id's big-endian bytes so numeric
/// order and key order coincide.
pub struct StoreAccumulator {
    current_doc: LocalDocId,
    values: HashMap<String, BTreeMap<u32, Vec<u8>>>,
}

impl StoreAccumulator {
    pub fn new() -> Self {
        StoreAccumulator {
            current_doc: LocalDocId(0),
            values: HashMap::new(),
        }
    }
}

impl SegmentComponentWriter for StoreAccumulator {
    fn doc(&mut self, doc_id: LocalDocId) {
        self.current_doc = doc_id;
    }

    fn field(&mut self, name: &str, value: &[u8]) {
        self.values
            .entry(name.to_string())
            .or_default()
            .insert(self.current_doc.0, value.to_vec());
    }

    fn term(&mut self, _term: &[u8]) {}

    fn end_field(&mut self) {}

    fn write(&mut self, layout: &IndexLayout, segment_id: u32) -> Result<()> {
        for (field_name, field_values) in &self.values {
            let mut kv_writer =
                KVStoreWriter::create(&layout.segment_kv_base(segment_id, field_name, "store"))?;

            for (doc_id, value) in field_values {
                kv_writer.append(&doc_id.to_be_bytes(), value)?;
            }

            kv_writer.finish()?;
        }

        Ok(())
    }
}

/// Stored values of one (segment, field).
pub struct FieldStoreReader {
    kv_reader: KVStoreReader,
}

impl FieldStoreReader {
    pub fn open(base: &Path) -> Result<Self> {
        Ok(FieldStoreReader {
            kv_reader: KVStoreReader::open(base)?,
        })
    }

    pub fn value(&self, doc_id: LocalDocId) -> Result<Option<&[u8]>> {
        self.kv_reader.get(&doc_id.0.to_be_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn stores_raw_values_per_doc() {
        let dir = TempDir::new().unwrap();
        let layout = IndexLayout::new(dir.path()).unwrap();

        let mut accumulator = StoreAccumulator::new();
        accumulator.doc(LocalDocId(0));
        accumulator.field("id", b"nine");
        accumulator.field("body", b"some text");
        accumulator.doc(LocalDocId(1));
        accumulator.field("id", b"three");
        accumulator.write(&layout, 7).unwrap();

        let ids = FieldStoreReader::open(&layout.segment_kv_base(7, "id", "store")).unwrap();
        assert_eq!(ids.value(LocalDocId(0)).unwrap(), Some(b"nine".as_ref()));
        assert_eq!(ids.value(LocalDocId(1)).unwrap(), Some(b"three".as_ref()));
        assert_eq!(ids.value(LocalDocId(2)).unwrap(), None);

        let bodies = FieldStoreReader::open(&layout.segment_kv_base(7, "body", "store")).unwrap();
        assert_eq!(bodies.value(LocalDocId(1)).unwrap(), None);
    }

    #[test]
    fn last_value_wins_for_repeated_fields() {
        let dir = TempDir::new().unwrap();
        let layout = IndexLayout::new(dir.path()).unwrap();

        let mut accumulator = StoreAccumulator::new();
        accumulator.doc(LocalDocId(0));
        accumulator.field("tag", b"first");
        accumulator.field("tag", b"second");
        accumulator.write(&layout, 8).unwrap();

        let tags = FieldStoreReader::open(&layout.segment_kv_base(8, "tag", "store")).unwrap();
        assert_eq!(tags.value(LocalDocId(0)).unwrap(), Some(b"second".as_ref()));
    }
}
