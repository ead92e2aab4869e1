use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use roaring::RoaringBitmap;

use crate::core::error::Result;
use crate::index::dictionary::DictionaryReader;
use crate::index::field_length::FieldLengthReader;
use crate::index::field_stats::read_field_stats;
use crate::index::postings::FreqsReader;
use crate::index::store::FieldStoreReader;
use crate::storage::array_store::ArrayStoreReader;
use crate::storage::layout::{path_with_suffix, IndexLayout};

/// Read side of one immutable segment. Per-field files are opened on
/// first use and cached; a field the segment never saw resolves to `None`
/// rather than an error, since fields are discovered per batch.
pub struct SegmentReader {
    pub id: u32,
    pub deleted_docs: RoaringBitmap,
    layout: IndexLayout,

    dictionaries: Mutex<HashMap<String, Option<Arc<DictionaryReader>>>>,
    freqs_readers: Mutex<HashMap<String, Option<Arc<FreqsReader>>>>,
    length_readers: Mutex<HashMap<String, Option<Arc<FieldLengthReader>>>>,
    store_readers: Mutex<HashMap<String, Option<Arc<FieldStoreReader>>>>,
}

impl SegmentReader {
    pub fn new(layout: IndexLayout, id: u32, deleted_docs: RoaringBitmap) -> Self {
        SegmentReader {
            id,
            deleted_docs,
            layout,
            dictionaries: Mutex::new(HashMap::new()),
            freqs_readers: Mutex::new(HashMap::new()),
            length_readers: Mutex::new(HashMap::new()),
            store_readers: Mutex::new(HashMap::new()),
        }
    }

    pub fn dictionary(&self, field_name: &str) -> Result<Option<Arc<DictionaryReader>>> {
        let mut cache = self.dictionaries.lock();
        if let Some(cached) = cache.get(field_name) {
            return Ok(cached.clone());
        }

        let base = self.layout.segment_kv_base(self.id, field_name, "dictionary");
        let reader = if path_with_suffix(&base, ".data").exists() {
            Some(Arc::new(DictionaryReader::open(&base)?))
        } else {
            None
        };

        cache.insert(field_name.to_string(), reader.clone());
        Ok(reader)
    }

    pub fn freqs(&self, field_name: &str) -> Result<Option<Arc<FreqsReader>>> {
        let mut cache = self.freqs_readers.lock();
        if let Some(cached) = cache.get(field_name) {
            return Ok(cached.clone());
        }

        let path = self.layout.segment_file(self.id, field_name, "frequencies");
        let reader = if path.exists() {
            Some(Arc::new(FreqsReader::open(&path)?))
        } else {
            None
        };

        cache.insert(field_name.to_string(), reader.clone());
        Ok(reader)
    }

    pub fn field_lengths(&self, field_name: &str) -> Result<Option<Arc<FieldLengthReader>>> {
        let mut cache = self.length_readers.lock();
        if let Some(cached) = cache.get(field_name) {
            return Ok(cached.clone());
        }

        let path = self.layout.segment_file(self.id, field_name, "lengths");
        let reader = if path.exists() {
            let store = Arc::new(ArrayStoreReader::open(&path, 1)?);
            Some(Arc::new(FieldLengthReader::new(store)))
        } else {
            None
        };

        cache.insert(field_name.to_string(), reader.clone());
        Ok(reader)
    }

    pub fn store(&self, field_name: &str) -> Result<Option<Arc<FieldStoreReader>>> {
        let mut cache = self.store_readers.lock();
        if let Some(cached) = cache.get(field_name) {
            return Ok(cached.clone());
        }

        let base = self.layout.segment_kv_base(self.id, field_name, "store");
        let reader = if path_with_suffix(&base, ".data").exists() {
            Some(Arc::new(FieldStoreReader::open(&base)?))
        } else {
            None
        };

        cache.insert(field_name.to_string(), reader.clone());
        Ok(reader)
    }

    /// (doc_count, sum_term_freq) for one field; (0, 0) when the segment
    /// has no such field.
    pub fn field_stats(&self, field_name: &str) -> Result<(u32, u64)> {
        let path = self.layout.segment_file(self.id, field_name, "stats");
        if !path.exists() {
            return Ok((0, 0));
        }
        read_field_stats(&path)
    }
}
