use std::collections::BTreeMap;

use roaring::RoaringBitmap;

use crate::core::error::{Error, ErrorKind, Result};
use crate::storage::kv_store::{KVStoreReader, KVStoreWriter};
use crate::storage::layout::IndexLayout;

/// Writes one deletion generation: a KV store keyed by segment id (u32 BE)
/// whose values are serialized bitmaps of tombstoned local doc ids. The
/// BTreeMap keeps segment keys ascending, as the KV store requires.
pub fn write_deleted(
    layout: &IndexLayout,
    generation: u32,
    deleted_by_segment: &BTreeMap<u32, RoaringBitmap>,
) -> Result<()> {
    let mut writer = KVStoreWriter::create(&layout.deleted_kv_base(generation))?;

    for (segment_id, bitmap) in deleted_by_segment {
        let mut buffer = Vec::with_capacity(bitmap.serialized_size());
        bitmap
            .serialize_into(&mut buffer)
            .map_err(|err| Error::new(ErrorKind::Internal, err.to_string()))?;
        writer.append(&segment_id.to_be_bytes(), &buffer)?;
    }

    writer.finish()
}

/// Reads the deletion generation referenced by a commit. A commit without
/// a generation behaves as a generation with no tombstones.
pub struct DeletedReader {
    store: Option<KVStoreReader>,
}

impl DeletedReader {
    pub fn open(layout: &IndexLayout, generation: Option<u32>) -> Result<Self> {
        let store = match generation {
            Some(generation) => Some(KVStoreReader::open(&layout.deleted_kv_base(generation))?),
            None => None,
        };
        Ok(DeletedReader { store })
    }

    pub fn deleted_docs_for_segment(&self, segment_id: u32) -> Result<Option<RoaringBitmap>> {
        let Some(store) = &self.store else {
            return Ok(None);
        };

        let Some(bytes) = store.get(&segment_id.to_be_bytes())? else {
            return Ok(None);
        };

        let bitmap = RoaringBitmap::deserialize_from(bytes)
            .map_err(|err| Error::new(ErrorKind::Format, err.to_string()))?;
        Ok(Some(bitmap))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn bitmap_round_trip() {
        let dir = TempDir::new().unwrap();
        let layout = IndexLayout::new(dir.path()).unwrap();

        let mut first = RoaringBitmap::new();
        first.insert(0);
        first.insert(7);
        first.insert(100_000);
        let mut second = RoaringBitmap::new();
        second.insert(3);

        let mut by_segment = BTreeMap::new();
        by_segment.insert(9u32, first.clone());
        by_segment.insert(4u32, second.clone());
        write_deleted(&layout, 0, &by_segment).unwrap();

        let reader = DeletedReader::open(&layout, Some(0)).unwrap();
        assert_eq!(reader.deleted_docs_for_segment(9).unwrap(), Some(first));
        assert_eq!(reader.deleted_docs_for_segment(4).unwrap(), Some(second));
        assert_eq!(reader.deleted_docs_for_segment(5).unwrap(), None);
    }

    #[test]
    fn absent_generation_has_no_tombstones() {
        let dir = TempDir::new().unwrap();
        let layout = IndexLayout::new(dir.path()).unwrap();
        let reader = DeletedReader::open(&layout, None).unwrap();
        assert_eq!(reader.deleted_docs_for_segment(1).unwrap(), None);
    }
}
