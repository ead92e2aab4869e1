use std::sync::Arc;

use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::LocalDocId;
use crate::storage::array_store::ArrayStoreReader;

/// Field lengths are quantized to a byte id through this fixed table: the
/// id of a length is the largest entry not above it. The schedule is exact
/// through 63 tokens, then widens in strides of 4, 32 and 256, topping out
/// at 18 560. The table is part of the segment format; writer and reader
/// agree on it by construction.
pub const FIELD_LENGTH_TABLE_SIZE: usize = 256;

pub const FIELD_LENGTH_TABLE: [u64; FIELD_LENGTH_TABLE_SIZE] = build_field_length_table();

const fn build_field_length_table() -> [u64; FIELD_LENGTH_TABLE_SIZE] {
    let mut table = [0u64; FIELD_LENGTH_TABLE_SIZE];
    let mut id = 0usize;
    while id < FIELD_LENGTH_TABLE_SIZE {
        table[id] = if id < 64 {
            id as u64
        } else if id < 128 {
            64 + (id as u64 - 64) * 4
        } else if id < 192 {
            320 + (id as u64 - 128) * 32
        } else {
            2368 + (id as u64 - 192) * 256
        };
        id += 1;
    }
    table
}

pub fn field_length_to_id(length: u64) -> u8 {
    (FIELD_LENGTH_TABLE.partition_point(|&entry| entry <= length) - 1) as u8
}

/// Per-doc quantized field length of one (segment, field), one byte per
/// local doc id.
pub struct FieldLengthReader {
    store: Arc<ArrayStoreReader>,
    doc_count: u32,
}

impl FieldLengthReader {
    pub fn new(store: Arc<ArrayStoreReader>) -> Self {
        let doc_count = store.num_elements();
        FieldLengthReader { store, doc_count }
    }

    pub fn doc_count(&self) -> u32 {
        self.doc_count
    }

    /// An unknown doc id here means the segment is structurally corrupt.
    pub fn length_id(&self, doc_id: LocalDocId) -> Result<u8> {
        match self.store.get(doc_id.0) {
            Some(value) => Ok(value[0]),
            None => Err(Error::new(
                ErrorKind::NotFound,
                format!("document {} not found in field lengths", doc_id.0),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_is_strictly_increasing() {
        for id in 1..FIELD_LENGTH_TABLE_SIZE {
            assert!(FIELD_LENGTH_TABLE[id] > FIELD_LENGTH_TABLE[id - 1]);
        }
        assert_eq!(FIELD_LENGTH_TABLE[0], 0);
        assert!(FIELD_LENGTH_TABLE[255] > 4_000);
    }

    #[test]
    fn small_lengths_are_exact() {
        for length in 0u64..64 {
            let id = field_length_to_id(length);
            assert_eq!(FIELD_LENGTH_TABLE[id as usize], length);
        }
    }

    #[test]
    fn quantization_rounds_down() {
        for length in [64u64, 65, 100, 317, 1_000, 5_000, 1_000_000] {
            let id = field_length_to_id(length);
            assert!(FIELD_LENGTH_TABLE[id as usize] <= length);
            if (id as usize) < FIELD_LENGTH_TABLE_SIZE - 1 {
                assert!(FIELD_LENGTH_TABLE[id as usize + 1] > length);
            }
        }
        assert_eq!(field_length_to_id(u64::MAX), 255);
    }

    #[test]
    fn id_is_monotone_in_length() {
        let mut previous = 0u8;
        for length in 0u64..20_000 {
            let id = field_length_to_id(length);
            assert!(id >= previous);
            previous = id;
        }
    }
}
