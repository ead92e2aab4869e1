use std::fs;
use std::io::Write;
use std::path::Path;

use crate::core::error::{Error, ErrorKind, Result};
use crate::storage::layout::create_file;

/// Per-field segment stats: 12 bytes of
/// `doc_count (u32 BE) ‖ sum_term_freq (u64 BE)`.
pub fn write_field_stats(path: &Path, doc_count: u32, sum_term_freq: u64) -> Result<()> {
    let mut buffer = [0u8; 12];
    buffer[0..4].copy_from_slice(&doc_count.to_be_bytes());
    buffer[4..12].copy_from_slice(&sum_term_freq.to_be_bytes());

    let mut file = create_file(path)?;
    file.write_all(&buffer)?;
    Ok(())
}

pub fn read_field_stats(path: &Path) -> Result<(u32, u64)> {
    let bytes = fs::read(path)?;
    if bytes.len() < 12 {
        return Err(Error::new(ErrorKind::Format, "truncated field stats file"));
    }

    let doc_count = u32::from_be_bytes(bytes[0..4].try_into().unwrap());
    let sum_term_freq = u64::from_be_bytes(bytes[4..12].try_into().unwrap());
    Ok((doc_count, sum_term_freq))
}
