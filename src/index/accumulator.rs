use crate::core::error::Result;
use crate::core::types::LocalDocId;
use crate::storage::layout::IndexLayout;

/// Event interface shared by the per-batch accumulators. The writer drives
/// every accumulator through the same sequence:
///
///   doc(0), field("title", ..), term(..), term(..), end_field(),
///   field("body", ..), term(..), end_field(), doc(1), ..., write()
pub trait SegmentComponentWriter {
    fn doc(&mut self, doc_id: LocalDocId);

    fn field(&mut self, name: &str, value: &[u8]);

    fn term(&mut self, term: &[u8]);

    fn end_field(&mut self);

    /// Flushes everything accumulated since construction into the files of
    /// one new segment.
    fn write(&mut self, layout: &IndexLayout, segment_id: u32) -> Result<()>;
}
