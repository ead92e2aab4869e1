use log::debug;

use crate::core::error::Result;
use crate::core::types::to_global_doc_id;
use crate::query::ast::Node;
use crate::query::context::QueryContext;
use crate::query::execution::{generate_execution_context, FieldLengthNorms};
use crate::reader::index_reader::IndexReader;
use crate::search::collector::Collector;

/// Runs a query against every live segment, feeding the collector
/// (local doc id, score) hits mapped to global ids. Tombstoned docs are
/// dropped after scoring; the collector's lower bound is re-read before
/// every step so pruning tightens as the heap fills.
pub fn search(query: &Node, reader: &IndexReader, collector: &mut dyn Collector) -> Result<()> {
    let mut query_context = QueryContext::default();
    let root = query.compile_root(&mut query_context)?;

    let segments = reader.segment_readers();
    let execution = generate_execution_context(&query_context, segments)?;

    for (segment_index, segment) in segments.iter().enumerate() {
        let Some(mut iterator) = root.create_iterator(&execution, segment_index)? else {
            continue;
        };

        let mut length_norms = FieldLengthNorms::new(
            &execution.length_readers[segment_index],
            &execution.precomputed_norms,
        );

        let mut hits = 0u64;
        loop {
            let lower_bound = collector.lower_bound();
            let Some((local_doc_id, score)) = iterator.next(&mut length_norms, lower_bound)?
            else {
                break;
            };

            if score < lower_bound {
                continue;
            }

            if segment.deleted_docs.contains(local_doc_id.0) {
                continue;
            }

            collector.collect(to_global_doc_id(segment.id, local_doc_id), score);
            hits += 1;
        }

        debug!("segment {}: {} hits collected", segment.id, hits);
    }

    Ok(())
}
