use crate::core::types::GlobalDocId;
use crate::search::heap::MinHeap;

/// Sink for scored hits. `lower_bound` is read back by the iterators on
/// every step; a tighter bound prunes more blocks.
pub trait Collector {
    fn collect(&mut self, doc_id: GlobalDocId, score: f32);

    fn lower_bound(&self) -> f32;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DocScore {
    pub doc_id: GlobalDocId,
    pub score: f32,
}

/// Keeps the N best hits in a score-keyed min-heap: the root is always
/// the weakest kept hit, which doubles as the pruning threshold.
pub struct TopNCollector {
    top_n: usize,
    heap: MinHeap<GlobalDocId>,
}

impl TopNCollector {
    pub fn new(top_n: usize) -> Self {
        TopNCollector {
            top_n,
            heap: MinHeap::new(),
        }
    }

    /// Drains into descending score order.
    pub fn into_sorted_docs(mut self) -> Vec<DocScore> {
        let mut results = Vec::with_capacity(self.heap.len());
        while let Some((score, doc_id)) = self.heap.pop() {
            results.push(DocScore { doc_id, score });
        }
        results.reverse();
        results
    }
}

impl Collector for TopNCollector {
    fn collect(&mut self, doc_id: GlobalDocId, score: f32) {
        if self.top_n == 0 {
            return;
        }

        if self.heap.len() < self.top_n {
            self.heap.push(score, doc_id);
            return;
        }

        if let Some(min) = self.heap.min_key() {
            if score > min {
                self.heap.replace_min(score, doc_id);
            }
        }
    }

    fn lower_bound(&self) -> f32 {
        if self.heap.len() < self.top_n {
            return 0.0;
        }
        self.heap.min_key().unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_only_the_best_n() {
        let mut collector = TopNCollector::new(2);
        collector.collect(1, 0.5);
        collector.collect(2, 2.0);
        collector.collect(3, 1.0);
        collector.collect(4, 0.1);

        let results = collector.into_sorted_docs();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].doc_id, 2);
        assert_eq!(results[1].doc_id, 3);
        assert!(results[0].score >= results[1].score);
    }

    #[test]
    fn lower_bound_is_zero_until_full() {
        let mut collector = TopNCollector::new(2);
        assert_eq!(collector.lower_bound(), 0.0);
        collector.collect(1, 5.0);
        assert_eq!(collector.lower_bound(), 0.0);
        collector.collect(2, 3.0);
        assert_eq!(collector.lower_bound(), 3.0);
        collector.collect(3, 4.0);
        assert_eq!(collector.lower_bound(), 4.0);
    }

    #[test]
    fn fewer_hits_than_capacity() {
        let mut collector = TopNCollector::new(10);
        collector.collect(9, 1.5);
        let results = collector.into_sorted_docs();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].doc_id, 9);
    }
}
