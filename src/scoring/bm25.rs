use crate::index::field_length::{FIELD_LENGTH_TABLE, FIELD_LENGTH_TABLE_SIZE};

pub const BM25_K1: f32 = 1.2;
pub const BM25_B: f32 = 0.75;

/// Inverse document frequency over the whole live index: `doc_count` and
/// `doc_freq` are summed across segments before calling this.
pub fn idf(doc_count: u64, doc_freq: u64) -> f32 {
    let doc_count = doc_count as f32;
    let doc_freq = doc_freq as f32;
    (1.0 + (doc_count - doc_freq + 0.5) / (doc_freq + 0.5)).ln()
}

/// One norm per quantized length id, so scoring is a table lookup.
pub fn precompute_length_norms(average_field_length: f32) -> Vec<f32> {
    let mut norms = Vec::with_capacity(FIELD_LENGTH_TABLE_SIZE);
    for &length in FIELD_LENGTH_TABLE.iter() {
        norms.push(BM25_K1 * (1.0 - BM25_B + BM25_B * (length as f32 / average_field_length)));
    }
    norms
}

/// The shared term-frequency factor of the score and of its upper bounds.
pub fn bm25_score(term_idf: f32, term_freq: f32, length_norm: f32) -> f32 {
    term_idf * (term_freq * (BM25_K1 + 1.0)) / (term_freq + length_norm)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idf_decreases_with_doc_freq() {
        let rare = idf(1000, 1);
        let common = idf(1000, 900);
        assert!(rare > common);
        assert!(common > 0.0);
    }

    #[test]
    fn norms_grow_with_length() {
        let norms = precompute_length_norms(10.0);
        assert_eq!(norms.len(), FIELD_LENGTH_TABLE_SIZE);
        assert!(norms[0] < norms[50]);
        assert!(norms[50] < norms[255]);
    }

    #[test]
    fn score_saturates_in_term_freq() {
        let norm = 1.0;
        let one = bm25_score(1.0, 1.0, norm);
        let five = bm25_score(1.0, 5.0, norm);
        let fifty = bm25_score(1.0, 50.0, norm);
        assert!(one < five && five < fifty);
        // Bounded by idf * (k1 + 1).
        assert!(fifty < BM25_K1 + 1.0);
    }

    #[test]
    fn longer_docs_score_lower_at_equal_tf() {
        let norms = precompute_length_norms(8.0);
        let short = bm25_score(1.0, 2.0, norms[4]);
        let long = bm25_score(1.0, 2.0, norms[40]);
        assert!(short > long);
    }
}
