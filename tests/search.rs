use lodestone::{
    search, BooleanClause, BooleanNode, Document, IndexReader, IndexWriter, MatchType, Node,
    TermNode, TopNCollector,
};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tempfile::TempDir;

fn u64_bytes(value: u64) -> Vec<u8> {
    value.to_be_bytes().to_vec()
}

fn doc(id: u64, body: &str, title: &str) -> Document {
    let mut document = Document::new();
    document.add_bytes("id", u64_bytes(id));
    document.add_text("body", body.as_bytes());
    document.add_text("title", title.as_bytes());
    document
}

/// Two batches, so two segments.
fn build_simple_index(dir: &TempDir) {
    let writer = IndexWriter::open(dir.path()).unwrap();

    writer
        .add_documents(&[
            doc(9, "This is a hello world. Business.", "Hello, world"),
            doc(
                3,
                "After years of struggling to stay afloat, a beloved local business... \
                 business world",
                "Local Business Closes its Doors",
            ),
            doc(
                89,
                "This is an apple. This is an orange. This is a car.",
                "This is",
            ),
        ])
        .unwrap();

    writer
        .add_documents(&[doc(34, "Roger that", "Ok, this is ok")])
        .unwrap();
}

fn should(field: &str, term: &str) -> BooleanClause {
    BooleanClause {
        match_type: MatchType::Should,
        node: TermNode::new(field, term.as_bytes()),
    }
}

fn must(field: &str, term: &str) -> BooleanClause {
    BooleanClause {
        match_type: MatchType::Must,
        node: TermNode::new(field, term.as_bytes()),
    }
}

fn search_ids(query: &Node, reader: &IndexReader, top_n: usize) -> Vec<u64> {
    let mut collector = TopNCollector::new(top_n);
    search(query, reader, &mut collector).unwrap();

    collector
        .into_sorted_docs()
        .into_iter()
        .map(|hit| {
            let value = reader.value("id", hit.doc_id).unwrap().unwrap();
            u64::from_be_bytes(value.as_slice().try_into().unwrap())
        })
        .collect()
}

#[test]
fn single_term_should_matches_one_doc() {
    let dir = TempDir::new().unwrap();
    build_simple_index(&dir);
    let reader = IndexReader::open(dir.path()).unwrap();

    let query = BooleanNode::new(vec![should("body", "hello")]);
    assert_eq!(search_ids(&query, &reader, 10), vec![9]);
}

#[test]
fn bare_term_node_as_query_root() {
    let dir = TempDir::new().unwrap();
    build_simple_index(&dir);
    let reader = IndexReader::open(dir.path()).unwrap();

    let query = TermNode::new("body", "hello".as_bytes());
    assert_eq!(search_ids(&query, &reader, 10), vec![9]);
}

#[test]
fn higher_term_frequency_ranks_first() {
    let dir = TempDir::new().unwrap();
    build_simple_index(&dir);
    let reader = IndexReader::open(dir.path()).unwrap();

    // "business" appears twice in doc 3 and once in doc 9.
    let query = BooleanNode::new(vec![should("body", "business")]);
    assert_eq!(search_ids(&query, &reader, 10), vec![3, 9]);
}

#[test]
fn shorter_field_ranks_first_at_equal_frequency() {
    let dir = TempDir::new().unwrap();
    build_simple_index(&dir);
    let reader = IndexReader::open(dir.path()).unwrap();

    let query = BooleanNode::new(vec![should("title", "is")]);
    assert_eq!(search_ids(&query, &reader, 10), vec![89, 34]);
}

#[test]
fn cross_field_disjunction_ranks_double_match_first() {
    let dir = TempDir::new().unwrap();
    build_simple_index(&dir);
    let reader = IndexReader::open(dir.path()).unwrap();

    // Doc 89 matches "is" in both fields and outranks single-field hits.
    let query = BooleanNode::new(vec![should("title", "is"), should("body", "is")]);
    assert_eq!(search_ids(&query, &reader, 10), vec![89, 9, 34]);
}

#[test]
fn conjunction_requires_all_terms() {
    let dir = TempDir::new().unwrap();
    build_simple_index(&dir);
    let reader = IndexReader::open(dir.path()).unwrap();

    let query = BooleanNode::new(vec![must("title", "is"), must("body", "that")]);
    assert_eq!(search_ids(&query, &reader, 10), vec![34]);
}

#[test]
fn conjunction_with_absent_term_matches_nothing() {
    let dir = TempDir::new().unwrap();
    build_simple_index(&dir);
    let reader = IndexReader::open(dir.path()).unwrap();

    let query = BooleanNode::new(vec![must("title", "is"), must("body", "unobtainium")]);
    assert_eq!(search_ids(&query, &reader, 10), Vec::<u64>::new());
}

#[test]
fn absent_term_yields_empty_results() {
    let dir = TempDir::new().unwrap();
    build_simple_index(&dir);
    let reader = IndexReader::open(dir.path()).unwrap();

    let query = BooleanNode::new(vec![should("body", "unobtainium")]);
    assert_eq!(search_ids(&query, &reader, 10), Vec::<u64>::new());
}

#[test]
fn unknown_field_yields_empty_results() {
    let dir = TempDir::new().unwrap();
    build_simple_index(&dir);
    let reader = IndexReader::open(dir.path()).unwrap();

    let query = BooleanNode::new(vec![should("subtitle", "is")]);
    assert_eq!(search_ids(&query, &reader, 10), Vec::<u64>::new());
}

#[test]
fn delete_then_search_drops_the_tombstoned_doc() {
    let dir = TempDir::new().unwrap();
    build_simple_index(&dir);

    let writer = IndexWriter::open(dir.path()).unwrap();
    writer.delete_documents("id", &[u64_bytes(89)]).unwrap();

    let reader = IndexReader::open(dir.path()).unwrap();
    let query = BooleanNode::new(vec![should("title", "is")]);
    assert_eq!(search_ids(&query, &reader, 10), vec![34]);
}

#[test]
fn deletion_is_monotone_across_generations() {
    let dir = TempDir::new().unwrap();
    build_simple_index(&dir);

    let writer = IndexWriter::open(dir.path()).unwrap();
    // First generation tombstones a doc in the first segment, the second
    // one a doc in the second segment; both must stay deleted.
    writer.delete_documents("id", &[u64_bytes(9)]).unwrap();
    writer.delete_documents("id", &[u64_bytes(34)]).unwrap();

    let reader = IndexReader::open(dir.path()).unwrap();
    let query = BooleanNode::new(vec![should("title", "is"), should("body", "is")]);
    assert_eq!(search_ids(&query, &reader, 10), vec![89]);
}

#[test]
fn delete_of_nonexistent_value_is_a_noop() {
    let dir = TempDir::new().unwrap();
    build_simple_index(&dir);

    let writer = IndexWriter::open(dir.path()).unwrap();
    writer.delete_documents("id", &[u64_bytes(12345)]).unwrap();

    // No deletion generation was written.
    assert!(!dir.path().join("deleted.0.data").exists());

    let reader = IndexReader::open(dir.path()).unwrap();
    let query = BooleanNode::new(vec![should("title", "is")]);
    assert_eq!(search_ids(&query, &reader, 10), vec![89, 34]);
}

#[test]
fn empty_batch_writes_no_segment() {
    let dir = TempDir::new().unwrap();
    let writer = IndexWriter::open(dir.path()).unwrap();
    writer.add_documents(&[]).unwrap();

    let reader = IndexReader::open(dir.path()).unwrap();
    assert!(reader.segment_readers().is_empty());
}

#[test]
fn reader_is_a_snapshot_of_open_time() {
    let dir = TempDir::new().unwrap();
    build_simple_index(&dir);

    let before = IndexReader::open(dir.path()).unwrap();

    let writer = IndexWriter::open(dir.path()).unwrap();
    writer
        .add_documents(&[doc(50, "hello again", "Untitled")])
        .unwrap();

    let query = BooleanNode::new(vec![should("body", "hello")]);
    assert_eq!(search_ids(&query, &before, 10), vec![9]);

    let after = IndexReader::open(dir.path()).unwrap();
    let mut ids = search_ids(&query, &after, 10);
    ids.sort_unstable();
    assert_eq!(ids, vec![9, 50]);
}

#[test]
fn stored_values_round_trip_exactly() {
    let dir = TempDir::new().unwrap();
    let writer = IndexWriter::open(dir.path()).unwrap();

    let mut document = Document::new();
    document.add_bytes("id", u64_bytes(1));
    document.add_bytes("payload", vec![0u8, 255, 1, 128, 7]);
    writer.add_documents(&[document]).unwrap();

    let reader = IndexReader::open(dir.path()).unwrap();
    let hits = reader.search_by_exact_values("id", &[u64_bytes(1)]).unwrap();
    assert_eq!(hits.len(), 1);

    let payload = reader.value("payload", hits[0]).unwrap().unwrap();
    assert_eq!(payload, vec![0u8, 255, 1, 128, 7]);
    assert_eq!(reader.value("missing", hits[0]).unwrap(), None);
}

#[test]
fn value_of_foreign_doc_id_is_none() {
    let dir = TempDir::new().unwrap();
    build_simple_index(&dir);
    let reader = IndexReader::open(dir.path()).unwrap();
    // A global id whose segment is not live.
    assert_eq!(reader.value("id", u64::MAX).unwrap(), None);
}

/// Top-N retrieval with pruning must return exactly the best-scoring docs
/// an exhaustive (never-pruned) run finds.
#[test]
fn pruned_top_n_equals_exhaustive_top_n() {
    let vocabulary = [
        "the", "quick", "brown", "fox", "jumps", "over", "lazy", "dog", "and", "cat", "runs",
        "fast", "through", "green", "fields", "under", "bright", "skies", "every", "morning",
    ];

    let dir = TempDir::new().unwrap();
    let writer = IndexWriter::open(dir.path()).unwrap();
    let mut rng = StdRng::seed_from_u64(7);

    let mut next_id = 0u64;
    for _ in 0..3 {
        let mut batch = Vec::new();
        for _ in 0..100 {
            let length = rng.gen_range(2..30);
            let body = (0..length)
                .map(|_| vocabulary[rng.gen_range(0..vocabulary.len())])
                .collect::<Vec<_>>()
                .join(" ");

            let mut document = Document::new();
            document.add_bytes("id", u64_bytes(next_id));
            document.add_text("body", body.as_bytes());
            batch.push(document);
            next_id += 1;
        }
        writer.add_documents(&batch).unwrap();
    }

    let reader = IndexReader::open(dir.path()).unwrap();

    for terms in [
        vec!["the"],
        vec!["quick", "lazy"],
        vec!["the", "fox", "morning"],
        vec!["green", "skies", "dog", "runs"],
    ] {
        let query = BooleanNode::new(
            terms
                .iter()
                .map(|&term| should("body", term))
                .collect::<Vec<_>>(),
        );

        // A heap that never fills keeps the lower bound at zero, so this
        // run scores every matching doc.
        let mut exhaustive = TopNCollector::new(10_000);
        search(&query, &reader, &mut exhaustive).unwrap();
        let reference = exhaustive.into_sorted_docs();

        let mut pruned = TopNCollector::new(5);
        search(&query, &reader, &mut pruned).unwrap();
        let top = pruned.into_sorted_docs();

        assert_eq!(top.len(), reference.len().min(5));
        for (pruned_hit, reference_hit) in top.iter().zip(reference.iter()) {
            assert_eq!(pruned_hit.score, reference_hit.score);
        }
    }
}

#[test]
fn conjunction_agrees_with_manual_intersection() {
    let dir = TempDir::new().unwrap();
    let writer = IndexWriter::open(dir.path()).unwrap();

    writer
        .add_documents(&[
            doc(1, "alpha beta", "x"),
            doc(2, "alpha", "x"),
            doc(3, "beta alpha beta", "x"),
        ])
        .unwrap();
    writer
        .add_documents(&[doc(4, "beta", "x"), doc(5, "alpha beta gamma", "x")])
        .unwrap();

    let reader = IndexReader::open(dir.path()).unwrap();
    let query = BooleanNode::new(vec![must("body", "alpha"), must("body", "beta")]);
    let mut ids = search_ids(&query, &reader, 10);
    ids.sort_unstable();
    assert_eq!(ids, vec![1, 3, 5]);
}
