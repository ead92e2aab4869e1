pub mod core;
pub mod mmap;
pub mod compression;
pub mod analysis;
pub mod storage;
pub mod index;
pub mod scoring;
pub mod query;
pub mod search;
pub mod writer;
pub mod reader;

pub use crate::core::error::{Error, ErrorKind, Result};
pub use crate::core::types::{
    local_doc_id_of, segment_id_of, to_global_doc_id, Document, Field, FieldType, GlobalDocId,
    LocalDocId,
};
pub use crate::query::ast::{BooleanClause, BooleanNode, MatchType, Node, TermNode};
pub use crate::reader::index_reader::IndexReader;
pub use crate::search::collector::{Collector, DocScore, TopNCollector};
pub use crate::search::executor::search;
pub use crate::writer::index_writer::IndexWriter;

/*
┌──────────────────────────────────────────────────────────────────────────┐
│                            STRUCT ARCHITECTURE                            │
└──────────────────────────────────────────────────────────────────────────┘

┌──────────────────────────────── WRITE PATH ──────────────────────────────┐
│                                                                           │
│  IndexWriter ──drives──> InvertedIndexAccumulator ──flush──> per field:  │
│      │                       │                       DictionaryWriter    │
│      │                       │                       FreqsWriter         │
│      │                       │                       ArrayStoreWriter    │
│      │                       │                       field stats         │
│      │                   StoreAccumulator ──flush──> KVStoreWriter       │
│      │                                                                   │
│      └──publishes──> Commit (.commit → commit, atomic rename)            │
│                                                                           │
│  delete_documents ──> SearchByExactValues ──> deleted.<gen> (roaring)    │
│                                                                           │
└───────────────────────────────────────────────────────────────────────────┘

┌──────────────────────────────── READ PATH ───────────────────────────────┐
│                                                                           │
│  IndexReader ──snapshot of──> Commit                                     │
│      │                                                                   │
│      └──owns──> SegmentReader (per live segment, lazy per-field caches)  │
│                     │── DictionaryReader (term → TermInfo, mmap+bsearch) │
│                     │── FreqsReader (posting blocks, mmap)               │
│                     │── FieldLengthReader (1 byte per doc, mmap)         │
│                     └── FieldStoreReader (doc id → raw value)            │
│                                                                           │
│  search(Node) ──compile──> RootNode ──per segment──> RootDocIterator     │
│      │                                   │── RootTermIterator            │
│      │                                   │── ConjunctionIterator         │
│      │                                   └── DisjunctionIterator (WAND)  │
│      │                                         └── ChildTermIterator     │
│      │                                               └── TermFreqsIter.  │
│      └──feeds──> TopNCollector (f32 min-heap, lower bound → pruning)     │
│                                                                           │
└───────────────────────────────────────────────────────────────────────────┘
*/
