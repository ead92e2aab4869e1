use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::LocalDocId;
use crate::query::conjunction::ConjunctionIterator;
use crate::query::context::QueryContext;
use crate::query::disjunction::DisjunctionIterator;
use crate::query::execution::{ExecutionContext, FieldLengthNorms};
use crate::query::term_iterator::{ChildTermIterator, RootTermIterator};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchType {
    /// At least one SHOULD clause must match (disjunction).
    Should,
    /// Every MUST clause must match (conjunction).
    Must,
}

/// Query tree. A boolean node's clauses must all share one match type;
/// mixing SHOULD and MUST in a single node fails compilation.
#[derive(Debug, Clone)]
pub enum Node {
    Term(TermNode),
    Boolean(BooleanNode),
}

#[derive(Debug, Clone)]
pub struct TermNode {
    pub field: String,
    pub term: Vec<u8>,
}

impl TermNode {
    pub fn new(field: &str, term: impl Into<Vec<u8>>) -> Node {
        Node::Term(TermNode {
            field: field.to_string(),
            term: term.into(),
        })
    }
}

#[derive(Debug, Clone)]
pub struct BooleanNode {
    pub clauses: Vec<BooleanClause>,
}

#[derive(Debug, Clone)]
pub struct BooleanClause {
    pub match_type: MatchType,
    pub node: Node,
}

impl BooleanNode {
    pub fn new(clauses: Vec<BooleanClause>) -> Node {
        Node::Boolean(BooleanNode { clauses })
    }
}

impl Node {
    pub(crate) fn compile_root(&self, context: &mut QueryContext) -> Result<RootNode> {
        match self {
            Node::Term(term) => {
                let (field_index, term_index) = context.register_term(&term.field, &term.term);
                Ok(RootNode::Term(TermAddress {
                    field_index,
                    term_index,
                }))
            }
            Node::Boolean(boolean) => {
                if boolean.clauses.is_empty() {
                    return Err(Error::new(
                        ErrorKind::QueryCompile,
                        "boolean query has no clauses",
                    ));
                }

                // A single clause is just its child.
                if boolean.clauses.len() == 1 {
                    return boolean.clauses[0].node.compile_root(context);
                }

                let all_must = boolean
                    .clauses
                    .iter()
                    .all(|clause| clause.match_type == MatchType::Must);
                let all_should = boolean
                    .clauses
                    .iter()
                    .all(|clause| clause.match_type == MatchType::Should);

                if !all_must && !all_should {
                    return Err(Error::new(
                        ErrorKind::QueryCompile,
                        "clauses must be either all SHOULD or all MUST",
                    ));
                }

                let children = boolean
                    .clauses
                    .iter()
                    .map(|clause| clause.node.compile_child(context))
                    .collect::<Result<Vec<_>>>()?;

                if all_must {
                    Ok(RootNode::Conjunction(children))
                } else {
                    Ok(RootNode::Disjunction(children))
                }
            }
        }
    }

    fn compile_child(&self, context: &mut QueryContext) -> Result<TermAddress> {
        match self {
            Node::Term(term) => {
                let (field_index, term_index) = context.register_term(&term.field, &term.term);
                Ok(TermAddress {
                    field_index,
                    term_index,
                })
            }
            Node::Boolean(_) => Err(Error::new(
                ErrorKind::QueryCompile,
                "nested boolean clauses are not supported",
            )),
        }
    }
}

/// A term's slot in the query context, resolved per segment at iteration
/// time.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TermAddress {
    field_index: usize,
    term_index: usize,
}

impl TermAddress {
    fn create_child_iterator<'a>(
        &self,
        execution: &'a ExecutionContext,
        segment_index: usize,
    ) -> Result<Option<ChildTermIterator<'a>>> {
        let Some(term_info) =
            execution.term_infos[segment_index][self.field_index][self.term_index]
        else {
            return Ok(None);
        };

        let freqs_reader = execution.freqs_readers[segment_index][self.field_index]
            .as_ref()
            .ok_or_else(|| {
                Error::new(ErrorKind::Internal, "dictionary entry without frequencies")
            })?;

        Ok(Some(ChildTermIterator::new(
            self.field_index,
            freqs_reader.term_freqs_iterator(&term_info),
            execution.term_idfs[self.field_index][self.term_index],
            &execution.precomputed_norms[self.field_index],
        )))
    }
}

/// Compiled query shapes. Compilation is segment-independent; iterators
/// are built per segment.
#[derive(Debug)]
pub(crate) enum RootNode {
    Term(TermAddress),
    Conjunction(Vec<TermAddress>),
    Disjunction(Vec<TermAddress>),
}

impl RootNode {
    /// `None` means this query can produce nothing in this segment.
    pub(crate) fn create_iterator<'a>(
        &self,
        execution: &'a ExecutionContext,
        segment_index: usize,
    ) -> Result<Option<RootDocIterator<'a>>> {
        match self {
            RootNode::Term(address) => {
                let Some(term_info) =
                    execution.term_infos[segment_index][address.field_index][address.term_index]
                else {
                    return Ok(None);
                };

                let freqs_reader = execution.freqs_readers[segment_index][address.field_index]
                    .as_ref()
                    .ok_or_else(|| {
                        Error::new(ErrorKind::Internal, "dictionary entry without frequencies")
                    })?;

                Ok(Some(RootDocIterator::Term(RootTermIterator::new(
                    address.field_index,
                    freqs_reader.term_freqs_iterator(&term_info),
                    execution.term_idfs[address.field_index][address.term_index],
                    &execution.precomputed_norms[address.field_index],
                ))))
            }
            RootNode::Conjunction(addresses) => {
                let mut children = Vec::with_capacity(addresses.len());
                for address in addresses {
                    // A conjunction with an absent term matches nothing.
                    let Some(child) = address.create_child_iterator(execution, segment_index)?
                    else {
                        return Ok(None);
                    };
                    children.push(child);
                }
                Ok(Some(RootDocIterator::Conjunction(ConjunctionIterator::new(
                    children,
                )?)))
            }
            RootNode::Disjunction(addresses) => {
                let mut children = Vec::with_capacity(addresses.len());
                for address in addresses {
                    if let Some(child) = address.create_child_iterator(execution, segment_index)? {
                        children.push(child);
                    }
                }
                Ok(Some(RootDocIterator::Disjunction(DisjunctionIterator::new(
                    children,
                )?)))
            }
        }
    }
}

/// Per-segment scored doc iterator; pumps (doc id, score) pairs until
/// exhausted.
pub(crate) enum RootDocIterator<'a> {
    Term(RootTermIterator<'a>),
    Conjunction(ConjunctionIterator<'a>),
    Disjunction(DisjunctionIterator<'a>),
}

impl<'a> RootDocIterator<'a> {
    pub(crate) fn next(
        &mut self,
        length_norms: &mut FieldLengthNorms,
        lower_bound: f32,
    ) -> Result<Option<(LocalDocId, f32)>> {
        match self {
            RootDocIterator::Term(iterator) => iterator.next(length_norms, lower_bound),
            RootDocIterator::Conjunction(iterator) => iterator.next(length_norms, lower_bound),
            RootDocIterator::Disjunction(iterator) => iterator.next(length_norms, lower_bound),
        }
    }
}
