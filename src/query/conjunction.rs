use crate::core::error::Result;
use crate::core::types::LocalDocId;
use crate::query::execution::FieldLengthNorms;
use crate::query::term_iterator::ChildTermIterator;

/// Leapfrog intersection: every child must land on the same doc id. The
/// moment any child is exhausted no further doc can match all clauses, so
/// the whole iterator is exhausted.
pub struct ConjunctionIterator<'a> {
    children: Vec<ChildTermIterator<'a>>,
    exhausted: bool,
}

impl<'a> ConjunctionIterator<'a> {
    pub fn new(mut children: Vec<ChildTermIterator<'a>>) -> Result<Self> {
        let mut exhausted = children.is_empty();
        for child in &mut children {
            if !child.next_shallow(LocalDocId(0))? {
                exhausted = true;
            }
        }

        Ok(ConjunctionIterator {
            children,
            exhausted,
        })
    }

    pub fn next(
        &mut self,
        length_norms: &mut FieldLengthNorms,
        _lower_bound: f32,
    ) -> Result<Option<(LocalDocId, f32)>> {
        loop {
            if self.exhausted {
                return Ok(None);
            }

            // Leapfrog towards the child that is furthest ahead.
            self.children.sort_by(|a, b| b.doc_id().cmp(&a.doc_id()));
            let target = self.children[0].doc_id();

            let mut aligned = true;
            for child in &mut self.children {
                if !child.next(target)? {
                    self.exhausted = true;
                    return Ok(None);
                }
                if child.doc_id() != target {
                    aligned = false;
                    break;
                }
            }

            if !aligned {
                continue;
            }

            length_norms.set_doc(target);
            let mut score = 0.0;
            for child in &mut self.children {
                score += child.score(length_norms)?;
                if !child.next(LocalDocId(target.0.saturating_add(1)))? {
                    self.exhausted = true;
                }
            }

            return Ok(Some((target, score)));
        }
    }
}
