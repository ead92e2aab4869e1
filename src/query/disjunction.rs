use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::LocalDocId;
use crate::query::execution::FieldLengthNorms;
use crate::query::term_iterator::ChildTermIterator;

/// Block-max WAND over the child term iterators.
///
/// Reference: Shuai Ding and Torsten Suel. 2011. Faster top-k document
/// retrieval using block-max indexes. SIGIR '11.
pub struct DisjunctionIterator<'a> {
    children: Vec<ChildTermIterator<'a>>,
}

impl<'a> DisjunctionIterator<'a> {
    pub fn new(mut children: Vec<ChildTermIterator<'a>>) -> Result<Self> {
        for child in &mut children {
            child.next_shallow(LocalDocId(0))?;
        }
        Ok(DisjunctionIterator { children })
    }

    pub fn next(
        &mut self,
        length_norms: &mut FieldLengthNorms,
        lower_bound: f32,
    ) -> Result<Option<(LocalDocId, f32)>> {
        loop {
            if self.children.is_empty() {
                return Ok(None);
            }

            self.children.sort_by_key(|child| child.doc_id());

            // Pivot: the shortest prefix whose cumulative best-case score
            // clears the threshold. No such prefix means nothing left can
            // enter the top N.
            let mut cumulative = 0.0f32;
            let mut pivot = None;
            for (index, child) in self.children.iter().enumerate() {
                cumulative += child.global_upper_bound();
                if cumulative > lower_bound {
                    pivot = Some(index);
                    break;
                }
            }
            let Some(mut pivot) = pivot else {
                return Ok(None);
            };

            let pivot_doc = self.children[pivot].doc_id();

            // Move every earlier child's block window up to the pivot doc.
            let mut index = 0;
            while index < pivot {
                if self.children[index].next_shallow(pivot_doc)? {
                    index += 1;
                } else {
                    self.children.remove(index);
                    pivot -= 1;
                }
            }

            // Refine with the per-block bounds of the pivot prefix. A
            // child tied with the pivot just after it would contribute to
            // the pivot doc without being covered by this sum, so the
            // skip below only applies when there is no such tie.
            let block_upper_bound: f32 = self.children[..=pivot]
                .iter()
                .map(|child| child.block_upper_bound())
                .sum();
            let tied_after_pivot = pivot + 1 < self.children.len()
                && self.children[pivot + 1].doc_id() == pivot_doc;

            if block_upper_bound <= lower_bound && !tied_after_pivot {
                // No doc up to the earliest block boundary (and before
                // the next child's doc) can clear the threshold; jump the
                // strongest covered child past that point.
                let mut boundary = self.children[..=pivot]
                    .iter()
                    .map(|child| child.block_max_doc_id().0)
                    .min()
                    .unwrap_or(0);
                if pivot + 1 < self.children.len() {
                    boundary = boundary.min(self.children[pivot + 1].doc_id().0 - 1);
                }

                let covered = self.children[..=pivot].iter().enumerate();
                let Some(strongest) = Self::highest_idf(covered) else {
                    continue;
                };
                if !self.children[strongest].next(LocalDocId(boundary.saturating_add(1)))? {
                    self.children.swap_remove(strongest);
                }
                continue;
            }

            if self.children[0].doc_id() != pivot_doc {
                // Not everything before the pivot is aligned yet; advance
                // the strongest child still sitting below the pivot doc.
                // Children whose block move already pushed them beyond it
                // are progress on their own.
                let behind = self.children[..pivot]
                    .iter()
                    .enumerate()
                    .filter(|(_, child)| child.doc_id() < pivot_doc);
                let Some(strongest) = Self::highest_idf(behind) else {
                    continue;
                };
                if !self.children[strongest].next(pivot_doc)? {
                    self.children.swap_remove(strongest);
                }
                continue;
            }

            // The pivot doc is a candidate: score every child that holds
            // it, then advance those children past it.
            length_norms.set_doc(pivot_doc);
            let mut score = 0.0f32;
            let mut index = 0;
            while index < self.children.len() {
                if !self.children[index].next(pivot_doc)? {
                    return Err(Error::new(
                        ErrorKind::Internal,
                        "disjunction child exhausted before its pivot",
                    ));
                }

                if self.children[index].doc_id() == pivot_doc {
                    score += self.children[index].score(length_norms)?;
                    if !self.children[index]
                        .next(LocalDocId(pivot_doc.0.saturating_add(1)))?
                    {
                        // Swap-remove is enough; the next round re-sorts.
                        self.children.swap_remove(index);
                        continue;
                    }
                }

                index += 1;
            }

            return Ok(Some((pivot_doc, score)));
        }
    }

    fn highest_idf<'b, 'c: 'b>(
        children: impl Iterator<Item = (usize, &'b ChildTermIterator<'c>)>,
    ) -> Option<usize> {
        let mut best = None;
        let mut best_idf = f32::MIN;
        for (index, child) in children {
            if child.idf() > best_idf {
                best_idf = child.idf();
                best = Some(index);
            }
        }
        best
    }
}
