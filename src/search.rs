//! Breadth-first search for minimal column combinations.
//!
//! The lattice of column sets is exponentially large, so the search never materializes it.
//! Instead it keeps one queue of candidates, and each candidate generates its successors only by
//! appending a column greater than every column it already has. Every combination therefore has
//! exactly one parent (itself without its largest column), so no combination is ever queued twice,
//! whatever order the queue is drained in.
//!
//! What makes a candidate valid, and which candidates are already known to be redundant, is up to
//! the [`Lattice`] implementation.

use crate::{ColumnIndex, ColumnSet, Result};
use log::trace;
use std::collections::VecDeque;

/// What a [`Lattice`] concluded about one candidate.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Verdict {
    /// The candidate is a superset of a result already found, so it wasn't tested.
    Covered,
    /// The candidate satisfies the property being searched for.
    Holds,
    /// The candidate doesn't satisfy the property.
    Fails,
}

/// A search task over the lattice of column sets.
pub trait Lattice {
    /// The number of columns; candidates only ever contain indices below this.
    fn width(&self) -> usize;

    /// The candidates the search starts from.
    fn seeds(&self) -> Vec<ColumnSet>;

    /// Tests one candidate, recording it as a result if appropriate.
    ///
    /// Implementations should check the candidate against results found so far before running
    /// any expensive test, and report [`Verdict::Covered`] if it's redundant.
    fn evaluate(&mut self, candidate: &ColumnSet) -> Result<Verdict>;

    /// Decides whether the successors of a candidate are worth visiting.
    ///
    /// The default suits monotone properties: if a set holds then so does every superset, and if
    /// it's covered then so is every superset, so only failing candidates get expanded.
    fn expands(&self, _candidate: &ColumnSet, verdict: Verdict) -> bool {
        verdict == Verdict::Fails
    }

    /// The candidates that follow `candidate` in the lattice. The default appends each column
    /// larger than the candidate's largest column.
    fn successors(&self, candidate: &ColumnSet) -> Vec<ColumnSet> {
        candidate.extensions(self.width()).collect()
    }
}

/// Every single-column set for a relation of the given width.
pub fn singletons(width: usize) -> Vec<ColumnSet> {
    ColumnSet::default().extensions(width).collect()
}

/// Every two-column set for a relation of the given width.
pub fn pairs(width: usize) -> Vec<ColumnSet> {
    singletons(width)
        .iter()
        .flat_map(|single| single.extensions(width))
        .collect()
}

/// Drains the candidate queue of a [`Lattice`], starting from its seeds.
///
/// Candidates are visited in breadth-first order, so every set is visited after all of the
/// smaller sets that were queued. Returns the number of candidates visited.
///
/// Stopping between two candidates is always safe: no candidate's evaluation is left half-done.
pub fn search<L: Lattice + ?Sized>(lattice: &mut L) -> Result<usize> {
    let mut queue: VecDeque<ColumnSet> = lattice.seeds().into();
    let mut visited = 0;

    while let Some(candidate) = queue.pop_front() {
        visited += 1;
        let verdict = lattice.evaluate(&candidate)?;
        trace!("{:?}: {:?}", candidate, verdict);

        if lattice.expands(&candidate, verdict) {
            queue.extend(lattice.successors(&candidate));
        }
    }

    Ok(visited)
}

pub(crate) fn to_index(column: usize) -> ColumnIndex {
    debug_assert!(column <= usize::from(ColumnIndex::MAX));
    column as ColumnIndex
}
