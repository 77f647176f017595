//! Minimal unique column combinations.

use crate::search::{self, Lattice, Verdict};
use crate::{ColumnSet, MinimalSets, Relation, Result};
use lasso::Spur;
use log::{debug, info};
use smallvec::SmallVec;
use std::collections::HashSet;

/// Returns `true` if no two rows agree on every one of the given columns.
///
/// A row with a null in any of the columns is left out entirely: null never equals anything, not
/// even another null, so such a row can't collide with any other.
///
/// This is a single pass over the rows that stops at the first duplicate.
pub fn is_unique(relation: &Relation, columns: &ColumnSet) -> bool {
    let mut seen = HashSet::with_capacity(relation.len());
    for row in relation.rows() {
        let key: Option<SmallVec<[Spur; 4]>> =
            columns.iter().map(|column| row[usize::from(column)]).collect();
        if let Some(key) = key {
            if !seen.insert(key) {
                return false;
            }
        }
    }
    true
}

struct UniqueColumns<'a> {
    relation: &'a Relation,
    found: MinimalSets,
}

impl Lattice for UniqueColumns<'_> {
    fn width(&self) -> usize {
        self.relation.width()
    }

    fn seeds(&self) -> Vec<ColumnSet> {
        search::singletons(self.width())
    }

    fn evaluate(&mut self, candidate: &ColumnSet) -> Result<Verdict> {
        if self.found.covers(candidate) {
            return Ok(Verdict::Covered);
        }
        if is_unique(self.relation, candidate) {
            debug!("{}: unique {:?}", self.relation.name(), candidate);
            self.found.insert(candidate.clone());
            Ok(Verdict::Holds)
        } else {
            Ok(Verdict::Fails)
        }
    }
}

/// Finds every minimal set of columns whose combined values are distinct across all rows without
/// nulls in those columns.
///
/// ```
/// use dependency_miner::{ColumnSet, Dataset, MemorySource};
/// use dependency_miner::unique::minimal_uniques;
///
/// let source = MemorySource::new("r", &["a", "b"])
///     .row(&[Some("1"), Some("x")])
///     .row(&[Some("2"), Some("x")])
///     .row(&[Some("3"), Some("y")]);
/// let data = Dataset::load(&[&source]).unwrap();
///
/// let found = minimal_uniques(&data.relations()[0]).unwrap();
/// assert_eq!(found.iter().collect::<Vec<_>>(), vec![&ColumnSet::new(&[0])]);
/// ```
pub fn minimal_uniques(relation: &Relation) -> Result<MinimalSets> {
    let mut lattice = UniqueColumns {
        relation,
        found: MinimalSets::new(),
    };
    let visited = search::search(&mut lattice)?;
    info!(
        "{}: {} minimal unique column combinations after {} candidates",
        relation.name(),
        lattice.found.len(),
        visited
    );
    Ok(lattice.found)
}
