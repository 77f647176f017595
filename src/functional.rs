//! Minimal functional dependencies.
//!
//! A set of columns `L` functionally determines a column `R` when any two rows that agree on `L`
//! also agree on `R`. In terms of stripped partitions, that's the case exactly when adding `R` to
//! `L` doesn't split any of `L`'s groups, which shows up as an unchanged
//! [key error](Partition::key_error).
//!
//! The search walks the lattice breadth-first starting from every pair of columns. Each candidate
//! combination `C` stands for the dependencies `C - {R} -> R`, one for each member `R`. Partitions
//! are computed bottom-up and cached, so by the time `C` is visited the partition of every smaller
//! combination it could need has already been built.

use crate::search::{self, Lattice, Verdict};
use crate::{ColumnIndex, ColumnSet, Error, MinimalSets, Partition, Relation, Result};
use log::{debug, info};
use std::collections::HashMap;

/// A functional dependency between columns of one relation, identified by local column index.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Dependency {
    /// The columns whose values determine the dependent column.
    pub determinant: ColumnSet,
    /// The column whose value is determined.
    pub dependent: ColumnIndex,
}

struct Dependencies<'a> {
    relation: &'a Relation,
    // Written once per combination; whichever pair of smaller partitions it's refined from, the
    // result is the same.
    partitions: HashMap<ColumnSet, Partition>,
    // Minimal determinants found so far, indexed by dependent column.
    found: Vec<MinimalSets>,
}

impl<'a> Dependencies<'a> {
    fn new(relation: &'a Relation) -> Self {
        let width = relation.width();
        let partitions = search::singletons(width)
            .into_iter()
            .map(|single| {
                let column = single.as_slice()[0];
                (single, Partition::for_column(relation.column(column)))
            })
            .collect();

        Dependencies {
            relation,
            partitions,
            found: vec![MinimalSets::new(); width],
        }
    }

    fn partition(&self, columns: &ColumnSet) -> Result<&Partition> {
        self.partitions
            .get(columns)
            .ok_or_else(|| Error::MissingPartition(columns.clone()))
    }

    /// Returns the key error of a combination, computing and caching its partition first if
    /// necessary. The partition is refined from the combination's parent in the lattice, which
    /// breadth-first order guarantees was visited earlier, and its largest column.
    fn key_error(&mut self, combination: &ColumnSet) -> Result<usize> {
        if let Some(partition) = self.partitions.get(combination) {
            return Ok(partition.key_error());
        }

        let last = match combination.last() {
            Some(last) => last,
            None => return Err(Error::MissingPartition(combination.clone())),
        };
        let parent = self.partition(&combination.without(last))?;
        let refined = parent.refine(self.partition(&ColumnSet::single(last))?);
        let key_error = refined.key_error();
        self.partitions.insert(combination.clone(), refined);
        Ok(key_error)
    }
}

impl Lattice for Dependencies<'_> {
    fn width(&self) -> usize {
        self.relation.width()
    }

    fn seeds(&self) -> Vec<ColumnSet> {
        search::pairs(self.width())
    }

    fn evaluate(&mut self, candidate: &ColumnSet) -> Result<Verdict> {
        // Supersets refine their partitions from this one, so it's needed even if every
        // dependency below turns out to be redundant.
        let combined = self.key_error(candidate)?;

        let mut verdict = Verdict::Covered;
        for dependent in candidate.iter() {
            let determinant = candidate.without(dependent);
            let found = &self.found[usize::from(dependent)];
            if found.covers(&determinant) {
                continue;
            }

            if self.partition(&determinant)?.key_error() == combined {
                debug!(
                    "{}: {:?} -> {}",
                    self.relation.name(),
                    determinant,
                    dependent
                );
                self.found[usize::from(dependent)].insert(determinant);
                if verdict == Verdict::Covered {
                    verdict = Verdict::Holds;
                }
            } else {
                verdict = Verdict::Fails;
            }
        }
        Ok(verdict)
    }

    // A combination stands for several dependencies at once, and one of them holding says nothing
    // about the dependencies its supersets stand for, so every combination gets expanded.
    fn expands(&self, _candidate: &ColumnSet, _verdict: Verdict) -> bool {
        true
    }
}

/// Finds every minimal functional dependency with a non-empty determinant that holds in the
/// relation.
///
/// Results are grouped by dependent column in ascending order, and within each group ordered from
/// smallest determinant to largest.
///
/// ```
/// use dependency_miner::{ColumnSet, Dataset, MemorySource};
/// use dependency_miner::functional::{minimal_dependencies, Dependency};
///
/// let source = MemorySource::new("r", &["a", "b", "c"])
///     .row(&[Some("1"), Some("1"), Some("1")])
///     .row(&[Some("1"), Some("1"), Some("2")])
///     .row(&[Some("2"), Some("2"), Some("1")]);
/// let data = Dataset::load(&[&source]).unwrap();
///
/// let found = minimal_dependencies(&data.relations()[0]).unwrap();
/// assert_eq!(found, vec![
///     Dependency { determinant: ColumnSet::new(&[1]), dependent: 0 },
///     Dependency { determinant: ColumnSet::new(&[0]), dependent: 1 },
/// ]);
/// ```
pub fn minimal_dependencies(relation: &Relation) -> Result<Vec<Dependency>> {
    let mut lattice = Dependencies::new(relation);
    let visited = search::search(&mut lattice)?;

    let mut dependencies = Vec::new();
    for (dependent, determinants) in lattice.found.into_iter().enumerate() {
        let dependent = search::to_index(dependent);
        dependencies.extend(determinants.into_iter().map(|determinant| Dependency {
            determinant,
            dependent,
        }));
    }

    info!(
        "{}: {} minimal functional dependencies after {} candidates, {} partitions",
        relation.name(),
        dependencies.len(),
        visited,
        lattice.partitions.len()
    );
    Ok(dependencies)
}
