#![warn(missing_docs)]
#![doc(test(no_crate_inject))]
#![doc(test(attr(deny(unused, future_incompatible))))]

//! This crate discovers structural constraints that hold over tabular data without being told
//! about them in advance:
//!
//! - minimal unique column combinations, found by a breadth-first walk over the lattice of column
//!   sets with a hash-based uniqueness test ([`unique`]);
//! - minimal functional dependencies, found by the same kind of walk but testing each candidate
//!   with stripped partitions, as described by Huhtala et al., "TANE: An Efficient Algorithm for
//!   Discovering Functional and Approximate Dependencies", 1999 ([`functional`]);
//! - unary inclusion dependencies across any number of relations, found with one synchronized
//!   pass over sorted value streams, as described by Bauckmann et al., "Efficiently Detecting
//!   Inclusion Dependencies", 2007 ([`inclusion`]).
//!
//! All three searches load their input through a [`RowSource`] and deliver results to a
//! [`ConstraintSink`]:
//!
//! ```
//! use dependency_miner::{discover_uniques, Constraint, MemorySource};
//!
//! let source = MemorySource::new("people", &["id", "city"])
//!     .row(&[Some("1"), Some("Oslo")])
//!     .row(&[Some("2"), Some("Oslo")]);
//!
//! let mut results: Vec<Constraint> = Vec::new();
//! discover_uniques(&source, &mut results).unwrap();
//! assert_eq!(results.len(), 1);
//! assert_eq!(results[0].to_string(), "people[id]");
//! ```

pub use sorted_iter;

pub mod constraint;
pub mod error;
pub mod functional;
pub mod inclusion;
pub mod partition;
pub mod search;
pub mod source;
pub mod unique;

pub use constraint::{
    discover_functional, discover_inclusions, discover_uniques, BoxError, ColumnRef, Constraint,
    ConstraintSink, FunctionalDependency, InclusionDependency, UniqueColumnCombination,
};
pub use error::{Error, Result};
pub use partition::Partition;
pub use source::{Column, Dataset, MemorySource, Relation, Row, RowSource, SourceOptions, TsvSource};

use smallvec::SmallVec;
use sorted_iter::assume::AssumeSortedByItemExt;
use sorted_iter::sorted_iterator::SortedByItem;
use sorted_iter::SortedIterator;
use std::cmp::Ordering;
use std::iter;
use std::mem::size_of;

/// Dense index of a column within a [`Relation`], or within a [`Dataset`] when several relations
/// are analyzed together.
pub type ColumnIndex = u16;

// SmallVec contains two `usize` fields which overlap with the inline vector, so column sets have
// minimum size if the inline array occupies the same number of bytes.
const INLINE_COLUMNS: usize = 2 * size_of::<usize>() / size_of::<ColumnIndex>();

/// A set of columns, kept in canonical ascending order without duplicates.
///
/// This implementation avoids heap allocations for combinations of up to a machine word's worth
/// of columns.
#[derive(Clone, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ColumnSet(SmallVec<[ColumnIndex; INLINE_COLUMNS]>);

impl ColumnSet {
    /// Creates a column set containing the specified columns.
    ///
    /// It's okay if the provided slice contains duplicates.
    pub fn new(ids: &[ColumnIndex]) -> Self {
        let mut v = SmallVec::from_slice(ids);
        v.sort_unstable();
        v.dedup();
        ColumnSet(v)
    }

    /// Creates a set containing exactly one column.
    pub fn single(id: ColumnIndex) -> Self {
        ColumnSet::new(std::slice::from_ref(&id))
    }

    /// The number of columns in the set.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if there are no columns in this set.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns an iterator over the columns in this set, in ascending order.
    ///
    /// ```
    /// use dependency_miner::ColumnSet;
    ///
    /// let abc = ColumnSet::new(&[2, 3, 1, 3]);
    /// let mut it = abc.iter();
    /// assert_eq!(it.next(), Some(1));
    /// assert_eq!(it.next(), Some(2));
    /// assert_eq!(it.next(), Some(3));
    /// assert_eq!(it.next(), None);
    /// ```
    pub fn iter(&self) -> impl Iterator<Item = ColumnIndex> + SortedByItem + Clone + '_ {
        self.0.iter().copied().assume_sorted_by_item()
    }

    /// The largest column in the set, if any.
    pub fn last(&self) -> Option<ColumnIndex> {
        self.0.last().copied()
    }

    /// Returns `true` if the given column is a member of this set.
    pub fn contains(&self, id: ColumnIndex) -> bool {
        self.0.binary_search(&id).is_ok()
    }

    /// Returns `true` if `other` contains every column that `self` does.
    ///
    /// ```
    /// use dependency_miner::ColumnSet;
    /// let nil = ColumnSet::new(&[]);
    /// let one = ColumnSet::new(&[1]);
    ///
    /// assert!(nil.is_subset(&one));
    /// assert!(nil.is_subset(&nil));
    /// assert!(one.is_subset(&one));
    /// assert!(!one.is_subset(&nil));
    /// ```
    pub fn is_subset(&self, other: &Self) -> bool {
        self.len() <= other.len() && self.iter().intersection(other.iter()).eq(self.iter())
    }

    /// Returns `true` if `self` contains every column that `other` does.
    pub fn is_superset(&self, other: &Self) -> bool {
        other.is_subset(self)
    }

    /// Returns a new set with the columns of both sets.
    pub fn union(&self, other: &Self) -> Self {
        ColumnSet(self.iter().union(other.iter()).collect())
    }

    /// Returns the set without the given column.
    ///
    /// ```
    /// use dependency_miner::ColumnSet;
    ///
    /// let abc = ColumnSet::new(&[0, 1, 2]);
    /// assert_eq!(abc.without(1), ColumnSet::new(&[0, 2]));
    /// assert_eq!(abc.without(7), abc);
    /// ```
    pub fn without(&self, id: ColumnIndex) -> Self {
        ColumnSet(self.0.iter().copied().filter(|&c| c != id).collect())
    }

    /// Returns an iterator over every set that is one column larger than this one, where the
    /// added column is strictly greater than every column already present and less than `width`.
    ///
    /// Starting from the empty set and repeatedly extending every result this way produces each
    /// non-empty subset of `0..width` exactly once, because every set has exactly one parent: itself
    /// without its largest column.
    ///
    /// ```
    /// use dependency_miner::ColumnSet;
    ///
    /// let ac = ColumnSet::new(&[0, 2]);
    /// let mut it = ac.extensions(4);
    /// assert_eq!(it.next(), Some(ColumnSet::new(&[0, 2, 3])));
    /// assert_eq!(it.next(), None);
    ///
    /// assert_eq!(ColumnSet::new(&[]).extensions(3).count(), 3);
    /// ```
    pub fn extensions(
        &self,
        width: usize,
    ) -> impl DoubleEndedIterator<Item = Self> + ExactSizeIterator + iter::FusedIterator + '_ {
        let start = self.last().map_or(0, |last| usize::from(last) + 1);
        (start..width.max(start)).map(move |added| {
            debug_assert!(added <= usize::from(ColumnIndex::MAX));
            let mut extended = ColumnSet(SmallVec::with_capacity(self.len() + 1));
            extended.0.extend_from_slice(&self.0);
            extended.0.push(added as ColumnIndex);
            extended
        })
    }

    pub(crate) fn as_slice(&self) -> &[ColumnIndex] {
        &self.0
    }
}

impl std::fmt::Debug for ColumnSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.0.iter()).finish()
    }
}

impl iter::FromIterator<ColumnIndex> for ColumnSet {
    /// Creates a column set containing the specified columns.
    ///
    /// It's okay if the provided iterator contains duplicates.
    fn from_iter<I: IntoIterator<Item = ColumnIndex>>(iter: I) -> Self {
        let mut v = SmallVec::from_iter(iter);
        v.sort_unstable();
        v.dedup();
        ColumnSet(v)
    }
}

/// A collection of [`ColumnSet`]s where no member is a subset of any other.
///
/// This is how searches record their results: once a set satisfies a monotone property, every
/// superset of it does too, so only the minimal sets are worth keeping.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct MinimalSets {
    sets: Vec<ColumnSet>,
}

impl MinimalSets {
    /// Creates an empty collection.
    pub fn new() -> Self {
        MinimalSets { sets: Vec::new() }
    }

    // Members are kept sorted in ascending order by size, so any member that could be a subset of
    // a given set comes before any member that couldn't. Ties are broken by ColumnSet's natural
    // order so that there's a canonical order and derived Eq/Hash just work.
    fn sort_by(a: &ColumnSet, b: &ColumnSet) -> Ordering {
        a.len().cmp(&b.len()).then_with(|| a.cmp(b))
    }

    /// Returns `true` if some member is a subset of `candidate`, which makes `candidate`
    /// redundant.
    pub fn covers(&self, candidate: &ColumnSet) -> bool {
        self.sets
            .iter()
            .take_while(|set| set.len() <= candidate.len())
            .any(|set| set.is_subset(candidate))
    }

    /// Adds a set unless it's covered by an existing member, and removes members which are
    /// supersets of the new one. Returns `true` if the set was added.
    ///
    /// ```
    /// use dependency_miner::{ColumnSet, MinimalSets};
    ///
    /// let ab = ColumnSet::new(&[1, 2]);
    /// let a = ColumnSet::new(&[1]);
    /// let b = ColumnSet::new(&[2]);
    ///
    /// let mut sets = MinimalSets::new();
    /// assert!(sets.insert(ab.clone()));
    /// assert!(sets.insert(a.clone()));
    /// assert!(!sets.insert(ab.clone()));
    /// assert!(sets.insert(b.clone()));
    ///
    /// let mut it = sets.iter();
    /// assert_eq!(it.next(), Some(&a));
    /// assert_eq!(it.next(), Some(&b));
    /// assert_eq!(it.next(), None);
    /// ```
    pub fn insert(&mut self, set: ColumnSet) -> bool {
        let len = set.len();
        let insert_at = match self
            .sets
            .binary_search_by(|probe| MinimalSets::sort_by(probe, &set))
        {
            Ok(_) => return false,
            Err(insert_at) => insert_at,
        };

        // Everything before the insertion point is no bigger than the new set, so that's the only
        // place a covering subset can be.
        if self.sets[..insert_at].iter().any(|s| s.is_subset(&set)) {
            return false;
        }

        // Only strictly bigger members can be supersets. Nothing before the insertion point is
        // strictly bigger, so the position found by binary search is still valid afterward.
        self.sets.retain(|s| s.len() <= len || !set.is_subset(s));
        self.sets.insert(insert_at, set);
        true
    }

    /// Returns an iterator over the members, smallest first.
    pub fn iter(
        &self,
    ) -> impl DoubleEndedIterator<Item = &ColumnSet> + ExactSizeIterator + iter::FusedIterator + '_
    {
        self.sets.iter()
    }

    /// The number of members.
    pub fn len(&self) -> usize {
        self.sets.len()
    }

    /// Returns `true` if there are no members.
    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }
}

impl IntoIterator for MinimalSets {
    type Item = ColumnSet;
    type IntoIter = std::vec::IntoIter<ColumnSet>;

    fn into_iter(self) -> Self::IntoIter {
        self.sets.into_iter()
    }
}

#[cfg(test)]
#[test]
fn column_set_size() {
    assert_eq!(size_of::<ColumnSet>(), size_of::<SmallVec<[(); 0]>>());
}
