//! Stripped partitions, also known as position list indexes.
//!
//! A partition for a set of columns groups together the rows whose values agree on every one of
//! those columns. Two things are left out because they can never show that the columns fail to be
//! a key: groups with only one row, and rows with a null in any of the columns.

use lasso::Spur;
use std::collections::HashMap;

/// Equivalence classes of row positions, with singleton classes stripped out.
///
/// Partitions are kept in a canonical form (rows ascending within each group, groups ordered by
/// their first row) so that two partitions of the same rows compare equal however they were
/// computed.
#[derive(Clone, Debug, Default, Eq, Hash, PartialEq)]
pub struct Partition {
    groups: Vec<Vec<usize>>,
}

impl Partition {
    /// Builds the partition for a single column from its values, given in row order.
    ///
    /// ```
    /// use dependency_miner::{Dataset, MemorySource, Partition};
    ///
    /// let source = MemorySource::new("r", &["a"])
    ///     .row(&[Some("x")])
    ///     .row(&[Some("y")])
    ///     .row(&[Some("x")])
    ///     .row(&[None])
    ///     .row(&[None]);
    /// let data = Dataset::load(&[&source]).unwrap();
    ///
    /// let partition = Partition::for_column(data.relations()[0].column(0));
    /// assert_eq!(partition.groups().collect::<Vec<_>>(), vec![&[0, 2][..]]);
    /// assert_eq!(partition.key_error(), 1);
    /// ```
    pub fn for_column<I: IntoIterator<Item = Option<Spur>>>(values: I) -> Self {
        let mut classes: HashMap<Spur, Vec<usize>> = HashMap::new();
        for (row, value) in values.into_iter().enumerate() {
            if let Some(value) = value {
                classes.entry(value).or_insert_with(Vec::new).push(row);
            }
        }
        Partition::from_groups(classes.into_iter().map(|(_, rows)| rows))
    }

    fn from_groups<I: IntoIterator<Item = Vec<usize>>>(groups: I) -> Self {
        let mut groups: Vec<Vec<usize>> = groups.into_iter().filter(|g| g.len() > 1).collect();
        // Rows are pushed in ascending order by both constructors, so only the groups themselves
        // need sorting.
        debug_assert!(groups.iter().all(|g| g.windows(2).all(|w| w[0] < w[1])));
        groups.sort_unstable_by_key(|g| g[0]);
        groups.shrink_to_fit();
        Partition { groups }
    }

    /// Computes the partition for the union of the columns behind `self` and `other`: two rows
    /// share a group in the result exactly when they share a group in both inputs.
    ///
    /// ```
    /// use dependency_miner::{Dataset, MemorySource, Partition};
    ///
    /// let source = MemorySource::new("r", &["a", "b"])
    ///     .row(&[Some("1"), Some("x")])
    ///     .row(&[Some("1"), Some("x")])
    ///     .row(&[Some("1"), Some("y")])
    ///     .row(&[Some("2"), Some("y")]);
    /// let data = Dataset::load(&[&source]).unwrap();
    /// let relation = &data.relations()[0];
    ///
    /// let a = Partition::for_column(relation.column(0));
    /// let b = Partition::for_column(relation.column(1));
    /// let ab = a.refine(&b);
    /// assert_eq!(ab.groups().collect::<Vec<_>>(), vec![&[0, 1][..]]);
    /// assert_eq!(ab, b.refine(&a));
    /// ```
    pub fn refine(&self, other: &Partition) -> Partition {
        // Label every row that appears in `self` with the group it appears in. Rows missing from
        // the probe table were stripped from `self`, so they can't share a group with anything.
        let mut probe = HashMap::with_capacity(self.groups.iter().map(Vec::len).sum());
        for (id, group) in self.groups.iter().enumerate() {
            for &row in group.iter() {
                probe.insert(row, id);
            }
        }

        // Within each group of `other`, split rows apart by their group in `self`. Reuse the same
        // map for every group to avoid hammering the allocator.
        let mut refined = Vec::new();
        let mut split: HashMap<usize, Vec<usize>> = HashMap::new();
        for group in other.groups.iter() {
            for &row in group.iter() {
                if let Some(&id) = probe.get(&row) {
                    split.entry(id).or_insert_with(Vec::new).push(row);
                }
            }
            refined.extend(split.drain().map(|(_, rows)| rows));
        }

        Partition::from_groups(refined)
    }

    /// Returns the number of rows that would have to be removed for the columns to form a key:
    /// the sum over every group of its size less one.
    pub fn key_error(&self) -> usize {
        self.groups.iter().map(|g| g.len() - 1).sum()
    }

    /// Returns `true` if no two rows agree on the partitioned columns.
    pub fn is_key(&self) -> bool {
        self.groups.is_empty()
    }

    /// Returns an iterator over the groups, each an ascending list of row positions.
    pub fn groups(&self) -> impl ExactSizeIterator<Item = &[usize]> + '_ {
        self.groups.iter().map(|g| &g[..])
    }
}
