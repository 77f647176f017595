//! Unary inclusion dependencies.
//!
//! Column `c` is included in column `r` when every value that appears in `c` also appears in `r`.
//! Rather than comparing every pair of columns, every column's distinct values are sorted and all
//! of the resulting streams are consumed together, smallest value first. Each time a value comes
//! up, the columns that have it can only still be included in other columns that have it too, so
//! each column's set of possible referenced columns shrinks until only the true ones are left.

use crate::search::to_index;
use crate::{ColumnIndex, ColumnSet, Dataset};
use lasso::Spur;
use log::{debug, info};
use sorted_iter::SortedIterator;
use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashMap, HashSet};

/// An inclusion dependency between two columns, identified by global column index.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Inclusion {
    /// The column whose values are all found in the referenced column.
    pub dependent: ColumnIndex,
    /// The column containing every value of the dependent column.
    pub referenced: ColumnIndex,
}

/// The order values are merged in: case-insensitive, with ties between values that differ only in
/// case broken by ordinary string order so that distinct values never compare equal.
///
/// ```
/// use dependency_miner::inclusion::value_order;
/// use std::cmp::Ordering;
///
/// assert_eq!(value_order("apple", "Banana"), Ordering::Less);
/// assert_eq!(value_order("B", "b"), Ordering::Less);
/// assert_eq!(value_order("b", "b"), Ordering::Equal);
/// ```
pub fn value_order(a: &str, b: &str) -> Ordering {
    let folded = |s: &str| s.chars().flat_map(char::to_lowercase).collect::<Vec<_>>();
    folded(a).cmp(&folded(b)).then_with(|| a.cmp(b))
}

/// Replaces every distinct value with its rank under [`value_order`], returning each column's
/// distinct non-null values as ascending ranks.
fn ranked_columns(data: &Dataset) -> Vec<Vec<u32>> {
    let distinct: Vec<HashSet<Spur>> = (0..data.columns().len())
        .map(|column| data.column_values(to_index(column)).flatten().collect())
        .collect();

    let mut values: Vec<Spur> = distinct
        .iter()
        .flatten()
        .copied()
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    values.sort_unstable_by(|a, b| value_order(data.resolve(a), data.resolve(b)));
    let ranks: HashMap<Spur, u32> = values
        .into_iter()
        .enumerate()
        .map(|(rank, value)| (value, rank as u32))
        .collect();

    distinct
        .into_iter()
        .map(|values| {
            let mut stream: Vec<u32> = values.iter().map(|value| ranks[value]).collect();
            stream.sort_unstable();
            stream
        })
        .collect()
}

/// Finds every unary inclusion dependency between distinct columns of the dataset, across all of
/// its relations.
///
/// A column with no non-null values is trivially included in every other column. Results are
/// ordered by dependent column, then by referenced column.
///
/// ```
/// use dependency_miner::{Dataset, MemorySource};
/// use dependency_miner::inclusion::{unary_inclusions, Inclusion};
///
/// let x = MemorySource::new("x", &["a"])
///     .row(&[Some("1")])
///     .row(&[Some("2")]);
/// let y = MemorySource::new("y", &["b"])
///     .row(&[Some("2")])
///     .row(&[Some("1")])
///     .row(&[Some("3")]);
/// let data = Dataset::load(&[&x, &y]).unwrap();
///
/// assert_eq!(unary_inclusions(&data), vec![Inclusion { dependent: 0, referenced: 1 }]);
/// ```
pub fn unary_inclusions(data: &Dataset) -> Vec<Inclusion> {
    let width = data.columns().len();
    let mut streams: Vec<_> = ranked_columns(data)
        .into_iter()
        .map(Vec::into_iter)
        .collect();

    let mut references: Vec<ColumnSet> = (0..width)
        .map(|column| {
            (0..width)
                .filter(|&other| other != column)
                .map(to_index)
                .collect()
        })
        .collect();

    // The head of every stream that still has values, smallest first. Each stream has at most one
    // entry here at a time.
    let mut heads = BinaryHeap::with_capacity(width);
    for (column, stream) in streams.iter_mut().enumerate() {
        if let Some(value) = stream.next() {
            heads.push(Reverse((value, to_index(column))));
        }
    }

    let mut bearing = Vec::with_capacity(width);
    let mut steps = 0usize;
    while heads.len() > 1 {
        steps += 1;
        let min = match heads.peek() {
            Some(Reverse((value, _))) => *value,
            None => break,
        };
        while let Some(Reverse((value, column))) = heads.peek().copied() {
            if value != min {
                break;
            }
            heads.pop();
            bearing.push(column);
        }

        // Every column that has this value narrows its references to the other columns that have
        // it, all against the same snapshot.
        let snapshot: ColumnSet = bearing.drain(..).collect();
        for column in snapshot.iter() {
            let refs = &mut references[usize::from(column)];
            if !refs.is_empty() {
                *refs = refs.iter().intersection(snapshot.iter()).collect();
            }
            if let Some(value) = streams[usize::from(column)].next() {
                heads.push(Reverse((value, column)));
            }
        }
    }

    // Once every other stream has run dry, whatever is left in the last one appears nowhere else.
    if let Some(Reverse((_, column))) = heads.pop() {
        references[usize::from(column)] = ColumnSet::default();
    }

    let mut inclusions = Vec::new();
    for (dependent, referenced) in references.iter().enumerate() {
        let dependent = to_index(dependent);
        for referenced in referenced.iter() {
            let (from, to) = (
                &data.columns()[usize::from(dependent)],
                &data.columns()[usize::from(referenced)],
            );
            debug!("{}.{} <= {}.{}", from.relation, from.name, to.relation, to.name);
            inclusions.push(Inclusion {
                dependent,
                referenced,
            });
        }
    }

    info!(
        "{} unary inclusion dependencies among {} columns after {} distinct values",
        inclusions.len(),
        width,
        steps
    );
    inclusions
}
