//! Everything that can stop a discovery run.

use crate::ColumnSet;
use std::io;
use thiserror::Error;

/// A specialized `Result` whose error defaults to this crate's [`Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Reasons a discovery run can fail.
///
/// Nothing here is retried: every search is deterministic over its input, so running it again on
/// the same rows would fail the same way.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// A row source couldn't be opened or read.
    #[error(transparent)]
    Io(#[from] io::Error),

    /// A search over several relations was started with none.
    #[error("no input relations were provided")]
    NoInput,

    /// The input has more columns than a [`ColumnIndex`](crate::ColumnIndex) can address.
    #[error("{count} columns is more than the {} that can be analyzed at once", usize::from(crate::ColumnIndex::MAX) + 1)]
    TooManyColumns {
        /// Total number of columns across all input relations.
        count: usize,
    },

    /// A row didn't have exactly one value per declared column.
    #[error("relation {relation}, row {row}: expected {expected} values but found {found}")]
    RowWidth {
        /// Name of the relation the row came from.
        relation: String,
        /// 1-based position of the row within its relation, not counting any header.
        row: usize,
        /// Number of columns in the relation's schema.
        expected: usize,
        /// Number of values actually present.
        found: usize,
    },

    /// A field in a delimited file wasn't valid UTF-8.
    #[error("relation {relation}, row {row}: field is not valid UTF-8")]
    Encoding {
        /// Name of the relation the row came from.
        relation: String,
        /// 1-based position of the row within its file, counting any header.
        row: u64,
    },

    /// The functional dependency walk needed a partition it never computed. This is a bug in the
    /// search, not a problem with the data.
    #[error("no partition was computed for column combination {0:?}")]
    MissingPartition(ColumnSet),

    /// The constraint sink refused a result.
    #[error("constraint sink rejected a result: {0}")]
    Sink(#[source] Box<dyn std::error::Error + Send + Sync>),
}
