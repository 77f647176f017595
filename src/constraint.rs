//! Discovered constraints, named by relation and column rather than by index, and the sinks they
//! are delivered to.

use crate::{functional, inclusion, unique};
use crate::{Column, ColumnIndex, ColumnSet, Dataset, Error, Relation, Result, RowSource};
use std::fmt;

/// Any error a [`ConstraintSink`] wants to report.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Identifies a column by name.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct ColumnRef {
    /// Name of the relation the column belongs to.
    pub relation: String,
    /// Name of the column.
    pub column: String,
}

impl ColumnRef {
    fn local(relation: &Relation, column: ColumnIndex) -> Self {
        ColumnRef {
            relation: relation.name().to_owned(),
            column: relation.column_names()[usize::from(column)].clone(),
        }
    }

    fn global(column: &Column) -> Self {
        ColumnRef {
            relation: column.relation.clone(),
            column: column.name.clone(),
        }
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.relation, self.column)
    }
}

// Writes columns as `relation[a, b]`, starting a new bracket whenever the relation changes.
fn fmt_columns<W: fmt::Write>(out: &mut W, columns: &[ColumnRef]) -> fmt::Result {
    let mut relation = None;
    for column in columns {
        if relation == Some(&column.relation) {
            write!(out, ", {}", column.column)?;
        } else {
            if relation.is_some() {
                out.write_str("], ")?;
            }
            write!(out, "{}[{}", column.relation, column.column)?;
            relation = Some(&column.relation);
        }
    }
    if relation.is_some() {
        out.write_str("]")?;
    }
    Ok(())
}

/// A minimal set of columns whose combined values are unique.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct UniqueColumnCombination {
    /// The columns, in ascending schema order.
    pub columns: Vec<ColumnRef>,
}

impl fmt::Display for UniqueColumnCombination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_columns(f, &self.columns)
    }
}

/// A minimal functional dependency: the determinant's values fix the dependent column's value.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct FunctionalDependency {
    /// The determining columns, in ascending schema order.
    pub determinant: Vec<ColumnRef>,
    /// The determined column.
    pub dependent: ColumnRef,
}

impl fmt::Display for FunctionalDependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_columns(f, &self.determinant)?;
        write!(f, " -> {}", self.dependent)
    }
}

/// An inclusion dependency: every value of the dependent columns also appears in the referenced
/// columns.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct InclusionDependency {
    /// The columns whose values are included.
    pub dependent: Vec<ColumnRef>,
    /// The columns that include them, position for position.
    pub referenced: Vec<ColumnRef>,
}

impl fmt::Display for InclusionDependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt_columns(f, &self.dependent)?;
        f.write_str(" <= ")?;
        fmt_columns(f, &self.referenced)
    }
}

/// Any constraint one of the searches can discover.
///
/// ```
/// use dependency_miner::{ColumnRef, Constraint, FunctionalDependency};
///
/// let column = |name: &str| ColumnRef { relation: "r".to_owned(), column: name.to_owned() };
/// let fd = Constraint::Functional(FunctionalDependency {
///     determinant: vec![column("a"), column("b")],
///     dependent: column("c"),
/// });
/// assert_eq!(fd.to_string(), "r[a, b] -> r[c]");
/// ```
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Constraint {
    /// See [`UniqueColumnCombination`].
    Unique(UniqueColumnCombination),
    /// See [`FunctionalDependency`].
    Functional(FunctionalDependency),
    /// See [`InclusionDependency`].
    Inclusion(InclusionDependency),
}

impl fmt::Display for Constraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constraint::Unique(c) => fmt::Display::fmt(c, f),
            Constraint::Functional(c) => fmt::Display::fmt(c, f),
            Constraint::Inclusion(c) => fmt::Display::fmt(c, f),
        }
    }
}

/// Receives discovered constraints one at a time.
///
/// If the sink returns an error, the search stops and reports [`Error::Sink`]; results that
/// haven't been delivered yet are dropped.
pub trait ConstraintSink {
    /// Accepts one constraint.
    fn receive(&mut self, constraint: Constraint) -> Result<(), BoxError>;
}

impl ConstraintSink for Vec<Constraint> {
    fn receive(&mut self, constraint: Constraint) -> Result<(), BoxError> {
        self.push(constraint);
        Ok(())
    }
}

fn emit<S: ConstraintSink + ?Sized>(sink: &mut S, constraint: Constraint) -> Result<()> {
    sink.receive(constraint).map_err(Error::Sink)
}

fn local_columns(relation: &Relation, columns: &ColumnSet) -> Vec<ColumnRef> {
    columns
        .iter()
        .map(|column| ColumnRef::local(relation, column))
        .collect()
}

/// Loads a relation and delivers every minimal unique column combination in it to `sink`.
pub fn discover_uniques<S: ConstraintSink + ?Sized>(
    source: &dyn RowSource,
    sink: &mut S,
) -> Result<()> {
    let data = Dataset::load(&[source])?;
    let relation = &data.relations()[0];
    for columns in unique::minimal_uniques(relation)? {
        let columns = local_columns(relation, &columns);
        emit(sink, Constraint::Unique(UniqueColumnCombination { columns }))?;
    }
    Ok(())
}

/// Loads a relation and delivers every minimal functional dependency in it to `sink`.
pub fn discover_functional<S: ConstraintSink + ?Sized>(
    source: &dyn RowSource,
    sink: &mut S,
) -> Result<()> {
    let data = Dataset::load(&[source])?;
    let relation = &data.relations()[0];
    for dependency in functional::minimal_dependencies(relation)? {
        let fd = FunctionalDependency {
            determinant: local_columns(relation, &dependency.determinant),
            dependent: ColumnRef::local(relation, dependency.dependent),
        };
        emit(sink, Constraint::Functional(fd))?;
    }
    Ok(())
}

/// Loads any number of relations and delivers every unary inclusion dependency between their
/// columns to `sink`.
pub fn discover_inclusions<S: ConstraintSink + ?Sized>(
    sources: &[&dyn RowSource],
    sink: &mut S,
) -> Result<()> {
    let data = Dataset::load(sources)?;
    let columns = data.columns();
    for found in inclusion::unary_inclusions(&data) {
        let ind = InclusionDependency {
            dependent: vec![ColumnRef::global(&columns[usize::from(found.dependent)])],
            referenced: vec![ColumnRef::global(&columns[usize::from(found.referenced)])],
        };
        emit(sink, Constraint::Inclusion(ind))?;
    }
    Ok(())
}
