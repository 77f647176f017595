//! Reading relations into memory.
//!
//! A [`RowSource`] describes one relation and can hand out its rows as many times as asked. The
//! searches never work on a source directly: they first load every source into a [`Dataset`],
//! which interns each distinct value once so that comparing two cells is comparing two integers.

use crate::{ColumnIndex, Error, Result};
use csv_core::{ReadFieldResult, ReaderBuilder};
use lasso::{Rodeo, RodeoResolver, Spur};
use log::{debug, info};
use std::fs::File;
use std::io;
use std::mem::take;
use std::path::{Path, PathBuf};
use std::str;

/// One row as delivered by a [`RowSource`]: a value or null for each column.
pub type Row = Vec<Option<String>>;

/// A relation that rows can be read from.
pub trait RowSource {
    /// The name of the relation.
    fn relation_name(&self) -> &str;

    /// The names of the relation's columns, in order. Every row must have exactly this many
    /// values.
    fn column_names(&self) -> &[String];

    /// Returns a fresh iterator over all of the relation's rows, starting from the first.
    fn rows(&self) -> Result<Box<dyn Iterator<Item = Result<Row>> + '_>>;
}

/// A relation whose rows are already in memory.
///
/// ```
/// use dependency_miner::{MemorySource, RowSource};
///
/// let source = MemorySource::new("r", &["a", "b"])
///     .row(&[Some("1"), None])
///     .row(&[Some("2"), Some("x")]);
///
/// assert_eq!(source.column_names().len(), 2);
/// assert_eq!(source.rows().unwrap().count(), 2);
/// ```
#[derive(Clone, Debug, Default)]
pub struct MemorySource {
    name: String,
    columns: Vec<String>,
    rows: Vec<Row>,
}

impl MemorySource {
    /// Creates an empty relation with the given schema.
    pub fn new(name: &str, columns: &[&str]) -> Self {
        MemorySource {
            name: name.to_owned(),
            columns: columns.iter().map(|&c| c.to_owned()).collect(),
            rows: Vec::new(),
        }
    }

    /// Appends a row. The width isn't checked until the relation is loaded.
    pub fn row(mut self, values: &[Option<&str>]) -> Self {
        self.push_row(values.iter().map(|v| v.map(str::to_owned)).collect());
        self
    }

    /// Appends an owned row.
    pub fn push_row(&mut self, row: Row) -> &mut Self {
        self.rows.push(row);
        self
    }
}

impl RowSource for MemorySource {
    fn relation_name(&self) -> &str {
        &self.name
    }

    fn column_names(&self) -> &[String] {
        &self.columns
    }

    fn rows(&self) -> Result<Box<dyn Iterator<Item = Result<Row>> + '_>> {
        Ok(Box::new(self.rows.iter().cloned().map(Ok)))
    }
}

/// How to interpret a delimited text file.
#[derive(Clone, Debug)]
pub struct SourceOptions {
    /// The byte that separates fields. Tab by default.
    pub delimiter: u8,

    /// A field with exactly this content is read as null. By default only empty fields are null.
    pub null: String,

    /// Whether the first record names the columns. If not, columns are named `column1`,
    /// `column2`, and so on.
    pub has_header: bool,
}

impl Default for SourceOptions {
    fn default() -> Self {
        SourceOptions {
            delimiter: b'\t',
            null: String::new(),
            has_header: true,
        }
    }
}

/// A relation stored in a delimited text file, tab-separated unless configured otherwise.
///
/// The relation is named after the file's stem. The file is re-read from the start every time
/// [`RowSource::rows`] is called.
#[derive(Clone, Debug)]
pub struct TsvSource {
    path: PathBuf,
    name: String,
    columns: Vec<String>,
    options: SourceOptions,
}

impl TsvSource {
    /// Opens a file and reads its schema.
    pub fn open<P: AsRef<Path>>(path: P, options: SourceOptions) -> Result<Self> {
        let path = path.as_ref().to_owned();
        let name = path
            .file_stem()
            .map_or_else(|| path.to_string_lossy(), |stem| stem.to_string_lossy())
            .into_owned();

        let mut records = Records::new(File::open(&path)?, &name, &options);
        let first = records.next().transpose()?.unwrap_or_default();
        let columns = if options.has_header {
            first
        } else {
            (1..=first.len()).map(|i| format!("column{}", i)).collect()
        };

        debug!("opened {} with columns {:?}", path.display(), columns);
        Ok(TsvSource {
            path,
            name,
            columns,
            options,
        })
    }
}

impl RowSource for TsvSource {
    fn relation_name(&self) -> &str {
        &self.name
    }

    fn column_names(&self) -> &[String] {
        &self.columns
    }

    fn rows(&self) -> Result<Box<dyn Iterator<Item = Result<Row>> + '_>> {
        let input = File::open(&self.path)?;
        let records = Records::new(input, &self.name, &self.options);
        let skip = if self.options.has_header { 1 } else { 0 };
        let null = &self.options.null;
        Ok(Box::new(records.skip(skip).map(move |record| {
            Ok(record?
                .into_iter()
                .map(|field| if field == *null { None } else { Some(field) })
                .collect())
        })))
    }
}

/// Streams records out of delimited text, one `Vec` of fields at a time.
struct Records<R> {
    input: R,
    relation: String,
    reader: csv_core::Reader,
    inputbuf: Box<[u8]>,
    start: usize,
    end: usize,
    eof: bool,
    fieldbuf: Vec<u8>,
    fieldlen: usize,
    record: Vec<String>,
    done: bool,
}

impl<R: io::Read> Records<R> {
    fn new(input: R, relation: &str, options: &SourceOptions) -> Self {
        Records {
            input,
            relation: relation.to_owned(),
            reader: ReaderBuilder::new().delimiter(options.delimiter).build(),
            inputbuf: vec![0; 16384].into_boxed_slice(),
            start: 0,
            end: 0,
            eof: false,
            fieldbuf: vec![0; 1024],
            fieldlen: 0,
            record: Vec::new(),
            done: false,
        }
    }

    fn read_record(&mut self) -> Result<Option<Vec<String>>> {
        loop {
            // An empty input slice tells csv-core that the file has ended, so only refill once
            // everything already buffered has been consumed.
            if self.start == self.end && !self.eof {
                let read = self.input.read(&mut self.inputbuf)?;
                self.start = 0;
                self.end = read;
                self.eof = read == 0;
            }

            let (result, nin, nout) = self.reader.read_field(
                &self.inputbuf[self.start..self.end],
                &mut self.fieldbuf[self.fieldlen..],
            );
            self.start += nin;
            self.fieldlen += nout;

            match result {
                ReadFieldResult::InputEmpty => {}
                ReadFieldResult::OutputFull => {
                    let len = self.fieldbuf.len();
                    self.fieldbuf.resize(len * 2, 0);
                }
                ReadFieldResult::Field { record_end } => {
                    let field = str::from_utf8(&self.fieldbuf[..self.fieldlen]).map_err(|_| {
                        Error::Encoding {
                            relation: self.relation.clone(),
                            row: self.reader.line(),
                        }
                    })?;
                    self.record.push(field.to_owned());
                    self.fieldlen = 0;

                    if record_end {
                        return Ok(Some(take(&mut self.record)));
                    }
                }
                ReadFieldResult::End => return Ok(None),
            }
        }
    }
}

impl<R: io::Read> Iterator for Records<R> {
    type Item = Result<Vec<String>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let result = self.read_record().transpose();
        self.done = !matches!(result, Some(Ok(_)));
        result
    }
}

/// A column of a [`Dataset`], addressed by its global index.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Column {
    /// Name of the relation this column belongs to.
    pub relation: String,
    /// Name of the column within its relation.
    pub name: String,
    /// Position of this column among all columns of all relations in the dataset.
    pub index: ColumnIndex,
}

/// One relation loaded into memory, with every value interned.
///
/// Column indices used with a relation are local to it, starting from 0.
#[derive(Clone, Debug)]
pub struct Relation {
    name: String,
    columns: Vec<String>,
    rows: Vec<Box<[Option<Spur>]>>,
}

impl Relation {
    fn read(source: &dyn RowSource, values: &mut Rodeo<Spur>) -> Result<Self> {
        let name = source.relation_name().to_owned();
        let columns = source.column_names().to_vec();
        let mut rows = Vec::new();

        for (position, row) in source.rows()?.enumerate() {
            let row = row?;
            if row.len() != columns.len() {
                return Err(Error::RowWidth {
                    relation: name,
                    row: position + 1,
                    expected: columns.len(),
                    found: row.len(),
                });
            }
            rows.push(
                row.iter()
                    .map(|value| value.as_ref().map(|v| values.get_or_intern(v)))
                    .collect(),
            );
        }

        rows.shrink_to_fit();
        Ok(Relation {
            name,
            columns,
            rows,
        })
    }

    /// The name of the relation.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The names of the relation's columns.
    pub fn column_names(&self) -> &[String] {
        &self.columns
    }

    /// The number of columns.
    pub fn width(&self) -> usize {
        self.columns.len()
    }

    /// The number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` if the relation has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns the interned values of every row, in input order.
    pub fn rows(&self) -> impl ExactSizeIterator<Item = &[Option<Spur>]> + '_ {
        self.rows.iter().map(|row| &row[..])
    }

    /// Returns the interned values of one column, in row order.
    pub fn column(&self, column: ColumnIndex) -> impl ExactSizeIterator<Item = Option<Spur>> + '_ {
        let column = usize::from(column);
        self.rows.iter().map(move |row| row[column])
    }
}

/// Every input relation loaded into memory, sharing one table of interned values.
///
/// Global column indices are assigned by concatenating each relation's columns in the order the
/// relations were given.
#[derive(Debug)]
pub struct Dataset {
    values: RodeoResolver<Spur>,
    relations: Vec<Relation>,
    columns: Vec<Column>,
}

impl Dataset {
    /// Reads every row of every source.
    ///
    /// This fails before reading any rows if there are no sources or too many columns, and fails
    /// as soon as it finds a row whose width doesn't match its relation's schema: dropping a row
    /// could change which constraints hold, so there's no partial result.
    pub fn load(sources: &[&dyn RowSource]) -> Result<Self> {
        if sources.is_empty() {
            return Err(Error::NoInput);
        }

        let count: usize = sources.iter().map(|s| s.column_names().len()).sum();
        if count > usize::from(ColumnIndex::MAX) + 1 {
            return Err(Error::TooManyColumns { count });
        }

        let mut values = Rodeo::new();
        let mut relations = Vec::with_capacity(sources.len());
        let mut columns = Vec::with_capacity(count);
        for source in sources {
            let relation = Relation::read(*source, &mut values)?;
            info!(
                "loaded relation {} with {} columns and {} rows",
                relation.name,
                relation.width(),
                relation.len()
            );
            for name in relation.columns.iter() {
                columns.push(Column {
                    relation: relation.name.clone(),
                    name: name.clone(),
                    index: columns.len() as ColumnIndex,
                });
            }
            relations.push(relation);
        }

        Ok(Dataset {
            values: values.into_resolver(),
            relations,
            columns,
        })
    }

    /// The loaded relations, in input order.
    pub fn relations(&self) -> &[Relation] {
        &self.relations
    }

    /// Every column of every relation, indexed by global column index.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Returns the text of an interned value.
    pub fn resolve(&self, value: &Spur) -> &str {
        self.values.resolve(value)
    }

    /// Returns an iterator over the values of a column, given its global index.
    pub fn column_values(
        &self,
        global: ColumnIndex,
    ) -> impl ExactSizeIterator<Item = Option<Spur>> + '_ {
        let mut local = usize::from(global);
        let mut relations = self.relations.iter();
        let mut relation = relations.next();
        while let Some(r) = relation {
            if local < r.width() {
                break;
            }
            local -= r.width();
            relation = relations.next();
        }
        // Global indices come from `columns`, so a relation is always found; an out-of-range
        // index just produces an empty iterator.
        let rows = relation.map_or(&[][..], |r| &r.rows[..]);
        rows.iter().map(move |row| row[local])
    }
}
