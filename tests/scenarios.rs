use dependency_miner::functional::{minimal_dependencies, Dependency};
use dependency_miner::inclusion::{unary_inclusions, Inclusion};
use dependency_miner::unique::{is_unique, minimal_uniques};
use dependency_miner::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

fn strings(constraints: &[Constraint]) -> Vec<String> {
    constraints.iter().map(ToString::to_string).collect()
}

#[test]
fn unique_prunes_supersets_of_results() {
    let source = MemorySource::new("t", &["a", "b"])
        .row(&[Some("1"), Some("x")])
        .row(&[Some("2"), Some("x")])
        .row(&[Some("3"), Some("y")]);

    let mut results: Vec<Constraint> = Vec::new();
    discover_uniques(&source, &mut results).unwrap();
    assert_eq!(strings(&results), vec!["t[a]"]);
}

#[test]
fn unique_needs_combination() {
    let source = MemorySource::new("t", &["a", "b", "c"])
        .row(&[Some("1"), Some("x"), Some("p")])
        .row(&[Some("1"), Some("y"), Some("q")])
        .row(&[Some("2"), Some("x"), Some("q")])
        .row(&[Some("2"), Some("y"), Some("p")]);

    let data = Dataset::load(&[&source]).unwrap();
    let found: Vec<_> = minimal_uniques(&data.relations()[0])
        .unwrap()
        .into_iter()
        .collect();
    assert_eq!(
        found,
        vec![
            ColumnSet::new(&[0, 1]),
            ColumnSet::new(&[0, 2]),
            ColumnSet::new(&[1, 2])
        ]
    );
}

#[test]
fn nulls_never_collide() {
    let source = MemorySource::new("t", &["a"])
        .row(&[None])
        .row(&[None])
        .row(&[Some("1")]);

    let data = Dataset::load(&[&source]).unwrap();
    assert!(is_unique(&data.relations()[0], &ColumnSet::new(&[0])));

    let mut results: Vec<Constraint> = Vec::new();
    discover_uniques(&source, &mut results).unwrap();
    assert_eq!(strings(&results), vec!["t[a]"]);
}

#[test]
fn null_in_one_column_excludes_the_row() {
    let source = MemorySource::new("t", &["a", "b"])
        .row(&[Some("1"), None])
        .row(&[Some("1"), Some("x")])
        .row(&[Some("2"), Some("x")]);

    let data = Dataset::load(&[&source]).unwrap();
    let relation = &data.relations()[0];
    assert!(!is_unique(relation, &ColumnSet::new(&[0])));
    assert!(!is_unique(relation, &ColumnSet::new(&[1])));
    assert!(is_unique(relation, &ColumnSet::new(&[0, 1])));
}

#[test]
fn empty_relation_is_vacuously_unique() {
    let source = MemorySource::new("t", &["a", "b", "c"]);

    let mut results: Vec<Constraint> = Vec::new();
    discover_uniques(&source, &mut results).unwrap();
    assert_eq!(strings(&results), vec!["t[a]", "t[b]", "t[c]"]);
}

#[test]
fn functional_dependencies_between_covarying_columns() {
    let source = MemorySource::new("t", &["a", "b", "c"])
        .row(&[Some("1"), Some("1"), Some("1")])
        .row(&[Some("1"), Some("1"), Some("2")])
        .row(&[Some("2"), Some("2"), Some("1")]);

    let mut results: Vec<Constraint> = Vec::new();
    discover_functional(&source, &mut results).unwrap();
    assert_eq!(strings(&results), vec!["t[b] -> t[a]", "t[a] -> t[b]"]);
}

#[test]
fn functional_dependency_with_composite_determinant() {
    // c = a xor b: neither a nor b alone determines c, but together they do.
    let source = MemorySource::new("t", &["a", "b", "c"])
        .row(&[Some("0"), Some("0"), Some("0")])
        .row(&[Some("0"), Some("1"), Some("1")])
        .row(&[Some("1"), Some("0"), Some("1")])
        .row(&[Some("1"), Some("1"), Some("0")])
        .row(&[Some("1"), Some("1"), Some("0")]);

    let data = Dataset::load(&[&source]).unwrap();
    let found = minimal_dependencies(&data.relations()[0]).unwrap();
    assert_eq!(
        found,
        vec![
            Dependency {
                determinant: ColumnSet::new(&[1, 2]),
                dependent: 0
            },
            Dependency {
                determinant: ColumnSet::new(&[0, 2]),
                dependent: 1
            },
            Dependency {
                determinant: ColumnSet::new(&[0, 1]),
                dependent: 2
            },
        ]
    );
}

#[test]
fn functional_dependencies_prune_redundant_determinants() {
    // a is a key, so a -> b and a -> c; {a, b} -> c and {a, c} -> b must not be reported as
    // well. {b, c} is also a key, so {b, c} -> a is minimal.
    let source = MemorySource::new("t", &["a", "b", "c"])
        .row(&[Some("1"), Some("x"), Some("p")])
        .row(&[Some("2"), Some("x"), Some("q")])
        .row(&[Some("3"), Some("y"), Some("q")]);

    let data = Dataset::load(&[&source]).unwrap();
    let found = minimal_dependencies(&data.relations()[0]).unwrap();
    assert_eq!(
        found,
        vec![
            Dependency {
                determinant: ColumnSet::new(&[1, 2]),
                dependent: 0
            },
            Dependency {
                determinant: ColumnSet::new(&[0]),
                dependent: 1
            },
            Dependency {
                determinant: ColumnSet::new(&[0]),
                dependent: 2
            },
        ]
    );
}

#[test]
fn empty_relation_is_vacuously_dependent() {
    let source = MemorySource::new("t", &["a", "b", "c"]);

    let data = Dataset::load(&[&source]).unwrap();
    let found = minimal_dependencies(&data.relations()[0]).unwrap();
    assert_eq!(found.len(), 6);
    assert!(found.iter().all(|fd| fd.determinant.len() == 1));
}

#[test]
fn inclusion_between_relations() {
    let x = MemorySource::new("x", &["col_x"])
        .row(&[Some("1")])
        .row(&[Some("2")])
        .row(&[Some("3")]);
    let y = MemorySource::new("y", &["col_y"])
        .row(&[Some("1")])
        .row(&[Some("2")])
        .row(&[Some("3")])
        .row(&[Some("4")]);

    let mut results: Vec<Constraint> = Vec::new();
    discover_inclusions(&[&x, &y], &mut results).unwrap();
    assert_eq!(strings(&results), vec!["x[col_x] <= y[col_y]"]);
}

#[test]
fn inclusion_rejects_leftover_values() {
    // After y runs out, x still has a value nobody else has.
    let x = MemorySource::new("x", &["a"])
        .row(&[Some("1")])
        .row(&[Some("2")])
        .row(&[Some("5")]);
    let y = MemorySource::new("y", &["b"])
        .row(&[Some("1")])
        .row(&[Some("2")]);

    let data = Dataset::load(&[&x, &y]).unwrap();
    assert_eq!(
        unary_inclusions(&data),
        vec![Inclusion {
            dependent: 1,
            referenced: 0
        }]
    );
}

#[test]
fn inclusion_is_case_sensitive_but_ordered_case_insensitively() {
    let t = MemorySource::new("t", &["upper", "mixed", "lower"])
        .row(&[Some("B"), Some("a"), Some("a")])
        .row(&[Some("B"), Some("B"), Some("b")])
        .row(&[None, Some("a"), Some("c")]);

    let data = Dataset::load(&[&t]).unwrap();
    assert_eq!(
        unary_inclusions(&data),
        vec![Inclusion {
            dependent: 0,
            referenced: 1
        }]
    );
}

#[test]
fn inclusion_of_columns_with_equal_values() {
    let t = MemorySource::new("t", &["a", "b", "c"])
        .row(&[Some("1"), Some("2"), None])
        .row(&[Some("2"), Some("1"), None])
        .row(&[Some("2"), Some("1"), None]);

    let data = Dataset::load(&[&t]).unwrap();
    // c has no values at all, so it's included everywhere.
    assert_eq!(
        unary_inclusions(&data),
        vec![
            Inclusion {
                dependent: 0,
                referenced: 1
            },
            Inclusion {
                dependent: 1,
                referenced: 0
            },
            Inclusion {
                dependent: 2,
                referenced: 0
            },
            Inclusion {
                dependent: 2,
                referenced: 1
            },
        ]
    );
}

#[test]
fn narrow_row_aborts_the_run() {
    let source = MemorySource::new("t", &["a", "b"])
        .row(&[Some("1"), Some("x")])
        .row(&[Some("2")]);

    let mut results: Vec<Constraint> = Vec::new();
    match discover_uniques(&source, &mut results) {
        Err(Error::RowWidth {
            relation,
            row,
            expected,
            found,
        }) => {
            assert_eq!(relation, "t");
            assert_eq!((row, expected, found), (2, 2, 1));
        }
        other => panic!("expected a row width error, got {:?}", other),
    }
    assert!(results.is_empty());
}

#[test]
fn no_relations_is_a_configuration_error() {
    let mut results: Vec<Constraint> = Vec::new();
    assert!(matches!(
        discover_inclusions(&[], &mut results),
        Err(Error::NoInput)
    ));
}

struct Refuse;

impl ConstraintSink for Refuse {
    fn receive(&mut self, constraint: Constraint) -> Result<(), BoxError> {
        Err(format!("no room for {}", constraint).into())
    }
}

#[test]
fn sink_rejection_is_propagated() {
    let source = MemorySource::new("t", &["a"]).row(&[Some("1")]);

    match discover_uniques(&source, &mut Refuse) {
        Err(Error::Sink(error)) => assert_eq!(error.to_string(), "no room for t[a]"),
        other => panic!("expected a sink error, got {:?}", other),
    }
}

/// Writes a file into the given temporary directory, which removes it again when dropped.
fn write_temp<C: AsRef<[u8]>>(temp_dir: &TempDir, name: &str, contents: C) -> PathBuf {
    let path = temp_dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn tsv_source_reads_header_and_nulls() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_temp(&temp_dir, "people.tsv", "id\tcity\n1\tOslo\n2\t\n3\tOslo\n");
    let source = TsvSource::open(&path, SourceOptions::default()).unwrap();

    assert_eq!(source.relation_name(), "people");
    assert_eq!(source.column_names(), ["id", "city"]);

    let rows: Vec<Row> = source.rows().unwrap().collect::<Result<_>>().unwrap();
    assert_eq!(
        rows,
        vec![
            vec![Some("1".to_owned()), Some("Oslo".to_owned())],
            vec![Some("2".to_owned()), None],
            vec![Some("3".to_owned()), Some("Oslo".to_owned())],
        ]
    );

    // Rows can be read again from the start.
    assert_eq!(source.rows().unwrap().count(), 3);

    let mut results: Vec<Constraint> = Vec::new();
    discover_uniques(&source, &mut results).unwrap();
    assert_eq!(strings(&results), vec!["people[id]"]);
}

#[test]
fn tsv_source_without_header_and_custom_null() {
    let long = "v".repeat(5000);
    let contents = format!("1,NULL\n2,{}\n", long);
    let temp_dir = TempDir::new().unwrap();
    let path = write_temp(&temp_dir, "plain.csv", &contents);
    let options = SourceOptions {
        delimiter: b',',
        null: "NULL".to_owned(),
        has_header: false,
    };
    let source = TsvSource::open(&path, options).unwrap();

    assert_eq!(source.relation_name(), "plain");
    assert_eq!(source.column_names(), ["column1", "column2"]);

    let rows: Vec<Row> = source.rows().unwrap().collect::<Result<_>>().unwrap();
    assert_eq!(rows[0], vec![Some("1".to_owned()), None]);
    assert_eq!(rows[1], vec![Some("2".to_owned()), Some(long)]);
}

#[test]
fn tsv_source_rejects_ragged_rows() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_temp(&temp_dir, "ragged.tsv", "a\tb\n1\t2\n3\n");
    let source = TsvSource::open(&path, SourceOptions::default()).unwrap();

    let mut results: Vec<Constraint> = Vec::new();
    assert!(matches!(
        discover_functional(&source, &mut results),
        Err(Error::RowWidth { row: 2, .. })
    ));
}

#[test]
fn tsv_source_rejects_invalid_utf8() {
    let temp_dir = TempDir::new().unwrap();
    let path = write_temp(&temp_dir, "bad.tsv", b"a\tb\n1\t\xff\xfe\n");
    let source = TsvSource::open(&path, SourceOptions::default()).unwrap();

    let mut results: Vec<Constraint> = Vec::new();
    match discover_uniques(&source, &mut results) {
        Err(Error::Encoding { relation, .. }) => assert_eq!(relation, "bad"),
        other => panic!("expected an encoding error, got {:?}", other),
    }
    assert!(results.is_empty());
}

/// A relation with a schema but whose rows must never be read.
struct SchemaOnly {
    columns: Vec<String>,
}

impl RowSource for SchemaOnly {
    fn relation_name(&self) -> &str {
        "wide"
    }

    fn column_names(&self) -> &[String] {
        &self.columns
    }

    fn rows(&self) -> Result<Box<dyn Iterator<Item = Result<Row>> + '_>> {
        panic!("rows were read before the schema was checked");
    }
}

#[test]
fn too_many_columns_fails_before_reading_rows() {
    let count = usize::from(ColumnIndex::MAX) + 2;
    let wide = SchemaOnly {
        columns: (0..count).map(|c| format!("c{}", c)).collect(),
    };
    assert_eq!(count, 65537);

    match Dataset::load(&[&wide]) {
        Err(Error::TooManyColumns { count }) => assert_eq!(count, 65537),
        other => panic!("expected a column limit error, got {:?}", other.map(|_| ())),
    }

    // Exactly at the limit is fine.
    let widest = SchemaOnly {
        columns: (0..count - 1).map(|c| format!("c{}", c)).collect(),
    };
    let names: Vec<&str> = widest.columns.iter().map(String::as_str).collect();
    let data = Dataset::load(&[&MemorySource::new("widest", &names)]).unwrap();
    assert_eq!(data.columns().len(), 65536);
}
