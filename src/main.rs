use clap::{Parser, Subcommand};
use dependency_miner::*;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[clap(author, version, about, long_about = None)]
struct Args {
    #[clap(subcommand)]
    search: Search,

    #[clap(
        short = 'd',
        long,
        global = true,
        default_value = "\t",
        help = "Field delimiter: a single ASCII character, or `tab`",
        value_parser = parse_delimiter
    )]
    delimiter: u8,

    #[clap(
        long,
        global = true,
        default_value = "",
        help = "Field content that is read as null"
    )]
    null: String,

    #[clap(
        long,
        global = true,
        help = "The first line of each file is data, not column names"
    )]
    no_header: bool,
}

#[derive(Debug, Subcommand)]
enum Search {
    /// Minimal unique column combinations of one relation
    Ucc { input: PathBuf },
    /// Minimal functional dependencies of one relation
    Fd { input: PathBuf },
    /// Unary inclusion dependencies among the columns of all given relations
    Ind {
        #[clap(required = true)]
        inputs: Vec<PathBuf>,
    },
}

fn parse_delimiter(arg: &str) -> Result<u8, String> {
    match arg.as_bytes() {
        b"tab" => Ok(b'\t'),
        [byte] if byte.is_ascii() => Ok(*byte),
        _ => Err(format!("delimiter must be one ASCII character, not {:?}", arg)),
    }
}

/// Prints each constraint on its own line.
struct Printer<W>(W);

impl<W: Write> ConstraintSink for Printer<W> {
    fn receive(&mut self, constraint: Constraint) -> Result<(), BoxError> {
        writeln!(self.0, "{}", constraint)?;
        Ok(())
    }
}

fn run(args: Args) -> Result<()> {
    let options = SourceOptions {
        delimiter: args.delimiter,
        null: args.null,
        has_header: !args.no_header,
    };
    let stdout = io::stdout();
    let mut printer = Printer(stdout.lock());

    match args.search {
        Search::Ucc { input } => {
            let source = TsvSource::open(input, options)?;
            discover_uniques(&source, &mut printer)
        }
        Search::Fd { input } => {
            let source = TsvSource::open(input, options)?;
            discover_functional(&source, &mut printer)
        }
        Search::Ind { inputs } => {
            let sources = inputs
                .iter()
                .map(|input| TsvSource::open(input, options.clone()))
                .collect::<Result<Vec<_>>>()?;
            let sources: Vec<&dyn RowSource> =
                sources.iter().map(|s| s as &dyn RowSource).collect();
            discover_inclusions(&sources, &mut printer)
        }
    }
}

fn main() -> ExitCode {
    env_logger::init();
    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {}", error);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delimiter_is_one_ascii_character_or_tab() {
        assert_eq!(parse_delimiter("tab"), Ok(b'\t'));
        assert_eq!(parse_delimiter("\t"), Ok(b'\t'));
        assert_eq!(parse_delimiter(","), Ok(b','));
        assert!(parse_delimiter("ab").is_err());
        assert!(parse_delimiter("\u{e9}").is_err());
        assert!(parse_delimiter("").is_err());
    }

    #[test]
    fn source_options_follow_the_subcommand() {
        let args =
            Args::try_parse_from(["dependency-miner", "ucc", "f.tsv", "-d", ",", "--null", "NA"])
                .unwrap();
        assert_eq!(args.delimiter, b',');
        assert_eq!(args.null, "NA");
        assert!(!args.no_header);
        assert!(matches!(args.search, Search::Ucc { .. }));

        let args = Args::try_parse_from(["dependency-miner", "--no-header", "ind", "a.tsv", "b.tsv"])
            .unwrap();
        assert_eq!(args.delimiter, b'\t');
        assert!(args.no_header);
        match args.search {
            Search::Ind { inputs } => assert_eq!(inputs.len(), 2),
            other => panic!("parsed the wrong subcommand: {:?}", other),
        }
    }

    #[test]
    fn inclusion_search_needs_an_input() {
        assert!(Args::try_parse_from(["dependency-miner", "ind"]).is_err());
    }
}
