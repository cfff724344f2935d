use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::resolver::Resolver;

#[derive(Debug, Parser)]
#[command(author, version, about = "Normalize dirty source columns into safe typed values", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Resolve individual values and show the strategy that applied
    Resolve(ResolveArgs),
    /// Print the BigQuery expression for a resolver or a whole rules file
    Sql(SqlArgs),
    /// Sample a CSV file and propose a resolver for each column
    Probe(ProbeArgs),
    /// Apply a rules file to a CSV file
    Normalize(NormalizeArgs),
    /// List the columns of a rules file
    Rules(RulesArgs),
}

#[derive(Debug, Args)]
pub struct ResolveArgs {
    /// Resolver name (date, datetime, decimal, integer, text, char or an alias)
    #[arg(short = 'r', long = "resolver", value_parser = parse_resolver)]
    pub resolver: Resolver,
    /// Values to resolve (reads one value per stdin line when omitted)
    #[arg(allow_hyphen_values = true)]
    pub values: Vec<String>,
    /// Emit JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct SqlArgs {
    /// Resolver to render for a single column
    #[arg(short = 'r', long = "resolver", value_parser = parse_resolver, requires = "column", conflicts_with = "rules")]
    pub resolver: Option<Resolver>,
    /// Column reference or SQL expression to normalize (used verbatim)
    #[arg(short = 'c', long = "column")]
    pub column: Option<String>,
    /// Rules file to render as a SELECT statement
    #[arg(long = "rules", requires = "from")]
    pub rules: Option<PathBuf>,
    /// Table reference for the FROM clause
    #[arg(long = "from")]
    pub from: Option<String>,
}

#[derive(Debug, Args)]
pub struct ProbeArgs {
    /// Input CSV file to sample
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Destination rules file (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Number of rows to sample (0 means full scan)
    #[arg(long, default_value_t = 2000)]
    pub sample_rows: usize,
    /// CSV delimiter character (supports ',', 'tab', ';', '|')
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct NormalizeArgs {
    /// Input CSV file to normalize ('-' for stdin)
    #[arg(short = 'i', long = "input")]
    pub input: PathBuf,
    /// Rules file mapping columns to resolvers
    #[arg(short = 'r', long = "rules")]
    pub rules: PathBuf,
    /// Output CSV file (stdout if omitted)
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,
    /// Limit number of rows emitted
    #[arg(long)]
    pub limit: Option<usize>,
    /// CSV delimiter character for reading input
    #[arg(long, value_parser = parse_delimiter)]
    pub delimiter: Option<u8>,
    /// Delimiter to use for output (defaults to input delimiter)
    #[arg(long = "output-delimiter", value_parser = parse_delimiter)]
    pub output_delimiter: Option<u8>,
    /// Character encoding of the input file (defaults to utf-8)
    #[arg(long = "input-encoding")]
    pub input_encoding: Option<String>,
    /// Character encoding for the output file/stdout (defaults to utf-8)
    #[arg(long = "output-encoding")]
    pub output_encoding: Option<String>,
}

#[derive(Debug, Args)]
pub struct RulesArgs {
    /// Rules file to list
    #[arg(short = 'r', long = "rules")]
    pub rules: PathBuf,
}

pub fn parse_resolver(value: &str) -> Result<Resolver, String> {
    value.parse::<Resolver>().map_err(|err| err.to_string())
}

pub fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\t" => Ok(b'\t'),
        "comma" | "," => Ok(b','),
        "|" | "pipe" => Ok(b'|'),
        ";" | "semicolon" => Ok(b';'),
        other => {
            let mut chars = other.chars();
            let first = chars
                .next()
                .ok_or_else(|| "Delimiter cannot be empty".to_string())?;
            if chars.next().is_some() {
                return Err("Delimiter must be a single character".to_string());
            }
            if !first.is_ascii() {
                return Err("Delimiter must be ASCII".to_string());
            }
            Ok(first as u8)
        }
    }
}
