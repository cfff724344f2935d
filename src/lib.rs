pub mod cli;
pub mod data;
pub mod io_utils;
pub mod normalize;
pub mod numeric;
pub mod probe;
pub mod resolver;
pub mod rules;
pub mod rules_cmd;
pub mod sql;
pub mod table;
pub mod temporal;
pub mod transform;

pub use data::{RawCell, Value};
pub use numeric::{resolve_decimal, resolve_int};
pub use resolver::{Resolution, Resolver, resolve_char, resolve_text};
pub use rules::{ColumnRule, RuleError, RuleSet};
pub use temporal::{resolve_date, resolve_datetime};

use std::{
    env,
    io::{self, BufRead},
    sync::OnceLock,
};

use anyhow::{Context, Result, bail};
use clap::Parser;
use log::{LevelFilter, debug, info};

use crate::cli::{Cli, Commands};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("column_normalizer", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    match cli.command {
        Commands::Resolve(args) => handle_resolve(&args),
        Commands::Sql(args) => handle_sql(&args),
        Commands::Probe(args) => probe::execute(&args),
        Commands::Normalize(args) => normalize::execute(&args),
        Commands::Rules(args) => rules_cmd::execute(&args),
    }
}

fn handle_resolve(args: &cli::ResolveArgs) -> Result<()> {
    let values = if args.values.is_empty() {
        debug!("Reading values for '{}' from stdin", args.resolver);
        io::stdin()
            .lock()
            .lines()
            .collect::<io::Result<Vec<_>>>()
            .context("Reading values from stdin")?
    } else {
        args.values.clone()
    };

    let resolutions = values
        .iter()
        .map(|value| args.resolver.explain(&RawCell::from(value.as_str())))
        .collect::<Vec<_>>();

    if args.json {
        let entries = values
            .iter()
            .zip(&resolutions)
            .map(|(input, resolution)| {
                serde_json::json!({
                    "input": input,
                    "value": resolution.value,
                    "display": resolution.value.as_display(),
                    "strategy": resolution.strategy,
                    "fallback": resolution.fallback,
                })
            })
            .collect::<Vec<_>>();
        let rendered =
            serde_json::to_string_pretty(&entries).context("Serializing resolutions to JSON")?;
        println!("{rendered}");
    } else {
        let headers = ["input", "output", "strategy"].map(String::from);
        let rows = values
            .iter()
            .zip(&resolutions)
            .map(|(input, resolution)| {
                vec![
                    input.clone(),
                    resolution.value.as_display(),
                    resolution.strategy.clone(),
                ]
            })
            .collect::<Vec<_>>();
        table::print_table(&headers, &rows);
    }

    let fallbacks = resolutions.iter().filter(|r| r.fallback).count();
    info!(
        "Resolved {} value(s) with '{}' ({} fallback(s))",
        resolutions.len(),
        args.resolver,
        fallbacks
    );
    Ok(())
}

fn handle_sql(args: &cli::SqlArgs) -> Result<()> {
    match (&args.resolver, &args.column, &args.rules, &args.from) {
        (Some(resolver), Some(column), _, _) => {
            println!("{}", resolver.render_sql(column));
            Ok(())
        }
        (None, _, Some(path), Some(source)) => {
            let rules = RuleSet::load(path)
                .with_context(|| format!("Loading rules from {path:?}"))?;
            println!("{}", rules.select_statement(source));
            info!(
                "Rendered SELECT for {} column(s) from {:?}",
                rules.columns.len(),
                path
            );
            Ok(())
        }
        _ => bail!("Provide either --resolver with --column, or --rules with --from"),
    }
}

pub(crate) fn printable_delimiter(delimiter: u8) -> String {
    match delimiter {
        b',' => ",".to_string(),
        b'\t' => "\\t".to_string(),
        b'\n' => "\\n".to_string(),
        other => (other as char).to_string(),
    }
}
