//! Resolver inference from sampled CSV rows.
//!
//! Every non-placeholder sample narrows the set of resolvers a column could
//! use; the most specific survivor wins, in the order integer, decimal, date,
//! datetime, text.

use std::collections::HashSet;

use anyhow::{Context, Result};
use log::{debug, info};

use crate::{
    cli::ProbeArgs,
    data::RawCell,
    io_utils::{self, CsvInput},
    numeric::{THOUSANDS_SEPARATOR, parse_decimal_literal, parse_whole_number},
    resolver::Resolver,
    rules::{ColumnRule, RuleSet},
    temporal,
    transform::string_ops,
};

const PLACEHOLDER_TOKENS: &[&str] = &["", "NULL"];

#[derive(Debug, Clone)]
struct ResolverCandidate {
    possible_integer: bool,
    possible_decimal: bool,
    possible_date: bool,
    possible_datetime: bool,
    observed: usize,
}

impl ResolverCandidate {
    fn new() -> Self {
        Self {
            possible_integer: true,
            possible_decimal: true,
            possible_date: true,
            possible_datetime: true,
            observed: 0,
        }
    }

    fn update(&mut self, value: &str) {
        let trimmed = value.trim();
        if PLACEHOLDER_TOKENS.contains(&trimmed) {
            return;
        }
        self.observed += 1;

        if self.possible_integer && parse_whole_number(trimmed).is_none() {
            self.possible_integer = false;
        }
        if self.possible_decimal {
            let cleaned = string_ops::strip_char(trimmed, THOUSANDS_SEPARATOR);
            if parse_decimal_literal(&cleaned).is_none() {
                self.possible_decimal = false;
            }
        }
        if self.possible_date && temporal::default_date_resolver().parse(trimmed).is_none() {
            self.possible_date = false;
        }
        if self.possible_datetime {
            let (_, shape) = temporal::default_temporal_resolver()
                .resolve_with_shape(&RawCell::from(trimmed));
            if shape.is_none() {
                self.possible_datetime = false;
            }
        }
    }

    fn decide(&self) -> Resolver {
        if self.observed == 0 {
            return Resolver::Text;
        }
        if self.possible_integer {
            Resolver::Integer
        } else if self.possible_decimal {
            Resolver::Decimal
        } else if self.possible_date {
            Resolver::Date
        } else if self.possible_datetime {
            Resolver::DateTime
        } else {
            Resolver::Text
        }
    }
}

/// Samples up to `sample_rows` rows (0 = all) and proposes one rule per column.
pub fn infer_rules(input: &mut CsvInput, sample_rows: usize) -> Result<RuleSet> {
    let headers = input.headers().to_vec();
    let mut candidates = vec![ResolverCandidate::new(); headers.len()];
    let mut processed = 0usize;

    for row in input.rows() {
        if sample_rows > 0 && processed >= sample_rows {
            break;
        }
        let row = row?;
        for (candidate, value) in candidates.iter_mut().zip(&row) {
            candidate.update(value);
        }
        processed += 1;
    }
    debug!("Sampled {processed} row(s) across {} column(s)", headers.len());

    let mut taken = HashSet::with_capacity(headers.len());
    let columns = headers
        .iter()
        .zip(&candidates)
        .map(|(header, candidate)| {
            let rule = ColumnRule::new(header.clone(), candidate.decide());
            let output = unique_output_name(header, &mut taken);
            if output == *header {
                rule
            } else {
                rule.with_rename(output)
            }
        })
        .collect();
    Ok(RuleSet::new(columns))
}

// Output names compare case-insensitively. The snake_case form is preferred,
// then the raw header, then the snake_case form with a numeric suffix.
fn unique_output_name(header: &str, taken: &mut HashSet<String>) -> String {
    let snake = string_ops::snake_case(header);
    let base = if snake.is_empty() {
        header
    } else {
        snake.as_ref()
    };
    let chosen = [base, header]
        .into_iter()
        .find(|name| !name.is_empty() && !taken.contains(&name.to_ascii_lowercase()))
        .map(str::to_string)
        .unwrap_or_else(|| {
            (2..)
                .map(|n| format!("{base}_{n}"))
                .find(|name| !taken.contains(&name.to_ascii_lowercase()))
                .unwrap_or_default()
        });
    taken.insert(chosen.to_ascii_lowercase());
    chosen
}

pub fn execute(args: &ProbeArgs) -> Result<()> {
    let delimiter = io_utils::resolve_input_delimiter(&args.input, args.delimiter);
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    info!(
        "Probing '{}' with delimiter '{}'",
        args.input.display(),
        crate::printable_delimiter(delimiter)
    );
    let mut input = CsvInput::open(&args.input, delimiter, encoding)?;
    let rules = infer_rules(&mut input, args.sample_rows)
        .with_context(|| format!("Inferring rules from {:?}", args.input))?;

    match &args.output {
        Some(path) if !io_utils::is_dash(path) => {
            rules
                .save(path)
                .with_context(|| format!("Writing rules to {path:?}"))?;
            info!(
                "Proposed rules for {} column(s) written to {:?}",
                rules.columns.len(),
                path
            );
        }
        _ => print!("{}", rules.to_yaml_string()?),
    }
    Ok(())
}
