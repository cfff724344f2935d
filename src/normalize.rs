//! Row-by-row application of a rules file to a CSV file.

use anyhow::{Context, Result};
use log::{debug, info};

use crate::{cli::NormalizeArgs, io_utils, rules::RuleSet};

pub fn execute(args: &NormalizeArgs) -> Result<()> {
    let input_delimiter = io_utils::resolve_input_delimiter(&args.input, args.delimiter);
    let input_encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let output_encoding = io_utils::resolve_encoding(args.output_encoding.as_deref())?;

    let rules = RuleSet::load(&args.rules)
        .with_context(|| format!("Loading rules from {:?}", args.rules))?;

    let mut input = io_utils::CsvInput::open(&args.input, input_delimiter, input_encoding)?;
    let positions = rules
        .column_positions(input.headers())
        .context("Validating input headers against rules")?;

    let output_delimiter = io_utils::resolve_output_delimiter(
        args.output.as_deref(),
        args.output_delimiter,
        input_delimiter,
    );
    let mut writer =
        io_utils::open_csv_writer(args.output.as_deref(), output_delimiter, output_encoding)?;
    writer
        .write_record(rules.output_headers())
        .context("Writing output headers")?;

    let mut fallbacks = vec![0usize; rules.columns.len()];
    let mut rows = 0usize;
    for row in input.rows() {
        if args.limit.is_some_and(|limit| rows >= limit) {
            break;
        }
        let row = row?;
        let resolved = rules.resolve_row(&positions, &row);
        for (count, resolution) in fallbacks.iter_mut().zip(&resolved) {
            if resolution.fallback {
                *count += 1;
            }
        }
        writer
            .write_record(resolved.iter().map(|r| r.value.as_display()))
            .with_context(|| format!("Writing output row {}", rows + 2))?;
        rows += 1;
    }
    writer.flush().context("Flushing output writer")?;

    for (column, count) in rules.columns.iter().zip(&fallbacks) {
        if *count > 0 {
            debug!(
                "Column '{}' ({}) fell back to its default in {} row(s)",
                column.name, column.resolver, count
            );
        }
    }
    let destination = args
        .output
        .as_ref()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "stdout".to_string());
    info!(
        "Normalized {} column(s) across {} row(s) with {} fallback value(s) -> {}",
        rules.columns.len(),
        rows,
        fallbacks.iter().sum::<usize>(),
        destination
    );
    Ok(())
}
