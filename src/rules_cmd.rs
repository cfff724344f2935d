use anyhow::{Context, Result};
use log::info;

use crate::{cli::RulesArgs, rules::RuleSet, table};

pub fn execute(args: &RulesArgs) -> Result<()> {
    let rules = RuleSet::load(&args.rules)
        .with_context(|| format!("Loading rules from {:?}", args.rules))?;

    let rows = rules
        .columns
        .iter()
        .enumerate()
        .map(|(idx, column)| {
            let output = column.output_name();
            vec![
                (idx + 1).to_string(),
                column.name.clone(),
                column.resolver.to_string(),
                if output != column.name {
                    output.to_string()
                } else {
                    String::new()
                },
            ]
        })
        .collect::<Vec<_>>();

    let headers = ["#", "name", "resolver", "output"].map(String::from);
    table::print_table(&headers, &rows);
    info!("Listed {} column(s) from {:?}", rules.columns.len(), args.rules);
    Ok(())
}
