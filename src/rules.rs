//! Rules files: which resolver normalizes which source column.
//!
//! A rules file is the YAML counterpart of a normalizing `SELECT`: one entry
//! per output column, naming the source column, its resolver and an optional
//! output name.

use std::{collections::HashSet, fs::File, io::BufReader, path::Path};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    data::RawCell,
    resolver::{Resolution, Resolver},
    sql,
};

pub const CURRENT_RULES_VERSION: &str = "1.0.0";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RuleError {
    #[error("Rules file does not define any columns")]
    NoColumns,
    #[error("Rule at position {position} has an empty column name")]
    EmptyName { position: usize },
    #[error("Output column '{name}' is produced by more than one rule")]
    DuplicateOutput { name: String },
    #[error("Column '{name}' not found in input headers")]
    MissingColumn { name: String },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ColumnRule {
    pub name: String,
    pub resolver: Resolver,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        rename = "name_mapping"
    )]
    pub rename: Option<String>,
}

impl ColumnRule {
    pub fn new(name: impl Into<String>, resolver: Resolver) -> Self {
        Self {
            name: name.into(),
            resolver,
            rename: None,
        }
    }

    pub fn with_rename(mut self, rename: impl Into<String>) -> Self {
        self.rename = Some(rename.into());
        self
    }

    pub fn output_name(&self) -> &str {
        self.rename
            .as_deref()
            .filter(|value| !value.is_empty())
            .unwrap_or(&self.name)
    }

    pub fn render_sql(&self) -> String {
        self.resolver
            .render_sql(&sql::quote_identifier(&self.name))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RuleSet {
    pub columns: Vec<ColumnRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_version: Option<String>,
}

impl RuleSet {
    pub fn new(columns: Vec<ColumnRule>) -> Self {
        Self {
            columns,
            schema_version: Some(CURRENT_RULES_VERSION.to_string()),
        }
    }

    pub fn validate(&self) -> Result<(), RuleError> {
        if self.columns.is_empty() {
            return Err(RuleError::NoColumns);
        }
        let mut seen = HashSet::with_capacity(self.columns.len());
        for (idx, column) in self.columns.iter().enumerate() {
            if column.name.trim().is_empty() {
                return Err(RuleError::EmptyName { position: idx + 1 });
            }
            let output = column.output_name();
            if !seen.insert(output.to_ascii_lowercase()) {
                return Err(RuleError::DuplicateOutput {
                    name: output.to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn output_headers(&self) -> Vec<String> {
        self.columns
            .iter()
            .map(|c| c.output_name().to_string())
            .collect()
    }

    /// Position of each rule's source column within `headers`.
    pub fn column_positions(&self, headers: &[String]) -> Result<Vec<usize>, RuleError> {
        self.columns
            .iter()
            .map(|column| {
                headers
                    .iter()
                    .position(|header| header == &column.name)
                    .ok_or_else(|| RuleError::MissingColumn {
                        name: column.name.clone(),
                    })
            })
            .collect()
    }

    /// Resolves one row, given the positions from [`RuleSet::column_positions`].
    pub fn resolve_row(&self, positions: &[usize], row: &[String]) -> Vec<Resolution> {
        self.columns
            .iter()
            .zip(positions)
            .map(|(column, &idx)| {
                let cell = row
                    .get(idx)
                    .map(|value| RawCell::from(value.as_str()))
                    .unwrap_or_default();
                column.resolver.explain(&cell)
            })
            .collect()
    }

    pub fn select_statement(&self, source: &str) -> String {
        sql::select_statement(
            self.columns
                .iter()
                .map(|column| (column.render_sql(), column.output_name())),
            source,
        )
    }

    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("Opening rules file {path:?}"))?;
        let reader = BufReader::new(file);
        let rules: RuleSet = serde_yaml::from_reader(reader).context("Parsing rules YAML")?;
        rules
            .validate()
            .with_context(|| format!("Validating rules file {path:?}"))?;
        Ok(rules)
    }

    pub fn from_yaml_str(input: &str) -> Result<Self> {
        let rules: RuleSet = serde_yaml::from_str(input).context("Parsing rules YAML")?;
        rules.validate()?;
        Ok(rules)
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        self.validate()?;
        serde_yaml::to_string(&self.versioned()).context("Serializing rules to YAML string")
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        self.validate()?;
        let file = File::create(path).with_context(|| format!("Creating rules file {path:?}"))?;
        serde_yaml::to_writer(file, &self.versioned()).context("Writing rules YAML")
    }

    fn versioned(&self) -> RuleSet {
        let mut rules = self.clone();
        if rules.schema_version.is_none() {
            rules.schema_version = Some(CURRENT_RULES_VERSION.to_string());
        }
        rules
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Value;

    fn sample_rules() -> RuleSet {
        RuleSet::new(vec![
            ColumnRule::new("ORDER DT", Resolver::Date).with_rename("order_dt"),
            ColumnRule::new("amount", Resolver::Decimal),
        ])
    }

    #[test]
    fn validate_rejects_duplicate_outputs() {
        let rules = RuleSet::new(vec![
            ColumnRule::new("a", Resolver::Text).with_rename("Value"),
            ColumnRule::new("b", Resolver::Integer).with_rename("value"),
        ]);
        assert_eq!(
            rules.validate(),
            Err(RuleError::DuplicateOutput {
                name: "value".to_string()
            })
        );
        assert_eq!(RuleSet::new(Vec::new()).validate(), Err(RuleError::NoColumns));
        let blank = RuleSet::new(vec![ColumnRule::new(" ", Resolver::Text)]);
        assert_eq!(blank.validate(), Err(RuleError::EmptyName { position: 1 }));
    }

    #[test]
    fn yaml_uses_name_mapping_and_canonical_resolvers() {
        let yaml = sample_rules().to_yaml_string().unwrap();
        assert!(yaml.contains("name_mapping: order_dt"));
        assert!(yaml.contains("resolver: decimal"));
        assert!(yaml.contains("schema_version: 1.0.0"));
        let parsed = RuleSet::from_yaml_str(&yaml).unwrap();
        assert_eq!(parsed, sample_rules());
    }

    #[test]
    fn yaml_accepts_resolver_aliases() {
        let yaml = "columns:\n  - name: qty\n    resolver: safe_int\n  - name: at\n    resolver: safe_sas_datetime\n";
        let parsed = RuleSet::from_yaml_str(yaml).unwrap();
        assert_eq!(parsed.columns[0].resolver, Resolver::Integer);
        assert_eq!(parsed.columns[1].resolver, Resolver::DateTime);
        assert_eq!(parsed.schema_version, None);
    }

    #[test]
    fn unknown_resolver_fails_to_parse() {
        let yaml = "columns:\n  - name: qty\n    resolver: money\n";
        let err = RuleSet::from_yaml_str(yaml).unwrap_err();
        assert!(format!("{err:#}").contains("Unknown resolver 'money'"));
    }

    #[test]
    fn column_positions_report_missing_columns() {
        let rules = sample_rules();
        let headers = vec!["amount".to_string(), "ORDER DT".to_string()];
        assert_eq!(rules.column_positions(&headers).unwrap(), vec![1, 0]);
        let missing = vec!["amount".to_string()];
        assert_eq!(
            rules.column_positions(&missing),
            Err(RuleError::MissingColumn {
                name: "ORDER DT".to_string()
            })
        );
    }

    #[test]
    fn resolve_row_applies_each_rule() {
        let rules = sample_rules();
        let row = vec!["1,234.50".to_string(), "20240305".to_string()];
        let resolved = rules.resolve_row(&[1, 0], &row);
        assert_eq!(resolved[0].value.as_display(), "2024-03-05");
        assert_eq!(resolved[1].value.as_display(), "1234.50");
        assert!(!resolved[1].fallback);

        let short_row = vec!["x".to_string()];
        let resolved = rules.resolve_row(&[1, 0], &short_row);
        assert_eq!(resolved[0].value.as_display(), "1900-01-01");
        assert_eq!(resolved[1].value, Value::Decimal(None));
    }

    #[test]
    fn select_statement_quotes_and_aliases() {
        let sql = sample_rules().select_statement("raw.orders");
        assert!(sql.starts_with("SELECT\n  COALESCE("));
        assert!(sql.contains("SAFE_CAST(`ORDER DT` AS STRING)"));
        assert!(sql.contains("AS order_dt,\n"));
        assert!(sql.contains("AS NUMERIC) AS amount\nFROM raw.orders"));
    }
}
