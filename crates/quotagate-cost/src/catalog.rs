// SPDX-FileCopyrightText: 2026 Quotagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Model price catalog.
//!
//! The catalog is built once at startup from a CSV source with the columns
//! `model, version, input, cached_input, output` (header row required).
//! Rates are USD per million tokens. Each row is stored under its `model`
//! name and, when present and different, again under its dated `version`
//! string, so lookups can match either form.
//!
//! Malformed rows are skipped with a warning. The load only fails when the
//! source cannot be read or holds fewer than a header plus one data row.

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use quotagate_core::QuotaError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

/// Catalog key reported for the fallback entry.
pub const DEFAULT_PRICING_KEY: &str = "default";

/// Fallback input rate (USD per million tokens) for unpriced models.
pub const DEFAULT_INPUT_PER_MTOK: f64 = 30.0;

/// Fallback output rate (USD per million tokens) for unpriced models.
pub const DEFAULT_OUTPUT_PER_MTOK: f64 = 60.0;

/// Minimum number of fields a data row must carry.
const REQUIRED_FIELDS: usize = 5;

/// Price rates for one model, in USD per million tokens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceEntry {
    /// Generic model name from the `model` column.
    pub model: String,
    /// Dated release string from the `version` column (may be empty).
    #[serde(default)]
    pub version: String,
    /// Price per million prompt tokens.
    pub input: f64,
    /// Price per million cached prompt tokens. Informational only.
    #[serde(default)]
    pub cached_input: f64,
    /// Price per million completion tokens.
    pub output: f64,
}

impl PriceEntry {
    /// Create an entry with no version and no cached-input rate.
    pub fn new(model: impl Into<String>, input: f64, output: f64) -> Self {
        Self {
            model: model.into(),
            version: String::new(),
            input,
            cached_input: 0.0,
            output,
        }
    }

    /// The conservative entry used when no catalog key matches.
    pub fn fallback(input: f64, output: f64) -> Self {
        Self::new(DEFAULT_PRICING_KEY, input, output)
    }
}

/// Why a single CSV row was skipped.
#[derive(Debug, Error, PartialEq)]
enum RowError {
    #[error("incomplete row with {0} fields")]
    Incomplete(usize),
    #[error("empty model name")]
    EmptyModel,
    #[error("invalid {field} price `{value}` for model {model}")]
    InvalidRate {
        field: &'static str,
        value: String,
        model: String,
    },
}

/// Immutable mapping from catalog key to [`PriceEntry`].
///
/// Lookups go through [`PriceCatalog::resolve`]: exact key first, then the
/// first key that is a prefix of the requested model, then the fallback
/// entry. When several keys are prefixes of the same model, which one wins
/// is unspecified.
#[derive(Debug, Clone)]
pub struct PriceCatalog {
    entries: HashMap<String, PriceEntry>,
    fallback: PriceEntry,
}

impl Default for PriceCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl PriceCatalog {
    /// An empty catalog; every lookup resolves to the fallback entry.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            fallback: PriceEntry::fallback(DEFAULT_INPUT_PER_MTOK, DEFAULT_OUTPUT_PER_MTOK),
        }
    }

    /// Replace the fallback rates used for unmatched models.
    pub fn with_fallback_rates(mut self, input: f64, output: f64) -> Self {
        self.fallback = PriceEntry::fallback(input, output);
        self
    }

    /// Build a catalog from entries, keyed by each entry's `model` and `version`.
    pub fn from_entries(entries: impl IntoIterator<Item = PriceEntry>) -> Self {
        let mut catalog = Self::new();
        for entry in entries {
            catalog.insert_row(entry);
        }
        catalog
    }

    /// Load a catalog from a CSV file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, QuotaError> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| QuotaError::Pricing {
            message: format!("cannot open pricing file {}: {e}", path.display()),
            source: Some(Box::new(e)),
        })?;
        Self::from_reader(file)
    }

    /// Load a catalog from any CSV byte source.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, QuotaError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let records = csv_reader
            .records()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| QuotaError::Pricing {
                message: format!("error reading CSV: {e}"),
                source: Some(Box::new(e)),
            })?;

        if records.len() < 2 {
            return Err(QuotaError::Pricing {
                message: "CSV file must contain at least header and one data row".to_string(),
                source: None,
            });
        }

        let mut catalog = Self::new();
        // Row 0 is the header.
        for (index, record) in records.iter().enumerate().skip(1) {
            match parse_row(record) {
                Ok(entry) => catalog.insert_row(entry),
                Err(e) => warn!(line = index + 1, error = %e, "skipping pricing row"),
            }
        }

        info!(models = catalog.len(), "loaded model pricing");
        Ok(catalog)
    }

    fn insert_row(&mut self, entry: PriceEntry) {
        if !entry.version.is_empty() && entry.version != entry.model {
            self.entries.insert(entry.version.clone(), entry.clone());
        }
        self.entries.insert(entry.model.clone(), entry);
    }

    /// Resolve a model identifier to its price entry.
    ///
    /// Returns the entry and whether it came from the catalog (`true`) or is
    /// the fallback (`false`).
    pub fn resolve(&self, model: &str) -> (&PriceEntry, bool) {
        if let Some(entry) = self.entries.get(model) {
            return (entry, true);
        }

        // e.g. gpt-4o-2024-08-06 -> gpt-4o
        if let Some(entry) = self
            .entries
            .iter()
            .find(|(key, _)| model.starts_with(key.as_str()))
            .map(|(_, entry)| entry)
        {
            return (entry, true);
        }

        (&self.fallback, false)
    }

    /// The entry used for models with no matching key.
    pub fn fallback(&self) -> &PriceEntry {
        &self.fallback
    }

    /// All catalog keys, sorted.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }

    /// The full key -> entry mapping.
    pub fn entries(&self) -> &HashMap<String, PriceEntry> {
        &self.entries
    }

    /// Number of catalog keys (versioned keys count separately).
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn parse_row(record: &csv::StringRecord) -> Result<PriceEntry, RowError> {
    if record.len() < REQUIRED_FIELDS {
        return Err(RowError::Incomplete(record.len()));
    }

    let model = &record[0];
    if model.is_empty() {
        return Err(RowError::EmptyModel);
    }
    let rate = |field: &'static str, value: &str| {
        parse_rate(value).ok_or_else(|| RowError::InvalidRate {
            field,
            value: value.to_string(),
            model: model.to_string(),
        })
    };

    let input = rate("input", &record[2])?;
    // Optional: an empty or broken cached_input never fails the row.
    let cached_input = parse_rate(&record[3]).unwrap_or(0.0);
    let output = rate("output", &record[4])?;

    Ok(PriceEntry {
        model: model.to_string(),
        version: record[1].to_string(),
        input,
        cached_input,
        output,
    })
}

/// Parse a per-million-token rate. Empty means zero.
fn parse_rate(value: &str) -> Option<f64> {
    if value.is_empty() {
        return Some(0.0);
    }
    value
        .parse::<f64>()
        .ok()
        .filter(|rate| rate.is_finite() && *rate >= 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const HEADER: &str = "model,version,input,cached_input,output\n";

    fn load_str(content: &str) -> Result<PriceCatalog, QuotaError> {
        PriceCatalog::from_reader(content.as_bytes())
    }

    fn test_catalog() -> PriceCatalog {
        PriceCatalog::from_entries([
            PriceEntry::new("gpt-4o", 2.5, 10.0),
            PriceEntry::new("gpt-4o-mini", 0.15, 0.6),
            PriceEntry::new("gpt-4.1", 2.0, 8.0),
            PriceEntry::new("o3", 2.0, 8.0),
            PriceEntry::new("o4-mini", 1.1, 4.4),
            PriceEntry::new("gpt-3.5-turbo", 0.5, 1.5),
        ])
    }

    #[test]
    fn valid_csv_yields_generic_and_versioned_keys() {
        let catalog = load_str(
            "model,version,input,cached_input,output\n\
             gpt-4o,gpt-4o-2024-08-06,2.5,1.25,10.0\n\
             gpt-4o-mini,gpt-4o-mini-2024-07-18,0.15,0.075,0.6\n",
        )
        .unwrap();
        assert_eq!(catalog.len(), 4);
        assert_eq!(
            catalog.keys(),
            vec![
                "gpt-4o",
                "gpt-4o-2024-08-06",
                "gpt-4o-mini",
                "gpt-4o-mini-2024-07-18"
            ]
        );
        let versioned = &catalog.entries()["gpt-4o-2024-08-06"];
        assert_eq!(versioned, &catalog.entries()["gpt-4o"]);
        assert!((versioned.cached_input - 1.25).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_cached_input_defaults_to_zero() {
        let catalog = load_str(&format!("{HEADER}gpt-4o,gpt-4o-2024-08-06,2.5,,10.0\n")).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.entries()["gpt-4o"].cached_input, 0.0);
    }

    #[test]
    fn unparsable_cached_input_defaults_to_zero() {
        let catalog = load_str(&format!("{HEADER}gpt-4o,,2.5,n/a,10.0\n")).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.entries()["gpt-4o"].cached_input, 0.0);
    }

    #[test]
    fn invalid_input_price_skips_the_row() {
        let catalog =
            load_str(&format!("{HEADER}gpt-4o,gpt-4o-2024-08-06,invalid,1.25,10.0\n")).unwrap();
        assert!(catalog.is_empty());
    }

    #[test]
    fn invalid_output_price_skips_only_that_row() {
        let catalog = load_str(&format!(
            "{HEADER}gpt-4o,,2.5,,oops\ngpt-4.1,gpt-4.1-2025-04-14,2.0,0.5,8.0\n"
        ))
        .unwrap();
        assert_eq!(catalog.keys(), vec!["gpt-4.1", "gpt-4.1-2025-04-14"]);
    }

    #[test]
    fn negative_rate_skips_the_row() {
        let catalog = load_str(&format!("{HEADER}gpt-4o,,-2.5,,10.0\n")).unwrap();
        assert!(catalog.is_empty());
    }

    #[test]
    fn incomplete_row_is_skipped() {
        let catalog = load_str(&format!(
            "{HEADER}gpt-4o,gpt-4o-2024-08-06\no3,o3-2025-04-16,2.0,0.5,8.0\n"
        ))
        .unwrap();
        assert_eq!(catalog.keys(), vec!["o3", "o3-2025-04-16"]);
    }

    #[test]
    fn all_rows_invalid_yields_empty_catalog() {
        let catalog = load_str(&format!("{HEADER}gpt-4o,gpt-4o-2024-08-06\n")).unwrap();
        assert_eq!(catalog.len(), 0);
    }

    #[test]
    fn version_equal_to_model_inserts_once() {
        let catalog = load_str(&format!("{HEADER}o3,o3,2.0,,8.0\n")).unwrap();
        assert_eq!(catalog.len(), 1);
    }

    #[test]
    fn empty_source_is_an_error() {
        let err = load_str("").unwrap_err();
        assert!(matches!(err, QuotaError::Pricing { .. }));
    }

    #[test]
    fn header_without_data_is_an_error() {
        let err = load_str(HEADER).unwrap_err();
        assert!(err.to_string().contains("at least header and one data row"));
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = PriceCatalog::load(dir.path().join("nope.csv")).unwrap_err();
        assert!(err.to_string().contains("cannot open pricing file"));
    }

    #[test]
    fn load_reads_file_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{HEADER}gpt-4o,gpt-4o-2024-08-06,2.5,1.25,10.0\n").unwrap();
        let catalog = PriceCatalog::load(file.path()).unwrap();
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn exact_match_is_found() {
        let catalog = test_catalog();
        let (entry, matched) = catalog.resolve("gpt-4o-mini");
        assert!(matched);
        assert_eq!(entry.model, "gpt-4o-mini");
    }

    #[test]
    fn exact_match_wins_over_prefix() {
        // "gpt-4o" is a prefix of "gpt-4o-mini", but the exact key must win.
        let catalog = test_catalog();
        for _ in 0..32 {
            let (entry, _) = catalog.resolve("gpt-4o-mini");
            assert!((entry.input - 0.15).abs() < f64::EPSILON);
        }
    }

    #[test]
    fn prefix_match_for_dated_model() {
        let catalog = test_catalog();
        let (entry, matched) = catalog.resolve("gpt-3.5-turbo-0125");
        assert!(matched);
        assert_eq!(entry.model, "gpt-3.5-turbo");
    }

    #[test]
    fn ambiguous_prefix_still_matches() {
        let catalog = test_catalog();
        let (entry, matched) = catalog.resolve("gpt-4o-mini-2024-07-18");
        assert!(matched);
        assert!(entry.model == "gpt-4o" || entry.model == "gpt-4o-mini");
    }

    #[test]
    fn unknown_model_gets_fallback() {
        let catalog = test_catalog();
        let (entry, matched) = catalog.resolve("nonexistent-model-12345");
        assert!(!matched);
        assert_eq!(entry.model, DEFAULT_PRICING_KEY);
        assert_eq!(entry.input, DEFAULT_INPUT_PER_MTOK);
        assert_eq!(entry.output, DEFAULT_OUTPUT_PER_MTOK);
    }

    #[test]
    fn fallback_rates_are_configurable() {
        let catalog = PriceCatalog::new().with_fallback_rates(1.0, 2.0);
        let (entry, matched) = catalog.resolve("anything");
        assert!(!matched);
        assert_eq!((entry.input, entry.output), (1.0, 2.0));
    }

    #[test]
    fn resolve_is_idempotent() {
        let catalog = test_catalog();
        for model in ["gpt-4o", "o3-mini", "claude-3", "gpt-4.1-nano"] {
            let first = catalog.resolve(model);
            let second = catalog.resolve(model);
            assert_eq!(first, second);
        }
    }

    #[test]
    fn entry_serializes_with_csv_column_names() {
        let entry = PriceEntry {
            model: "gpt-4o".into(),
            version: "gpt-4o-2024-08-06".into(),
            input: 2.5,
            cached_input: 1.25,
            output: 10.0,
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["model"], "gpt-4o");
        assert_eq!(json["version"], "gpt-4o-2024-08-06");
        assert_eq!(json["cached_input"], 1.25);
    }

    #[test]
    fn row_errors_describe_the_problem() {
        let record = csv::StringRecord::from(vec!["gpt-4o", "", "abc", "", "1"]);
        let err = parse_row(&record).unwrap_err();
        assert_eq!(
            err,
            RowError::InvalidRate {
                field: "input",
                value: "abc".into(),
                model: "gpt-4o".into(),
            }
        );
        assert_eq!(
            parse_row(&csv::StringRecord::from(vec!["gpt-4o"])).unwrap_err(),
            RowError::Incomplete(1)
        );
    }

    #[test]
    fn parse_rate_cases() {
        assert_eq!(parse_rate("2.5"), Some(2.5));
        assert_eq!(parse_rate("0"), Some(0.0));
        assert_eq!(parse_rate(""), Some(0.0));
        assert_eq!(parse_rate("10.123456"), Some(10.123456));
        assert_eq!(parse_rate("invalid"), None);
        assert_eq!(parse_rate("NaN"), None);
        assert_eq!(parse_rate("-1"), None);
    }
}
