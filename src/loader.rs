//! Reads a [CoefficientTable] from CSV.
//!
//! Columns are found by keyword rather than by exact header, so
//! `Costo ($/kg)` or `Protein %` are both accepted. Spanish and English
//! keywords are recognised.
use std::fs::File;
use std::io::Read;
use std::path::Path;

use fnv::FnvHashSet as HashSet;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::table::{normalize_name, Attribute, CoefficientTable, Ingredient};

/// Cell values treated as missing
pub const NA_VALUES: [&str; 6] = ["", " ", "NA", "N/A", "n/a", "na"];

const NAME_KEYWORDS: &[&str] = &["ingrediente", "ingredient"];

fn keywords(attribute: Attribute) -> &'static [&'static str] {
    match attribute {
        Attribute::Cost => &["costo", "cost"],
        Attribute::Protein => &["proteina", "proteína", "protein"],
        Attribute::Energy => &["energia", "energía", "energy"],
        Attribute::Calcium => &["calcio", "calcium"],
    }
}

/// Load and validate the table stored at `path`, which must name an existing `.csv` file.
pub fn load(path: impl AsRef<Path>) -> Result<CoefficientTable> {
    let path = path.as_ref();
    if path.extension().and_then(|e| e.to_str()) != Some("csv") {
        return Err(Error::invalid_input(format!(
            "the data path '{}' must end with '.csv'",
            path.display()
        )));
    }
    let table = load_from_reader(File::open(path)?)?;
    info!(path = %path.display(), ingredients = table.len(), "loaded coefficient table");
    Ok(table)
}

/// Load and validate a table from any CSV source
pub fn load_from_reader<R: Read>(reader: R) -> Result<CoefficientTable> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);
    let headers = reader.headers()?.clone();
    debug!(?headers, "csv headers");

    let name_column = find_column(&headers, NAME_KEYWORDS)?;
    let mut value_columns = [0; 4];
    for (slot, attribute) in value_columns.iter_mut().zip(Attribute::ALL) {
        *slot = find_column(&headers, keywords(attribute))?;
    }

    let mut seen = HashSet::default();
    let mut ingredients = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record?;
        let line = row + 2;
        let name = normalize_name(cell(&record, name_column, "ingredient", line)?);
        let mut values = [0.; 4];
        for ((value, &column), attribute) in
            values.iter_mut().zip(&value_columns).zip(Attribute::ALL)
        {
            *value = parse_number(cell(&record, column, attribute.column_name(), line)?)
                .ok_or_else(|| {
                    Error::invalid_input(format!(
                        "line {}: column '{}' does not hold a number",
                        line,
                        attribute.column_name()
                    ))
                })?;
        }
        if !seen.insert(name.clone()) {
            warn!(%name, line, "dropping duplicate ingredient");
            continue;
        }
        let [cost, protein, energy, calcium] = values;
        ingredients.push(Ingredient::new(name, cost, protein, energy, calcium));
    }
    CoefficientTable::validate(ingredients)
}

fn find_column(headers: &csv::StringRecord, keywords: &[&str]) -> Result<usize> {
    headers
        .iter()
        .position(|header| {
            let header = header.to_lowercase();
            keywords.iter().any(|k| header.contains(k))
        })
        .ok_or_else(|| {
            Error::invalid_input(format!(
                "no column matches '{}' in headers {:?}",
                keywords[0],
                headers.iter().collect::<Vec<_>>()
            ))
        })
}

fn cell<'r>(
    record: &'r csv::StringRecord,
    column: usize,
    what: &str,
    line: usize,
) -> Result<&'r str> {
    match record.get(column) {
        Some(value) if !is_missing(value) => Ok(value),
        _ => Err(Error::invalid_input(format!(
            "line {}: column '{}' contains a missing value",
            line, what
        ))),
    }
}

fn is_missing(value: &str) -> bool {
    NA_VALUES.contains(&value) || NA_VALUES.contains(&value.trim())
}

/// Parses `3.5`, ` 3,5 ` and `1e3`
fn parse_number(value: &str) -> Option<f64> {
    value.trim().replace(',', ".").parse().ok()
}
