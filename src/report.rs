//! Writes a solved blend as a fixed-width text table.
//!
//! ```text
//! Ingrediente              Cantidad (kg)  Costo Total ($)
//! Semillas de trigo        626.04         $3881.45
//! ...
//!
//!
//!
//! Funcion Objetivo ($)                    $14105.27
//! ```
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use fnv::FnvHashMap as HashMap;
use tracing::info;

use crate::error::{Error, Result};
use crate::solve::{round2, Blend, SolveOutcome};
use crate::table::CoefficientTable;

/// Display names, keyed by normalized ingredient name
pub type Labels = HashMap<String, String>;

const NAME_WIDTH: usize = 25;
const VALUE_WIDTH: usize = 15;

/// Labels of the reference ingredients
pub fn default_labels() -> Labels {
    [
        ("trigo", "Semillas de trigo"),
        ("sandia", "Semillas de sandia"),
        ("calabaza", "Semillas de calabaza"),
        ("estofado", "Estofado sospechoso"),
    ]
    .into_iter()
    .map(|(name, label)| (name.to_string(), label.to_string()))
    .collect()
}

/// The label of `name`, or `name` itself when it has none
pub fn label<'a>(labels: &'a Labels, name: &'a str) -> &'a str {
    labels.get(name).map(String::as_str).unwrap_or(name)
}

/// The blend of a successful outcome, or [Error::NoSolution]
pub fn require_blend(outcome: &SolveOutcome) -> Result<&Blend> {
    match outcome {
        SolveOutcome::Optimal(blend) => Ok(blend),
        SolveOutcome::Failed(failure) => Err(Error::NoSolution {
            reason: format!("{}: {}", failure.kind, failure.message),
        }),
    }
}

/// Render the result table into `writer`. Nothing is written for a failed outcome.
pub fn write_to<W: Write>(
    mut writer: W,
    table: &CoefficientTable,
    outcome: &SolveOutcome,
    labels: &Labels,
) -> Result<()> {
    let blend = require_blend(outcome)?;
    writeln!(
        writer,
        "{:<NAME_WIDTH$}{:<VALUE_WIDTH$}{:<VALUE_WIDTH$}",
        "Ingrediente", "Cantidad (kg)", "Costo Total ($)"
    )?;
    let rows = table
        .iter()
        .zip(&blend.quantities)
        .zip(&blend.exact_quantities);
    for ((ingredient, quantity), exact) in rows {
        writeln!(
            writer,
            "{:<NAME_WIDTH$}{:<VALUE_WIDTH$}{:<VALUE_WIDTH$}",
            label(labels, &ingredient.name),
            format!("{:.2}", quantity),
            format!("${:.2}", round2(exact * ingredient.cost)),
        )?;
    }
    writeln!(writer, "\n\n")?;
    writeln!(
        writer,
        "{:<NAME_WIDTH$}{:<VALUE_WIDTH$}{:<VALUE_WIDTH$}",
        "Funcion Objetivo ($)",
        "",
        format!("${:.2}", blend.total_cost)
    )?;
    writer.flush()?;
    Ok(())
}

/// Write the result table to `path`, creating parent directories as needed.
///
/// A failed outcome returns [Error::NoSolution] before the file is created.
pub fn write_file(
    path: impl AsRef<Path>,
    table: &CoefficientTable,
    outcome: &SolveOutcome,
    labels: &Labels,
) -> Result<()> {
    let path = path.as_ref();
    require_blend(outcome)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    write_to(BufWriter::new(File::create(path)?), table, outcome, labels)?;
    info!(path = %path.display(), "results saved");
    Ok(())
}
