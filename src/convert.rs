//! Top-level conversion from a diagnostics declaration file to a diag table.

use crate::parse::{parse_line, Frequency};
use crate::table::{DiagTable, VertGrid};
use anyhow::{bail, Context, Result};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

/// Marker on alternate-chemistry diagnostics; excluded unless requested.
const ALT_CO2_MARKER: &str = "ALT_CO2";

/// Convert a MARBL diagnostics file into a diag table extension at `output`.
///
/// `two_dim_vars` names the variables to treat as 2D; everything else is 3D.
/// Fatal conditions (missing input, malformed line, duplicate declaration)
/// surface as errors with no output written. An input that selects no
/// variables at all is not an error; no file is produced.
pub fn diagnostics_to_diag_table(
    input: &Path,
    output: &Path,
    two_dim_vars: &BTreeSet<String>,
    vert_grid: VertGrid,
    output_all: bool,
    output_alt_co2: bool,
) -> Result<()> {
    if !input.is_file() {
        bail!("diagnostics file not found: {}", input.display());
    }
    let content = std::fs::read_to_string(input)
        .with_context(|| format!("read {}", input.display()))?;

    let mut table = DiagTable::new(vert_grid);
    let mut processed: BTreeMap<Frequency, BTreeSet<String>> = BTreeMap::new();

    for line in content.lines() {
        let Some(decl) = parse_line(line)? else {
            continue;
        };
        if !output_alt_co2 && decl.name.contains(ALT_CO2_MARKER) {
            continue;
        }

        // A variable may only be requested once per frequency across the
        // whole file.
        for freq in &decl.frequencies {
            let seen = processed.entry(*freq).or_default();
            if !seen.insert(decl.name.clone()) {
                bail!(
                    "{} appears in {} with frequency {freq} multiple times",
                    decl.name,
                    input.display()
                );
            }
        }

        let is_2d = two_dim_vars.contains(&decl.name);
        table.update(&decl.name, &decl.frequencies, is_2d, output_all, vert_grid)?;
    }

    table.dump(output)
}

/// Load the 2D-variable set from a file of one name per line.
///
/// Uses the same comment and blank-line conventions as the diagnostics file.
pub fn load_two_dim_vars(path: &Path) -> Result<BTreeSet<String>> {
    let content =
        std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let mut names = BTreeSet::new();
    for line in content.lines() {
        let name = match line.find('#') {
            Some(idx) => &line[..idx],
            None => line,
        };
        let name = name.trim();
        if !name.is_empty() {
            names.insert(name.to_string());
        }
    }
    Ok(names)
}
