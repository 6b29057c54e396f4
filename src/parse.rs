//! Line parser for MARBL diagnostics declaration files.
//!
//! Each non-blank line has the form `NAME : freq_op[, freq_op, ...]`.
//! MOM uses the same format for its ecosystem-based diagnostics, so the
//! grammar here must stay in sync with what MARBL_generate_diagnostics_file
//! emits.

use anyhow::{anyhow, bail, Result};
use std::fmt;
use std::str::FromStr;

/// Output-frequency tier a variable can be assigned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Frequency {
    Low,
    Medium,
    High,
    Never,
}

impl Frequency {
    pub fn as_str(self) -> &'static str {
        match self {
            Frequency::Low => "low",
            Frequency::Medium => "medium",
            Frequency::High => "high",
            Frequency::Never => "never",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "low" => Ok(Frequency::Low),
            "medium" => Ok(Frequency::Medium),
            "high" => Ok(Frequency::High),
            "never" => Ok(Frequency::Never),
            other => Err(anyhow!("unrecognized output frequency '{other}'")),
        }
    }
}

/// One parsed declaration line.
///
/// Operators are recorded alongside their frequencies but carry no semantics
/// in the diag table today; they are validated for shape and retained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub name: String,
    pub frequencies: Vec<Frequency>,
    pub operators: Vec<String>,
}

/// Parse one raw line into a declaration.
///
/// Returns `Ok(None)` for lines that are empty after comment stripping.
/// Malformed lines are errors; callers treat them as fatal.
pub fn parse_line(raw: &str) -> Result<Option<Declaration>> {
    let line = match raw.find('#') {
        Some(idx) => &raw[..idx],
        None => raw,
    };
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let parts: Vec<&str> = line.split(':').collect();
    if parts.len() != 2 {
        bail!("cannot determine variable name from line: '{raw}'");
    }
    let name = parts[0].trim();

    let mut frequencies = Vec::new();
    let mut operators = Vec::new();
    for entry in parts[1].split(',') {
        let freq_op: Vec<&str> = entry.trim().split('_').collect();
        if freq_op.len() != 2 {
            bail!("cannot determine frequency and operator from entry: '{entry}'");
        }
        frequencies.push(freq_op[0].parse()?);
        operators.push(freq_op[1].to_string());
    }

    Ok(Some(Declaration {
        name: name.to_string(),
        frequencies,
        operators,
    }))
}
