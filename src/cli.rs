//! CLI argument parsing.
//!
//! The flag surface mirrors the scripts that drive this tool from the CESM
//! build, including the legacy per-tier stream assignments, so existing
//! invocations keep working.

use crate::table::VertGrid;
use clap::Parser;
use std::path::PathBuf;

/// Generate a MOM6 diag table extension from a MARBL diagnostics file.
#[derive(Parser, Debug)]
#[command(name = "marbl2diag", version, about)]
pub struct Args {
    /// File generated by MARBL_generate_diagnostics_file
    #[arg(short = 'i', long, value_name = "PATH")]
    pub ecosys_diagnostics_in: PathBuf,

    /// Location of diag table (JSON) file to create
    #[arg(short = 't', long, value_name = "PATH")]
    pub diag_table_out: PathBuf,

    /// Stream to put low frequency output into (legacy, unused)
    #[arg(short = 'l', long, value_name = "N", default_value_t = 0)]
    pub low_frequency_stream: i32,

    /// Stream to put medium frequency output into (legacy, unused)
    #[arg(short = 'm', long, value_name = "N", default_value_t = 0)]
    pub medium_frequency_stream: i32,

    /// Stream to put high frequency output into (legacy, unused)
    #[arg(short = 'g', long, value_name = "N", default_value_t = 0)]
    pub high_frequency_stream: i32,

    /// BGC history output grid
    #[arg(short = 'v', long, value_enum, default_value_t = VertGrid::Native)]
    pub vert_grid: VertGrid,

    /// Put all MARBL diagnostics in the medium-frequency stream
    #[arg(long)]
    pub output_all: bool,

    /// Include ALT_CO2 diagnostics in the streams
    #[arg(long)]
    pub output_alt_co2: bool,

    /// File listing variables to treat as 2D, one name per line
    #[arg(long, value_name = "PATH")]
    pub two_dim_vars: Option<PathBuf>,
}
