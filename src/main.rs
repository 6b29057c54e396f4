use anyhow::Result;
use clap::Parser;
use marbl_diag_table::cli::Args;
use marbl_diag_table::convert;
use std::collections::BTreeSet;
use tracing_subscriber::filter::{EnvFilter, LevelFilter};

fn main() {
    init_tracing();
    if let Err(err) = run() {
        tracing::error!("{err:#}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = Args::parse();

    // Parsed for compatibility with the driving scripts; the template layout
    // no longer consumes stream indices.
    tracing::debug!(
        low = args.low_frequency_stream,
        medium = args.medium_frequency_stream,
        high = args.high_frequency_stream,
        "legacy stream assignments"
    );

    let two_dim_vars = match &args.two_dim_vars {
        Some(path) => convert::load_two_dim_vars(path)?,
        None => BTreeSet::new(),
    };

    convert::diagnostics_to_diag_table(
        &args.ecosys_diagnostics_in,
        &args.diag_table_out,
        &two_dim_vars,
        args.vert_grid,
        args.output_all,
        args.output_alt_co2,
    )
}

fn init_tracing() {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
