//! Acceptance-run sweeper for stackcheck.
//!
//! This binary deletes any provider resources created for a single
//! acceptance run (images tagged `acc-run=<STACKCHECK_RUN_ID>` and the
//! builder instance named after the run) and then verifies the set is
//! empty.

use clap::Parser;
use stackcheck::cli::Cli;
use stackcheck::sweep::{SweepConfig, Sweeper};
use std::io::Write as _;

fn main() -> Result<(), String> {
    let cli = Cli::parse();
    let config = SweepConfig::new(cli.project_id, cli.run_id, cli.provider_bin)
        .map_err(|err| err.to_string())?;
    let sweeper = Sweeper::with_process_runner(config);
    let summary = sweeper.sweep().map_err(|err| err.to_string())?;
    writeln!(
        std::io::stdout(),
        "sweep complete: deleted_images={}, deleted_instances={}",
        summary.deleted_images,
        summary.deleted_instances
    )
    .map_err(|err| err.to_string())?;
    Ok(())
}
