pub mod cli;
pub mod logging;
pub mod pages;
pub mod runner;
pub mod scenarios;
pub mod styles;

use std::sync::Arc;

use anyhow::{Context, Result};
use colored::Colorize;
use mobdrive::{ArtifactLayout, FsSink, SessionRegistry, TestConfig, WorkerId};
use mobdrive_runtime::DriverFactory;

use crate::cli::Cli;
use crate::runner::Runner;

/// Runs the command line; `Ok(false)` means at least one scenario failed.
pub async fn run(cli: Cli) -> Result<bool> {
	let selected = scenarios::select(&cli.only)?;

	if cli.list {
		for scenario in &selected {
			println!("{:<18} {}", scenario.name.cyan(), scenario.description);
		}
		return Ok(true);
	}

	let path = TestConfig::resolve_path(cli.config.as_deref());
	let config = TestConfig::load(&path).with_context(|| format!("loading {}", path.display()))?;
	let config = TestConfig::install(config).clone();

	let registry = SessionRegistry::new(DriverFactory::http()?, config.clone());
	let runner = Runner::new(
		registry,
		ArtifactLayout::from_config(&config),
		Arc::new(FsSink::cwd()),
		WorkerId::new(&cli.worker),
	)
	.with_recording(cli.record);

	let report = runner.run(&selected).await?;
	report.print_summary();
	Ok(report.all_passed())
}
