use std::path::PathBuf;

use clap::Parser;

use crate::styles::cli_styles;

#[derive(Parser, Debug)]
#[command(name = "mobdrive")]
#[command(about = "Run the mobile end-to-end scenarios against an Appium server")]
#[command(version)]
#[command(styles = cli_styles())]
pub struct Cli {
	/// Configuration file (defaults to $MOBDRIVE_CONFIG, then test-config.json)
	#[arg(short, long, value_name = "FILE")]
	pub config: Option<PathBuf>,

	/// Increase verbosity (-v info, -vv debug)
	#[arg(short, long, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// Record the screen for every scenario
	#[arg(long)]
	pub record: bool,

	/// Run only the named scenario (repeatable)
	#[arg(long, value_name = "NAME")]
	pub only: Vec<String>,

	/// List scenarios and exit
	#[arg(long)]
	pub list: bool,

	/// Worker name used to key the session
	#[arg(long, value_name = "NAME", default_value = "main")]
	pub worker: String,
}
