use clap::Parser;
use colored::Colorize;
use mobdrive_cli::cli::Cli;
use mobdrive_cli::logging;

#[tokio::main]
async fn main() {
	let cli = Cli::parse();
	logging::init_logging(cli.verbose);

	match mobdrive_cli::run(cli).await {
		Ok(true) => {}
		Ok(false) => std::process::exit(1),
		Err(err) => {
			eprintln!("{} {err:#}", "error:".red().bold());
			std::process::exit(2);
		}
	}
}
