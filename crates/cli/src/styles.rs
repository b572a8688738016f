//! Help and summary styling.

use clap::builder::Styles;
use clap::builder::styling::AnsiColor;
use colored::{ColoredString, Colorize};
use mobdrive::hooks::TestState;

/// Cargo-like help colours: green bold headers, cyan literals and placeholders.
pub fn cli_styles() -> Styles {
	Styles::styled()
		.header(AnsiColor::Green.on_default().bold())
		.usage(AnsiColor::Green.on_default().bold())
		.literal(AnsiColor::Cyan.on_default())
		.placeholder(AnsiColor::Cyan.on_default())
		.valid(AnsiColor::Cyan.on_default())
}

/// Fixed-width status tag for a finished scenario.
pub fn status_tag(state: TestState) -> ColoredString {
	match state {
		TestState::Passed => "PASS".green().bold(),
		TestState::Failed => "FAIL".red().bold(),
		TestState::Idle | TestState::Running => "SKIP".yellow().bold(),
	}
}
