//! Suite runner: one session per worker, every scenario wrapped in hooks.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use colored::Colorize;
use mobdrive::{
	Actions, ArtifactLayout, ArtifactSink, DriverHandle, HookManager, Marker, PageContext, SessionRegistry, TestCase,
	TestInvocation, WaitOptions, WorkerId,
};
use tracing::{info, warn};

use crate::scenarios::{Scenario, ScenarioContext};
use crate::styles::status_tag;

pub struct Runner {
	registry: SessionRegistry,
	hooks: HookManager,
	layout: ArtifactLayout,
	sink: Arc<dyn ArtifactSink>,
	worker: WorkerId,
	record: bool,
	page_load: Option<WaitOptions>,
}

impl Runner {
	pub fn new(registry: SessionRegistry, layout: ArtifactLayout, sink: Arc<dyn ArtifactSink>, worker: WorkerId) -> Self {
		let hooks = HookManager::with_default_hooks(layout.clone(), sink.clone());
		Self {
			registry,
			hooks,
			layout,
			sink,
			worker,
			record: false,
			page_load: None,
		}
	}

	/// Record the screen for every scenario.
	pub fn with_recording(mut self, record: bool) -> Self {
		self.record = record;
		self
	}

	pub fn with_page_load(mut self, options: WaitOptions) -> Self {
		self.page_load = Some(options);
		self
	}

	pub fn registry(&self) -> &SessionRegistry {
		&self.registry
	}

	/// Opens the worker's session, runs `scenarios` in order and quits.
	///
	/// Only a session that cannot be started is an error; scenario failures
	/// and teardown problems end up in the report.
	pub async fn run(&self, scenarios: &[Scenario]) -> Result<SuiteReport> {
		let driver = self
			.registry
			.initialize(&self.worker)
			.await
			.with_context(|| format!("starting session for worker '{}'", self.worker))?;

		let mut report = SuiteReport::default();
		for scenario in scenarios {
			let test = self.test_case(scenario);
			let invocation = self
				.hooks
				.run(&driver, &test, |driver| async move {
					let ctx = self.scenario_context(driver);
					scenario.run(&ctx).await
				})
				.await;
			report.invocations.push(invocation);
		}

		if let Err(e) = self.registry.quit(&self.worker).await {
			warn!(target = "mobdrive_cli.runner", worker = %self.worker, error = %e, "session teardown failed");
			report.teardown_error = Some(e.to_string());
		}
		info!(
			target = "mobdrive_cli.runner",
			passed = report.passed(),
			failed = report.failed(),
			"suite finished"
		);
		Ok(report)
	}

	fn test_case(&self, scenario: &Scenario) -> TestCase {
		let test = TestCase::new(scenario.name).with_marker(Marker::ScreenshotOnFailure);
		if self.record {
			test.with_marker(Marker::RecordScreen)
		} else {
			test
		}
	}

	fn scenario_context(&self, driver: DriverHandle) -> ScenarioContext {
		let actions = Actions::new(driver.clone()).with_artifacts(self.layout.clone(), self.sink.clone());
		let mut pages = PageContext::new(driver).with_actions(actions);
		if let Some(options) = self.page_load {
			pages = pages.with_page_load(options);
		}
		ScenarioContext {
			pages,
			config: self.registry.config().clone(),
		}
	}
}

/// Outcome of one suite run.
#[derive(Debug, Default)]
pub struct SuiteReport {
	pub invocations: Vec<TestInvocation>,
	pub teardown_error: Option<String>,
}

impl SuiteReport {
	pub fn passed(&self) -> usize {
		self.invocations.iter().filter(|i| i.passed()).count()
	}

	pub fn failed(&self) -> usize {
		self.invocations.len() - self.passed()
	}

	/// Teardown errors are reported but never fail the suite.
	pub fn all_passed(&self) -> bool {
		self.invocations.iter().all(TestInvocation::passed)
	}

	pub fn print_summary(&self) {
		for invocation in &self.invocations {
			println!(
				"{} {} {}",
				status_tag(invocation.state),
				invocation.name,
				format_duration(invocation.duration).dimmed()
			);
			if let Some(reason) = &invocation.failure {
				println!("     {}", reason.red());
			}
			for path in &invocation.artifacts {
				println!("     {} {}", "artifact".cyan(), path.display());
			}
			for failure in &invocation.hook_failures {
				println!(
					"     {} {} ({:?}): {}",
					"hook".yellow(),
					failure.hook,
					failure.phase,
					failure.message
				);
			}
		}
		if let Some(error) = &self.teardown_error {
			println!("{} {}", "teardown:".yellow().bold(), error);
		}

		let totals = format!("{} passed, {} failed", self.passed(), self.failed());
		if self.all_passed() {
			println!("\n{}", totals.green().bold());
		} else {
			println!("\n{}", totals.red().bold());
		}
	}
}

fn format_duration(duration: Duration) -> String {
	if duration.as_secs() >= 1 {
		format!("({:.1}s)", duration.as_secs_f64())
	} else {
		format!("({}ms)", duration.as_millis())
	}
}
