//! The end-to-end scenarios, in suite order.

use anyhow::{Result, bail, ensure};
use futures::future::BoxFuture;
use mobdrive::{PageContext, PageObject, TestConfig};
use tracing::info;

use crate::pages::{
	AppointmentChooseGpPage, AppointmentChooseProviderPage, HomePage, LoginPage, SingpassVerificationPage,
};

/// What a scenario body gets to work with.
pub struct ScenarioContext {
	pub pages: PageContext,
	pub config: TestConfig,
}

type ScenarioFn = for<'a> fn(&'a ScenarioContext) -> BoxFuture<'a, Result<()>>;

/// A named, ordered end-to-end flow.
#[derive(Clone, Copy)]
pub struct Scenario {
	pub name: &'static str,
	pub description: &'static str,
	body: ScenarioFn,
}

impl Scenario {
	pub fn run<'a>(&self, ctx: &'a ScenarioContext) -> BoxFuture<'a, Result<()>> {
		(self.body)(ctx)
	}
}

impl std::fmt::Debug for Scenario {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("Scenario").field("name", &self.name).finish()
	}
}

pub const SCENARIOS: &[Scenario] = &[
	Scenario {
		name: "login",
		description: "Should login successfully with valid credentials",
		body: run_login,
	},
	Scenario {
		name: "book-appointment",
		description: "Book an appointment with a general practitioner",
		body: run_book_appointment,
	},
];

/// Scenarios named in `only`, in suite order; all of them when `only` is empty.
pub fn select(only: &[String]) -> Result<Vec<Scenario>> {
	if let Some(unknown) = only.iter().find(|name| !SCENARIOS.iter().any(|s| s.name == name.as_str())) {
		let known: Vec<_> = SCENARIOS.iter().map(|s| s.name).collect();
		bail!("unknown scenario '{unknown}' (available: {})", known.join(", "));
	}
	Ok(SCENARIOS
		.iter()
		.filter(|s| only.is_empty() || only.iter().any(|name| name == s.name))
		.copied()
		.collect())
}

fn run_login(ctx: &ScenarioContext) -> BoxFuture<'_, Result<()>> {
	Box::pin(login(ctx))
}

fn run_book_appointment(ctx: &ScenarioContext) -> BoxFuture<'_, Result<()>> {
	Box::pin(book_appointment(ctx))
}

async fn login(ctx: &ScenarioContext) -> Result<()> {
	let login = LoginPage::default();
	let home = HomePage::default();
	let credentials = ctx.config.credentials()?;

	ensure!(login.is_displayed(&ctx.pages).await, "Should be on login page initially");
	login.login(&ctx.pages, &credentials).await?;
	ensure!(home.is_displayed(&ctx.pages).await, "Should be on home page after successful login");

	info!(target = "mobdrive_cli.scenarios", "login succeeded");
	Ok(())
}

async fn book_appointment(ctx: &ScenarioContext) -> Result<()> {
	let singpass = SingpassVerificationPage::default();
	let home = HomePage::default();
	let provider = AppointmentChooseProviderPage::default();
	let gp = AppointmentChooseGpPage::default();

	ensure!(
		singpass.is_displayed(&ctx.pages).await,
		"Should be on singpass verification page initially"
	);
	singpass.remind_me_later(&ctx.pages).await?;

	ensure!(home.is_displayed(&ctx.pages).await, "Should be on home page initially");
	home.book_appointment(&ctx.pages).await?;

	ensure!(
		provider.is_displayed(&ctx.pages).await,
		"Should be on appointment provider page"
	);
	provider.select_gp(&ctx.pages).await?;

	ensure!(gp.is_displayed(&ctx.pages).await, "Should be on GP selection page");
	Ok(())
}
