use async_trait::async_trait;
use mobdrive::{Locator, PageContext, PageDescriptor, PageObject, UiElement};
use mobdrive_runtime::Credentials;
use tracing::info;

/// Welcome screen and the email login form behind it.
pub struct LoginPage {
	page: PageDescriptor,
	log_in: UiElement,
	log_in_with_email: UiElement,
	username: UiElement,
	password: UiElement,
	submit: UiElement,
}

impl Default for LoginPage {
	fn default() -> Self {
		Self {
			page: PageDescriptor::new("Login Page", UiElement::accessibility_id("Our services")),
			log_in: UiElement::new("Login Button", Locator::accessibility_id("Log in")),
			log_in_with_email: UiElement::new("Log in with email Button", Locator::accessibility_id("Log in with email")),
			username: UiElement::new(
				"Username Field",
				Locator::android_uiautomator(r#"new UiSelector().className("android.widget.EditText").instance(0)"#),
			),
			password: UiElement::new(
				"Password Field",
				Locator::android_uiautomator(r#"new UiSelector().className("android.widget.EditText").instance(1)"#),
			),
			submit: UiElement::new(
				"Submit Login Button",
				Locator::android_uiautomator(r#"new UiSelector().description("Log in")"#),
			),
		}
	}
}

impl LoginPage {
	/// Opens the email form, enters `credentials` and submits.
	pub async fn login(&self, ctx: &PageContext, credentials: &Credentials) -> mobdrive::Result<()> {
		info!(target = "mobdrive_cli.pages", user = %credentials.username, "logging in");
		let actions = ctx.actions();
		actions.click(&self.log_in).await?;
		actions.click(&self.log_in_with_email).await?;
		actions.send_keys(&self.username, &credentials.username).await?;
		actions.send_keys(&self.password, &credentials.password).await?;
		actions.hide_keyboard().await;
		// The submit button ignores element clicks on Flutter builds.
		actions.tap(&self.submit).await?;
		info!(target = "mobdrive_cli.pages", "login submitted");
		Ok(())
	}
}

#[async_trait]
impl PageObject for LoginPage {
	fn page_name(&self) -> &str {
		self.page.page_name()
	}

	async fn wait_for_load(&self, ctx: &PageContext) -> mobdrive::Result<()> {
		self.page.wait_for_load(ctx).await
	}
}
