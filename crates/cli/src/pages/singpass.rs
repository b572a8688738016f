use async_trait::async_trait;
use mobdrive::{Locator, PageContext, PageDescriptor, PageObject, UiElement};

/// Accessibility label of the Singpass prompt, one line per paragraph.
const PROMPT_LABEL: &str = "Verify identity with Singpass\n\
	We use Singpass to securely confirm your identity, as required by MOH.\n\
	Verify quickly with a one-time Singpass login.\n\
	Keep your personal details accurate and compliant with healthcare regulations.\n\
	Avoid identity mismatch issues that could stop your consultation.";

/// Identity verification prompt shown after login.
pub struct SingpassVerificationPage {
	page: PageDescriptor,
	remind_me_later: UiElement,
}

impl Default for SingpassVerificationPage {
	fn default() -> Self {
		Self {
			page: PageDescriptor::new("Singpass Verification Page", UiElement::new("Singpass prompt", Locator::accessibility_id(PROMPT_LABEL))),
			remind_me_later: UiElement::new("'Remind me later' Button", Locator::accessibility_id("Remind me later")),
		}
	}
}

impl SingpassVerificationPage {
	/// Dismisses the prompt without verifying.
	pub async fn remind_me_later(&self, ctx: &PageContext) -> mobdrive::Result<()> {
		ctx.actions().click(&self.remind_me_later).await
	}
}

#[async_trait]
impl PageObject for SingpassVerificationPage {
	fn page_name(&self) -> &str {
		self.page.page_name()
	}

	async fn wait_for_load(&self, ctx: &PageContext) -> mobdrive::Result<()> {
		self.page.wait_for_load(ctx).await
	}
}
