use async_trait::async_trait;
use mobdrive::{Locator, PageContext, PageDescriptor, PageObject, UiElement};

/// First booking step: choosing the kind of provider.
pub struct AppointmentChooseProviderPage {
	page: PageDescriptor,
	general_practitioner: UiElement,
}

impl Default for AppointmentChooseProviderPage {
	fn default() -> Self {
		Self {
			page: PageDescriptor::new("Appointment Choose Provider Page", UiElement::accessibility_id("Book an Appointment")),
			general_practitioner: UiElement::new(
				"'General Practitioner (GP)' Button",
				Locator::accessibility_id("General Practitioner"),
			),
		}
	}
}

impl AppointmentChooseProviderPage {
	pub async fn select_gp(&self, ctx: &PageContext) -> mobdrive::Result<()> {
		ctx.actions().click(&self.general_practitioner).await
	}
}

#[async_trait]
impl PageObject for AppointmentChooseProviderPage {
	fn page_name(&self) -> &str {
		self.page.page_name()
	}

	async fn wait_for_load(&self, ctx: &PageContext) -> mobdrive::Result<()> {
		self.page.wait_for_load(ctx).await
	}
}

/// GP selection list.
pub struct AppointmentChooseGpPage {
	page: PageDescriptor,
}

impl Default for AppointmentChooseGpPage {
	fn default() -> Self {
		Self {
			page: PageDescriptor::new("Appointment Choose GP Page", UiElement::accessibility_id("Select GP")),
		}
	}
}

#[async_trait]
impl PageObject for AppointmentChooseGpPage {
	fn page_name(&self) -> &str {
		self.page.page_name()
	}

	async fn wait_for_load(&self, ctx: &PageContext) -> mobdrive::Result<()> {
		self.page.wait_for_load(ctx).await
	}
}
