use async_trait::async_trait;
use mobdrive::{Locator, PageContext, PageDescriptor, PageObject, UiElement};

pub struct HomePage {
	page: PageDescriptor,
	book_appointment: UiElement,
}

impl Default for HomePage {
	fn default() -> Self {
		Self {
			page: PageDescriptor::new("Home Page", UiElement::accessibility_id("Virtual Consultation")),
			book_appointment: UiElement::new(
				"Book an Appointment",
				Locator::android_uiautomator(r#"new UiSelector().className("android.widget.ImageView").instance(3)"#),
			),
		}
	}
}

impl HomePage {
	pub async fn book_appointment(&self, ctx: &PageContext) -> mobdrive::Result<()> {
		ctx.actions().click(&self.book_appointment).await
	}
}

#[async_trait]
impl PageObject for HomePage {
	fn page_name(&self) -> &str {
		self.page.page_name()
	}

	async fn wait_for_load(&self, ctx: &PageContext) -> mobdrive::Result<()> {
		self.page.wait_for_load(ctx).await
	}
}
