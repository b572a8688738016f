//! Screens of the patient app under test.
//!
//! Each page is a [`PageDescriptor`](mobdrive::PageDescriptor) anchored on an
//! element unique to that screen, plus the elements its flows touch.

mod appointment;
mod home;
mod login;
mod singpass;

pub use appointment::{AppointmentChooseGpPage, AppointmentChooseProviderPage};
pub use home::HomePage;
pub use login::LoginPage;
pub use singpass::SingpassVerificationPage;
