mod course;
mod crn;
mod email_address;
mod subscription;
mod user;

pub use course::Course;
pub use crn::Crn;
pub use email_address::EmailAddress;
pub use subscription::Subscription;
pub use user::User;
