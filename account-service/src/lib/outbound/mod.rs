pub mod clock;
pub mod mailer;
pub mod repositories;
