//! SMTP mail delivery for adpass.
//!
//! Sends plain-text mail through an unauthenticated relay using [`lettre`].

pub mod error;
pub mod mailer;

pub use error::{Error, Result};
pub use mailer::{SmtpMailer, SmtpSettings};
