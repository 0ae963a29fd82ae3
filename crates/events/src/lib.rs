//! Outbound delivery of rendered invitations.
//!
//! - [`EmailDelivery`]: merges the HTML template with city contacts, attaches
//!   the rendered image and inline logo, and hands the message to a [`Mailer`].
//! - [`SmtpMailer`]: the production [`Mailer`] over implicit-TLS SMTP.

pub mod delivery;

pub use delivery::email::{
    EmailConfig, EmailDelivery, EmailError, InvitationEmail, Mailer, SmtpMailer,
};
