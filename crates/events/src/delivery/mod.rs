//! Email delivery channel and the HTML template merge it relies on.

pub mod email;
pub mod template;
