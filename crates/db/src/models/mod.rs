//! Row types for database tables.

pub mod invitation_job;
