//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument.

pub mod invitation_job_repo;

pub use invitation_job_repo::InvitationJobRepo;
