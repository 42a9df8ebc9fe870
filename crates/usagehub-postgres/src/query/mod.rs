//! Database query repositories for the status tables.
//!
//! Repositories are implemented directly on [`PgConnection`] so callers can
//! compose several operations over one pooled connection.
//!
//! # Tenant scoping
//!
//! Read and update operations take a `scope`: `Some(prefix)` restricts the
//! query to rows whose `account_or_prefix` matches, `None` means an
//! unscoped internal caller.
//!
//! [`PgConnection`]: crate::PgConnection

pub mod status;
pub mod status_step;
pub mod usage_event;

pub use status::StatusRepository;
pub use status_step::StatusStepRepository;
pub use usage_event::UsageEventRepository;
