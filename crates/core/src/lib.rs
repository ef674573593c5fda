//! Survey response domain logic.
//!
//! Everything in this crate is pure: no database, no HTTP. The `db` crate
//! drives these rules inside transactions and the `api` crate exposes them.

pub mod clock;
pub mod error;
pub mod pagination;
pub mod params;
pub mod projector;
pub mod question;
pub mod reconcile;
pub mod status;
pub mod tree;
pub mod types;
pub mod validation;
