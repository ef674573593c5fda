//! Request handlers.
//!
//! Handlers delegate to the response coordinator or the repositories in
//! `surveyor_db` and map errors via [`AppError`](crate::error::AppError).

pub mod records;
pub mod responses;
