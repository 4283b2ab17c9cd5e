//! Business logic and repository trait definitions for Huddle.
//!
//! This crate holds the trigger classifier, the session coordinator state
//! machine, and the expiry sweeper, together with the "ports" (repository,
//! notification, and summarization traits) that the infrastructure layer
//! implements. It depends only on `huddle-types` -- never on `huddle-infra`
//! or any database/HTTP crate.

pub mod classifier;
pub mod code;
pub mod coordinator;
pub mod notify;
pub mod repository;
pub mod summarize;
pub mod sweeper;

#[cfg(test)]
mod testing;
