//! Shared domain types for Huddle.
//!
//! This crate contains the core domain types used across the Huddle service:
//! sessions, participants, contribution records, classified intents, inbound
//! messages, configuration, and their associated error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror, secrecy.

pub mod config;
pub mod error;
pub mod intent;
pub mod message;
pub mod session;
