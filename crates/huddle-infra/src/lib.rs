//! Infrastructure layer for Huddle.
//!
//! Implements the ports defined in `huddle-core`: the SQLite session store,
//! the WhatsApp Cloud API notification sink, and the OpenAI-compatible
//! summarizer. Also hosts the configuration loader and webhook payload and
//! signature handling.

pub mod config;
pub mod sqlite;
pub mod summarizer;
pub mod whatsapp;
