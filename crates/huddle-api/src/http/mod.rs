//! HTTP layer: the WhatsApp webhook and the health probe.

pub mod error;
pub mod handlers;
pub mod router;
