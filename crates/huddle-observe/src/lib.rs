//! Observability setup for Huddle: the global tracing subscriber and the
//! optional OpenTelemetry bridge.

pub mod tracing_setup;

pub use tracing_setup::{TracingConfig, default_filter, init_tracing, shutdown_tracing};
