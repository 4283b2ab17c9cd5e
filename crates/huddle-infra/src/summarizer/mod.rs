//! Summarizer implementations.

pub mod openai;

pub use openai::OpenAiSummarizer;
