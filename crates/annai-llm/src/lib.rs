//! # Annai LLM
//!
//! Blocking client for the hosted text-generation service used by the
//! Annai recommendation pipeline. Speaks the OpenAI-compatible
//! chat-completions wire format (Groq by default), with a mandatory
//! per-request timeout and bounded retry with backoff for transient
//! failures. The generation call is the pipeline's most likely runtime
//! failure mode and its errors are kept distinguishable.

pub mod client;
pub mod error;

pub use client::{ChatClient, ChatConfig, DEFAULT_BASE_URL};
pub use error::{LlmError, Result};
