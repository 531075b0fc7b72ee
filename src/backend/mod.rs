//! Generative-text backends.
//!
//! The orchestration layer consumes a single capability,
//! [`TextCompletion`]. [`OllamaClient`] is the bundled implementation; tests
//! and embedders can supply their own.

mod ollama;
mod traits;

pub use ollama::{DEFAULT_BASE_URL, DEFAULT_MODEL, OllamaClient};
pub use traits::TextCompletion;
