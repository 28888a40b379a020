//! `warroom-oracle`: fallback-safe access to the generative text backend.
//!
//! ```text
//! Oracle<G>          ← one async fn per capability, never fails
//!     │                 timeout, fence stripping, shape check
//!     ▼
//! TextGenerator      ← "prompt in, text out, or error"
//!     │
//!     ▼
//! GeminiClient       ← POST {endpoint}/models/{model}:generateContent
//! ```
//!
//! Each capability returns [`Generated<T>`]: the value plus a [`Source`] tag
//! saying whether it came from the backend or from the fixed fallback.

pub mod client;
pub mod error;
pub mod fallback;
pub mod generator;
pub mod oracle;
pub mod types;

pub use client::GeminiClient;
pub use error::{OracleError, Result};
pub use generator::TextGenerator;
pub use oracle::{strip_fences, Oracle};
pub use types::{Generated, Source};
