//! Upstream chat-completion client and streaming support.
//!
//! Speaks the OpenAI-compatible wire format directly: [`client`] opens the
//! streaming HTTP request, [`decoder`] reassembles SSE event frames from
//! network chunks whose boundaries are independent of frame boundaries, and
//! [`types`] holds the wire-level serde models.

pub mod client;
pub mod decoder;
pub mod types;

pub use client::ChatCompletionClient;
