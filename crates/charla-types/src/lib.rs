//! Shared domain types for charla.
//!
//! This crate contains the core domain types used across the charla service:
//! User, Conversation, ChatMessage, upstream LLM types, and their associated
//! error types.
//!
//! Zero infrastructure dependencies -- only serde, uuid, chrono, thiserror.

pub mod chat;
pub mod config;
pub mod error;
pub mod llm;
pub mod user;
