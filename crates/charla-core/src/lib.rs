//! Business logic and repository trait definitions for charla.
//!
//! This crate defines the "ports" (repository traits) that the infrastructure
//! layer implements, plus the pure exchange logic: quota gating, prompt
//! composition, and transcript recording. It depends only on `charla-types`
//! -- never on `charla-infra` or any database/IO crate.

pub mod chat;
pub mod prompt;
pub mod quota;
pub mod user;
