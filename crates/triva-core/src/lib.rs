//! # triva-core
//!
//! Foundation types and the bounded transcript store for the Triva intake
//! assistant.
//!
//! This crate provides the shared vocabulary that the other Triva crates
//! depend on:
//!
//! - **Branded IDs**: `MessageId`, `SessionId` as newtypes for type safety
//! - **Messages**: `Message` with text-or-structured content and per-message
//!   timing fields
//! - **Clinical report**: the structured payload that terminates a
//!   conversation, plus the shape heuristic that recognizes it
//! - **Transcript**: bounded, append-only message store with freeze and
//!   drop-oldest semantics
//! - **Logging**: `tracing` subscriber bootstrap for hosts

#![deny(unsafe_code)]

pub mod constants;
pub mod ids;
pub mod logging;
pub mod messages;
pub mod report;
pub mod text;
pub mod transcript;

pub use ids::{MessageId, SessionId};
pub use messages::{Message, MessageContent, Role};
pub use report::ClinicalReport;
pub use transcript::Transcript;
