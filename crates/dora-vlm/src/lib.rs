//! # Dora vision-language node
//!
//! A dataflow node that keeps the latest frame of every camera input and
//! answers text prompts about them with a vision-language model.
//!
//! The node state lives in [`node::VlmNode`]; it is fed [`node::NodeEvent`]s
//! and reports an [`node::Outcome`] per event, so the dataflow runtime only
//! shows up in the binary and in [`input`].

/// Environment configuration.
pub mod config;

/// Conversation turns replayed to the model.
pub mod conversation;

/// Error types.
pub mod error;

/// Storage of the decoded frames.
pub mod frames;

/// Conversion of dora inputs into node events.
pub mod input;

/// Prompt building and model invocation.
pub mod invoker;

/// Model abstraction.
pub mod model;

/// Event handling state machine.
pub mod node;

/// SmolVLM2 backend on kornia-vlm.
pub mod smolvlm2;

/// Chat templates.
pub mod template;

pub use crate::config::VlmConfig;
pub use crate::error::{ConfigError, VlmError};
pub use crate::node::{IgnoreReason, NodeEvent, Outcome, TextOutput, VlmNode};
