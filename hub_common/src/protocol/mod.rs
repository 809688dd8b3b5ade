//! # Homebrew Repeater Protocol
//!
//! Only the wire-level command tokens live here; packet parsing and
//! authentication belong to the hub itself.

/// Command tokens, as they appear at the start of a datagram.
pub mod commands;

pub use commands::ALL_COMMANDS;
