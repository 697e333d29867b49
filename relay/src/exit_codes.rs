//! Stable exit codes for the relay CLI.

/// Success, including delegations whose returned text describes a failure.
pub const OK: i32 = 0;
/// Invalid usage or environment: no prompt, unreadable config, missing
/// credentials, or a chat-service failure in single-shot mode.
pub const INVALID: i32 = 1;
