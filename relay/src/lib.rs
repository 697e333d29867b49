//! Command-line assistant that routes prompts either to a chat-completion
//! service or to an external autonomous agent run as a child process.
//!
//! The architecture enforces a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (routing, output extraction, the
//!   interactive-loop state machine). No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting operations (config files, child processes,
//!   HTTP). Behind traits so tests can substitute scripted backends.
//!
//! [`session`] wires core logic to the I/O layer to implement the CLI modes:
//! single-shot chat, single-shot delegation, and the interactive loop.

pub mod core;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod session;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
