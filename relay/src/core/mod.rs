//! Pure, deterministic logic: routing, extraction, and the loop state machine.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! data and return deterministic outputs suitable for direct testing.

pub mod dispatch;
pub mod extract;
pub mod router;
pub mod transcript;
