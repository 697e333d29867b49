//! Input classification and the interactive-loop state machine.
//!
//! The loop in [`session`](crate::session) performs the actual I/O; the
//! transition logic here is deterministic so it can be tested without a
//! terminal, a chat service, or a delegate process.

use crate::core::router::{DelegationRequest, parse_directive};

/// Prefix marking an interactive line as delegate-directed.
pub const AGENT_PREFIX: &str = "agent:";
/// Input that ends the interactive session.
pub const EXIT_COMMAND: &str = "exit";

/// Where one line of input should go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// Forward to the chat service with the running transcript.
    Chat(String),
    /// Hand to the delegate.
    Delegation(DelegationRequest),
}

/// Immediate action for one line of input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputAction {
    /// Blank line: keep waiting.
    Ignore,
    /// `exit`: end the session.
    Quit,
    Dispatch(Request),
}

/// Classify one line of interactive input.
pub fn classify_input(line: &str) -> InputAction {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return InputAction::Ignore;
    }
    if trimmed.eq_ignore_ascii_case(EXIT_COMMAND) {
        return InputAction::Quit;
    }
    if let Some(rest) = trimmed.strip_prefix(AGENT_PREFIX) {
        return InputAction::Dispatch(Request::Delegation(parse_directive(rest)));
    }
    InputAction::Dispatch(Request::Chat(trimmed.to_string()))
}

/// Interactive-loop state.
///
/// `Terminated` is final. Each dispatched request blocks the loop until its
/// outcome has been displayed; there is no concurrent input handling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoopState {
    /// Not yet reading input.
    Idle,
    /// Ready for the next line.
    AwaitingInput,
    /// A request is being executed.
    Dispatching(Request),
    /// An outcome is ready to print.
    Displaying(String),
    /// Session over.
    Terminated,
}

impl LoopState {
    /// Begin the session: `Idle` becomes `AwaitingInput`.
    pub fn start(self) -> Self {
        match self {
            Self::Idle => Self::AwaitingInput,
            other => other,
        }
    }

    /// Consume one line of input while awaiting. `None` means end of input.
    pub fn on_input(self, line: Option<&str>) -> Self {
        match self {
            Self::AwaitingInput => match line {
                None => Self::Terminated,
                Some(line) => match classify_input(line) {
                    InputAction::Ignore => Self::AwaitingInput,
                    InputAction::Quit => Self::Terminated,
                    InputAction::Dispatch(request) => Self::Dispatching(request),
                },
            },
            other => other,
        }
    }

    /// Record the outcome of the in-flight request.
    pub fn on_outcome(self, text: String) -> Self {
        match self {
            Self::Dispatching(_) => Self::Displaying(text),
            other => other,
        }
    }

    /// Acknowledge that the pending outcome was shown.
    pub fn on_displayed(self) -> Self {
        match self {
            Self::Displaying(_) => Self::AwaitingInput,
            other => other,
        }
    }
}
