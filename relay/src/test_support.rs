//! Scripted chat and delegate backends for tests.
//!
//! Compiled only for tests or with the `test-support` feature, which
//! integration tests enable through the dev-dependency on this crate.

use std::cell::RefCell;
use std::collections::VecDeque;

use anyhow::{Result, anyhow};

use crate::core::router::DelegationRequest;
use crate::core::transcript::Transcript;
use crate::io::chat::ChatBackend;
use crate::io::delegate::{Delegate, DelegateError};

/// Chat backend that replays queued outcomes in order.
///
/// `Err` entries carry the message the backend should fail with. Running out
/// of entries is itself a failure so tests notice unexpected extra calls.
pub struct ScriptedChat {
    outcomes: RefCell<VecDeque<Result<String, String>>>,
}

impl ScriptedChat {
    pub fn new(outcomes: Vec<Result<String, String>>) -> Self {
        Self {
            outcomes: RefCell::new(outcomes.into_iter().collect()),
        }
    }

    /// All-successful script.
    pub fn replies(replies: &[&str]) -> Self {
        Self::new(replies.iter().map(|r| Ok((*r).to_string())).collect())
    }
}

impl ChatBackend for ScriptedChat {
    fn complete(&self, _transcript: &Transcript) -> Result<String> {
        match self.outcomes.borrow_mut().pop_front() {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(message)) => Err(anyhow!(message)),
            None => Err(anyhow!("scripted chat ran out of replies")),
        }
    }
}

/// Delegate that replays queued outcomes and records every request it sees.
pub struct ScriptedDelegate {
    outcomes: RefCell<VecDeque<Result<String, DelegateError>>>,
    seen: RefCell<Vec<DelegationRequest>>,
}

impl ScriptedDelegate {
    pub fn new(outcomes: Vec<Result<String, DelegateError>>) -> Self {
        Self {
            outcomes: RefCell::new(outcomes.into_iter().collect()),
            seen: RefCell::new(Vec::new()),
        }
    }

    /// All-successful script.
    pub fn texts(texts: &[&str]) -> Self {
        Self::new(texts.iter().map(|t| Ok((*t).to_string())).collect())
    }

    /// Requests observed so far, in order.
    pub fn requests(&self) -> Vec<DelegationRequest> {
        self.seen.borrow().clone()
    }
}

impl Delegate for ScriptedDelegate {
    fn invoke(&self, request: &DelegationRequest) -> Result<String, DelegateError> {
        self.seen.borrow_mut().push(request.clone());
        match self.outcomes.borrow_mut().pop_front() {
            Some(outcome) => outcome,
            None => Ok(String::new()),
        }
    }
}
