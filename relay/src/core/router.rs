//! Prompt routing: turn free-form input into a delegation request.
//!
//! The delegate asks clarifying questions on its own stdin, so every request
//! carries the answers it will need up front. A wording heuristic predicts
//! those questions; interactive directives can override them explicitly.

/// A task for the delegate plus the confirmation lines it will ask for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelegationRequest {
    pub task: String,
    /// Answers fed to the delegate one per line, in order, after the task.
    pub extra_inputs: Vec<String>,
    /// Emit command/payload/stream diagnostics around the invocation.
    pub verbose: bool,
}

impl DelegationRequest {
    /// Build a request with explicit confirmation inputs, bypassing the
    /// heuristic.
    pub fn with_inputs(task: impl Into<String>, extra_inputs: Vec<String>) -> Self {
        Self {
            task: task.into(),
            extra_inputs,
            verbose: false,
        }
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Standard-input payload for the delegate: the task line, then exactly
    /// one line per expected prompt.
    pub fn stdin_payload(&self) -> String {
        let mut payload = String::with_capacity(self.task.len() + 1);
        payload.push_str(&self.task);
        payload.push('\n');
        for input in &self.extra_inputs {
            payload.push_str(input);
            payload.push('\n');
        }
        payload
    }
}

/// Derive confirmation inputs for a task from its wording.
///
/// Tasks that save and execute something get a single approval. Tasks that
/// only save get nothing, since the delegate finishes without asking. Anything
/// else is treated as a generation task that prompts for sample content and a
/// final approval.
pub fn route(prompt: &str) -> DelegationRequest {
    let lower = prompt.to_lowercase();
    let extra_inputs = if lower.contains("save") && lower.contains("execute") {
        vec!["yes".to_string()]
    } else if lower.contains("save") {
        Vec::new()
    } else {
        vec!["Hello World".to_string(), "yes".to_string()]
    };
    DelegationRequest {
        task: prompt.to_string(),
        extra_inputs,
        verbose: false,
    }
}

/// Parse the tail of an `agent:` directive into a request.
///
/// A `;`-separated tail overrides the heuristic: the first segment is the
/// task, the rest become the confirmation inputs verbatim (order preserved,
/// empty segments kept). Without a `;` the heuristic applies as usual.
pub fn parse_directive(rest: &str) -> DelegationRequest {
    let rest = rest.trim();
    match rest.split_once(';') {
        Some((task, inputs)) => DelegationRequest::with_inputs(
            task.trim(),
            inputs.split(';').map(|s| s.trim().to_string()).collect(),
        ),
        None => route(rest),
    }
}
