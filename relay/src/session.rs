//! Orchestration of single-shot prompts and the interactive loop.

use std::io::{BufRead, Write};

use anyhow::{Context, Result};
use tracing::debug;

use crate::core::dispatch::{LoopState, Request};
use crate::core::router::{self, DelegationRequest};
use crate::io::chat::{ChatBackend, ChatSession};
use crate::io::delegate::{Delegate, delegate_to_text};

/// Combine piped stdin with argument words into one prompt.
///
/// Covers shell usage like `cat notes.txt | relay "summarize this"`: the piped
/// text comes first, then the arguments, space-joined. `None` means there is
/// nothing to ask.
pub fn combined_prompt(piped: Option<&str>, args: &[String]) -> Option<String> {
    let mut parts: Vec<&str> = Vec::new();
    if let Some(piped) = piped {
        let piped = piped.trim();
        if !piped.is_empty() {
            parts.push(piped);
        }
    }
    let joined_args = args.join(" ");
    let trimmed_args = joined_args.trim();
    if !trimmed_args.is_empty() {
        parts.push(trimmed_args);
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" "))
    }
}

/// Send one prompt through the chat service.
pub fn chat_once<B: ChatBackend>(backend: B, prompt: &str) -> Result<String> {
    let mut session = ChatSession::new(backend);
    session.send(prompt)
}

/// Hand one prompt to the delegate, folding failures into the returned text.
pub fn delegate_once<D: Delegate>(delegate: &D, prompt: &str, verbose: bool) -> String {
    let request = router::route(prompt).verbose(verbose);
    announce_delegation(&request);
    delegate_to_text(delegate, &request)
}

fn announce_delegation(request: &DelegationRequest) {
    if !request.verbose {
        eprintln!("delegating to agent...");
    }
    debug!(task = %request.task, inputs = ?request.extra_inputs, "delegation request");
}

/// Run the interactive loop over the given input/output streams.
///
/// One [`ChatSession`] spans the whole loop, so chat context accumulates
/// across exchanges. Lines starting with `agent:` go to the delegate,
/// everything else to the chat service; `exit` or end of input ends the loop
/// with a farewell, while Ctrl+C falls through to default process termination.
pub fn run_repl<B, D, R, W>(
    backend: B,
    delegate: &D,
    input: R,
    mut output: W,
    verbose: bool,
) -> Result<()>
where
    B: ChatBackend,
    D: Delegate,
    R: BufRead,
    W: Write,
{
    let mut session = ChatSession::new(backend);
    let mut lines = input.lines();

    writeln!(
        output,
        "Interactive chat mode activated. Type 'exit' or press Ctrl+C to quit."
    )?;
    let mut state = LoopState::Idle.start();
    loop {
        state = match state {
            LoopState::Idle => LoopState::Idle.start(),
            LoopState::AwaitingInput => {
                write!(output, "You: ")?;
                output.flush()?;
                let line = lines.next().transpose().context("read input line")?;
                LoopState::AwaitingInput.on_input(line.as_deref())
            }
            LoopState::Dispatching(request) => {
                let text = dispatch_request(&mut session, delegate, &request, verbose);
                LoopState::Dispatching(request).on_outcome(text)
            }
            LoopState::Displaying(text) => {
                writeln!(output, "{text}")?;
                LoopState::Displaying(text).on_displayed()
            }
            LoopState::Terminated => break,
        };
    }
    writeln!(output, "Chat ended.")?;
    Ok(())
}

/// Execute one dispatched request, folding any error into displayable text.
fn dispatch_request<B: ChatBackend, D: Delegate>(
    session: &mut ChatSession<B>,
    delegate: &D,
    request: &Request,
    verbose: bool,
) -> String {
    match request {
        Request::Chat(prompt) => match session.send(prompt) {
            Ok(reply) => format!("Bot: {reply}"),
            Err(err) => format!("chat error: {err:#}"),
        },
        Request::Delegation(delegation) => {
            let delegation = delegation.clone().verbose(verbose);
            announce_delegation(&delegation);
            format!("Agent: {}", delegate_to_text(delegate, &delegation))
        }
    }
}
