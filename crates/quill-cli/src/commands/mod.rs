//! Slash commands for interactive mode

mod status;
mod suggest;

pub use status::StatusCommand;
pub use suggest::{OptionsCommand, SuggestCommand};

use quill_agent::Orchestrator;

/// Result of executing a slash command
#[derive(Debug, PartialEq)]
pub enum CommandResult {
    /// Show a message to the user (not sent to the backend)
    Message(String),
    /// Export the approved proposal
    Export { winning: bool },
    /// Exit the application
    Exit,
    /// Unknown command
    Unknown(String),
}

/// Parse and execute a slash command
pub fn execute_command(
    input: &str,
    orchestrator: &Orchestrator,
    remote_prompts: &[String],
) -> Option<CommandResult> {
    let input = input.trim();

    let rest = input.strip_prefix('/')?;
    let (command, args) = match rest.split_once(' ') {
        Some((command, args)) => (command, args.trim()),
        None => (rest, ""),
    };
    let command = command.to_lowercase();

    Some(match command.as_str() {
        "help" | "h" | "?" => CommandResult::Message(help_message()),

        "quit" | "exit" | "q" => CommandResult::Exit,

        "status" | "s" => StatusCommand::execute(orchestrator),

        "options" | "o" => OptionsCommand::execute(orchestrator),

        "suggest" | "g" => SuggestCommand::execute(args, orchestrator, remote_prompts),

        "export" | "e" => match args.to_lowercase().as_str() {
            "" => CommandResult::Export { winning: false },
            "winning" | "win" => CommandResult::Export { winning: true },
            other => CommandResult::Message(format!(
                "Unknown export flag: '{}'\nUsage: /export [winning]",
                other
            )),
        },

        "error" => match orchestrator.last_error() {
            Some(report) => CommandResult::Message(format!("[{}] {}", report.kind, report.message)),
            None => CommandResult::Message("No error.".to_string()),
        },

        "dismiss" | "d" => {
            orchestrator.dismiss_error();
            CommandResult::Message("Error dismissed.".to_string())
        }

        _ => CommandResult::Unknown(command),
    })
}

/// Route one line of interactive input.
///
/// Slash commands are executed and leave the pending input alone, so the
/// last error stays visible to `/error` and `/status`. Any other line
/// becomes the pending input and `None` is returned for submission.
pub fn dispatch_line(
    line: &str,
    orchestrator: &Orchestrator,
    remote_prompts: &[String],
) -> Option<CommandResult> {
    let result = execute_command(line, orchestrator, remote_prompts);
    if result.is_none() {
        orchestrator.set_input(line);
    }
    result
}

fn help_message() -> String {
    r#"Available commands:
  /help, /h, /?          Show this help message
  /status, /s            Show conversation mode, transcript size and last error
  /options, /o           Show feedback options for the draft under review
  /suggest, /g <text>    Show example inputs matching <text>
  /export, /e [winning]  Save the approved proposal (optionally as a winning bid)
  /error                 Show the last error
  /dismiss, /d           Dismiss the last error
  /quit, /exit, /q       Exit quill

Anything else is sent to the backend. While a draft awaits review, your
input is sent as feedback; "Approve" accepts the draft.

Examples:
  /suggest borehole    Prompts mentioning "borehole"
  /export winning      Save the approved proposal as a winning bid"#
        .to_string()
}
