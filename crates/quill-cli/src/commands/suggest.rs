//! /suggest and /options commands - example inputs

use super::CommandResult;
use quill_agent::suggest::{COMMON_PROMPTS, FEEDBACK_OPTIONS, filter_suggestions};
use quill_agent::{ModeKind, Orchestrator};

pub struct SuggestCommand;

impl SuggestCommand {
    /// Filter feedback options while a draft is under review, prompts otherwise
    pub fn execute(args: &str, orchestrator: &Orchestrator, remote: &[String]) -> CommandResult {
        if args.is_empty() {
            return CommandResult::Message("Usage: /suggest <text>".to_string());
        }

        let hits: Vec<String> = if orchestrator.mode_kind() == ModeKind::Interrupted {
            let offered = orchestrator.feedback_options();
            let mut hits: Vec<String> = filter_suggestions(args, &offered)
                .into_iter()
                .map(str::to_string)
                .collect();
            for hit in filter_suggestions(args, FEEDBACK_OPTIONS) {
                if !hits.iter().any(|h| h == hit) {
                    hits.push(hit.to_string());
                }
            }
            hits
        } else {
            filter_suggestions(args, remote)
                .into_iter()
                .chain(filter_suggestions(args, COMMON_PROMPTS))
                .map(str::to_string)
                .collect()
        };

        if hits.is_empty() {
            return CommandResult::Message(format!("No suggestions matching '{}'.", args));
        }
        CommandResult::Message(numbered(&hits))
    }
}

pub struct OptionsCommand;

impl OptionsCommand {
    pub fn execute(orchestrator: &Orchestrator) -> CommandResult {
        if orchestrator.mode_kind() != ModeKind::Interrupted {
            return CommandResult::Message("No draft is awaiting feedback.".to_string());
        }
        let offered = orchestrator.feedback_options();
        if offered.is_empty() {
            let builtin: Vec<String> = FEEDBACK_OPTIONS.iter().map(|s| s.to_string()).collect();
            return CommandResult::Message(format!(
                "The backend offered no options. Common feedback:\n{}",
                numbered(&builtin)
            ));
        }
        CommandResult::Message(format!("Feedback options:\n{}", numbered(&offered)))
    }
}

fn numbered(items: &[String]) -> String {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| format!("  {}. {}", i + 1, item))
        .collect::<Vec<_>>()
        .join("\n")
}
