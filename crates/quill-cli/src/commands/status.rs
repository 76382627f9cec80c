//! /status command - show conversation state

use super::CommandResult;
use quill_agent::{ExportStatus, Mode, Orchestrator, Role};

use crate::utils::truncate_chars;

pub struct StatusCommand;

impl StatusCommand {
    pub fn execute(orchestrator: &Orchestrator) -> CommandResult {
        let turns = orchestrator.snapshot();
        let mode = orchestrator.mode();

        let mut output = String::from("Conversation Status\n");
        output.push_str(&"-".repeat(40));
        output.push('\n');

        output.push_str(&format!("Mode:       {}\n", mode.kind()));
        let context = &orchestrator.config().context;
        output.push_str(&format!(
            "RFQ:        {}\n",
            context.rfq_id.as_deref().unwrap_or("(none)")
        ));
        output.push_str(&format!("Retrieval:  {}\n", context.mode));
        output.push('\n');

        let user_turns = turns.iter().filter(|t| t.role() == Role::User).count();
        output.push_str(&format!("Turns:      {} total\n", turns.len()));
        output.push_str(&format!(
            "            {} user, {} assistant\n",
            user_turns,
            turns.len() - user_turns
        ));
        if let Some(last) = orchestrator.transcript().last() {
            let speaker = match last.role() {
                Role::User => "you",
                Role::Assistant => "assistant",
            };
            output.push_str(&format!(
                "Last turn:  {}: {}\n",
                speaker,
                truncate_chars(&last.content().replace('\n', " "), 60)
            ));
        }

        if let Some(state) = mode.state() {
            output.push_str(&format!(
                "Feedback:   {} round(s) recorded\n",
                state.human_feedback().len()
            ));
            if let Some(iteration) = state.as_map().get("iteration") {
                output.push_str(&format!("Iteration:  {}\n", iteration));
            }
        }

        match &mode {
            Mode::Interrupted { proposal, .. } => {
                output.push_str(&format!(
                    "Draft:      {}\n",
                    truncate_chars(&proposal.replace('\n', " "), 60)
                ));
                output.push_str("Next input is sent as feedback on this draft.\n");
            }
            Mode::Approved { .. } => {
                output.push_str("Draft approved. Use /export to save it.\n");
            }
            Mode::Idle => {}
        }

        if let Some(report) = orchestrator.last_error() {
            output.push('\n');
            output.push_str(&format!("Last error: [{}] {}\n", report.kind, report.message));
        }

        match orchestrator.last_export() {
            Some(ExportStatus::Linked(link)) => {
                output.push_str(&format!("Exported:   {}\n", link));
            }
            Some(ExportStatus::Failed(message)) => {
                output.push_str(&format!("Export failed: {}\n", message));
            }
            None => {}
        }

        CommandResult::Message(output)
    }
}
