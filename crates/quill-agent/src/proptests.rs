//! Property tests for the orchestrator invariants

use proptest::prelude::*;
use serde_json::json;

use crate::orchestrator::tests::{Scripted, make_test_orchestrator};
use crate::orchestrator::{ModeKind, SubmitOutcome};
use crate::transport::Request;

#[derive(Debug, Clone)]
enum ReplyShape {
    Answer,
    Interrupt,
    Approved,
    ServerError,
    NetworkFailure,
    Malformed,
}

fn reply_shape() -> impl Strategy<Value = ReplyShape> {
    prop_oneof![
        Just(ReplyShape::Answer),
        Just(ReplyShape::Interrupt),
        Just(ReplyShape::Approved),
        Just(ReplyShape::ServerError),
        Just(ReplyShape::NetworkFailure),
        Just(ReplyShape::Malformed),
    ]
}

fn user_input() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        "[ \t\n]{1,4}",
        "[a-zA-Z][a-zA-Z ]{0,20}",
    ]
}

fn script_step(shape: &ReplyShape, iteration: usize) -> Scripted {
    match shape {
        ReplyShape::Answer => Scripted::Reply(json!({"response": "answer"})),
        ReplyShape::Interrupt => Scripted::Reply(json!({
            "interrupt": true,
            "proposal": format!("Draft v{}", iteration),
            "feedback_options": ["Approve"],
            "state": {"iteration": iteration, "human_feedback": []}
        })),
        ReplyShape::Approved => Scripted::Reply(json!({"status": "approved"})),
        ReplyShape::ServerError => Scripted::Reply(json!({"error": "boom"})),
        ReplyShape::NetworkFailure => Scripted::Fail(quill_api::Error::Status {
            status: 500,
            body: String::new(),
        }),
        ReplyShape::Malformed => Scripted::Reply(json!({"unexpected": true})),
    }
}

fn run<F: std::future::Future>(future: F) -> F::Output {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .unwrap()
        .block_on(future)
}

proptest! {
    /// Transcript only grows, by two turns per admitted exchange and by
    /// nothing for blank input.
    #[test]
    fn prop_turns_grow_in_pairs(
        steps in prop::collection::vec((user_input(), reply_shape()), 1..12)
    ) {
        run(async {
            let (orch, transport) = make_test_orchestrator(vec![]);
            let mut exchanges = 0usize;
            let mut previous_len = 0usize;

            for (i, (input, shape)) in steps.iter().enumerate() {
                transport.push(script_step(shape, i));
                let outcome = orch.submit(input).await;

                if input.trim().is_empty() {
                    prop_assert_eq!(outcome, SubmitOutcome::Ignored);
                } else {
                    exchanges += 1;
                }
                let len = orch.snapshot().len();
                prop_assert!(len >= previous_len);
                prop_assert_eq!(len, exchanges * 2);
                prop_assert!(!orch.is_busy());
                previous_len = len;

                // state present iff the mode carries it
                let holds_state = orch.state().is_some();
                prop_assert_eq!(holds_state, orch.mode_kind() != ModeKind::Idle);
            }
            Ok(())
        })?;
    }

    /// Every resume sends the held state with exactly one feedback entry added.
    #[test]
    fn prop_resume_round_trips_state(
        steps in prop::collection::vec(("[a-z]{1,12}", reply_shape()), 1..10)
    ) {
        run(async {
            let (orch, transport) = make_test_orchestrator(vec![]);

            for (i, (input, shape)) in steps.iter().enumerate() {
                let held = orch.state();
                let interrupted = orch.mode_kind() == ModeKind::Interrupted;
                transport.push(script_step(shape, i));
                orch.submit(input).await;

                let sent = transport.sent.lock().last().cloned();
                match (interrupted, sent) {
                    (true, Some(Request::Resume(resume))) => {
                        let held = held.expect("interrupted mode holds state");
                        prop_assert_eq!(&resume.feedback, input);
                        prop_assert_eq!(resume.state, held.with_feedback(input.clone()));
                    }
                    (false, Some(Request::Query(query))) => {
                        prop_assert_eq!(&query.user_query, input);
                    }
                    (interrupted, other) => {
                        prop_assert!(false, "interrupted={} but sent {:?}", interrupted, other);
                    }
                }
            }
            Ok(())
        })?;
    }
}

