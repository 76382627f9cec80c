//! quill - proposal drafting assistant CLI

mod auth;
mod commands;
mod config;
mod utils;

use clap::Parser;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;

use quill_agent::{
    ExportStatus, HttpTransport, ModeKind, Orchestrator, OrchestratorConfig, OrchestratorEvent, Role,
    SessionContext, SubmitOutcome,
};
use quill_api::{BackendClient, ChatMode, QueryContext};

/// quill - draft proposals with a human-in-the-loop agent
#[derive(Parser, Debug)]
#[command(name = "quill")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Backend base URL (default: config file, then QUILL_API_URL)
    #[arg(short, long)]
    endpoint: Option<String>,

    /// RFQ the proposal answers
    #[arg(long)]
    rfq: Option<String>,

    /// Retrieval sub-mode (local, hybrid)
    #[arg(short, long)]
    mode: Option<String>,

    /// User identifier sent with fresh queries
    #[arg(short, long)]
    user: Option<String>,

    /// Request timeout in seconds
    #[arg(short, long)]
    timeout: Option<u64>,

    /// Run in non-interactive mode with a single prompt
    #[arg(short = 'c', long)]
    command: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Initialize config file
    #[arg(long)]
    init_config: bool,

    /// Store a backend access token
    #[arg(long, value_name = "TOKEN")]
    login: Option<String>,

    /// Refresh token stored alongside --login (used for exports)
    #[arg(long, value_name = "TOKEN", requires = "login")]
    refresh: Option<String>,

    /// Remove stored credentials
    #[arg(long)]
    logout: bool,

    /// Show stored credential status
    #[arg(long)]
    auth_status: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Setup tracing
    if args.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("quill=debug,quill_agent=debug,quill_api=debug")
            .init();
    }

    // Initialize config and exit
    if args.init_config {
        match config::Config::init() {
            Ok(path) => {
                println!("Config file created at: {}", path.display());
                println!("\nExample config:\n{}", config::example_config());
            }
            Err(e) => {
                eprintln!("Error creating config: {}", e);
                std::process::exit(1);
            }
        }
        return Ok(());
    }

    if let Some(token) = args.login {
        return handle_login(token, args.refresh, args.user);
    }

    if args.logout {
        return handle_logout();
    }

    if args.auth_status {
        return show_auth_status();
    }

    // Load config file
    let cfg = config::Config::load();

    // Merge config with CLI args (CLI takes precedence)
    let endpoint = args
        .endpoint
        .or(cfg.endpoint.clone())
        .or_else(|| std::env::var(quill_api::client::API_URL_ENV).ok());
    let Some(endpoint) = endpoint else {
        eprintln!("Error: No backend endpoint configured");
        eprintln!();
        eprintln!("Options:");
        eprintln!("  1. Pass it directly: quill --endpoint http://localhost:8000");
        eprintln!("  2. Set it in the environment: export {}=...", quill_api::client::API_URL_ENV);
        eprintln!("  3. Add to config: quill --init-config");
        std::process::exit(1);
    };

    let mode: ChatMode = args
        .mode
        .or(cfg.mode.clone())
        .map(|m| m.parse::<ChatMode>())
        .transpose()?
        .unwrap_or_default();
    let timeout = Duration::from_secs(args.timeout.or(cfg.timeout_secs).unwrap_or(30));
    let context = QueryContext {
        rfq_id: args.rfq.or(cfg.rfq.clone()),
        mode,
    };

    let session = Arc::new(auth::FileSession::load().with_user_id(args.user.or(cfg.user.clone())));
    if !session.is_logged_in() {
        tracing::debug!("No stored credentials, requests are sent without a token");
    }
    let client = BackendClient::with_timeout(endpoint, timeout)?;
    let transport = Arc::new(
        HttpTransport::new(client, Arc::clone(&session) as Arc<dyn SessionContext>)
            .with_rfq(context.rfq_id.clone()),
    );

    let config = OrchestratorConfig {
        context,
        request_timeout: timeout,
    };
    let orchestrator = Orchestrator::new(config, transport.clone(), session.clone());

    // Non-interactive mode
    if let Some(command) = args.command {
        return run_command(&orchestrator, &command).await;
    }

    let remote_prompts = if cfg.remote_suggestions.unwrap_or(true)
        && orchestrator.config().context.rfq_id.is_some()
    {
        match transport.prompt_suggestions().await {
            Ok(prompts) => prompts,
            Err(e) => {
                tracing::warn!("Could not fetch prompt suggestions: {}", e);
                Vec::new()
            }
        }
    } else {
        Vec::new()
    };

    run_interactive(&orchestrator, &transport, &remote_prompts).await
}

/// Print events for one request until it ends
fn spawn_printer(
    mut receiver: broadcast::Receiver<OrchestratorEvent>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            let event = match receiver.recv().await {
                Ok(event) => event,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!("Event printer lagged by {} events", n);
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            };
            let terminal = event.is_terminal();
            match event {
                OrchestratorEvent::TurnAppended { turn } if turn.role() == Role::Assistant => {
                    println!("{}", turn.content());
                }
                OrchestratorEvent::ModeChanged { to, .. } => match to {
                    ModeKind::Interrupted => {
                        println!("\n[Draft ready for review. Reply with feedback, or \"Approve\". /options lists choices.]");
                    }
                    ModeKind::Approved => {
                        println!("\n[Use /export to save the approved proposal.]");
                    }
                    ModeKind::Idle => {}
                },
                OrchestratorEvent::Error { kind, message } => {
                    tracing::debug!("{} error: {}", kind, message);
                }
                OrchestratorEvent::Cancelled => {
                    println!("[Request cancelled]");
                }
                _ => {}
            }
            if terminal {
                break;
            }
        }
    })
}

/// Submit `text`, aborting the request on Ctrl-C.
async fn submit_with_interrupt(orchestrator: &Orchestrator, text: &str) -> SubmitOutcome {
    let handle = orchestrator.handle();
    let submit = orchestrator.submit(text);
    tokio::pin!(submit);
    loop {
        tokio::select! {
            outcome = &mut submit => break outcome,
            _ = tokio::signal::ctrl_c() => handle.abort(),
        }
    }
}

async fn run_command(orchestrator: &Orchestrator, command: &str) -> anyhow::Result<()> {
    println!("quill> {}", command);
    println!();

    let printer = spawn_printer(orchestrator.subscribe());
    let outcome = submit_with_interrupt(orchestrator, command).await;
    finish_printer(printer, &outcome).await;

    match outcome {
        SubmitOutcome::Failed { error, .. } => anyhow::bail!("{}", error.message),
        SubmitOutcome::Ignored => anyhow::bail!("Nothing to send"),
        _ => Ok(()),
    }
}

/// Let the printer drain the events of a finished request.
async fn finish_printer(printer: tokio::task::JoinHandle<()>, outcome: &SubmitOutcome) {
    match outcome {
        SubmitOutcome::Ignored | SubmitOutcome::Rejected => printer.abort(),
        _ => {
            let abort = printer.abort_handle();
            if tokio::time::timeout(Duration::from_secs(1), printer)
                .await
                .is_err()
            {
                abort.abort();
            }
        }
    }
}

async fn run_interactive(
    orchestrator: &Orchestrator,
    transport: &HttpTransport,
    remote_prompts: &[String],
) -> anyhow::Result<()> {
    if std::io::IsTerminal::is_terminal(&std::io::stderr()) {
        let context = &orchestrator.config().context;
        match &context.rfq_id {
            Some(rfq) => eprintln!("quill ({}, {} retrieval)", rfq, context.mode),
            None => eprintln!("quill ({} retrieval)", context.mode),
        }
        eprintln!("Type /help for commands.");
        eprintln!();
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("{}", prompt_for(orchestrator.mode_kind()));
        std::io::stdout().flush()?;

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => {
                println!();
                break;
            }
        };
        // EOF
        let Some(line) = line else { break };

        if line.trim().is_empty() {
            continue;
        }

        if let Some(result) = commands::dispatch_line(&line, orchestrator, remote_prompts) {
            match result {
                commands::CommandResult::Message(msg) => println!("{}", msg),
                commands::CommandResult::Exit => break,
                commands::CommandResult::Export { winning } => {
                    match orchestrator.export(transport, winning).await {
                        Some(ExportStatus::Linked(link)) => println!("Saved: {}", link),
                        Some(ExportStatus::Failed(error)) => eprintln!("Export failed: {}", error),
                        None => println!("Nothing to export yet: no proposal has been approved."),
                    }
                }
                commands::CommandResult::Unknown(cmd) => {
                    println!("Unknown command: /{}", cmd);
                    println!("Type /help for available commands.");
                }
            }
            println!();
            continue;
        }

        println!();
        let printer = spawn_printer(orchestrator.subscribe());
        let outcome = submit_with_interrupt(orchestrator, &line).await;
        if matches!(outcome, SubmitOutcome::Rejected) {
            println!("A request is already in flight.");
        }
        finish_printer(printer, &outcome).await;
        println!();
    }

    Ok(())
}

fn prompt_for(mode: ModeKind) -> &'static str {
    match mode {
        ModeKind::Idle => "> ",
        ModeKind::Interrupted => "feedback> ",
        ModeKind::Approved => "approved> ",
    }
}

fn handle_login(
    token: String,
    refresh: Option<String>,
    user: Option<String>,
) -> anyhow::Result<()> {
    let path = auth::auth_file();
    let stored = auth::StoredAuth::new(token, refresh, user);
    match auth::save_auth(&path, &stored) {
        Ok(()) => {
            println!("Credentials saved to {}", path.display());
        }
        Err(e) => {
            eprintln!("Login failed: {}", e);
            std::process::exit(1);
        }
    }
    Ok(())
}

fn handle_logout() -> anyhow::Result<()> {
    match auth::remove_auth(&auth::auth_file()) {
        Ok(()) => {
            println!("Logged out");
        }
        Err(e) => {
            eprintln!("Logout failed: {}", e);
            std::process::exit(1);
        }
    }
    Ok(())
}

fn show_auth_status() -> anyhow::Result<()> {
    println!("Authentication Status");
    println!("{}", "-".repeat(40));

    let path = auth::auth_file();
    match auth::load_auth(&path) {
        Some(stored) if stored.access_token.is_some() => {
            let saved = chrono::DateTime::from_timestamp_millis(stored.saved_at)
                .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
                .unwrap_or_else(|| "unknown".to_string());
            println!("{:<15} Logged in (saved: {})", "Access token", saved);
            println!(
                "{:<15} {}",
                "Refresh token",
                if stored.refresh_token.is_some() {
                    "present"
                } else {
                    "absent (exports will not be linked to a drive account)"
                }
            );
            if let Some(user) = stored.user_id {
                println!("{:<15} {}", "User", user);
            }
        }
        _ => println!("{:<15} Not logged in", "Access token"),
    }

    println!();
    println!("Login with: quill --login <token> [--refresh <token>]");
    println!("Logout with: quill --logout");

    Ok(())
}
