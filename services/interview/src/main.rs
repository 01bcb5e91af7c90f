use anyhow::{Context, Result};
use clap::Parser;
use interview_core::Update;
use interview_core::question_service::QuestionService;
use interview_core::runner::{SessionHandle, SessionRunner};
use interview_service::config::Config;
use interview_service::console::{ConsoleRecognizer, ConsoleSynthesizer, SpeechFeed};
use interview_service::presenter::{FollowUp, Presenter, format_answers};
use interview_service::question_adapter::HttpQuestionService;
use std::sync::Arc;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing_subscriber::fmt::time::ChronoLocal;

#[derive(Parser)]
#[command(version, about = "Voice-driven interview against a remote question service")]
struct Cli {
    /// Base URL of the question service (overrides QUESTION_SERVICE_URL)
    #[arg(long)]
    base_url: Option<String>,
    /// Clear the server-side session before starting
    #[arg(long)]
    reset: bool,
    /// Print the stored answers and exit
    #[arg(long)]
    results: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // --- 1. Load Configuration ---
    let config = Config::from_env().context("Failed to load application configuration")?;

    // --- 2. Initialize Logging ---
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(ChronoLocal::rfc_3339())
        .with_writer(std::io::stderr)
        .init();

    tracing::info!("Configuration loaded successfully. Starting interview service...");

    // --- 3. Parse Command-Line Arguments ---
    let args = Cli::parse();
    let base_url = args
        .base_url
        .clone()
        .unwrap_or_else(|| config.question_service_url.clone());

    // --- 4. Initialize the Question Service Client ---
    let client_config = question_client::Config::builder()
        .with_base_url(&base_url)
        .with_timeout(config.request_timeout)
        .build();
    let client = question_client::client_with_config(client_config)
        .context("Failed to build question service client")?;
    let service = Arc::new(HttpQuestionService::new(client));
    tracing::info!("Using question service at {}", base_url);

    if args.results {
        let answers = service
            .list_answers()
            .await
            .context("Failed to fetch stored answers")?;
        for line in format_answers(&answers) {
            println!("{line}");
        }
        return Ok(());
    }

    if args.reset {
        let reset = service
            .reset_session()
            .await
            .context("Failed to reset the server-side session")?;
        if !reset {
            anyhow::bail!("question service refused to reset the session");
        }
        tracing::info!("Server-side session cleared.");
    }

    // --- 5. Session Setup ---
    let (recognizer, feed) = ConsoleRecognizer::new();
    let synthesizer = ConsoleSynthesizer::new(&config.controller.locale, config.speak_word);
    let (runner, handle, updates) =
        SessionRunner::new(config.controller.clone(), service, recognizer, synthesizer);

    let mut runner_handle = tokio::spawn(runner.run());
    let presenter_handle = tokio::spawn(present(updates, handle.clone()));
    let input_handle = tokio::spawn(dispatch_input(read_stdin(), handle.clone(), feed));

    println!("Type your answer, then an empty line. Commands: /start /finish /retry /relisten /answers /reset /quit");
    handle.start();

    // --- 6. Run until the session ends ---
    let session = tokio::select! {
        session = &mut runner_handle => session.context("Session runner failed")?,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Received Ctrl-C, shutting down...");
            handle.shutdown();
            runner_handle.await.context("Session runner failed")?
        }
    };

    presenter_handle.abort();
    input_handle.abort();
    if let Some(error) = &session.last_error {
        tracing::debug!("Last recoverable error: {}", error);
    }
    tracing::info!(
        "Shutting down after {} question(s) in state {:?}.",
        session.question_index,
        session.turn_state
    );
    Ok(())
}

/// Reads stdin on a dedicated thread so a pending read never blocks shutdown.
fn read_stdin() -> UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

async fn dispatch_input(mut lines: UnboundedReceiver<String>, handle: SessionHandle, feed: SpeechFeed) {
    while let Some(line) = lines.recv().await {
        match line.trim() {
            "/start" => handle.start(),
            "/finish" => handle.finish_answer(),
            "/retry" => handle.retry_submit(),
            "/relisten" => handle.relisten(),
            "/answers" => handle.list_answers(),
            "/reset" => handle.reset(),
            "/quit" => handle.shutdown(),
            text => {
                if !feed.push_line(text) && !text.is_empty() {
                    println!("(not listening right now)");
                }
                true
            }
        };
    }
}

// Renders session updates and winds the session down once it is complete.
async fn present(mut updates: UnboundedReceiver<Update>, handle: SessionHandle) {
    let mut presenter = Presenter::new();
    let mut lines = Vec::new();
    while let Some(update) = updates.recv().await {
        let follow_up = presenter.render(update, &mut lines);
        for line in lines.drain(..) {
            println!("{line}");
        }
        match follow_up {
            Some(FollowUp::ListAnswers) => handle.list_answers(),
            Some(FollowUp::Shutdown) => handle.shutdown(),
            None => true,
        };
    }
}
