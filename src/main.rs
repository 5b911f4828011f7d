//! Support chat - terminal client for a question/answer service
//!
//! Lines typed on stdin are sent as questions; answers are printed as they
//! arrive, in the order the questions were asked.

mod answer;
mod config;
mod render;
mod session;
mod transcript;

use answer::{AnswerService, HttpAnswerService, LoggingService};
use config::ClientConfig;
use session::{SessionController, SessionEvent, SubmissionHandle, SubmitError};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// A line of user input
#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    Send(&'a str),
    Cancel,
    Reset,
    Dump,
    Quit,
}

impl<'a> Command<'a> {
    fn parse(line: &'a str) -> Self {
        match line.trim() {
            "/cancel" => Command::Cancel,
            "/reset" => Command::Reset,
            "/dump" => Command::Dump,
            "/quit" | "/exit" => Command::Quit,
            _ => Command::Send(line),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr so they never interleave with the transcript
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "support_chat=info".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    let config = ClientConfig::from_env();
    let http = HttpAnswerService::new(config.answer_url.clone())?;
    tracing::info!(
        url = %http.url(),
        timeout_secs = config.request_timeout.as_secs(),
        "Answering service configured"
    );

    let service: Arc<dyn AnswerService> = Arc::new(LoggingService::new(Arc::new(http)));
    let session = SessionController::new(service, config.request_timeout, config.event_buffer);
    let shutdown = CancellationToken::new();
    let printer = tokio::spawn(print_events(
        session.clone(),
        session.subscribe(),
        shutdown.clone(),
    ));

    println!("Support chat. Commands: /cancel /reset /dump /quit");

    let mut outstanding: Vec<SubmissionHandle> = Vec::new();
    let mut quit = false;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        outstanding.retain(|h| !h.is_finished());
        match Command::parse(&line) {
            Command::Quit => {
                quit = true;
                break;
            }
            Command::Cancel => {
                if session.cancel_latest().is_none() {
                    println!("(nothing to cancel)");
                }
            }
            Command::Reset => session.reset(),
            Command::Dump => println!("{}", render::snapshot_json(&session.snapshot())?),
            Command::Send(text) => match session.submit(text) {
                Ok(handle) => {
                    tracing::debug!(
                        correlation_id = %handle.correlation_id,
                        user_turn = %handle.user_turn,
                        agent_turn = %handle.agent_turn,
                        "Question queued"
                    );
                    outstanding.push(handle);
                }
                Err(SubmitError::EmptyInput) => {}
            },
        }
    }

    // Input ran out (e.g. piped questions): let the answers arrive first
    if !quit {
        for handle in outstanding {
            handle.settled().await;
        }
    }

    shutdown.cancel();
    if let Err(e) = printer.await {
        tracing::error!(error = %e, "Event printer failed");
    }
    tracing::info!(
        pending = session.pending_count(),
        in_flight = session.in_flight_count(),
        "Shutting down"
    );
    Ok(())
}

/// Print transcript changes as they happen, draining what is queued on shutdown
async fn print_events(
    session: SessionController,
    mut events: broadcast::Receiver<SessionEvent>,
    shutdown: CancellationToken,
) {
    loop {
        tokio::select! {
            biased;
            event = events.recv() => match event {
                Ok(event) => print_event(&session, event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Event printer lagged, redrawing transcript");
                    println!("{}", render::format_transcript(&session.snapshot()));
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            () = shutdown.cancelled() => {
                while let Ok(event) = events.try_recv() {
                    print_event(&session, event);
                }
                break;
            }
        }
    }
}

fn print_event(session: &SessionController, event: SessionEvent) {
    match event {
        SessionEvent::TurnAppended(turn) => {
            if turn.is_pending() {
                if let Some(status) = render::format_pending(session.pending_count()) {
                    println!("{status}");
                }
            }
        }
        SessionEvent::TurnSettled(turn) => {
            println!("{}", render::format_turn(&turn));
            if let Some(status) = render::format_pending(session.pending_count()) {
                println!("{status}");
            }
        }
        SessionEvent::Reset => println!("(session cleared)"),
    }
}
