//! Interactive chat over stdin
//!
//! One orchestrator per session. Lines starting with `/` are commands:
//! `/reset`, `/metrics`, `/quit`.

use crate::config::{load_config, AppConfig};
use anyhow::{Context, Result};
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tourguide_core::{Orchestrator, TurnEvent, TurnReply};
use tourguide_llm::ResponsesApiProvider;
use tourguide_tools::{TourCard, TourVisorClient};
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

/// Slash command typed instead of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Reset,
    Metrics,
    Quit,
    Unknown,
}

fn parse_command(line: &str) -> Option<Command> {
    let command = line.strip_prefix('/')?;
    Some(match command.trim() {
        "reset" => Command::Reset,
        "metrics" => Command::Metrics,
        "quit" | "exit" => Command::Quit,
        _ => Command::Unknown,
    })
}

fn build_orchestrator(config: &AppConfig) -> Result<Orchestrator> {
    let provider = ResponsesApiProvider::new(config.responses_config()?)
        .context("Failed to create model provider")?;
    let backend = TourVisorClient::new(config.tourvisor_config()?)
        .context("Failed to create TourVisor client")?;

    let mut orchestrator = Orchestrator::new(
        Arc::new(provider),
        Arc::new(backend),
        config.orchestrator_config(),
    )
    .with_poll_config(config.poll_config());
    if let Some(instructions) = config.instructions()? {
        orchestrator = orchestrator.with_instructions(instructions);
    }
    Ok(orchestrator)
}

/// Run the REPL until `/quit`, end of input, or Ctrl-C
pub async fn run(stream: bool) -> Result<()> {
    let config = load_config()?;
    let mut orchestrator = build_orchestrator(&config)?;

    let session_id = Uuid::new_v4();
    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            signal.cancel();
        }
    });

    info!(%session_id, stream, "Chat session started");
    println!("Турагент на связи. Команды: /reset, /metrics, /quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let line = tokio::select! {
            _ = shutdown.cancelled() => break,
            line = lines.next_line() => line.context("Failed to read stdin")?,
        };
        let Some(line) = line else { break };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match parse_command(line) {
            Some(Command::Quit) => break,
            Some(Command::Reset) => {
                orchestrator.reset();
                println!("Диалог сброшен.");
                continue;
            }
            Some(Command::Metrics) => {
                println!("{}", orchestrator.metrics_handle().export_prometheus());
                continue;
            }
            Some(Command::Unknown) => {
                println!("Неизвестная команда: {line}");
                continue;
            }
            None => {}
        }

        let span = info_span!("turn", %session_id);
        let reply = if stream {
            stream_turn(&mut orchestrator, line).instrument(span).await
        } else {
            let reply = orchestrator.send_message(line).instrument(span).await;
            println!("{}", reply.text);
            reply
        };
        if !reply.is_completed() {
            warn!(status = ?reply.status, iterations = reply.iterations, "Turn did not complete");
        }
        print_cards(&orchestrator.take_pending_cards());
    }

    info!(%session_id, metrics = ?orchestrator.metrics(), "Chat session ended");
    Ok(())
}

async fn stream_turn(orchestrator: &mut Orchestrator, text: &str) -> TurnReply {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let printer = tokio::spawn(async move {
        let mut stdout = std::io::stdout();
        while let Some(event) = rx.recv().await {
            match event {
                TurnEvent::Delta(delta) => {
                    let _ = write!(stdout, "{delta}");
                }
                // The terminal cannot take text back; mark the retraction instead
                TurnEvent::Discard => {
                    let _ = writeln!(stdout, "\n[ответ отозван]");
                }
                TurnEvent::Finished(_) => {
                    let _ = writeln!(stdout);
                }
            }
            let _ = stdout.flush();
        }
    });

    let reply = orchestrator.send_message_streaming(text, &tx).await;
    drop(tx);
    if let Err(e) = printer.await {
        warn!(error = %e, "Stream printer task failed");
    }
    reply
}

fn format_card(card: &TourCard) -> String {
    let mut line = format!("• {}", card.hotel_name);
    if card.hotel_stars > 0 {
        line.push_str(&format!(" {}*", card.hotel_stars));
    }
    if !card.resort.is_empty() {
        line.push_str(&format!(", {}", card.resort));
    }
    if let Some(date) = &card.date_from {
        line.push_str(&format!(", вылет {date}"));
    }
    if card.nights > 0 {
        line.push_str(&format!(", {} ноч.", card.nights));
    }
    match card.price_per_person {
        Some(price) => line.push_str(&format!(", {price} ₽/чел.")),
        None => line.push_str(&format!(", {} ₽", card.price)),
    }
    line
}

fn print_cards(cards: &[TourCard]) {
    if cards.is_empty() {
        return;
    }
    println!("Варианты:");
    for card in cards {
        println!("{}", format_card(card));
    }
}
