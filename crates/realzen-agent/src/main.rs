//! An interactive real-estate assistant for the terminal.

#[macro_use]
extern crate tracing;

use std::io::Write as _;
use std::pin::pin;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use realzen_agent::core::TranscriptSource;
use realzen_agent::{Configuration, SessionBuilder};
use realzen_agent_openai_model::OpenAIProvider;
use tokio::io::{self, AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::select;
use tokio::sync::mpsc;
use tokio::time::sleep;

const BAR_CHAR: &str = "▎";
const MAX_TOOL_TRANSCRIPT_CHARS: usize = 160;

#[tokio::main(flavor = "current_thread")]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = match Configuration::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("invalid configuration: {err}");
            return;
        }
    };
    debug!(?config, "loaded configuration");
    if config.rapidapi_key().is_none() {
        warn!("RAPIDAPI_KEY is not set, property searches will fail");
    }

    let model_provider = match config
        .openai_config()
        .map_err(|err| err.to_string())
        .and_then(|c| OpenAIProvider::new(c).map_err(|err| err.to_string()))
    {
        Ok(provider) => provider,
        Err(err) => {
            eprintln!("cannot create the model provider: {err}");
            return;
        }
    };

    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let session = SessionBuilder::with_model_provider(model_provider)
        .on_transcript(move |transcript, source| {
            event_tx.send((transcript.to_owned(), source)).ok();
        })
        .build(&config);
    let mut session = match session {
        Ok(session) => session,
        Err(err) => {
            eprintln!("cannot create the session: {err}");
            return;
        }
    };

    let progress_style = ProgressStyle::with_template("{spinner} {wide_msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");
    let mut lines = BufReader::new(io::stdin()).lines();

    loop {
        print!("> ");
        std::io::stdout().flush().ok();

        let Some(line) = read_line(&mut lines).await else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let progress_bar = ProgressBar::new_spinner();
        progress_bar.set_style(progress_style.clone());
        progress_bar.set_message("🏠 Thinking...");

        let mut reply = pin!(session.send_message(line));
        let result = loop {
            select! {
                result = &mut reply => break result.map(|_| ()),
                Some((transcript, source)) = event_rx.recv() => {
                    progress_bar.suspend(|| print_transcript(&transcript, source));
                }
                _ = sleep(Duration::from_millis(100)) => progress_bar.tick(),
            }
        };
        progress_bar.finish_and_clear();

        // Transcripts of the last step may still be queued.
        while let Ok((transcript, source)) = event_rx.try_recv() {
            print_transcript(&transcript, source);
        }
        if let Err(err) = result {
            println!("{}❌ {}", BAR_CHAR.bright_red(), err.bright_red());
        }
        println!();
    }
}

fn print_transcript(transcript: &str, source: TranscriptSource) {
    match source {
        TranscriptSource::Assistant if !transcript.is_empty() => {
            println!("{}🤖 {}", BAR_CHAR.bright_cyan(), transcript.bright_white());
        }
        TranscriptSource::Tool => {
            let mut summary: String =
                transcript.chars().take(MAX_TOOL_TRANSCRIPT_CHARS).collect();
            if summary.len() < transcript.len() {
                summary.push('…');
            }
            println!("{}🔧 {}", BAR_CHAR.bright_yellow(), summary.dimmed());
        }
        _ => {}
    }
}

async fn read_line(lines: &mut Lines<BufReader<Stdin>>) -> Option<String> {
    match lines.next_line().await {
        Ok(line) => line,
        Err(err) => {
            error!("error reading input: {}", err);
            None
        }
    }
}
