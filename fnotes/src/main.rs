// FNotes - offline notes with a console shell
// Entry point and application setup

use anyhow::Context;
use fnotes::app::{AppState, Session};
use fnotes::config::{AppConfig, DEFAULT_LOG_FILTER};
use fnotes::platform::ConsolePlatform;
use fnotes::presentation::Event;
use fnotes::shell::{self, Command};
use std::io::BufRead;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so they don't interleave with the rendered screen
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Starting FNotes");

    let state = AppState::open(AppConfig::from_env())
        .await
        .context("failed to open the notes store")?;

    let (platform, answers) = ConsolePlatform::new();
    let platform = Arc::new(platform);
    let session = Session::start(state, platform.clone());

    let (events_tx, events_rx) = mpsc::channel(32);
    let screen = Arc::new(Mutex::new(String::new()));

    // stdin is read on a plain thread; it never holds up runtime shutdown
    let reader_screen = Arc::clone(&screen);
    std::thread::spawn(move || read_commands(platform, answers, events_tx, reader_screen));

    session
        .run(events_rx, |session| {
            if session.take_focus_request() {
                println!("(search) type `query <text>`");
            }

            let text = shell::render(session.presenter());
            if let Ok(mut last) = screen.lock() {
                if *last != text {
                    println!("{}", text);
                    *last = text;
                }
            }
        })
        .await?;

    tracing::info!("FNotes stopped");
    Ok(())
}

fn read_commands(
    platform: Arc<ConsolePlatform>,
    answers: mpsc::Sender<bool>,
    events: mpsc::Sender<Event>,
    screen: Arc<Mutex<String>>,
) {
    println!("{}", shell::HELP);

    for line in std::io::stdin().lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                tracing::error!("Failed to read input: {}", e);
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let event = match shell::parse(&line) {
            Ok(Command::Event(event)) => event,
            Ok(Command::Confirm) => {
                if !platform.is_prompting() || answers.try_send(true).is_err() {
                    println!("No authentication prompt is pending");
                }
                continue;
            }
            Ok(Command::Cancel) if platform.is_prompting() => {
                let _ = answers.try_send(false);
                continue;
            }
            Ok(Command::Cancel) => Event::Cancel,
            Ok(Command::List) => {
                if let Ok(last) = screen.lock() {
                    println!("{}", last);
                }
                continue;
            }
            Ok(Command::Help) => {
                println!("{}", shell::HELP);
                continue;
            }
            Ok(Command::Quit) => break,
            Err(e) => {
                println!("{}", e);
                continue;
            }
        };

        if events.blocking_send(event).is_err() {
            break;
        }
    }
}
