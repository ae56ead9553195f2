//! sift - review a media directory one item at a time.
//!
//! Wires the directory page source and the JSON state store into the
//! queue engine, then maps line commands from stdin onto the dispatcher.
//!
//! Usage: `sift <media-dir> [data-dir]`

use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;

use sift_core::{EngineConfig, EngineError, QueueStatus, ReviewCommand};
use sift_engine::{Dispatcher, QueueEngine, TotalCountCache};
use sift_store::{DirSource, JsonStateStore};

fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();
}

/// Resolve the data directory: explicit argument, then the platform
/// default.
fn resolve_data_dir(explicit: Option<String>) -> Option<PathBuf> {
    explicit.map(PathBuf::from).or_else(sift_core::data_dir)
}

fn print_status(status: &QueueStatus) {
    if status.done {
        println!("done ({} reviewed)", status.position);
        return;
    }
    let total = status
        .total
        .map(|t| format!("~{t}"))
        .unwrap_or_else(|| "?".to_string());
    let current = status
        .current
        .as_ref()
        .map(|id| id.to_string())
        .unwrap_or_else(|| "-".to_string());
    println!(
        "[{}/{}] {} (undo: {})",
        status.display_position(),
        total,
        current,
        status.undo_count
    );
}

fn parse_command(line: &str) -> Option<Result<ReviewCommand, String>> {
    let mut words = line.split_whitespace();
    let verb = words.next()?;
    let command = match verb {
        "skip" | "s" => ReviewCommand::Skip,
        "trash" | "t" => ReviewCommand::Trash,
        "undo" | "u" => ReviewCommand::Undo,
        "restart" => ReviewCommand::Restart,
        "jump" | "j" => match words.next().map(str::parse) {
            Some(Ok(target)) => ReviewCommand::Jump { target },
            _ => return Some(Err("usage: jump <position>".to_string())),
        },
        other => return Some(Err(format!("unknown command: {other}"))),
    };
    Some(Ok(command))
}

fn print_help() {
    println!("commands: skip (s), trash (t), undo (u), jump <n> (j), restart, status, help, quit");
}

async fn run(media_dir: String, data_dir: Option<String>) -> Result<(), EngineError> {
    let config = EngineConfig::load().unwrap_or_else(|e| {
        tracing::warn!("Failed to load config, using defaults: {e}");
        EngineConfig::default()
    });

    let data_dir = resolve_data_dir(data_dir)
        .ok_or_else(|| EngineError::Persistence("no data directory available".to_string()))?;

    let source = Arc::new(DirSource::new(media_dir)?);
    let store = Arc::new(JsonStateStore::open(data_dir)?);
    let count = Arc::new(TotalCountCache::new(
        source.clone(),
        store.clone(),
        config.clone(),
    ));
    let engine = Arc::new(QueueEngine::new(source, store, count.clone(), config));
    let dispatcher = Dispatcher::new(engine, count);

    let status = dispatcher.initialize().await?;
    print_status(&status);
    print_help();

    let stdin = std::io::stdin();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(_) => break,
        };
        match line.trim() {
            "" => continue,
            "quit" | "q" | "exit" => break,
            "help" | "?" => {
                print_help();
                continue;
            }
            "status" => {
                print_status(&dispatcher.status());
                continue;
            }
            other => match parse_command(other) {
                Some(Ok(command)) => match dispatcher.handle(command).await {
                    Ok(status) => print_status(&status),
                    Err(e) => eprintln!("error: {e}"),
                },
                Some(Err(usage)) => eprintln!("{usage}"),
                None => {}
            },
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    init_tracing();

    let mut args = std::env::args().skip(1);
    let Some(media_dir) = args.next() else {
        eprintln!("usage: sift <media-dir> [data-dir]");
        std::process::exit(2);
    };
    let data_dir = args.next();

    if let Err(e) = run(media_dir, data_dir).await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
