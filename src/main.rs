mod app;
mod bank;
mod clock;
mod config;
mod logging;
mod progress;
mod quiz;
mod scheduler;
mod selection;
mod storage;
mod timer;
mod transfer;
mod ui;

use anyhow::{Result, bail};
use app::{App, Store};
use bank::QuestionBank;
use clap::{Parser, Subcommand};
use clock::SystemClock;
use config::Config;
use progress::{LoadOutcome, ProgressStore};
use std::path::PathBuf;
use storage::{KeyValueStore, MemoryStore, SqliteStore};
use tracing::warn;

#[derive(Parser)]
#[command(name = "jitprep", about = "Java interview flashcards with spaced repetition", version)]
struct Cli {
    /// Use a different config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Write progress to jit-progress-YYYY-MM-DD.json
    Export {
        /// Directory to write to (default: export_dir from config)
        #[arg(long)]
        dir: Option<PathBuf>,
    },

    /// Replace all progress with the contents of a JSON file
    Import {
        /// File previously written by `export`
        file: PathBuf,
    },

    /// Forget all progress
    Reset {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },

    /// Show question counts, due items and average score per topic
    Stats,
}

/// Open the progress store. The interactive session falls back to an
/// in-memory store when the database is unusable; commands that exist to
/// change the database do not.
fn open_store(config: &Config, allow_fallback: bool) -> Result<Store> {
    let kv: Box<dyn KeyValueStore> = match SqliteStore::open(&config.db_path) {
        Ok(store) => Box::new(store),
        Err(e) if allow_fallback => {
            warn!(error = %e, "database unavailable, progress will not be saved");
            Box::new(MemoryStore::new())
        }
        Err(e) => return Err(e),
    };

    let store = ProgressStore::open(kv, SystemClock);
    if let LoadOutcome::Recovered(reason) = store.load_outcome() {
        warn!(%reason, "started with empty progress");
    }
    Ok(store)
}

fn confirm(prompt: &str) -> Result<bool> {
    eprint!("{} [y/N] ", prompt);
    let mut answer = String::new();
    std::io::stdin().read_line(&mut answer)?;
    Ok(answer.trim().eq_ignore_ascii_case("y"))
}

fn print_stats(bank: &QuestionBank, store: &Store) {
    let now = store.now_ms();

    println!("{:<14} {:>5} {:>5} {:>6}", "topic", "total", "due", "avg");
    for topic in &bank.topics {
        let ids: Vec<&str> = bank
            .questions
            .iter()
            .filter(|q| &q.topic == topic)
            .map(|q| q.id.as_str())
            .collect();
        println!(
            "{:<14} {:>5} {:>5} {:>6.2}",
            topic,
            ids.len(),
            store.due_count(&ids, now),
            store.average_score(&ids)
        );
    }

    let all: Vec<&str> = bank.questions.iter().map(|q| q.id.as_str()).collect();
    println!(
        "{:<14} {:>5} {:>5} {:>6.2}",
        "all",
        all.len(),
        store.due_count(&all, now),
        store.average_score(&all)
    );
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    config.ensure_dirs()?;

    if let Err(e) = logging::init(&config.log_path) {
        eprintln!("Warning: logging disabled: {:#}", e);
    }

    let bank = QuestionBank::load_or_builtin(config.questions_path.as_deref())?;

    match cli.command {
        Some(Command::Export { dir }) => {
            let store = open_store(&config, false)?;
            let dir = dir.unwrap_or_else(|| config.export_dir.clone());
            let path = transfer::export_to_dir(&store, &dir)?;
            println!("Exported {} entries to {}", store.len(), path.display());
        }
        Some(Command::Import { file }) => {
            let mut store = open_store(&config, false)?;
            match transfer::import_from_file(&mut store, &file) {
                Ok(count) => println!("Imported {} entries.", count),
                Err(e) => bail!("Failed to import {}: {}", file.display(), e),
            }
        }
        Some(Command::Reset { yes }) => {
            let mut store = open_store(&config, false)?;
            if yes || confirm("Reset progress?")? {
                store.reset_all()?;
                println!("Progress reset.");
            }
        }
        Some(Command::Stats) => {
            let store = open_store(&config, true)?;
            print_stats(&bank, &store);
        }
        None => {
            let store = open_store(&config, true)?;

            // Ignore SIGINT so Ctrl+C reaches the app as a key event
            #[cfg(unix)]
            unsafe {
                signal_hook::low_level::register(signal_hook::consts::SIGINT, || {})?;
            }

            let app = App::new(config, bank, store);
            let mut terminal = ratatui::init();
            let result = app.run(&mut terminal);
            ratatui::restore();
            result?;
        }
    }

    Ok(())
}
