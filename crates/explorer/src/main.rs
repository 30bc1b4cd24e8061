//! Opening explorer
//!
//! Interactive terminal session over an analysis tree file. The file is
//! polled so a freshly written analysis result replaces the current tree.

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use explorer::config::ExplorerConfig;
use explorer::session::Session;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file for local dev
    let _ = dotenvy::dotenv();

    // Logs on stderr, the session owns stdout
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let mut config = ExplorerConfig::from_env();
    if let Some(path) = std::env::args().nth(1) {
        config.tree_path = Some(PathBuf::from(path));
    }

    let mut session = Session::new(&config);
    match &config.tree_path {
        Some(path) => {
            if let Err(e) = session.load_file(path) {
                warn!(path = %path.display(), error = %e, "Tree file not loaded, waiting for it");
                session.watch(path);
            }
        }
        None => info!("No tree file given, starting from the initial position"),
    }

    print_board(&session);
    println!("Type 'help' for commands.");
    prompt();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let polling = config.poll_interval.is_some();
    let mut poll = tokio::time::interval(config.poll_interval.unwrap_or(Duration::from_secs(60)));

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                match session.execute(&line) {
                    Ok(reply) if reply.quit => break,
                    Ok(reply) => {
                        if !reply.text.is_empty() {
                            println!("{}", reply.text.trim_end());
                        }
                    }
                    Err(e) => println!("Error: {e}"),
                }
                prompt();
            }
            _ = poll.tick(), if polling => {
                match session.reload_if_changed() {
                    Ok(true) => {
                        println!();
                        println!("Analysis tree updated, back at the root.");
                        print_board(&session);
                        prompt();
                    }
                    Ok(false) => {}
                    Err(e) => warn!(error = %e, "Failed to reload tree file"),
                }
            }
        }
    }

    info!("Session closed");
    Ok(())
}

fn print_board(session: &Session) {
    match session.board() {
        Ok(board) => println!("{board}"),
        Err(e) => println!("Error: {e}"),
    }
}

fn prompt() {
    print!("> ");
    let _ = std::io::stdout().flush();
}
