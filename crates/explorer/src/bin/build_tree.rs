//! Build an intersected opening tree from two players' PGN exports.
//!
//! Player 1's games decide which white moves are kept, player 2's which black
//! moves. The output is the analysis tree JSON the explorer loads.
//!
//! Usage: cargo run --release --bin build-tree -- <p1.pgn> <p2.pgn> [--threshold 0.15] [--depth 20] [--out tree.json]

use std::env;
use std::fs;
use std::path::Path;
use std::time::Instant;

use chess_core::game_data::GameData;
use chess_core::opening_tree::{intersect_trees, PlayerTree};
use chess_core::pgn::{parse_pgn, split_games};
use explorer::error::ExplorerError;
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_THRESHOLD: f64 = 0.15;
const DEFAULT_DEPTH: usize = 20;
const DEFAULT_OUT: &str = "tree.json";

fn read_games(path: &Path) -> Result<Vec<GameData>, ExplorerError> {
    let text = fs::read_to_string(path).map_err(|e| ExplorerError::io(path, e))?;
    let chunks = split_games(&text);
    let games: Vec<GameData> = chunks.iter().filter_map(|g| parse_pgn(g)).collect();

    info!(
        path = %path.display(),
        found = chunks.len(),
        usable = games.len(),
        "Read PGN file"
    );
    Ok(games)
}

fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args: Vec<String> = env::args().collect();

    if args.len() < 3 {
        eprintln!(
            "Usage: {} <p1.pgn> <p2.pgn> [--threshold 0.15] [--depth 20] [--out tree.json]",
            args[0]
        );
        std::process::exit(1);
    }

    let p1_path = Path::new(&args[1]);
    let p2_path = Path::new(&args[2]);

    // Parse optional args
    let mut threshold = DEFAULT_THRESHOLD;
    let mut depth = DEFAULT_DEPTH;
    let mut out = DEFAULT_OUT.to_string();

    let mut i = 3;
    while i < args.len() {
        match args[i].as_str() {
            "--threshold" => {
                threshold = args.get(i + 1).and_then(|s| s.parse().ok()).unwrap_or(DEFAULT_THRESHOLD);
                i += 2;
            }
            "--depth" => {
                depth = args.get(i + 1).and_then(|s| s.parse().ok()).unwrap_or(DEFAULT_DEPTH);
                i += 2;
            }
            "--out" => {
                out = args.get(i + 1).cloned().unwrap_or_else(|| DEFAULT_OUT.to_string());
                i += 2;
            }
            _ => i += 1,
        }
    }

    if !(0.0..=1.0).contains(&threshold) {
        return Err(ExplorerError::Config("--threshold must be between 0 and 1").into());
    }

    println!("Building opening tree:");
    println!("  Player 1: {}", p1_path.display());
    println!("  Player 2: {}", p2_path.display());
    println!("  Threshold: {}", threshold);
    println!("  Depth: {} plies", depth);
    println!();

    let start = Instant::now();

    let p1 = PlayerTree::from_games(&read_games(p1_path)?, depth);
    let p2 = PlayerTree::from_games(&read_games(p2_path)?, depth);
    println!(
        "Player 1: {} games, {} tree nodes",
        p1.game_count(),
        p1.move_count()
    );
    println!(
        "Player 2: {} games, {} tree nodes",
        p2.game_count(),
        p2.move_count()
    );

    let tree = intersect_trees(&p1, &p2, threshold);
    let json = serde_json::to_string_pretty(&tree)?;
    fs::write(&out, json).map_err(|e| ExplorerError::io(&out, e))?;

    println!();
    println!(
        "Wrote {} nodes ({} plies deep) to {} in {:.1}s",
        tree.node_count(),
        tree.height(),
        out,
        start.elapsed().as_secs_f64()
    );

    Ok(())
}
