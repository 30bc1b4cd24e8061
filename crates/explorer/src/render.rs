//! Plain-text views of the session: board, tree outline, history, node details.

use std::fmt::Write;

use chess_core::analysis_tree::{eval_bar_white_share, format_eval, ResultTriple};
use chess_core::history::History;
use chess_core::layout::{GraphNode, TreeGraph};
use chess_core::navigator::BoardState;
use chess_core::rules::parse_position;
use chess_core::CoreError;
use shakmaty::{File, Position, Rank, Square};

const EVAL_BAR_WIDTH: usize = 20;

/// Board diagram from white's side. The last move's squares are bracketed
/// and a king in check is marked with `!`.
pub fn board(state: &BoardState) -> Result<String, CoreError> {
    let pos = parse_position(&state.position)?;
    let board = pos.board();
    let mut out = String::new();

    for rank in (0..8u32).rev() {
        let _ = write!(out, "{} ", rank + 1);
        for file in 0..8u32 {
            let sq = Square::from_coords(File::new(file), Rank::new(rank));
            let piece = board.piece_at(sq).map(|p| p.char()).unwrap_or('.');

            let touched = state
                .last_move
                .is_some_and(|mv| mv.from == sq || mv.to == sq);

            if state.check_square == Some(sq) {
                let _ = write!(out, "!{piece}!");
            } else if touched {
                let _ = write!(out, "[{piece}]");
            } else {
                let _ = write!(out, " {piece} ");
            }
        }
        out.push('\n');
    }
    out.push_str("   a  b  c  d  e  f  g  h\n");

    let _ = writeln!(out, "FEN: {}", state.position);
    if let Some(mv) = state.last_move {
        let _ = writeln!(out, "Last move: {mv}");
    }
    if let Some(sq) = state.check_square {
        let _ = writeln!(out, "Check: king on {sq}");
    }
    Ok(out)
}

/// Indented outline of the tree graph in preorder, selected node starred.
pub fn tree(graph: &TreeGraph, selected: Option<&str>) -> String {
    if graph.is_empty() {
        return "No tree loaded".to_string();
    }

    let mut out = String::new();
    for node in &graph.nodes {
        let marker = if selected == Some(node.id.as_str()) { '*' } else { ' ' };
        let indent = "  ".repeat(node.depth);
        let _ = write!(out, "{marker} {indent}{}", node.display_label);
        if !node.source_node.is_root() {
            let _ = write!(out, " ({:.0}%)", node.source_node.play_rate() * 100.0);
        }
        let _ = writeln!(out, "  [{}]", node.id);
    }
    out
}

/// Numbered history line; the displayed entry is marked.
pub fn history(history: &History, current: &str) -> String {
    let mut out = String::new();
    for (i, entry) in history.entries().iter().enumerate() {
        let marker = if entry.position == current { '>' } else { ' ' };
        match entry.mv {
            Some(mv) => {
                let _ = writeln!(out, "{marker} {i:>3}. {mv}");
            }
            None => {
                let _ = writeln!(out, "{marker} {i:>3}. start");
            }
        }
    }
    out
}

/// Details for a selected tree node.
pub fn node_info(node: &GraphNode) -> String {
    let data = &node.source_node;
    let mut out = String::new();

    let _ = writeln!(out, "Node: {} [{}]", node.display_label, node.id);
    let _ = writeln!(out, "FEN: {}", data.position);

    let share = eval_bar_white_share(data.evaluation_centipawns);
    let filled = ((share / 100.0) * EVAL_BAR_WIDTH as f64).round() as usize;
    let _ = writeln!(
        out,
        "Eval: {} |{}{}|",
        format_eval(data.evaluation_centipawns),
        "#".repeat(filled),
        "-".repeat(EVAL_BAR_WIDTH - filled.min(EVAL_BAR_WIDTH)),
    );

    if !data.is_root() {
        let side = if data.white_just_moved() { "white" } else { "black" };
        let _ = writeln!(out, "Play rate ({side}): {:.1}%", data.play_rate() * 100.0);
    }

    let _ = writeln!(
        out,
        "Games: p1 {} / p2 {}",
        data.game_counts.p1, data.game_counts.p2
    );
    let _ = writeln!(out, "Actual    p1 {}", results(&data.actual_results.p1));
    let _ = writeln!(out, "          p2 {}", results(&data.actual_results.p2));
    let _ = writeln!(out, "Expected  p1 {}", results(&data.expected_results.p1));
    let _ = writeln!(out, "          p2 {}", results(&data.expected_results.p2));
    out
}

fn results(triple: &ResultTriple) -> String {
    match triple.percentages() {
        Some((w, d, l)) => format!("W {w:.1}% D {d:.1}% L {l:.1}%"),
        None => "no games".to_string(),
    }
}
