use std::collections::HashMap;

use chess_core::analysis_tree::AnalysisNode;
use chess_core::rules::{BoardMove, MoveExecutor};
use chess_core::CoreError;
use serde_json::{json, Value};
use shakmaty::Square;

pub const START: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
pub const AFTER_E4: &str = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1";
pub const AFTER_D4: &str = "rnbqkbnr/pppppppp/8/8/3P4/8/PPP1PPPP/RNBQKBNR b KQkq - 0 1";
pub const AFTER_E4_E5: &str = "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2";
pub const AFTER_E4_C5: &str = "rnbqkbnr/pp1ppppp/8/2p5/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2";
pub const AFTER_D4_D5: &str = "rnbqkbnr/ppp1pppp/8/3p4/3P4/8/PPP1PPPP/RNBQKBNR w KQkq - 0 2";
pub const AFTER_D4_NF6: &str = "rnbqkb1r/pppppppp/5n2/8/3P4/8/PPP1PPPP/RNBQKBNR w KQkq - 1 2";

pub fn mv(code: &str) -> BoardMove {
    BoardMove::from_code(code).unwrap()
}

/// Engine-shaped tree: start -> e4 (e5, c5), d4 (d5, Nf6).
/// Children are arrays since a `json!` object would sort its keys.
pub fn opening_tree_json() -> Value {
    json!({
        "fen": START,
        "san": "root",
        "uci": "root",
        "eval": 20,
        "counts": { "p1": 40, "p2": 38 },
        "children": [
            {
                "fen": AFTER_E4,
                "san": "e4",
                "uci": "e2e4",
                "eval": 30,
                "rates": { "w": 0.7, "b": 0.8 },
                "counts": { "p1": 28, "p2": 30 },
                "p1_res": { "w_wins": 14, "draws": 8, "b_wins": 6 },
                "children": [
                    { "fen": AFTER_E4_E5, "san": "e5", "uci": "e7e5", "rates": { "w": 0.5, "b": 0.6 } },
                    { "fen": AFTER_E4_C5, "san": "c5", "uci": "c7c5", "rates": { "w": 0.3, "b": 0.4 } }
                ]
            },
            {
                "fen": AFTER_D4,
                "san": "d4",
                "uci": "d2d4",
                "rates": { "w": 0.3, "b": 0.2 },
                "children": [
                    { "fen": AFTER_D4_D5, "san": "d5", "uci": "d7d5" },
                    { "fen": AFTER_D4_NF6, "san": "Nf6", "uci": "g8f6" }
                ]
            }
        ]
    })
}

pub fn opening_tree() -> AnalysisNode {
    serde_json::from_value(opening_tree_json()).unwrap()
}

/// Executor over symbolic positions: only the scripted transitions are legal.
#[derive(Default)]
pub struct ScriptedExecutor {
    transitions: HashMap<(String, BoardMove), String>,
}

impl ScriptedExecutor {
    pub fn with(mut self, from: &str, code: &str, to: &str) -> Self {
        self.transitions
            .insert((from.to_string(), mv(code)), to.to_string());
        self
    }

    /// start --e2e4--> afterE4 --e7e5--> afterE4e5, plus start --d2d4--> afterD4.
    pub fn symbolic() -> Self {
        Self::default()
            .with("start", "e2e4", "afterE4")
            .with("afterE4", "e7e5", "afterE4e5")
            .with("start", "d2d4", "afterD4")
    }
}

impl MoveExecutor for ScriptedExecutor {
    fn apply_move(&self, position: &str, mv: &BoardMove) -> Result<String, CoreError> {
        self.transitions
            .get(&(position.to_string(), *mv))
            .cloned()
            .ok_or_else(|| CoreError::IllegalMove {
                fen: position.to_string(),
                from: mv.from.to_string(),
                to: mv.to.to_string(),
            })
    }

    fn legal_destinations(&self, position: &str, square: Square) -> Result<Vec<Square>, CoreError> {
        let mut dests: Vec<Square> = self
            .transitions
            .keys()
            .filter(|(p, m)| p == position && m.from == square)
            .map(|(_, m)| m.to)
            .collect();
        dests.sort();
        Ok(dests)
    }

    fn is_in_check(&self, _position: &str) -> Result<bool, CoreError> {
        Ok(false)
    }

    fn king_square(&self, _position: &str) -> Result<Option<Square>, CoreError> {
        Ok(None)
    }
}
