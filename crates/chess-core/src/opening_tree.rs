//! Opening tree builder for two-player repertoire analysis.
//!
//! Each player's games are folded into a move tree, then the two trees are
//! intersected into the analysis tree both players actually reach.

use std::collections::HashMap;
use std::sync::Arc;

use shakmaty::{san::SanPlus, Chess, Position};
use tracing::debug;

use crate::analysis_tree::{AnalysisNode, PlayRates, PlayerPair, ResultTriple};
use crate::game_data::{GameData, GameResult};
use crate::rules::{board_move, position_string, STANDARD_START_FEN};

struct TreeNode {
    san: String,
    uci: String,
    fen: String,
    games: u64,
    results: ResultTriple,
    children: HashMap<String, TreeNode>,
}

impl TreeNode {
    fn new(san: &str, uci: &str, fen: &str) -> Self {
        Self {
            san: san.to_string(),
            uci: uci.to_string(),
            fen: fen.to_string(),
            games: 0,
            results: ResultTriple::default(),
            children: HashMap::new(),
        }
    }

    fn record(&mut self, result: GameResult) {
        self.games += 1;
        match result {
            GameResult::WhiteWin => self.results.wins += 1.0,
            GameResult::BlackWin => self.results.losses += 1.0,
            GameResult::Draw => self.results.draws += 1.0,
            GameResult::Unknown => {}
        }
    }

    /// Children with the most played first, ties broken by SAN.
    fn ordered_children(&self) -> Vec<&TreeNode> {
        let mut children: Vec<&TreeNode> = self.children.values().collect();
        children.sort_by(|a, b| b.games.cmp(&a.games).then_with(|| a.san.cmp(&b.san)));
        children
    }
}

/// One player's games as a move tree.
pub struct PlayerTree {
    root: TreeNode,
}

impl PlayerTree {
    /// Fold `games` into a tree, keeping at most `max_plies` half-moves per
    /// game. A game stops contributing at its first unreadable or illegal move.
    pub fn from_games(games: &[GameData], max_plies: usize) -> Self {
        let mut root = TreeNode::new("", "", STANDARD_START_FEN);

        for game in games {
            let moves = &game.moves[..game.moves.len().min(max_plies)];

            let mut current = &mut root;
            let mut pos = Chess::default();

            for move_san in moves {
                let san: SanPlus = match move_san.parse() {
                    Ok(s) => s,
                    Err(_) => break,
                };

                let mv = match san.san.to_move(&pos) {
                    Ok(m) => m,
                    Err(_) => break,
                };

                let Some(code) = board_move(&mv) else { break };
                pos.play_unchecked(mv);

                let san_key = san.san.to_string();
                let child = current.children.entry(san_key).or_insert_with_key(|key| {
                    TreeNode::new(key, &code.to_string(), &position_string(&pos))
                });
                child.record(game.metadata.result);
                current = child;
            }
        }

        debug!(games = games.len(), "Built player tree");
        Self { root }
    }

    /// Games that reached the first move.
    pub fn game_count(&self) -> u64 {
        self.root.children.values().map(|c| c.games).sum()
    }

    /// Nodes below the root.
    pub fn move_count(&self) -> usize {
        fn count(node: &TreeNode) -> usize {
            node.children.values().map(|c| 1 + count(c)).sum()
        }
        count(&self.root)
    }
}

/// Intersect two players' trees into an analysis tree.
///
/// A move survives when both players reached it and the player to move chose
/// it in at least `threshold` of their games from the parent position: player
/// 1 for white moves (even plies), player 2 for black moves.
pub fn intersect_trees(p1: &PlayerTree, p2: &PlayerTree, threshold: f64) -> AnalysisNode {
    let mut root = AnalysisNode::root(STANDARD_START_FEN);
    root.game_counts = PlayerPair {
        p1: p1.game_count(),
        p2: p2.game_count(),
    };
    root.actual_results = PlayerPair {
        p1: sum_results(&p1.root),
        p2: sum_results(&p2.root),
    };

    let (p1_count, p2_count) = (root.game_counts.p1, root.game_counts.p2);
    root.children = intersect_children(&p1.root, &p2.root, p1_count, p2_count, 0, threshold);
    root
}

fn intersect_children(
    p1: &TreeNode,
    p2: &TreeNode,
    p1_parent_games: u64,
    p2_parent_games: u64,
    ply: usize,
    threshold: f64,
) -> Vec<Arc<AnalysisNode>> {
    let mut children = Vec::new();

    for child1 in p1.ordered_children() {
        let Some(child2) = p2.children.get(&child1.san) else {
            continue;
        };

        let w_rate = rate(child1.games, p1_parent_games);
        let b_rate = rate(child2.games, p2_parent_games);
        let white_to_move = ply % 2 == 0;
        if (white_to_move && w_rate < threshold) || (!white_to_move && b_rate < threshold) {
            continue;
        }

        let mut node =
            AnalysisNode::child(child1.fen.as_str(), child1.san.as_str(), child1.uci.as_str());
        node.rates = PlayRates {
            w: w_rate,
            b: b_rate,
        };
        node.game_counts = PlayerPair {
            p1: child1.games,
            p2: child2.games,
        };
        node.actual_results = PlayerPair {
            p1: child1.results,
            p2: child2.results,
        };
        node.children =
            intersect_children(child1, child2, child1.games, child2.games, ply + 1, threshold);

        children.push(Arc::new(node));
    }

    children
}

fn rate(games: u64, parent_games: u64) -> f64 {
    if parent_games == 0 {
        0.0
    } else {
        games as f64 / parent_games as f64
    }
}

fn sum_results(node: &TreeNode) -> ResultTriple {
    node.children
        .values()
        .fold(ResultTriple::default(), |acc, c| ResultTriple {
            wins: acc.wins + c.results.wins,
            draws: acc.draws + c.results.draws,
            losses: acc.losses + c.results.losses,
        })
}
