//! Analysis tree produced by the remote analysis job.
//!
//! The tree is read-only input: each node is a position reached by a move,
//! annotated with an engine evaluation and both players' results from that
//! position. A new job result replaces the whole tree.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use serde::de::{MapAccess, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::warn;

use crate::error::CoreError;
use crate::rules::white_just_moved;

/// Move name the analysis engine gives the root node.
const ROOT_SENTINEL: &str = "root";

/// Win/draw/loss counts, or probabilities for expected results.
/// Wins and losses are from white's point of view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResultTriple {
    #[serde(alias = "w_wins")]
    pub wins: f64,
    pub draws: f64,
    #[serde(alias = "b_wins")]
    pub losses: f64,
}

impl ResultTriple {
    pub fn total(&self) -> f64 {
        self.wins + self.draws + self.losses
    }

    /// (wins, draws, losses) as percentages of the total, `None` when empty.
    /// Losses absorb rounding so the three always sum to 100.
    pub fn percentages(&self) -> Option<(f64, f64, f64)> {
        let total = self.total();
        if total <= 0.0 {
            return None;
        }
        let wins = self.wins / total * 100.0;
        let draws = self.draws / total * 100.0;
        Some((wins, draws, 100.0 - wins - draws))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerPair<T> {
    pub p1: T,
    pub p2: T,
}

/// How often each player chose the move leading to a node, relative to its
/// parent. `w` is player 1 (white), `b` player 2 (black).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayRates {
    pub w: f64,
    pub b: f64,
}

impl Default for PlayRates {
    fn default() -> Self {
        Self { w: 1.0, b: 1.0 }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "WireNode")]
pub struct AnalysisNode {
    pub position: String,
    pub move_notation: Option<String>,
    pub move_code: Option<String>,
    pub evaluation_centipawns: i32,
    pub rates: PlayRates,
    pub game_counts: PlayerPair<u64>,
    pub actual_results: PlayerPair<ResultTriple>,
    pub expected_results: PlayerPair<ResultTriple>,
    #[serde(serialize_with = "serialize_children")]
    pub children: Vec<Arc<AnalysisNode>>,
}

impl AnalysisNode {
    pub fn root(position: impl Into<String>) -> Self {
        Self {
            position: position.into(),
            ..Default::default()
        }
    }

    pub fn child(
        position: impl Into<String>,
        notation: impl Into<String>,
        code: impl Into<String>,
    ) -> Self {
        Self {
            position: position.into(),
            move_notation: Some(notation.into()),
            move_code: Some(code.into()),
            ..Default::default()
        }
    }

    pub fn with_child(mut self, child: AnalysisNode) -> Self {
        self.children.push(Arc::new(child));
        self
    }

    pub fn is_root(&self) -> bool {
        self.move_code.is_none()
    }

    /// Side to move is black, so white made this node's move.
    pub fn white_just_moved(&self) -> bool {
        white_just_moved(&self.position)
    }

    /// Share of games in which the side that made this move chose it.
    pub fn play_rate(&self) -> f64 {
        if self.white_just_moved() {
            self.rates.w
        } else {
            self.rates.b
        }
    }

    /// Number of nodes in this subtree, including itself.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(|c| c.node_count()).sum::<usize>()
    }

    /// Longest root-to-leaf edge count.
    pub fn height(&self) -> usize {
        self.children
            .iter()
            .map(|c| c.height() + 1)
            .max()
            .unwrap_or(0)
    }

    /// A copy of this node's own data without its subtree.
    pub fn summary(&self) -> AnalysisNode {
        AnalysisNode {
            children: Vec::new(),
            ..self.clone()
        }
    }
}

/// Parse a tree from JSON. `null` yields `None`; syntax errors are returned.
pub fn parse_tree(json: &str) -> Result<Option<AnalysisNode>, CoreError> {
    Ok(serde_json::from_str(json)?)
}

/// Engine evaluation in pawns with two decimals, e.g. `+0.35` or `-1.20`.
pub fn format_eval(centipawns: i32) -> String {
    let score = centipawns as f64 / 100.0;
    if score > 0.0 {
        format!("+{score:.2}")
    } else {
        format!("{score:.2}")
    }
}

/// Percentage of an evaluation bar filled for white. Saturates at ±10 pawns.
pub fn eval_bar_white_share(centipawns: i32) -> f64 {
    let clamped = (centipawns as f64 / 100.0).clamp(-10.0, 10.0);
    50.0 + clamped * 5.0
}

/// Field names the analysis engine emits, with the camelCase names as aliases.
#[derive(Deserialize)]
struct WireNode {
    #[serde(default, alias = "position")]
    fen: Option<String>,
    #[serde(default, alias = "moveNotation")]
    san: Option<String>,
    #[serde(default, alias = "moveCode")]
    uci: Option<String>,
    #[serde(default, alias = "evaluationCentipawns")]
    eval: Option<f64>,
    #[serde(default)]
    rates: Option<PlayRates>,
    #[serde(default, alias = "gameCounts")]
    counts: Option<PlayerPair<u64>>,
    #[serde(default, alias = "actualResults")]
    actual_results: Option<PlayerPair<ResultTriple>>,
    #[serde(default, alias = "expectedResults")]
    expected_results: Option<PlayerPair<ResultTriple>>,
    #[serde(default)]
    p1_res: Option<ResultTriple>,
    #[serde(default)]
    p2_res: Option<ResultTriple>,
    #[serde(default)]
    p1_exp: Option<ResultTriple>,
    #[serde(default)]
    p2_exp: Option<ResultTriple>,
    #[serde(default)]
    children: Children,
}

impl From<WireNode> for AnalysisNode {
    fn from(w: WireNode) -> Self {
        let not_root = |m: Option<String>| m.filter(|s| s != ROOT_SENTINEL && !s.is_empty());

        let actual_results = w.actual_results.unwrap_or(PlayerPair {
            p1: w.p1_res.unwrap_or_default(),
            p2: w.p2_res.unwrap_or_default(),
        });
        let expected_results = w.expected_results.unwrap_or(PlayerPair {
            p1: w.p1_exp.unwrap_or_default(),
            p2: w.p2_exp.unwrap_or_default(),
        });

        AnalysisNode {
            position: w.fen.unwrap_or_default(),
            move_notation: not_root(w.san),
            move_code: not_root(w.uci),
            evaluation_centipawns: w.eval.map(|v| v.round() as i32).unwrap_or(0),
            rates: w.rates.unwrap_or_default(),
            game_counts: w.counts.unwrap_or_default(),
            actual_results,
            expected_results,
            children: w.children.0,
        }
    }
}

/// Child nodes, accepted either as a mapping keyed by move code (document
/// order is kept) or as a list.
#[derive(Default)]
struct Children(Vec<Arc<AnalysisNode>>);

impl<'de> Deserialize<'de> for Children {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        d.deserialize_any(ChildrenVisitor)
    }
}

struct ChildrenVisitor;

impl<'de> Visitor<'de> for ChildrenVisitor {
    type Value = Children;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a map of move code to node or a list of nodes")
    }

    fn visit_unit<E: serde::de::Error>(self) -> Result<Children, E> {
        Ok(Children::default())
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Children, A::Error> {
        let mut nodes = Vec::new();
        while let Some(node) = seq.next_element::<AnalysisNode>()? {
            nodes.push(node);
        }
        Ok(Children(unique_siblings(nodes)))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Children, A::Error> {
        let mut nodes = Vec::new();
        while let Some((key, mut node)) = map.next_entry::<String, AnalysisNode>()? {
            if node.move_code.is_none() {
                node.move_code = Some(key);
            }
            nodes.push(node);
        }
        Ok(Children(unique_siblings(nodes)))
    }
}

/// Sibling move codes must be distinct; later duplicates are dropped.
fn unique_siblings(nodes: Vec<AnalysisNode>) -> Vec<Arc<AnalysisNode>> {
    let mut seen = HashSet::new();
    nodes
        .into_iter()
        .filter(|node| match &node.move_code {
            Some(code) if !seen.insert(code.clone()) => {
                warn!(move_code = %code, "Dropping duplicate sibling move");
                false
            }
            _ => true,
        })
        .map(Arc::new)
        .collect()
}

fn serialize_children<S: Serializer>(
    children: &Vec<Arc<AnalysisNode>>,
    s: S,
) -> Result<S::Ok, S::Error> {
    s.collect_map(
        children
            .iter()
            .map(|c| (c.move_code.as_deref().unwrap_or_default(), c.as_ref())),
    )
}
