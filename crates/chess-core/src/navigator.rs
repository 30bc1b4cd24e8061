//! Selection and navigation controller.
//!
//! Owns the laid-out tree graph and the single session history, and tracks the
//! displayed position by value. Board highlighting (last move, king in check)
//! is derived on demand from the current position and is never stored.

use std::sync::Arc;

use serde::Serialize;
use shakmaty::Square;
use tracing::{debug, info};

use crate::analysis_tree::AnalysisNode;
use crate::error::CoreError;
use crate::history::{Advance, Direction, History, HistoryEntry};
use crate::layout::{layout, GraphNode, LayoutConfig, TreeGraph};
use crate::rules::{BoardMove, MoveExecutor, ShakmatyExecutor, STANDARD_START_FEN};

/// Result of a move attempt from the board.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    /// A new position was appended, replacing `dropped` recorded entries.
    Played { dropped: usize },
    /// The move matched the next recorded position; only the display advanced.
    Replayed,
    /// The executor refused the move; nothing changed.
    Rejected,
}

/// Everything a board needs to draw the current position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardState {
    pub position: String,
    pub last_move: Option<BoardMove>,
    #[serde(serialize_with = "serialize_square")]
    pub check_square: Option<Square>,
}

pub struct Navigator<E: MoveExecutor = ShakmatyExecutor> {
    executor: E,
    config: LayoutConfig,
    tree: Option<Arc<AnalysisNode>>,
    graph: TreeGraph,
    history: History,
    current: String,
    selected: Option<String>,
}

impl Navigator<ShakmatyExecutor> {
    pub fn new(config: LayoutConfig) -> Self {
        Self::with_executor(ShakmatyExecutor, config)
    }
}

impl<E: MoveExecutor> Navigator<E> {
    pub fn with_executor(executor: E, config: LayoutConfig) -> Self {
        Self {
            executor,
            config,
            tree: None,
            graph: TreeGraph::default(),
            history: History::new(STANDARD_START_FEN),
            current: STANDARD_START_FEN.to_string(),
            selected: None,
        }
    }

    /// Install a new analysis tree. The graph is recomputed from scratch and
    /// the session restarts at the tree's root; nothing of the previous
    /// history is kept.
    pub fn load_tree(&mut self, tree: Option<AnalysisNode>) {
        self.tree = tree.map(Arc::new);
        self.graph = layout(self.tree.as_ref(), &self.config);

        let chain = match self.graph.root() {
            Some(root) => root.ancestor_chain.clone(),
            None => vec![HistoryEntry::start(STANDARD_START_FEN)],
        };
        self.selected = self.graph.root().map(|r| r.id.clone());
        self.current = self.history.jump_to(chain).to_string();

        info!(
            nodes = self.graph.nodes.len(),
            edges = self.graph.edges.len(),
            "Analysis tree loaded"
        );
    }

    pub fn tree(&self) -> Option<&AnalysisNode> {
        self.tree.as_deref()
    }

    pub fn graph(&self) -> &TreeGraph {
        &self.graph
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn current_position(&self) -> &str {
        &self.current
    }

    pub fn selected(&self) -> Option<&GraphNode> {
        self.selected.as_deref().and_then(|id| self.graph.node(id))
    }

    /// Activate a graph node by id and jump the board to it.
    pub fn select_node(&mut self, id: &str) -> Result<(), CoreError> {
        let chain = self
            .graph
            .node(id)
            .map(|n| n.ancestor_chain.clone())
            .ok_or_else(|| CoreError::NodeNotFound(id.to_string()))?;

        self.selected = Some(id.to_string());
        self.on_node_selected(chain);
        Ok(())
    }

    /// Selection callback for a node's ancestor chain: replaces the history
    /// wholesale and shows the chain's last position.
    pub fn on_node_selected(&mut self, chain: Vec<HistoryEntry>) {
        self.current = self.history.jump_to(chain).to_string();
        debug!(position = %self.current, "Jumped to tree node");
    }

    /// Play a move from the displayed position.
    ///
    /// Illegal moves are reported as [`MoveOutcome::Rejected`]. An `Err` means
    /// the displayed position fell out of the history, which is a bug.
    pub fn make_move(&mut self, mv: BoardMove) -> Result<MoveOutcome, CoreError> {
        match self.history.make_move(&self.executor, &self.current, mv) {
            Ok(Advance::Appended { position, dropped }) => {
                self.current = position;
                Ok(MoveOutcome::Played { dropped })
            }
            Ok(Advance::Replayed { position }) => {
                self.current = position;
                Ok(MoveOutcome::Replayed)
            }
            Err(CoreError::IllegalMove { .. }) => {
                debug!(mv = %mv, "Move rejected");
                Ok(MoveOutcome::Rejected)
            }
            Err(e) => Err(e),
        }
    }

    /// Move one entry along the history. Returns false at either end.
    pub fn step(&mut self, direction: Direction) -> bool {
        match self.history.step(&self.current, direction) {
            Some(entry) => {
                self.current = entry.position.clone();
                true
            }
            None => false,
        }
    }

    /// Derived board state for the displayed position.
    pub fn board_state(&self) -> Result<BoardState, CoreError> {
        let last_move = self
            .history
            .index_of(&self.current)
            .and_then(|i| self.history.entries()[i].mv);

        Ok(BoardState {
            position: self.current.clone(),
            last_move,
            check_square: self.executor.check_square(&self.current)?,
        })
    }

    pub fn legal_destinations(&self, square: Square) -> Result<Vec<Square>, CoreError> {
        self.executor.legal_destinations(&self.current, square)
    }
}

fn serialize_square<S: serde::Serializer>(sq: &Option<Square>, s: S) -> Result<S::Ok, S::Error> {
    match sq {
        Some(sq) => s.collect_str(sq),
        None => s.serialize_none(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const AFTER_E4: &str = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1";
    const AFTER_E4_E5: &str = "rnbqkbnr/pppp1ppp/8/4p3/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 2";

    fn mv(code: &str) -> BoardMove {
        BoardMove::from_code(code).unwrap()
    }

    fn navigator_with_tree() -> Navigator {
        let mut nav = Navigator::new(LayoutConfig::default());
        nav.load_tree(Some(
            AnalysisNode::root(STANDARD_START_FEN).with_child(
                AnalysisNode::child(AFTER_E4, "e4", "e2e4")
                    .with_child(AnalysisNode::child(AFTER_E4_E5, "e5", "e7e5")),
            ),
        ));
        nav
    }

    #[test]
    fn test_select_node_replaces_history() {
        let mut nav = navigator_with_tree();
        nav.make_move(mv("d2d4")).unwrap();

        nav.select_node("e2e4-e7e5").unwrap();
        assert_eq!(nav.current_position(), AFTER_E4_E5);
        assert_eq!(nav.history().len(), 3);
        assert_eq!(nav.selected().unwrap().id, "e2e4-e7e5");

        let state = nav.board_state().unwrap();
        assert_eq!(state.last_move, Some(mv("e7e5")));
        assert_eq!(state.check_square, None);
    }

    #[test]
    fn test_unknown_node() {
        let mut nav = navigator_with_tree();
        assert!(matches!(nav.select_node("h2h4"), Err(CoreError::NodeNotFound(_))));
        assert_eq!(nav.current_position(), STANDARD_START_FEN);
    }

    #[test]
    fn test_rejected_move_is_silent() {
        let mut nav = navigator_with_tree();
        let before = nav.history().clone();
        assert_eq!(nav.make_move(mv("e2e5")).unwrap(), MoveOutcome::Rejected);
        assert_eq!(nav.history(), &before);
        assert_eq!(nav.current_position(), STANDARD_START_FEN);
    }

    #[test]
    fn test_step_after_branch() {
        let mut nav = navigator_with_tree();
        nav.select_node("e2e4-e7e5").unwrap();
        assert!(nav.step(Direction::Backward));
        assert_eq!(nav.current_position(), AFTER_E4);

        // Replay the recorded reply, the forward line survives
        assert_eq!(nav.make_move(mv("e7e5")).unwrap(), MoveOutcome::Replayed);
        assert_eq!(nav.history().len(), 3);

        assert!(nav.step(Direction::Backward));
        assert_eq!(nav.make_move(mv("c7c5")).unwrap(), MoveOutcome::Played { dropped: 1 });
        assert!(!nav.step(Direction::Forward));
        assert_eq!(nav.history().len(), 3);
    }

    #[test]
    fn test_new_tree_resets_session() {
        let mut nav = navigator_with_tree();
        nav.select_node("e2e4-e7e5").unwrap();

        nav.load_tree(Some(AnalysisNode::root(STANDARD_START_FEN)));
        assert_eq!(nav.history().len(), 1);
        assert_eq!(nav.current_position(), STANDARD_START_FEN);
        assert_eq!(nav.selected().unwrap().id, "");

        nav.load_tree(None);
        assert!(nav.graph().is_empty());
        assert!(nav.selected().is_none());
        assert_eq!(nav.history().len(), 1);
    }

    #[test]
    fn test_check_highlight() {
        let mut nav = Navigator::new(LayoutConfig::default());
        for code in ["f2f3", "e7e5", "g2g4", "d8h4"] {
            assert!(matches!(nav.make_move(mv(code)).unwrap(), MoveOutcome::Played { .. }));
        }
        let state = nav.board_state().unwrap();
        assert_eq!(state.check_square, Some(Square::E1));
        assert_eq!(state.last_move, Some(mv("d8h4")));
    }
}
