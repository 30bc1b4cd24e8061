//! Position history for one browsing session.
//!
//! History holds a single active line: index 0 is the starting position and
//! every later entry is the position reached by playing its move on the
//! previous entry. Branches live only in the analysis tree; making a new move
//! from the middle of the line replaces whatever followed it.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::CoreError;
use crate::rules::{BoardMove, MoveExecutor};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub position: String,
    #[serde(rename = "move")]
    pub mv: Option<BoardMove>,
}

impl HistoryEntry {
    pub fn start(position: impl Into<String>) -> Self {
        Self {
            position: position.into(),
            mv: None,
        }
    }

    pub fn after(position: impl Into<String>, mv: BoardMove) -> Self {
        Self {
            position: position.into(),
            mv: Some(mv),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
}

/// What `make_move` did to the history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    /// The line was cut after the current entry and the new position appended.
    /// `dropped` counts the recorded entries that were discarded.
    Appended { position: String, dropped: usize },
    /// The move reproduced the next recorded position; history is untouched.
    Replayed { position: String },
}

impl Advance {
    pub fn position(&self) -> &str {
        match self {
            Advance::Appended { position, .. } | Advance::Replayed { position } => position,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct History {
    entries: Vec<HistoryEntry>,
}

impl History {
    pub fn new(start_position: impl Into<String>) -> Self {
        Self {
            entries: vec![HistoryEntry::start(start_position)],
        }
    }

    /// Build a history from an ancestor chain. Returns `None` for an empty chain.
    pub fn from_chain(chain: Vec<HistoryEntry>) -> Option<Self> {
        if chain.is_empty() {
            None
        } else {
            Some(Self { entries: chain })
        }
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn first(&self) -> &HistoryEntry {
        &self.entries[0]
    }

    pub fn last(&self) -> &HistoryEntry {
        &self.entries[self.entries.len() - 1]
    }

    /// Index of the first entry whose position equals `position` exactly.
    pub fn index_of(&self, position: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.position == position)
    }

    /// Play `mv` from `current` and record it.
    ///
    /// Illegal moves return the executor's error and leave history unchanged.
    pub fn make_move<E: MoveExecutor>(
        &mut self,
        executor: &E,
        current: &str,
        mv: BoardMove,
    ) -> Result<Advance, CoreError> {
        let i = self
            .index_of(current)
            .ok_or_else(|| CoreError::PositionNotFound(current.to_string()))?;

        let next_position = executor.apply_move(current, &mv)?;

        if let Some(next) = self.entries.get(i + 1) {
            if next.position == next_position {
                debug!(index = i + 1, "Move replays recorded line");
                return Ok(Advance::Replayed {
                    position: next_position,
                });
            }
        }

        let dropped = self.entries.len() - (i + 1);
        self.entries.truncate(i + 1);
        self.entries.push(HistoryEntry::after(next_position.clone(), mv));
        debug!(index = i + 1, dropped, "Move appended to history");

        Ok(Advance::Appended {
            position: next_position,
            dropped,
        })
    }

    /// The neighbouring entry in `direction`, or `None` at either end of the
    /// line or when `current` is not recorded.
    pub fn step(&self, current: &str, direction: Direction) -> Option<&HistoryEntry> {
        let i = self.index_of(current)?;
        match direction {
            Direction::Forward => self.entries.get(i + 1),
            Direction::Backward if i > 0 => self.entries.get(i - 1),
            Direction::Backward => None,
        }
    }

    /// Replace the whole line with `chain`. An empty chain is ignored.
    /// Returns the new current position.
    pub fn jump_to(&mut self, chain: Vec<HistoryEntry>) -> &str {
        if chain.is_empty() {
            debug!("Ignoring jump to empty chain");
        } else {
            debug!(len = chain.len(), "Jumping to ancestor chain");
            self.entries = chain;
        }
        &self.last().position
    }

    /// Check that every entry follows from its predecessor.
    pub fn verify<E: MoveExecutor>(&self, executor: &E) -> Result<(), CoreError> {
        replay_chain(executor, &self.entries).map(|_| ())
    }
}

/// Replay a chain move by move from its first position and return the final
/// position. Fails when a move is missing, illegal, or lands on a position
/// different from the recorded one.
pub fn replay_chain<E: MoveExecutor>(
    executor: &E,
    chain: &[HistoryEntry],
) -> Result<String, CoreError> {
    let Some(first) = chain.first() else {
        return Err(CoreError::PositionNotFound(String::new()));
    };

    let mut position = first.position.clone();
    for entry in &chain[1..] {
        let mv = entry.mv.as_ref().ok_or_else(|| {
            CoreError::InvalidMoveCode(format!("missing move before '{}'", entry.position))
        })?;
        position = executor.apply_move(&position, mv)?;
        if position != entry.position {
            return Err(CoreError::PositionNotFound(entry.position.clone()));
        }
    }

    Ok(position)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::{ShakmatyExecutor, STANDARD_START_FEN};

    fn mv(code: &str) -> BoardMove {
        BoardMove::from_code(code).unwrap()
    }

    fn played(codes: &[&str]) -> History {
        let mut history = History::new(STANDARD_START_FEN);
        for code in codes {
            let current = history.last().position.clone();
            history.make_move(&ShakmatyExecutor, &current, mv(code)).unwrap();
        }
        history
    }

    #[test]
    fn test_linear_advance() {
        let history = played(&["e2e4", "e7e5", "g1f3"]);
        assert_eq!(history.len(), 4);
        assert_eq!(history.entries()[3].mv, Some(mv("g1f3")));
        history.verify(&ShakmatyExecutor).unwrap();
    }

    #[test]
    fn test_branch_replaces_tail() {
        let mut history = played(&["e2e4", "e7e5", "g1f3"]);
        let after_e4 = history.entries()[1].position.clone();

        let advance = history.make_move(&ShakmatyExecutor, &after_e4, mv("c7c5")).unwrap();
        assert!(matches!(advance, Advance::Appended { dropped: 2, .. }));
        assert_eq!(history.len(), 3);
        assert_eq!(history.last().mv, Some(mv("c7c5")));
        history.verify(&ShakmatyExecutor).unwrap();
    }

    #[test]
    fn test_replay_keeps_forward_line() {
        let mut history = played(&["e2e4", "e7e5", "g1f3"]);
        let before = history.clone();
        let after_e4 = history.entries()[1].position.clone();

        let advance = history.make_move(&ShakmatyExecutor, &after_e4, mv("e7e5")).unwrap();
        assert_eq!(advance.position(), before.entries()[2].position);
        assert!(matches!(advance, Advance::Replayed { .. }));
        assert_eq!(history, before);
    }

    #[test]
    fn test_illegal_move_leaves_history() {
        let mut history = played(&["e2e4"]);
        let before = history.clone();
        let current = history.last().position.clone();

        let err = history.make_move(&ShakmatyExecutor, &current, mv("e4e6")).unwrap_err();
        assert!(matches!(err, CoreError::IllegalMove { .. }));
        assert_eq!(history, before);
    }

    #[test]
    fn test_unknown_current_position() {
        let mut history = History::new(STANDARD_START_FEN);
        let err = history
            .make_move(&ShakmatyExecutor, "8/8/8/8/8/8/8/K6k w - - 0 1", mv("a1a2"))
            .unwrap_err();
        assert!(matches!(err, CoreError::PositionNotFound(_)));
        assert_eq!(history.len(), 1);
    }

    #[test]
    fn test_step_boundaries() {
        let history = played(&["d2d4"]);
        let start = history.first().position.clone();
        let end = history.last().position.clone();

        assert!(history.step(&start, Direction::Backward).is_none());
        assert!(history.step(&end, Direction::Forward).is_none());
        assert_eq!(history.step(&start, Direction::Forward).unwrap().position, end);
        assert_eq!(history.step(&end, Direction::Backward).unwrap().position, start);
    }

    #[test]
    fn test_jump_to_ignores_empty_chain() {
        let mut history = played(&["d2d4"]);
        let current = history.jump_to(Vec::new()).to_string();
        assert_eq!(current, history.last().position);
        assert_eq!(history.len(), 2);
    }

    #[test]
    fn test_replay_chain_detects_mismatch() {
        let chain = vec![
            HistoryEntry::start(STANDARD_START_FEN),
            HistoryEntry::after("not where e4 lands", mv("e2e4")),
        ];
        assert!(replay_chain(&ShakmatyExecutor, &chain).is_err());
    }
}
