//! Move executor: a thin, stateless wrapper over shakmaty.
//!
//! Positions cross this boundary as FEN strings so that history entries,
//! ancestor chains and tree nodes can all be compared by value.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use shakmaty::{fen::Fen, CastlingMode, Chess, EnPassantMode, File, Move, Position, Role, Square};

use crate::error::CoreError;

pub const STANDARD_START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// A move as the board sees it: origin and destination, plus the promotion
/// piece when one was requested or recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BoardMove {
    #[serde(with = "square_text")]
    pub from: Square,
    #[serde(with = "square_text")]
    pub to: Square,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "role_text")]
    pub promotion: Option<Role>,
}

impl BoardMove {
    pub fn new(from: Square, to: Square) -> Self {
        Self {
            from,
            to,
            promotion: None,
        }
    }

    pub fn with_promotion(mut self, role: Role) -> Self {
        self.promotion = Some(role);
        self
    }

    /// Decode a coordinate move code such as `e2e4` or `e7e8n`.
    pub fn from_code(code: &str) -> Result<Self, CoreError> {
        let code = code.trim();
        if !code.is_ascii() || code.len() < 4 || code.len() > 5 {
            return Err(CoreError::InvalidMoveCode(code.to_string()));
        }

        let from = parse_square(&code[0..2])
            .map_err(|_| CoreError::InvalidMoveCode(code.to_string()))?;
        let to = parse_square(&code[2..4])
            .map_err(|_| CoreError::InvalidMoveCode(code.to_string()))?;

        let promotion = match code[4..].chars().next() {
            Some(c) => Some(
                Role::from_char(c.to_ascii_lowercase())
                    .filter(|r| !matches!(r, Role::Pawn | Role::King))
                    .ok_or_else(|| CoreError::InvalidMoveCode(code.to_string()))?,
            ),
            None => None,
        };

        Ok(Self {
            from,
            to,
            promotion,
        })
    }
}

impl fmt::Display for BoardMove {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(role) = self.promotion {
            write!(f, "{}", role.char())?;
        }
        Ok(())
    }
}

impl FromStr for BoardMove {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_code(s)
    }
}

/// Rules-engine capability consumed by history and navigation.
///
/// Implementations are pure: every call is answered from the position string
/// alone.
pub trait MoveExecutor {
    /// Play `mv` on `position`, returning the resulting position.
    fn apply_move(&self, position: &str, mv: &BoardMove) -> Result<String, CoreError>;

    /// Destinations reachable by the piece on `square`. Empty when the square
    /// is empty or holds a piece of the side not to move.
    fn legal_destinations(&self, position: &str, square: Square) -> Result<Vec<Square>, CoreError>;

    fn is_in_check(&self, position: &str) -> Result<bool, CoreError>;

    /// Square of the king belonging to the side to move.
    fn king_square(&self, position: &str) -> Result<Option<Square>, CoreError>;

    /// King square when the side to move is in check, for board highlighting.
    fn check_square(&self, position: &str) -> Result<Option<Square>, CoreError> {
        if self.is_in_check(position)? {
            self.king_square(position)
        } else {
            Ok(None)
        }
    }
}

/// Standard chess rules backed by shakmaty.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShakmatyExecutor;

impl MoveExecutor for ShakmatyExecutor {
    fn apply_move(&self, position: &str, mv: &BoardMove) -> Result<String, CoreError> {
        let mut pos = parse_position(position)?;

        let legal = pos
            .legal_moves()
            .iter()
            .find(|m| matches_board_move(m, mv))
            .cloned()
            .ok_or_else(|| CoreError::IllegalMove {
                fen: position.to_string(),
                from: mv.from.to_string(),
                to: mv.to.to_string(),
            })?;

        pos.play_unchecked(legal);
        Ok(position_string(&pos))
    }

    fn legal_destinations(&self, position: &str, square: Square) -> Result<Vec<Square>, CoreError> {
        let pos = parse_position(position)?;

        let mut destinations: Vec<Square> = pos
            .legal_moves()
            .iter()
            .filter_map(|m| move_squares(m))
            .filter(|(from, _, _)| *from == square)
            .map(|(_, to, _)| to)
            .collect();

        // Promotions produce one move per piece for the same square
        destinations.sort();
        destinations.dedup();
        Ok(destinations)
    }

    fn is_in_check(&self, position: &str) -> Result<bool, CoreError> {
        Ok(parse_position(position)?.is_check())
    }

    fn king_square(&self, position: &str) -> Result<Option<Square>, CoreError> {
        let pos = parse_position(position)?;
        Ok(pos.board().king_of(pos.turn()))
    }
}

/// Parse a FEN string into a playable position.
pub fn parse_position(fen: &str) -> Result<Chess, CoreError> {
    let invalid = |reason: String| CoreError::InvalidPosition {
        fen: fen.to_string(),
        reason,
    };

    let parsed: Fen = fen.trim().parse().map_err(|e| invalid(format!("{e}")))?;
    parsed
        .into_position(CastlingMode::Standard)
        .map_err(|e| invalid(format!("{e}")))
}

/// Serialize a position the same way for every producer of position strings.
pub fn position_string(pos: &Chess) -> String {
    Fen::from_position(pos, EnPassantMode::Legal).to_string()
}

pub fn parse_square(text: &str) -> Result<Square, CoreError> {
    text.trim()
        .parse()
        .map_err(|_| CoreError::InvalidSquare(text.to_string()))
}

/// Side to move is black, i.e. white made the move that produced `fen`.
pub fn white_just_moved(fen: &str) -> bool {
    fen.split_whitespace().nth(1) == Some("b")
}

/// A shakmaty move in board coordinates, e.g. for deriving its move code.
pub fn board_move(m: &Move) -> Option<BoardMove> {
    move_squares(m).map(|(from, to, promotion)| BoardMove {
        from,
        to,
        promotion,
    })
}

/// (from, to, promotion) of a legal move in board coordinates. Castling is
/// reported by the king's destination square, the way a user drags it.
fn move_squares(m: &Move) -> Option<(Square, Square, Option<Role>)> {
    match m {
        Move::Normal {
            from,
            to,
            promotion,
            ..
        } => Some((*from, *to, *promotion)),
        Move::EnPassant { from, to } => Some((*from, *to, None)),
        Move::Castle { king, rook } => {
            let to_file = if rook.file() > king.file() { 6u32 } else { 2u32 };
            Some((*king, Square::from_coords(File::new(to_file), king.rank()), None))
        }
        _ => None,
    }
}

fn matches_board_move(m: &Move, mv: &BoardMove) -> bool {
    match move_squares(m) {
        Some((from, to, promotion)) => {
            from == mv.from
                && to == mv.to
                && match promotion {
                    Some(role) => role == mv.promotion.unwrap_or(Role::Queen),
                    None => mv.promotion.is_none(),
                }
        }
        None => false,
    }
}

mod square_text {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};
    use shakmaty::Square;

    pub fn serialize<S: Serializer>(sq: &Square, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(sq)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Square, D::Error> {
        let text = String::deserialize(d)?;
        text.parse()
            .map_err(|_| D::Error::custom(format!("invalid square '{text}'")))
    }
}

mod role_text {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};
    use shakmaty::Role;

    pub fn serialize<S: Serializer>(role: &Option<Role>, s: S) -> Result<S::Ok, S::Error> {
        match role {
            Some(r) => s.serialize_char(r.char()),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Role>, D::Error> {
        let text: Option<String> = Option::deserialize(d)?;
        match text.as_deref().and_then(|t| t.chars().next()) {
            Some(c) => Role::from_char(c.to_ascii_lowercase())
                .map(Some)
                .ok_or_else(|| D::Error::custom(format!("invalid promotion '{c}'"))),
            None => Ok(None),
        }
    }
}
