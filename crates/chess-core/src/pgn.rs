//! PGN parsing utilities: a lightweight regex-based parser.

use std::sync::LazyLock;

use regex::Regex;

use crate::game_data::{GameData, GameMetadata, GameResult};
use crate::rules::STANDARD_START_FEN;

static HEADER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"\[(\w+)\s+"([^"]*)"\]"#).expect("valid header regex"));
static HEADER_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[[^\]]*\]").expect("valid header line regex"));
static COMMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{[^}]*\}").expect("valid comment regex"));
static VARIATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\([^)]*\)").expect("valid variation regex"));
static MOVE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[KQRBN]?[a-h]?[1-8]?x?[a-h][1-8](?:=[QRBN])?[+#]?|O-O-O|O-O")
        .expect("valid move regex")
});

/// Split a multi-game PGN export into one text per game. A game starts at the
/// first tag line that follows movetext.
pub fn split_games(text: &str) -> Vec<&str> {
    let mut games = Vec::new();
    let mut start: Option<usize> = None;
    let mut seen_movetext = false;
    let mut offset = 0;

    for line in text.split_inclusive('\n') {
        let trimmed = line.trim();
        if trimmed.starts_with('[') {
            match start {
                Some(s) if seen_movetext => {
                    games.push(text[s..offset].trim());
                    start = Some(offset);
                    seen_movetext = false;
                }
                None => start = Some(offset),
                _ => {}
            }
        } else if !trimmed.is_empty() {
            if start.is_none() {
                start = Some(offset);
            }
            seen_movetext = true;
        }
        offset += line.len();
    }

    if let Some(s) = start {
        let last = text[s..].trim();
        if !last.is_empty() {
            games.push(last);
        }
    }
    games
}

/// Parse a single PGN game. Games set up from a non-standard position and
/// games without moves are skipped.
pub fn parse_pgn(pgn: &str) -> Option<GameData> {
    let mut white = "Unknown".to_string();
    let mut black = "Unknown".to_string();
    let mut result = GameResult::Unknown;
    let mut time_control = None;
    let mut setup = None;
    let mut fen = None;

    for cap in HEADER_RE.captures_iter(pgn) {
        let value = cap[2].to_string();
        match &cap[1] {
            "White" => white = value,
            "Black" => black = value,
            "Result" => result = GameResult::from_tag(&value),
            "TimeControl" => time_control = Some(value),
            "SetUp" => setup = Some(value),
            "FEN" => fen = Some(value),
            _ => {}
        }
    }

    // Filter non-standard positions
    if setup.as_deref() == Some("1") {
        if let Some(ref f) = fen {
            if f != STANDARD_START_FEN {
                return None;
            }
        }
    }

    let moves = extract_moves(pgn);
    if moves.is_empty() {
        return None;
    }

    Some(GameData {
        metadata: GameMetadata {
            white,
            black,
            result,
            time_control,
        },
        moves,
    })
}

/// Extract SAN moves from PGN text (after removing headers, comments, variations).
fn extract_moves(pgn: &str) -> Vec<String> {
    let no_headers = HEADER_LINE_RE.replace_all(pgn, "");
    let no_comments = COMMENT_RE.replace_all(&no_headers, "");
    let no_variations = VARIATION_RE.replace_all(&no_comments, "");

    MOVE_RE
        .find_iter(&no_variations)
        .map(|m| m.as_str().to_string())
        .collect()
}
