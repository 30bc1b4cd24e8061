//! Interactive explorer session: command parsing and dispatch.
//!
//! A session wraps one [`Navigator`] and remembers which tree file it came
//! from, so a finished analysis written over that file can be picked up.

use std::fmt::Write;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::SystemTime;

use chess_core::analysis_tree::parse_tree;
use chess_core::history::Direction;
use chess_core::navigator::{MoveOutcome, Navigator};
use chess_core::rules::{parse_square, BoardMove};
use chess_core::CoreError;
use tracing::{debug, info};

use crate::config::ExplorerConfig;
use crate::error::ExplorerError;
use crate::render;

pub const HELP: &str = "\
Commands:
  board              show the current position
  tree               outline of the analysis tree
  select [id]        jump to a tree node (no id selects the root)
  move <code>        play a move, e.g. e2e4 or e7e8n (a bare code works too)
  moves <square>     legal destinations from a square
  next | prev        step along the history
  history            show the active line
  info               details of the selected tree node
  export <path>      write the laid-out graph as JSON
  load <path>        load another tree file
  help               this text
  quit               leave";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Board,
    Tree,
    Select(String),
    Move(String),
    Moves(String),
    Next,
    Prev,
    History,
    Info,
    Export(PathBuf),
    Load(PathBuf),
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let Some(name) = words.next() else {
            return Err(String::new());
        };
        let arg = words.next();

        let required = |what: &str| {
            arg.map(str::to_string)
                .ok_or_else(|| format!("'{name}' needs {what}"))
        };

        match name.to_ascii_lowercase().as_str() {
            "board" | "b" => Ok(Command::Board),
            "tree" | "t" => Ok(Command::Tree),
            "select" | "s" => Ok(Command::Select(arg.unwrap_or_default().to_string())),
            "move" | "m" => required("a move code").map(Command::Move),
            "moves" => required("a square").map(Command::Moves),
            "next" | "n" => Ok(Command::Next),
            "prev" | "p" => Ok(Command::Prev),
            "history" | "h" => Ok(Command::History),
            "info" | "i" => Ok(Command::Info),
            "export" => required("a path").map(|p| Command::Export(p.into())),
            "load" => required("a path").map(|p| Command::Load(p.into())),
            "help" | "?" => Ok(Command::Help),
            "quit" | "exit" | "q" => Ok(Command::Quit),
            _ if BoardMove::from_code(name).is_ok() => Ok(Command::Move(name.to_string())),
            _ => Err(format!("Unknown command '{name}', try 'help'")),
        }
    }
}

/// Text to print after a command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub quit: bool,
}

impl Reply {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            quit: false,
        }
    }
}

pub struct Session {
    navigator: Navigator,
    tree_path: Option<PathBuf>,
    modified: Option<SystemTime>,
}

impl Session {
    pub fn new(config: &ExplorerConfig) -> Self {
        Self {
            navigator: Navigator::new(config.layout),
            tree_path: None,
            modified: None,
        }
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    pub fn tree_path(&self) -> Option<&Path> {
        self.tree_path.as_deref()
    }

    /// Install a tree from JSON text. `null` clears the tree.
    pub fn load_json(&mut self, json: &str) -> Result<(), ExplorerError> {
        let tree = parse_tree(json)?;
        self.navigator.load_tree(tree);
        Ok(())
    }

    /// Load a tree file and remember it for change polling.
    pub fn load_file(&mut self, path: &Path) -> Result<(), ExplorerError> {
        let json = fs::read_to_string(path).map_err(|e| ExplorerError::io(path, e))?;
        let modified = modified_time(path).ok();

        self.load_json(&json)?;
        self.tree_path = Some(path.to_path_buf());
        self.modified = modified;

        info!(path = %path.display(), "Loaded tree file");
        Ok(())
    }

    /// Poll a tree file that could not be loaded yet. The current tree stays
    /// until the file shows up or changes.
    pub fn watch(&mut self, path: &Path) {
        self.tree_path = Some(path.to_path_buf());
        self.modified = None;
    }

    /// Reload the tree file if its modification time moved since the last
    /// load. Returns whether a reload happened.
    pub fn reload_if_changed(&mut self) -> Result<bool, ExplorerError> {
        let Some(path) = self.tree_path.clone() else {
            return Ok(false);
        };

        let modified = match modified_time(&path) {
            Ok(modified) => modified,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "Tree file not written yet");
                return Ok(false);
            }
            Err(e) => return Err(ExplorerError::io(&path, e)),
        };
        if self.modified == Some(modified) {
            return Ok(false);
        }

        // A half-written file is retried only once its mtime moves again
        self.modified = Some(modified);
        self.load_file(&path)?;
        Ok(true)
    }

    /// Parse and run one input line.
    pub fn execute(&mut self, line: &str) -> Result<Reply, ExplorerError> {
        if line.trim().is_empty() {
            return Ok(Reply::default());
        }
        match line.parse::<Command>() {
            Ok(command) => self.run(command),
            Err(message) => Ok(Reply::text(message)),
        }
    }

    pub fn run(&mut self, command: Command) -> Result<Reply, ExplorerError> {
        debug!(?command, "Running command");

        let text = match command {
            Command::Board => self.board()?,
            Command::Tree => render::tree(
                self.navigator.graph(),
                self.navigator.selected().map(|n| n.id.as_str()),
            ),
            Command::Select(id) => match self.navigator.select_node(&id) {
                Ok(()) => self.board()?,
                Err(CoreError::NodeNotFound(id)) => format!("No tree node '{id}'"),
                Err(e) => return Err(e.into()),
            },
            Command::Move(code) => self.play(&code)?,
            Command::Moves(square) => self.destinations(&square)?,
            Command::Next => self.step(Direction::Forward, "Already at the end of the line")?,
            Command::Prev => self.step(Direction::Backward, "Already at the start")?,
            Command::History => render::history(
                self.navigator.history(),
                self.navigator.current_position(),
            ),
            Command::Info => match self.navigator.selected() {
                Some(node) => render::node_info(node),
                None => "No node selected".to_string(),
            },
            Command::Export(path) => self.export(&path)?,
            Command::Load(path) => {
                self.load_file(&path)?;
                format!(
                    "Loaded {} nodes from {}\n{}",
                    self.navigator.graph().nodes.len(),
                    path.display(),
                    self.board()?
                )
            }
            Command::Help => HELP.to_string(),
            Command::Quit => {
                return Ok(Reply {
                    text: String::new(),
                    quit: true,
                })
            }
        };

        Ok(Reply::text(text))
    }

    pub fn board(&self) -> Result<String, ExplorerError> {
        Ok(render::board(&self.navigator.board_state()?)?)
    }

    fn play(&mut self, code: &str) -> Result<String, ExplorerError> {
        let mv = match BoardMove::from_code(code) {
            Ok(mv) => mv,
            Err(_) => return Ok(format!("Unreadable move '{code}'")),
        };

        match self.navigator.make_move(mv)? {
            MoveOutcome::Rejected => Ok(format!("Illegal move {mv}")),
            MoveOutcome::Replayed => self.board(),
            MoveOutcome::Played { dropped } => {
                let mut text = self.board()?;
                if dropped > 0 {
                    let _ = writeln!(text, "({dropped} later positions discarded)");
                }
                Ok(text)
            }
        }
    }

    fn destinations(&self, square: &str) -> Result<String, ExplorerError> {
        let sq = match parse_square(square) {
            Ok(sq) => sq,
            Err(_) => return Ok(format!("Unreadable square '{square}'")),
        };

        let dests = self.navigator.legal_destinations(sq)?;
        if dests.is_empty() {
            return Ok(format!("No legal moves from {sq}"));
        }
        let list: Vec<String> = dests.iter().map(|d| d.to_string()).collect();
        Ok(format!("{sq}: {}", list.join(" ")))
    }

    fn step(&mut self, direction: Direction, at_end: &str) -> Result<String, ExplorerError> {
        if self.navigator.step(direction) {
            self.board()
        } else {
            Ok(at_end.to_string())
        }
    }

    fn export(&self, path: &Path) -> Result<String, ExplorerError> {
        let graph = self.navigator.graph();
        if graph.is_empty() {
            return Ok("No tree loaded".to_string());
        }

        let json = serde_json::to_string_pretty(graph)?;
        fs::write(path, json).map_err(|e| ExplorerError::io(path, e))?;
        Ok(format!("Wrote {} nodes to {}", graph.nodes.len(), path.display()))
    }
}

fn modified_time(path: &Path) -> io::Result<SystemTime> {
    fs::metadata(path).and_then(|m| m.modified())
}
