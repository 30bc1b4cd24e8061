pub mod analysis_tree;
pub mod error;
pub mod game_data;
pub mod history;
pub mod layout;
pub mod navigator;
pub mod opening_tree;
pub mod pgn;
pub mod rules;
pub mod tidy;

pub use error::CoreError;
