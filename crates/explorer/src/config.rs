//! Explorer configuration from environment variables

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use chess_core::layout::{LayoutConfig, NODE_HEIGHT, NODE_WIDTH};

const DEFAULT_POLL_SECS: u64 = 3;

#[derive(Clone, Debug)]
pub struct ExplorerConfig {
    /// Analysis tree JSON loaded at startup
    pub tree_path: Option<PathBuf>,

    /// Node spacing for the tree graph
    pub layout: LayoutConfig,

    /// How often the tree file is checked for a new result (None disables)
    pub poll_interval: Option<Duration>,
}

impl ExplorerConfig {
    /// Load configuration from environment variables.
    /// Unparseable numbers fall back to their defaults.
    pub fn from_env() -> Self {
        let tree_path = env::var("OPENING_TREE_PATH").ok().map(PathBuf::from);

        let node_width = env::var("LAYOUT_NODE_WIDTH")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|w: &f64| *w > 0.0)
            .unwrap_or(NODE_WIDTH);

        let node_height = env::var("LAYOUT_NODE_HEIGHT")
            .ok()
            .and_then(|v| v.parse().ok())
            .filter(|h: &f64| *h > 0.0)
            .unwrap_or(NODE_HEIGHT);

        let poll_secs = env::var("TREE_POLL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_POLL_SECS);

        Self {
            tree_path,
            layout: LayoutConfig {
                node_width,
                node_height,
                ..LayoutConfig::default()
            },
            poll_interval: (poll_secs > 0).then(|| Duration::from_secs(poll_secs)),
        }
    }
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            tree_path: None,
            layout: LayoutConfig::default(),
            poll_interval: Some(Duration::from_secs(DEFAULT_POLL_SECS)),
        }
    }
}
